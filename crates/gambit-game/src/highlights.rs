//! Board highlights: what the UI should paint.

use std::collections::BTreeSet;

use crate::Destination;

/// Presentation-only board marks.
///
/// - `selected`: the square a click-to-move started from
/// - `options`: where that piece may go, captures flagged
/// - `annotations`: squares the user marked with a right click
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlights {
    pub selected: Option<String>,
    pub options: Vec<Destination>,
    pub annotations: BTreeSet<String>,
}

impl Highlights {
    /// Marks `square` as selected with its candidate destinations.
    pub fn select(&mut self, square: &str, options: Vec<Destination>) {
        self.selected = Some(square.to_string());
        self.options = options;
    }

    /// Drops the selection and its destinations.
    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.options.clear();
    }

    /// Adds `square` to the annotations, or removes it if already there.
    pub fn toggle_annotation(&mut self, square: &str) {
        if !self.annotations.remove(square) {
            self.annotations.insert(square.to_string());
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_option(&self, square: &str) -> bool {
        self.options.iter().any(|d| d.square == square)
    }
}
