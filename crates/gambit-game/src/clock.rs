//! Remaining time per side.
//!
//! The server is the only authority on the clocks: every update that
//! carries them overwrites both values. Between updates the side to move's
//! clock is counted down locally, one second per tick, purely for display.

use crate::Side;

/// Default starting time (ten minutes) until the server says otherwise.
const DEFAULT_SECONDS: i64 = 600;

/// Remaining seconds for each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clocks {
    pub white: i64,
    pub black: i64,
}

impl Default for Clocks {
    fn default() -> Self {
        Self {
            white: DEFAULT_SECONDS,
            black: DEFAULT_SECONDS,
        }
    }
}

impl Clocks {
    /// Replaces whichever values the server sent.
    pub fn overwrite(&mut self, white: Option<i64>, black: Option<i64>) {
        if let Some(w) = white {
            self.white = w;
        }
        if let Some(b) = black {
            self.black = b;
        }
    }

    /// Counts `side` down by one second, stopping at zero.
    pub fn tick(&mut self, side: Side) {
        let clock = match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        };
        *clock = clock.saturating_sub(1).max(0);
    }

    pub fn get(&self, side: Side) -> i64 {
        match side {
            Side::White => self.white,
            Side::Black => self.black,
        }
    }
}

/// Renders seconds as `m:ss`. Negative values render as `0:00`.
pub fn format_clock(seconds: i64) -> String {
    let s = seconds.max(0);
    format!("{}:{:02}", s / 60, s % 60)
}
