//! The `Rules` trait: legality as a capability.
//!
//! The session never decides on its own whether a move is legal. It asks a
//! [`Rules`] implementation, which answers two questions:
//!
//! - "given position P and this candidate move, what is the resulting
//!   position?" ([`Rules::apply`])
//! - "where can the piece on this square go?" ([`Rules::legal_destinations`])
//!
//! Positions are opaque to the session. It only clones them, asks for their
//! FEN, and hands them back to the rules.

use std::fmt;

use crate::RulesError;

/// The side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// Parses the server's `currentTurn` value (`"w"` / `"b"`, or the full
    /// colour name).
    pub fn from_turn(turn: &str) -> Option<Self> {
        match turn.trim().to_ascii_lowercase().as_str() {
            "w" | "white" => Some(Self::White),
            "b" | "black" => Some(Self::Black),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::White => "w",
            Self::Black => "b",
        })
    }
}

/// A move as the user or the move history expresses it: source square,
/// target square, optional promotion piece letter.
///
/// The promotion letter is a preference. Rules ignore it for moves that
/// don't promote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMove {
    pub from: String,
    pub to: String,
    pub promotion: Option<char>,
}

impl CandidateMove {
    pub fn new(from: &str, to: &str, promotion: Option<char>) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            promotion,
        }
    }

    /// Parses coordinate notation: `e2e4`, `e7e8q`.
    ///
    /// # Errors
    /// [`RulesError::InvalidNotation`] unless the text is four ASCII
    /// characters optionally followed by one promotion letter.
    pub fn from_notation(text: &str) -> Result<Self, RulesError> {
        let invalid = || RulesError::InvalidNotation(text.to_string());
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(invalid());
        }
        let promotion = text[4..].chars().next();
        Ok(Self::new(&text[0..2], &text[2..4], promotion))
    }
}

impl fmt::Display for CandidateMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(p) = self.promotion {
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

/// One square a selected piece can move to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub square: String,
    /// `true` when the move takes an opposing piece.
    pub capture: bool,
}

/// The legality capability.
///
/// Implementations are stateless values; all state lives in
/// `Self::Position`.
pub trait Rules: Send + Sync + 'static {
    /// One immutable game position.
    type Position: Clone + Send + Sync + fmt::Debug + 'static;

    /// The standard starting position.
    fn initial(&self) -> Self::Position;

    /// Parses a FEN string.
    fn from_fen(&self, fen: &str) -> Result<Self::Position, RulesError>;

    /// Renders a position as FEN.
    fn to_fen(&self, position: &Self::Position) -> String;

    /// Whose move it is.
    fn side_to_move(&self, position: &Self::Position) -> Side;

    /// Returns the position after `mv`, or why `mv` can't be played.
    /// `position` is never modified.
    fn apply(
        &self,
        position: &Self::Position,
        mv: &CandidateMove,
    ) -> Result<Self::Position, RulesError>;

    /// Legal target squares for the piece on `square`. Empty if the square
    /// is empty, holds the wrong side's piece, or the piece is stuck.
    fn legal_destinations(&self, position: &Self::Position, square: &str) -> Vec<Destination>;

    /// Rebuilds a position by replaying coordinate moves from the start.
    ///
    /// # Errors
    /// The first move that fails to parse or apply.
    fn replay<'a>(
        &self,
        moves: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self::Position, RulesError> {
        let mut position = self.initial();
        for notation in moves {
            let mv = CandidateMove::from_notation(notation)?;
            position = self.apply(&position, &mv)?;
        }
        Ok(position)
    }
}
