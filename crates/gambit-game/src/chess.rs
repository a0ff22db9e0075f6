//! Standard chess, backed by `shakmaty`.

use shakmaty::{
    fen::Fen, uci::UciMove, CastlingMode, Chess, Color, EnPassantMode, Move, Position, Role,
    Square,
};

use crate::{CandidateMove, Destination, Rules, RulesError, Side};

/// Orthodox chess rules with standard castling.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardChess;

impl StandardChess {
    /// Resolves a candidate to a legal `shakmaty` move.
    ///
    /// The promotion letter is consulted only when the plain move needs
    /// one, so `e2e4` with a default `q` attached is still `e2e4`.
    fn resolve(&self, position: &Chess, mv: &CandidateMove) -> Result<Move, RulesError> {
        let from = parse_square(&mv.from, mv)?;
        let to = parse_square(&mv.to, mv)?;

        let plain = UciMove::Normal {
            from,
            to,
            promotion: None,
        };
        if let Ok(m) = plain.to_move(position) {
            return Ok(m);
        }

        let role = mv
            .promotion
            .and_then(Role::from_char)
            .ok_or_else(|| RulesError::IllegalMove(mv.to_string()))?;
        UciMove::Normal {
            from,
            to,
            promotion: Some(role),
        }
        .to_move(position)
        .map_err(|_| RulesError::IllegalMove(mv.to_string()))
    }
}

fn parse_square(text: &str, mv: &CandidateMove) -> Result<Square, RulesError> {
    text.parse::<Square>()
        .map_err(|_| RulesError::InvalidNotation(mv.to_string()))
}

impl Rules for StandardChess {
    type Position = Chess;

    fn initial(&self) -> Chess {
        Chess::default()
    }

    fn from_fen(&self, fen: &str) -> Result<Chess, RulesError> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| RulesError::InvalidFen(format!("{e}")))?;
        parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| RulesError::InvalidFen(format!("{e}")))
    }

    fn to_fen(&self, position: &Chess) -> String {
        Fen::from_position(position.clone(), EnPassantMode::Legal).to_string()
    }

    fn side_to_move(&self, position: &Chess) -> Side {
        match position.turn() {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }

    fn apply(&self, position: &Chess, mv: &CandidateMove) -> Result<Chess, RulesError> {
        let m = self.resolve(position, mv)?;
        position
            .clone()
            .play(&m)
            .map_err(|_| RulesError::IllegalMove(mv.to_string()))
    }

    fn legal_destinations(&self, position: &Chess, square: &str) -> Vec<Destination> {
        let Ok(from) = square.parse::<Square>() else {
            return Vec::new();
        };

        let mut out: Vec<Destination> = Vec::new();
        for m in position.legal_moves().iter().filter(|m| m.from() == Some(from)) {
            // Castling is reported by the king's target square, and the four
            // promotion choices collapse into one destination.
            let target = match UciMove::from_move(m, CastlingMode::Standard) {
                UciMove::Normal { to, .. } => to,
                _ => m.to(),
            };
            let name = target.to_string();
            if !out.iter().any(|d| d.square == name) {
                out.push(Destination {
                    square: name,
                    capture: m.is_capture(),
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn mv(text: &str) -> CandidateMove {
        CandidateMove::from_notation(text).unwrap()
    }

    #[test]
    fn test_initial_renders_start_fen() {
        let rules = StandardChess;
        assert_eq!(rules.to_fen(&rules.initial()), START);
    }

    #[test]
    fn test_apply_legal_move_returns_new_position() {
        let rules = StandardChess;
        let start = rules.initial();
        let after = rules.apply(&start, &mv("e2e4")).unwrap();

        assert_eq!(rules.side_to_move(&after), Side::Black);
        assert!(rules.to_fen(&after).starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b"));
        // The input position is untouched.
        assert_eq!(rules.to_fen(&start), START);
    }

    #[test]
    fn test_apply_ignores_promotion_letter_on_plain_move() {
        let rules = StandardChess;
        let with_q = CandidateMove::new("g1", "f3", Some('q'));
        assert!(rules.apply(&rules.initial(), &with_q).is_ok());
    }

    #[test]
    fn test_apply_illegal_move_returns_illegal() {
        let rules = StandardChess;
        let result = rules.apply(&rules.initial(), &mv("e2e5"));
        assert!(matches!(result, Err(RulesError::IllegalMove(_))));
    }

    #[test]
    fn test_apply_off_board_square_returns_invalid_notation() {
        let rules = StandardChess;
        let result = rules.apply(&rules.initial(), &mv("g1f9"));
        assert!(matches!(result, Err(RulesError::InvalidNotation(_))));
    }

    #[test]
    fn test_apply_promotion_requires_letter() {
        let rules = StandardChess;
        let pos = rules.from_fen("8/4P3/8/8/8/8/k7/7K w - - 0 1").unwrap();

        assert!(rules.apply(&pos, &mv("e7e8")).is_err());
        let promoted = rules.apply(&pos, &mv("e7e8n")).unwrap();
        assert!(rules.to_fen(&promoted).starts_with("4N3/"));
    }

    #[test]
    fn test_apply_castling_in_king_notation() {
        let rules = StandardChess;
        let pos = rules
            .from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1")
            .unwrap();
        let castled = rules.apply(&pos, &mv("e1g1")).unwrap();
        assert!(rules.to_fen(&castled).contains("R4RK1"));
    }

    #[test]
    fn test_from_fen_garbage_returns_invalid_fen() {
        let result = StandardChess.from_fen("not a fen");
        assert!(matches!(result, Err(RulesError::InvalidFen(_))));
    }

    #[test]
    fn test_replay_sequence_reaches_expected_position() {
        let rules = StandardChess;
        let pos = rules.replay("e2e4 e7e5 g1f3".split(' ')).unwrap();
        assert_eq!(rules.side_to_move(&pos), Side::Black);
    }

    #[test]
    fn test_replay_stops_at_first_bad_move() {
        let rules = StandardChess;
        assert!(rules.replay("e2e4 e7e5 g1f9".split(' ')).is_err());
    }

    #[test]
    fn test_legal_destinations_knight_from_start() {
        let rules = StandardChess;
        let mut squares: Vec<String> = rules
            .legal_destinations(&rules.initial(), "g1")
            .into_iter()
            .map(|d| d.square)
            .collect();
        squares.sort();
        assert_eq!(squares, vec!["f3", "h3"]);
    }

    #[test]
    fn test_legal_destinations_marks_captures() {
        let rules = StandardChess;
        let pos = rules.replay(["e2e4", "d7d5"]).unwrap();
        let dests = rules.legal_destinations(&pos, "e4");
        assert!(dests.contains(&Destination { square: "d5".into(), capture: true }));
        assert!(dests.contains(&Destination { square: "e5".into(), capture: false }));
    }

    #[test]
    fn test_legal_destinations_collapses_promotions() {
        let rules = StandardChess;
        let pos = rules.from_fen("8/4P3/8/8/8/8/k7/7K w - - 0 1").unwrap();
        assert_eq!(rules.legal_destinations(&pos, "e7").len(), 1);
    }

    #[test]
    fn test_legal_destinations_empty_or_opponent_square_is_empty() {
        let rules = StandardChess;
        assert!(rules.legal_destinations(&rules.initial(), "e4").is_empty());
        assert!(rules.legal_destinations(&rules.initial(), "e7").is_empty());
        assert!(rules.legal_destinations(&rules.initial(), "zz").is_empty());
    }
}
