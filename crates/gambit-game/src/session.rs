//! The per-game state machine.
//!
//! A [`GameSession`] holds what the board view shows for one game and is
//! the only thing that changes it. It has three inputs:
//!
//! - **snapshots** from the initial HTTP lookup ([`GameSession::apply_snapshot`])
//! - **authoritative updates** pushed on the game topic
//!   ([`GameSession::handle_update`])
//! - **local gestures**: drag, click, right click
//!   ([`GameSession::attempt_move`], [`GameSession::select_square`],
//!   [`GameSession::annotate`])
//!
//! Local moves are optimistic only in the sense that they're validated
//! before being sent. The committed board never changes until the server
//! echoes the move back as an update.
//!
//! ## Lifecycle
//!
//! ```text
//! [AwaitingData] ──snapshot / update──→ [InProgress] ──terminal──→ [Completed]
//!       │                                                              ▲
//!       └───────────────────── terminal snapshot ─────────────────────┘
//! ```
//!
//! `WAITING` (the opponent hasn't joined yet) keeps a session in
//! `AwaitingData`. `Completed` is terminal: later updates and gestures are
//! ignored.

use gambit_protocol::{destinations, GameId, GameSnapshot, GameUpdate, MoveRequest, UpdateKind};

use crate::{CandidateMove, Clocks, Highlights, Publisher, Rules, RulesError, Side};

const NOT_CONNECTED: &str = "Not connected! Move not sent.";
const DEFAULT_RESULT: &str = "Game Over";
const WAITING: &str = "WAITING";

fn is_terminal(status: &str) -> bool {
    matches!(status, "COMPLETED" | "FINISHED" | "DRAW")
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// No snapshot yet, or the game is still waiting for an opponent.
    AwaitingData,
    InProgress,
    /// Terminal. See [`GameSession::result`].
    Completed,
}

/// What happened to a drag-and-drop move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveAttempt {
    /// Legal and handed to the connection.
    Sent,
    /// Rejected by the rules; nothing else happened.
    Illegal(RulesError),
    /// The game is over.
    GameOver,
    /// Legal, but the connection is down. The status line says so.
    NotConnected,
}

/// What a left click on a square did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquareClick {
    /// Completed a two-click move, which was sent.
    Moved,
    /// Selected a piece; its destinations are highlighted.
    Selected,
    /// Dropped the previous selection.
    Cleared,
    /// Nothing to do (empty square, or the game is over).
    Ignored,
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// View state of one game plus the rules that govern it.
pub struct GameSession<R: Rules> {
    game_id: GameId,
    rules: R,
    position: R::Position,
    /// Coordinate moves the committed position was replayed from. Empty
    /// when the position came from a FEN.
    history: Vec<String>,
    clocks: Clocks,
    turn: Side,
    status: GameStatus,
    status_line: String,
    result: Option<String>,
    highlights: Highlights,
    promotion: char,
    username: Option<String>,
}

impl<R: Rules> GameSession<R> {
    /// A session for `game_id`, showing the start position until data
    /// arrives.
    pub fn new(game_id: GameId, rules: R) -> Self {
        let position = rules.initial();
        let turn = rules.side_to_move(&position);
        Self {
            game_id,
            rules,
            position,
            history: Vec::new(),
            clocks: Clocks::default(),
            turn,
            status: GameStatus::AwaitingData,
            status_line: "Connecting to server...".to_string(),
            result: None,
            highlights: Highlights::default(),
            promotion: 'q',
            username: None,
        }
    }

    /// Attaches the player's username to outbound moves.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Piece letter used when a move promotes. Defaults to `q`.
    pub fn with_promotion(mut self, piece: char) -> Self {
        self.promotion = piece;
        self
    }

    // -- Accessors --

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn position(&self) -> &R::Position {
        &self.position
    }

    pub fn fen(&self) -> String {
        self.rules.to_fen(&self.position)
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn clocks(&self) -> Clocks {
        self.clocks
    }

    pub fn turn(&self) -> Side {
        self.turn
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status == GameStatus::Completed
    }

    /// The one-line log shown under the board.
    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    /// Result text, once completed.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn highlights(&self) -> &Highlights {
        &self.highlights
    }

    // -- Connectivity --

    pub fn on_connected(&mut self) {
        if !self.is_over() {
            self.status_line = "Connected to Game Server".to_string();
        }
    }

    pub fn on_connection_error(&mut self) {
        if !self.is_over() {
            self.status_line = "Connection Error".to_string();
        }
    }

    // -- Authoritative inputs --

    /// Applies game state fetched over HTTP.
    pub fn apply_snapshot(&mut self, snapshot: &GameSnapshot) {
        if self.is_over() {
            return;
        }

        self.rebuild_board(snapshot.pgn.as_deref(), snapshot.fen.as_deref());
        self.clocks
            .overwrite(snapshot.white_time_remaining, snapshot.black_time_remaining);
        if let Some(turn) = snapshot.current_turn.as_deref().and_then(Side::from_turn) {
            self.turn = turn;
        }

        match snapshot.status.as_deref() {
            Some(s) if is_terminal(s) => {
                let result = snapshot.status_message.clone();
                self.complete(result);
            }
            Some(WAITING) | None => {}
            Some(_) => self.status = GameStatus::InProgress,
        }
    }

    /// The lookup gave up: assume a fresh game from the start position.
    ///
    /// Only acts while no data has arrived, so a late fallback never
    /// overwrites real state.
    pub fn apply_fallback(&mut self) {
        if self.status != GameStatus::AwaitingData {
            return;
        }
        tracing::warn!(game_id = %self.game_id, "game lookup failed, assuming a fresh game");
        self.position = self.rules.initial();
        self.turn = self.rules.side_to_move(&self.position);
        self.history.clear();
        self.status = GameStatus::InProgress;
    }

    /// Applies one update pushed on the game topic.
    pub fn handle_update(&mut self, update: &GameUpdate) {
        if self.is_over() {
            tracing::debug!(game_id = %self.game_id, kind = ?update.kind, "ignoring update for finished game");
            return;
        }

        match update.kind {
            UpdateKind::Move => {
                self.rebuild_board(update.pgn.as_deref(), update.fen.as_deref());
                self.clocks
                    .overwrite(update.white_time_left, update.black_time_left);
                if let Some(turn) = Side::from_turn(&update.current_turn) {
                    self.turn = turn;
                }
                self.highlights.clear_selection();
                self.status_line = format!("Opponent moved. Turn: {}", update.current_turn);

                if is_terminal(&update.status) {
                    self.complete(update.message.clone());
                } else if !update.status.is_empty() && update.status != WAITING {
                    self.status = GameStatus::InProgress;
                }
            }
            UpdateKind::GameOver => {
                self.clocks
                    .overwrite(update.white_time_left, update.black_time_left);
                self.complete(update.message.clone());
            }
            UpdateKind::Error => {
                self.status_line = match update.message.as_deref() {
                    Some(message) if !message.is_empty() => {
                        format!("Error: {} ({message})", update.status)
                    }
                    _ => format!("Error: {}", update.status),
                };
                tracing::debug!(game_id = %self.game_id, status = %update.status, "server reported an error");
            }
        }
    }

    /// Replaces the committed board from a move list, or from a FEN when
    /// there is no list or it doesn't replay. With neither, the board
    /// stays as it was.
    fn rebuild_board(&mut self, pgn: Option<&str>, fen: Option<&str>) {
        let Some(pgn) = pgn.filter(|p| !p.trim().is_empty()) else {
            self.adopt_fen(fen);
            return;
        };

        let moves: Vec<&str> = pgn.split(' ').filter(|m| !m.is_empty()).collect();
        match self.rules.replay(moves.iter().copied()) {
            Ok(position) => {
                self.turn = self.rules.side_to_move(&position);
                self.position = position;
                self.history = moves.into_iter().map(String::from).collect();
            }
            Err(e) => {
                tracing::debug!(game_id = %self.game_id, error = %e, "move list replay failed, using fen");
                self.adopt_fen(fen);
            }
        }
    }

    fn adopt_fen(&mut self, fen: Option<&str>) {
        let Some(fen) = fen else {
            return;
        };
        match self.rules.from_fen(fen) {
            Ok(position) => {
                self.turn = self.rules.side_to_move(&position);
                self.position = position;
                self.history.clear();
            }
            Err(e) => {
                tracing::warn!(game_id = %self.game_id, error = %e, "server sent an unusable fen, keeping board");
            }
        }
    }

    fn complete(&mut self, result: Option<String>) {
        let result = result
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_RESULT.to_string());
        tracing::info!(game_id = %self.game_id, %result, "game over");
        self.status = GameStatus::Completed;
        self.result = Some(result);
        self.highlights.clear();
    }

    // -- Local gestures --

    /// A drag from `from` to `to`.
    ///
    /// Validates on a throwaway copy; on success sends exactly one move
    /// request through `publisher`. The committed board is not touched.
    pub fn attempt_move<P: Publisher>(&mut self, from: &str, to: &str, publisher: &P) -> MoveAttempt {
        if self.is_over() {
            return MoveAttempt::GameOver;
        }
        let candidate = CandidateMove::new(from, to, Some(self.promotion));
        if let Err(e) = self.rules.apply(&self.position, &candidate) {
            tracing::debug!(game_id = %self.game_id, error = %e, "move rejected locally");
            return MoveAttempt::Illegal(e);
        }
        self.send_move(from, to, publisher)
    }

    /// A left click on `square` (click-to-move).
    ///
    /// With a piece already selected, a legal target sends the move. Any
    /// other click selects the clicked piece if it can move, or clears the
    /// selection. Every click clears the right-click annotations.
    pub fn select_square<P: Publisher>(&mut self, square: &str, publisher: &P) -> SquareClick {
        if self.is_over() {
            return SquareClick::Ignored;
        }
        self.highlights.annotations.clear();

        let Some(from) = self.highlights.selected.clone() else {
            return if self.show_options(square) {
                SquareClick::Selected
            } else {
                SquareClick::Ignored
            };
        };

        let candidate = CandidateMove::new(&from, square, Some(self.promotion));
        if self.rules.apply(&self.position, &candidate).is_ok()
            && self.send_move(&from, square, publisher) == MoveAttempt::Sent
        {
            return SquareClick::Moved;
        }

        if self.show_options(square) {
            SquareClick::Selected
        } else {
            self.highlights.clear_selection();
            SquareClick::Cleared
        }
    }

    /// A right click on `square`: toggles its annotation.
    pub fn annotate(&mut self, square: &str) {
        if !self.is_over() {
            self.highlights.toggle_annotation(square);
        }
    }

    /// One second of display time has passed.
    pub fn tick(&mut self) {
        if self.status == GameStatus::InProgress {
            self.clocks.tick(self.turn);
        }
    }

    fn send_move<P: Publisher>(&mut self, from: &str, to: &str, publisher: &P) -> MoveAttempt {
        let mut request = MoveRequest::new(self.game_id, from, to, self.promotion);
        if let Some(username) = &self.username {
            request = request.with_username(username.as_str());
        }
        if !publisher.publish(destinations::MOVE, &request) {
            self.status_line = NOT_CONNECTED.to_string();
            return MoveAttempt::NotConnected;
        }
        tracing::debug!(game_id = %self.game_id, %from, %to, "move sent");
        self.highlights.clear_selection();
        MoveAttempt::Sent
    }

    fn show_options(&mut self, square: &str) -> bool {
        let options = self.rules.legal_destinations(&self.position, square);
        if options.is_empty() {
            return false;
        }
        self.highlights.select(square, options);
        true
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde::Serialize;
    use serde_json::{json, Value};

    use super::*;
    use crate::StandardChess;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

    /// Records everything published; `connected` decides the return value.
    struct RecordingPublisher {
        connected: bool,
        sent: RefCell<Vec<(String, Value)>>,
    }

    impl RecordingPublisher {
        fn connected() -> Self {
            Self { connected: true, sent: RefCell::new(Vec::new()) }
        }

        fn disconnected() -> Self {
            Self { connected: false, sent: RefCell::new(Vec::new()) }
        }

        fn sent(&self) -> Vec<(String, Value)> {
            self.sent.borrow().clone()
        }
    }

    impl Publisher for RecordingPublisher {
        fn publish<T: Serialize>(&self, destination: &str, body: &T) -> bool {
            if !self.connected {
                return false;
            }
            let value = serde_json::to_value(body).unwrap();
            self.sent.borrow_mut().push((destination.to_string(), value));
            true
        }
    }

    fn session() -> GameSession<StandardChess> {
        GameSession::new(GameId(1), StandardChess)
    }

    fn update(value: Value) -> GameUpdate {
        serde_json::from_value(value).unwrap()
    }

    fn in_progress() -> GameSession<StandardChess> {
        let mut s = session();
        s.apply_snapshot(&GameSnapshot {
            id: GameId(1),
            status: Some("IN_PROGRESS".into()),
            fen: Some(START.into()),
            ..Default::default()
        });
        s
    }

    // =====================================================================
    // Snapshots and fallback
    // =====================================================================

    #[test]
    fn test_new_session_awaits_data() {
        let s = session();
        assert_eq!(s.status(), GameStatus::AwaitingData);
        assert_eq!(s.fen(), START);
        assert_eq!(s.status_line(), "Connecting to server...");
    }

    #[test]
    fn test_apply_snapshot_waiting_keeps_awaiting_data() {
        let mut s = session();
        s.apply_snapshot(&GameSnapshot {
            id: GameId(1),
            status: Some("WAITING".into()),
            white_time_remaining: Some(300),
            ..Default::default()
        });
        assert_eq!(s.status(), GameStatus::AwaitingData);
        assert_eq!(s.clocks().white, 300);
    }

    #[test]
    fn test_apply_snapshot_in_progress_with_pgn() {
        let mut s = session();
        s.apply_snapshot(&GameSnapshot {
            id: GameId(1),
            status: Some("IN_PROGRESS".into()),
            pgn: Some("e2e4 e7e5".into()),
            ..Default::default()
        });
        assert_eq!(s.status(), GameStatus::InProgress);
        assert_eq!(s.history(), ["e2e4", "e7e5"]);
        assert_eq!(s.turn(), Side::White);
    }

    #[test]
    fn test_apply_snapshot_completed_is_terminal() {
        let mut s = session();
        s.apply_snapshot(&GameSnapshot {
            id: GameId(1),
            status: Some("COMPLETED".into()),
            status_message: Some("Black resigned".into()),
            ..Default::default()
        });
        assert_eq!(s.status(), GameStatus::Completed);
        assert_eq!(s.result(), Some("Black resigned"));
    }

    #[test]
    fn test_apply_fallback_only_when_awaiting_data() {
        let mut s = session();
        s.apply_fallback();
        assert_eq!(s.status(), GameStatus::InProgress);
        assert_eq!(s.fen(), START);

        let mut moved = in_progress();
        moved.handle_update(&update(json!({"type": "MOVE", "pgn": "e2e4", "status": "IN_PROGRESS"})));
        moved.apply_fallback();
        assert_eq!(moved.fen(), AFTER_E4);
    }

    // =====================================================================
    // handle_update()
    // =====================================================================

    #[test]
    fn test_handle_update_move_replays_pgn_and_overwrites_clocks() {
        let mut s = session();
        s.handle_update(&update(json!({
            "type": "MOVE",
            "pgn": "e2e4",
            "whiteTimeLeft": 595,
            "blackTimeLeft": 600,
            "currentTurn": "b",
            "status": "IN_PROGRESS"
        })));

        assert_eq!(s.status(), GameStatus::InProgress);
        assert_eq!(s.fen(), AFTER_E4);
        assert_eq!(s.history(), ["e2e4"]);
        assert_eq!(s.clocks(), Clocks { white: 595, black: 600 });
        assert_eq!(s.turn(), Side::Black);
        assert_eq!(s.status_line(), "Opponent moved. Turn: b");
    }

    #[test]
    fn test_handle_update_draw_status_completes_game() {
        let mut s = in_progress();
        let publisher = RecordingPublisher::connected();
        s.handle_update(&update(json!({
            "type": "MOVE",
            "pgn": "e2e4",
            "currentTurn": "b",
            "status": "DRAW",
            "statusMessage": "Draw"
        })));

        assert_eq!(s.status(), GameStatus::Completed);
        assert_eq!(s.result(), Some("Draw"));
        assert_eq!(s.attempt_move("e7", "e5", &publisher), MoveAttempt::GameOver);
        assert!(publisher.sent().is_empty());
    }

    #[test]
    fn test_handle_update_bad_replay_falls_back_to_fen() {
        let mut s = in_progress();
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
        s.handle_update(&update(json!({
            "type": "MOVE",
            "pgn": "e2e4 e7e5 g1f9",
            "fen": fen,
            "status": "IN_PROGRESS"
        })));
        assert_eq!(s.fen(), fen);
        assert!(s.history().is_empty());
    }

    #[test]
    fn test_handle_update_bad_replay_without_fen_keeps_board() {
        let mut s = in_progress();
        s.handle_update(&update(json!({"type": "MOVE", "pgn": "e2e4", "status": "IN_PROGRESS"})));
        s.handle_update(&update(json!({"type": "MOVE", "pgn": "e2e4 e7e5 g1f9", "status": "IN_PROGRESS"})));
        assert_eq!(s.fen(), AFTER_E4);
        assert_eq!(s.history(), ["e2e4"]);
    }

    #[test]
    fn test_handle_update_without_pgn_uses_fen() {
        let mut s = in_progress();
        s.handle_update(&update(json!({"type": "MOVE", "fen": AFTER_E4, "status": "IN_PROGRESS"})));
        assert_eq!(s.fen(), AFTER_E4);
    }

    #[test]
    fn test_handle_update_move_with_completed_status_ends_game() {
        let mut s = in_progress();
        s.handle_update(&update(json!({"type": "MOVE", "pgn": "e2e4", "status": "FINISHED"})));
        assert_eq!(s.status(), GameStatus::Completed);
        assert_eq!(s.result(), Some("Game Over"));
    }

    #[test]
    fn test_handle_update_game_over_sets_result() {
        let mut s = in_progress();
        s.annotate("e4");
        s.handle_update(&update(json!({"type": "GAME_OVER", "message": "White wins on time"})));
        assert!(s.is_over());
        assert_eq!(s.result(), Some("White wins on time"));
        assert!(s.highlights().annotations.is_empty());
    }

    #[test]
    fn test_handle_update_error_sets_status_line_only() {
        let mut s = in_progress();
        s.handle_update(&update(json!({"type": "ERROR", "status": "Not your turn"})));
        assert_eq!(s.status_line(), "Error: Not your turn");
        assert_eq!(s.status(), GameStatus::InProgress);
        assert_eq!(s.fen(), START);
        assert_eq!(s.clocks(), Clocks::default());
    }

    #[test]
    fn test_handle_update_after_completion_is_ignored() {
        let mut s = in_progress();
        s.handle_update(&update(json!({"type": "GAME_OVER"})));
        s.handle_update(&update(json!({"type": "MOVE", "pgn": "e2e4", "status": "IN_PROGRESS"})));
        assert!(s.is_over());
        assert_eq!(s.fen(), START);
    }

    // =====================================================================
    // attempt_move()
    // =====================================================================

    #[test]
    fn test_attempt_move_legal_publishes_once_and_keeps_board() {
        let mut s = in_progress();
        let publisher = RecordingPublisher::connected();

        assert_eq!(s.attempt_move("e2", "e4", &publisher), MoveAttempt::Sent);

        let sent = publisher.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "/app/move");
        assert_eq!(
            sent[0].1,
            json!({"gameId": 1, "from": "e2", "to": "e4", "promotion": "q"})
        );
        assert_eq!(s.fen(), START);
    }

    #[test]
    fn test_attempt_move_illegal_sends_nothing() {
        let mut s = in_progress();
        let publisher = RecordingPublisher::connected();

        let result = s.attempt_move("e2", "e5", &publisher);

        assert!(matches!(result, MoveAttempt::Illegal(_)));
        assert!(publisher.sent().is_empty());
        assert_eq!(s.fen(), START);
    }

    #[test]
    fn test_attempt_move_disconnected_sets_status_line() {
        let mut s = in_progress();
        let result = s.attempt_move("e2", "e4", &RecordingPublisher::disconnected());
        assert_eq!(result, MoveAttempt::NotConnected);
        assert_eq!(s.status_line(), "Not connected! Move not sent.");
    }

    #[test]
    fn test_attempt_move_allowed_while_awaiting_data() {
        let mut s = session();
        let publisher = RecordingPublisher::connected();
        assert_eq!(s.attempt_move("g1", "f3", &publisher), MoveAttempt::Sent);
    }

    #[test]
    fn test_attempt_move_after_game_over_is_rejected() {
        let mut s = in_progress();
        s.handle_update(&update(json!({"type": "GAME_OVER"})));
        let publisher = RecordingPublisher::connected();
        assert_eq!(s.attempt_move("e2", "e4", &publisher), MoveAttempt::GameOver);
        assert!(publisher.sent().is_empty());
    }

    #[test]
    fn test_attempt_move_includes_username() {
        let mut s = GameSession::new(GameId(5), StandardChess).with_username("ana");
        let publisher = RecordingPublisher::connected();
        s.attempt_move("d2", "d4", &publisher);
        assert_eq!(publisher.sent()[0].1["username"], "ana");
    }

    // =====================================================================
    // select_square() / annotate()
    // =====================================================================

    #[test]
    fn test_select_square_then_target_sends_move() {
        let mut s = in_progress();
        let publisher = RecordingPublisher::connected();

        assert_eq!(s.select_square("g1", &publisher), SquareClick::Selected);
        assert_eq!(s.highlights().selected.as_deref(), Some("g1"));
        assert!(s.highlights().is_option("f3"));

        assert_eq!(s.select_square("f3", &publisher), SquareClick::Moved);
        assert_eq!(publisher.sent().len(), 1);
        assert_eq!(s.highlights().selected, None);
        assert_eq!(s.fen(), START);
    }

    #[test]
    fn test_select_square_empty_square_is_ignored() {
        let mut s = in_progress();
        assert_eq!(s.select_square("e4", &RecordingPublisher::connected()), SquareClick::Ignored);
    }

    #[test]
    fn test_select_square_switches_to_other_piece() {
        let mut s = in_progress();
        let publisher = RecordingPublisher::connected();
        s.select_square("g1", &publisher);
        assert_eq!(s.select_square("b1", &publisher), SquareClick::Selected);
        assert_eq!(s.highlights().selected.as_deref(), Some("b1"));
        assert!(publisher.sent().is_empty());
    }

    #[test]
    fn test_select_square_invalid_target_clears_selection() {
        let mut s = in_progress();
        let publisher = RecordingPublisher::connected();
        s.select_square("g1", &publisher);
        assert_eq!(s.select_square("g5", &publisher), SquareClick::Cleared);
        assert_eq!(s.highlights().selected, None);
    }

    #[test]
    fn test_select_square_clears_annotations() {
        let mut s = in_progress();
        s.annotate("d4");
        s.select_square("e4", &RecordingPublisher::connected());
        assert!(s.highlights().annotations.is_empty());
    }

    #[test]
    fn test_annotate_toggles() {
        let mut s = in_progress();
        s.annotate("d4");
        s.annotate("e5");
        s.annotate("d4");
        assert_eq!(s.highlights().annotations.iter().collect::<Vec<_>>(), ["e5"]);
    }

    // =====================================================================
    // tick()
    // =====================================================================

    #[test]
    fn test_tick_counts_down_side_to_move_only_in_progress() {
        let mut s = session();
        s.tick();
        assert_eq!(s.clocks(), Clocks::default());

        s.handle_update(&update(json!({
            "type": "MOVE", "pgn": "e2e4", "whiteTimeLeft": 595,
            "blackTimeLeft": 600, "currentTurn": "b", "status": "IN_PROGRESS"
        })));
        s.tick();
        s.tick();
        assert_eq!(s.clocks(), Clocks { white: 595, black: 598 });
    }
}
