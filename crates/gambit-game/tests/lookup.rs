//! Timing tests for the initial game lookup.
//!
//! Tokio's paused clock auto-advances whenever every task is idle, so the
//! retry delays resolve instantly while `Instant` still measures them.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use gambit_game::{
    lookup_with_retry, ApiError, GameLookup, GameSession, GameStatus, LookupOutcome, RetryPolicy,
    StandardChess,
};
use gambit_protocol::{GameId, GameSnapshot};
use tokio::time::Instant;

/// Answers from a script, then repeats the last answer.
struct ScriptedLookup {
    script: Mutex<VecDeque<Result<GameSnapshot, ApiError>>>,
    calls: AtomicU32,
}

impl ScriptedLookup {
    fn new(script: Vec<Result<GameSnapshot, ApiError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GameLookup for ScriptedLookup {
    async fn fetch(&self, _game_id: GameId) -> Result<GameSnapshot, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }
}

fn snapshot(status: &str) -> GameSnapshot {
    GameSnapshot {
        id: GameId(1),
        status: Some(status.to_string()),
        ..Default::default()
    }
}

fn network_error() -> Result<GameSnapshot, ApiError> {
    Err(ApiError::Network("connection refused".into()))
}

#[tokio::test(start_paused = true)]
async fn test_lookup_waits_initial_delay_then_finds_game() {
    let lookup = ScriptedLookup::new(vec![Ok(snapshot("IN_PROGRESS"))]);
    let started = Instant::now();

    let outcome = lookup_with_retry(&lookup, GameId(1), RetryPolicy::default(), |_| {}).await;

    assert_eq!(outcome, LookupOutcome::Found(snapshot("IN_PROGRESS")));
    assert_eq!(lookup.calls(), 1);
    assert_eq!(started.elapsed(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_lookup_polls_while_waiting() {
    let lookup = ScriptedLookup::new(vec![
        Ok(snapshot("WAITING")),
        Ok(snapshot("WAITING")),
        Ok(snapshot("IN_PROGRESS")),
    ]);
    let mut seen = Vec::new();
    let started = Instant::now();

    let outcome = lookup_with_retry(&lookup, GameId(1), RetryPolicy::default(), |s| {
        seen.push(s.status.clone().unwrap_or_default())
    })
    .await;

    assert_eq!(outcome, LookupOutcome::Found(snapshot("IN_PROGRESS")));
    assert_eq!(seen, ["WAITING", "WAITING", "IN_PROGRESS"]);
    assert_eq!(started.elapsed(), Duration::from_millis(2500));
}

#[tokio::test(start_paused = true)]
async fn test_lookup_stops_after_max_attempts_still_waiting() {
    let lookup = ScriptedLookup::new(vec![Ok(snapshot("WAITING"))]);
    let policy = RetryPolicy::default();

    let outcome = lookup_with_retry(&lookup, GameId(1), policy, |_| {}).await;

    assert_eq!(outcome, LookupOutcome::Found(snapshot("WAITING")));
    assert_eq!(lookup.calls(), policy.max_attempts());
}

#[tokio::test(start_paused = true)]
async fn test_lookup_failing_every_attempt_falls_back_after_max_attempts() {
    let lookup = ScriptedLookup::new(vec![network_error()]);
    let policy = RetryPolicy::default();

    let outcome = lookup_with_retry(&lookup, GameId(1), policy, |_| {}).await;

    assert_eq!(outcome, LookupOutcome::Fallback);
    assert_eq!(lookup.calls(), policy.max_attempts());
    assert_eq!(lookup.calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_lookup_recovers_after_transient_failure() {
    let lookup = ScriptedLookup::new(vec![network_error(), Ok(snapshot("IN_PROGRESS"))]);

    let outcome = lookup_with_retry(&lookup, GameId(1), RetryPolicy::default(), |_| {}).await;

    assert_eq!(outcome, LookupOutcome::Found(snapshot("IN_PROGRESS")));
    assert_eq!(lookup.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_lookup_unauthorized_gives_up_immediately() {
    let lookup = ScriptedLookup::new(vec![Err(ApiError::Unauthorized)]);

    let outcome = lookup_with_retry(&lookup, GameId(1), RetryPolicy::default(), |_| {}).await;

    assert_eq!(outcome, LookupOutcome::Fallback);
    assert_eq!(lookup.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fallback_outcome_drives_session_into_fresh_game() {
    let lookup = ScriptedLookup::new(vec![network_error()]);
    let mut session = GameSession::new(GameId(1), StandardChess);

    let outcome = lookup_with_retry(&lookup, GameId(1), RetryPolicy::default(), |s| {
        session.apply_snapshot(s)
    })
    .await;
    if outcome == LookupOutcome::Fallback {
        session.apply_fallback();
    }

    assert_eq!(session.status(), GameStatus::InProgress);
    assert_eq!(
        session.fen(),
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    );
}
