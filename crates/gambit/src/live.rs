//! A game session wired to the live connection.
//!
//! [`LiveGame`] is what a board screen holds while it is open. It owns:
//!
//! - the [`GameSession`], behind a mutex shared with the tasks below
//! - the listener on `/topic/game/{id}` feeding authoritative updates in
//! - the initial lookup task (bounded retries, then the offline fallback)
//! - the display-clock ticker
//! - a watcher turning connectivity events into the status line
//!
//! Dropping it unsubscribes the listener and aborts every task, so nothing
//! touches the session after the screen is gone.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use gambit_game::{
    lookup_with_retry, Clocks, GameLookup, GameSession, GameStatus, LookupOutcome, MoveAttempt,
    RetryPolicy, Rules, SquareClick,
};
use gambit_protocol::{GameId, GameUpdate, Topic};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::{ConnectionEvent, Multiplexer, Subscription};

/// Settings for [`LiveGame::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveGameConfig {
    /// Initial lookup schedule.
    pub retry: RetryPolicy,
    /// Display clock resolution.
    pub tick_interval: Duration,
    /// Attached to outbound moves when set.
    pub username: Option<String>,
    /// Piece letter used for promotions.
    pub promotion: char,
}

impl Default for LiveGameConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            tick_interval: Duration::from_secs(1),
            username: None,
            promotion: 'q',
        }
    }
}

type Shared<R> = Arc<Mutex<GameSession<R>>>;

fn lock<R: Rules>(session: &Mutex<GameSession<R>>) -> MutexGuard<'_, GameSession<R>> {
    session
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An open game board bound to the connection.
pub struct LiveGame<R: Rules> {
    game_id: GameId,
    session: Shared<R>,
    mux: Multiplexer,
    subscription: Subscription,
    tasks: Vec<JoinHandle<()>>,
}

impl<R: Rules> LiveGame<R> {
    /// Subscribes to the game topic and starts the background tasks.
    ///
    /// Must be called from within a Tokio runtime. The connection does not
    /// need to be up yet: the subscription is replayed once it is.
    pub fn open<L: GameLookup>(
        mux: &Multiplexer,
        game_id: GameId,
        rules: R,
        lookup: Arc<L>,
        config: LiveGameConfig,
    ) -> Self {
        let mut session = GameSession::new(game_id, rules).with_promotion(config.promotion);
        if let Some(username) = config.username.clone() {
            session = session.with_username(username);
        }
        if mux.is_connected() {
            session.on_connected();
        }
        let session: Shared<R> = Arc::new(Mutex::new(session));

        let subscription = {
            let session = Arc::clone(&session);
            mux.subscribe_to(Topic::game(game_id), move |update: GameUpdate| {
                lock(&session).handle_update(&update);
            })
        };

        let tasks = vec![
            tokio::spawn(run_lookup(Arc::clone(&session), lookup, config.retry)),
            tokio::spawn(run_ticker(Arc::clone(&session), config.tick_interval)),
            tokio::spawn(watch_connection(Arc::clone(&session), mux.events())),
        ];
        tracing::info!(%game_id, "game opened");

        Self {
            game_id,
            session,
            mux: mux.clone(),
            subscription,
            tasks,
        }
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// A drag from `from` to `to`. See [`GameSession::attempt_move`].
    pub fn attempt_move(&self, from: &str, to: &str) -> MoveAttempt {
        lock(&self.session).attempt_move(from, to, &self.mux)
    }

    /// A left click. See [`GameSession::select_square`].
    pub fn select_square(&self, square: &str) -> SquareClick {
        lock(&self.session).select_square(square, &self.mux)
    }

    /// A right click.
    pub fn annotate(&self, square: &str) {
        lock(&self.session).annotate(square);
    }

    /// Reads the session under its lock.
    pub fn with_session<T>(&self, f: impl FnOnce(&GameSession<R>) -> T) -> T {
        f(&lock(&self.session))
    }

    pub fn status(&self) -> GameStatus {
        lock(&self.session).status()
    }

    pub fn fen(&self) -> String {
        lock(&self.session).fen()
    }

    pub fn clocks(&self) -> Clocks {
        lock(&self.session).clocks()
    }

    pub fn status_line(&self) -> String {
        lock(&self.session).status_line().to_string()
    }
}

impl<R: Rules> Drop for LiveGame<R> {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
        for task in &self.tasks {
            task.abort();
        }
        tracing::debug!(game_id = %self.game_id, "game closed");
    }
}

async fn run_lookup<R: Rules, L: GameLookup>(session: Shared<R>, lookup: Arc<L>, retry: RetryPolicy) {
    let game_id = lock(&session).game_id();
    let outcome = lookup_with_retry(lookup.as_ref(), game_id, retry, |snapshot| {
        lock(&session).apply_snapshot(snapshot);
    })
    .await;

    if outcome == LookupOutcome::Fallback {
        lock(&session).apply_fallback();
    }
}

async fn run_ticker<R: Rules>(session: Shared<R>, every: Duration) {
    let mut timer = interval_at(Instant::now() + every, every);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        timer.tick().await;
        lock(&session).tick();
    }
}

async fn watch_connection<R: Rules>(
    session: Shared<R>,
    mut events: broadcast::Receiver<ConnectionEvent>,
) {
    loop {
        match events.recv().await {
            Ok(ConnectionEvent::Connected) => {
                lock(&session).on_connected();
            }
            Ok(ConnectionEvent::Disconnected) => {
                lock(&session).on_connection_error();
            }
            Ok(ConnectionEvent::ProtocolError(_)) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "connection events lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
