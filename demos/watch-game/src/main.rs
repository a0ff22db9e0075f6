//! Follows a game over the realtime link and prints the board state.
//!
//! ```text
//! GAMBIT_SOCKET_URL=ws://localhost:8080/ws RUST_LOG=gambit=debug watch-game 42
//! ```

use std::sync::Arc;
use std::time::Duration;

use gambit::{ClientConfig, ConnectionManagerBuilder, GambitError, LiveGame, LiveGameConfig};
use gambit_game::{format_clock, ApiError, GameLookup, StandardChess};
use gambit_protocol::{GameId, GameSnapshot};
use gambit_transport::WebSocketConnector;
use tracing_subscriber::EnvFilter;

/// No REST backend here; the board starts fresh and follows the pushes.
struct NoLookup;

impl GameLookup for NoLookup {
    async fn fetch(&self, _game_id: GameId) -> Result<GameSnapshot, ApiError> {
        Err(ApiError::Network("no game API configured".to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<(), GambitError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(game_id) = std::env::args().nth(1).and_then(|arg| arg.parse().ok()).map(GameId) else {
        eprintln!("usage: watch-game <game-id>");
        std::process::exit(2);
    };

    let config = ClientConfig::from_env();
    tracing::info!(url = %config.url, %game_id, "watching game");

    let manager = ConnectionManagerBuilder::new()
        .config(config)
        .build(WebSocketConnector::default());
    manager.connect().await?;

    let game = LiveGame::open(
        manager.multiplexer(),
        game_id,
        StandardChess,
        Arc::new(NoLookup),
        LiveGameConfig::default(),
    );

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let clocks = game.clocks();
                println!(
                    "{}  [white {} | black {}]  {}",
                    game.fen(),
                    format_clock(clocks.white),
                    format_clock(clocks.black),
                    game.status_line()
                );
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    drop(game);
    manager.disconnect();
    Ok(())
}
