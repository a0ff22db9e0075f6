//! HTTP calls with the stored credentials attached.

use std::sync::Arc;

use gambit_auth::{AuthState, CredentialStore};
use gambit_game::{ApiError, GameApi, GameLookup, QueueResponse};
use gambit_protocol::{GameId, GameSnapshot};

/// Wraps a [`GameApi`] so callers never handle the token themselves.
///
/// Every call reads the current token from the [`AuthState`]. A response of
/// [`ApiError::Unauthorized`] clears the stored credentials before the error
/// is returned, so the next screen sees a logged-out user.
pub struct AuthorizedApi<A, S: CredentialStore> {
    api: A,
    auth: Arc<AuthState<S>>,
}

impl<A: GameApi, S: CredentialStore> AuthorizedApi<A, S> {
    pub fn new(api: A, auth: Arc<AuthState<S>>) -> Self {
        Self { api, auth }
    }

    pub fn auth(&self) -> &AuthState<S> {
        &self.auth
    }

    pub fn inner(&self) -> &A {
        &self.api
    }

    fn check<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if matches!(result, Err(ApiError::Unauthorized)) {
            tracing::warn!("server rejected credentials, logging out");
            self.auth.handle_unauthorized();
        }
        result
    }

    pub async fn create_game(&self, time_control: &str) -> Result<QueueResponse, ApiError> {
        let token = self.auth.token();
        let result = self.api.create_game(token.as_deref(), time_control).await;
        self.check(result)
    }

    pub async fn join_game(&self, game_id: GameId) -> Result<GameSnapshot, ApiError> {
        let token = self.auth.token();
        let result = self.api.join_game(token.as_deref(), game_id).await;
        self.check(result)
    }

    pub async fn fetch_game(&self, game_id: GameId) -> Result<GameSnapshot, ApiError> {
        let token = self.auth.token();
        let result = self.api.fetch_game(token.as_deref(), game_id).await;
        self.check(result)
    }

    pub async fn resign(&self, game_id: GameId) -> Result<GameSnapshot, ApiError> {
        let token = self.auth.token();
        let result = self.api.resign(token.as_deref(), game_id).await;
        self.check(result)
    }

    pub async fn undo(&self, game_id: GameId) -> Result<(), ApiError> {
        let token = self.auth.token();
        let result = self.api.undo(token.as_deref(), game_id).await;
        self.check(result)
    }

    pub async fn enqueue(&self, time_control: &str) -> Result<QueueResponse, ApiError> {
        let token = self.auth.token();
        let result = self.api.enqueue(token.as_deref(), time_control).await;
        self.check(result)
    }

    pub async fn dequeue(&self) -> Result<(), ApiError> {
        let token = self.auth.token();
        let result = self.api.dequeue(token.as_deref()).await;
        self.check(result)
    }
}

impl<A: GameApi, S: CredentialStore> GameLookup for AuthorizedApi<A, S> {
    async fn fetch(&self, game_id: GameId) -> Result<GameSnapshot, ApiError> {
        self.fetch_game(game_id).await
    }
}
