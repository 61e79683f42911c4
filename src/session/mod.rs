//! Session controller.
//!
//! Drives login, logout, startup authentication checks and token refresh on
//! top of the [`RequestExecutor`], publishing every transition through a
//! [`SessionSignal`].

mod state;
mod types;

pub use state::*;
pub use types::*;

use crate::client::{ApiError, RequestBody, RequestExecutor};
use crate::credentials::TokenSet;
use parking_lot::RwLock;
use reqwest::Method;
use std::sync::Arc;
use tokio::sync::watch;

pub const TOKEN_PATH: &str = "/auth/token";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const CURRENT_USER_PATH: &str = "/auth/current-user";

pub struct SessionController {
    executor: Arc<RequestExecutor>,
    last_error: RwLock<Option<String>>,
}

impl SessionController {
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self {
            executor,
            last_error: RwLock::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        self.executor.session().state()
    }

    pub fn identity(&self) -> Option<UserIdentity> {
        self.executor.session().identity()
    }

    /// Message from the last failed operation, suitable for display.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.executor.session().subscribe()
    }

    /// Exchange a username and password for a session.
    ///
    /// On failure the backend's `detail` is kept in [`last_error`] and the
    /// session stays logged out.
    ///
    /// [`last_error`]: SessionController::last_error
    pub async fn login(&self, username: &str, password: &str) -> Result<UserIdentity, ApiError> {
        let signal = self.executor.session();
        let credentials = self.executor.credentials();
        signal.begin_login();
        *self.last_error.write() = None;

        let mut stored = false;
        let result = async {
            let options = self.executor.defaults().clone().anonymous();
            let body = RequestBody::form([("username", username), ("password", password)]);
            let value = self
                .executor
                .execute(Method::POST, TOKEN_PATH, Some(body), &options)
                .await?
                .into_json()?;
            let tokens: TokenResponse =
                serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;

            let secure = self.executor.registry().get_active().is_secure();
            credentials.set(&TokenSet::from(tokens), secure)?;
            stored = true;

            self.executor
                .get_json::<UserIdentity>(CURRENT_USER_PATH)
                .await
        }
        .await;

        match result {
            Ok(identity) => {
                tracing::info!(user = %identity.user_name, role = %identity.user_role, "Logged in");
                signal.establish(identity.clone());
                Ok(identity)
            }
            Err(e) => {
                if stored {
                    credentials.clear();
                }
                signal.expire();
                tracing::warn!(error = %e, "Login failed");
                *self.last_error.write() = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Drop all credentials. Never fails.
    pub fn logout(&self) {
        self.executor.credentials().clear();
        self.executor.session().expire();
        *self.last_error.write() = None;
    }

    /// Validate a persisted token against `/auth/current-user`.
    ///
    /// Without a stored bearer token no request is made and `Ok(None)` is
    /// returned. A 401 clears the session through the executor; any other
    /// failure keeps the token for a later retry.
    pub async fn check_auth(&self) -> Result<Option<UserIdentity>, ApiError> {
        if !self.executor.credentials().has_session() {
            tracing::debug!("No stored token, skipping auth check");
            return Ok(None);
        }

        match self
            .executor
            .get_json::<UserIdentity>(CURRENT_USER_PATH)
            .await
        {
            Ok(identity) => {
                self.executor.session().establish(identity.clone());
                *self.last_error.write() = None;
                Ok(Some(identity))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Auth check failed");
                *self.last_error.write() = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Trade the current bearer token for a fresh one.
    ///
    /// A failure leaves the session exactly as it was.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let credentials = self.executor.credentials();
        let current = credentials.read();
        if current.bearer_token.is_none() {
            return Err(ApiError::Validation("not logged in".into()));
        }

        let options = self.executor.defaults().clone().without_auth_interception();
        let result = async {
            let value = self
                .executor
                .execute(Method::POST, REFRESH_PATH, None, &options)
                .await?
                .into_json()?;
            serde_json::from_value::<TokenResponse>(value)
                .map_err(|e| ApiError::Decode(e.to_string()))
        }
        .await;

        match result {
            Ok(tokens) => {
                let mut tokens = TokenSet::from(tokens);
                if tokens.api_key.is_none() {
                    tokens.api_key = current.api_key;
                }
                let secure = self.executor.registry().get_active().is_secure();
                credentials.set(&tokens, secure)?;
                tracing::info!("Session token refreshed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                *self.last_error.write() = Some(e.user_message());
                Err(e)
            }
        }
    }
}
