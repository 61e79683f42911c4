use super::UserIdentity;
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use tokio::sync::watch;

/// Session lifecycle: `LoggedOut -> LoggingIn -> LoggedIn -> LoggedOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    LoggedOut,
    LoggingIn,
    LoggedIn,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::LoggedOut => "logged_out",
            SessionState::LoggingIn => "logging_in",
            SessionState::LoggedIn => "logged_in",
        };
        f.write_str(s)
    }
}

/// Shared session state, observable through a watch channel.
///
/// The executor holds one to announce 401-driven logouts; the
/// [`SessionController`](super::SessionController) drives the rest.
pub struct SessionSignal {
    state: watch::Sender<SessionState>,
    identity: RwLock<Option<UserIdentity>>,
}

impl Default for SessionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSignal {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::LoggedOut);
        Self {
            state,
            identity: RwLock::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn identity(&self) -> Option<UserIdentity> {
        self.identity.read().clone()
    }

    pub(crate) fn begin_login(&self) {
        self.transition(SessionState::LoggingIn);
    }

    /// Attach the identity, then announce `LoggedIn`.
    pub(crate) fn establish(&self, identity: UserIdentity) {
        *self.identity.write() = Some(identity);
        self.transition(SessionState::LoggedIn);
    }

    /// Drop the identity, then announce `LoggedOut`.
    pub fn expire(&self) {
        *self.identity.write() = None;
        self.transition(SessionState::LoggedOut);
    }

    fn transition(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::info!(from = %previous, to = %next, "Session state changed");
        }
    }
}
