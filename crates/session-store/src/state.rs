//! Connection lifecycle of the bridge session.

use std::fmt;

use serde::Serialize;

/// Where the bridge connection is in its login lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No session loaded yet.
    Unauthenticated,
    /// A QR was issued or stored credentials are being tried.
    Authenticating,
    /// Credentials accepted and persisted.
    Authenticated,
    /// Connected and receiving messages.
    Ready,
    /// Transport dropped; credentials are still valid.
    Disconnected,
    /// Device logged out and session removed. Needs an explicit restart.
    LoggedOut,
}

impl AuthState {
    /// Whether moving from `self` to `next` is allowed.
    ///
    /// Leaving `LoggedOut` only happens through [`crate::RemoteAuth::restart`].
    pub fn can_transition_to(self, next: AuthState) -> bool {
        use AuthState::*;

        match (self, next) {
            (Unauthenticated, Authenticating) => true,
            (Authenticating, Authenticating | Authenticated | Disconnected) => true,
            (Authenticated, Ready | Disconnected) => true,
            (Ready, Disconnected) => true,
            (Disconnected, Authenticating) => true,
            (LoggedOut, _) => false,
            (_, LoggedOut) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::Authenticating => "authenticating",
            AuthState::Authenticated => "authenticated",
            AuthState::Ready => "ready",
            AuthState::Disconnected => "disconnected",
            AuthState::LoggedOut => "logged_out",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
