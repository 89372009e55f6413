use std::sync::Arc;

use uuid::Uuid;

use marquee_core::error::{MarqueeError, Result};
use marquee_core::model::{SessionData, SessionUser};

use super::{CredentialLookup, SessionStore};
use crate::obs::Gauge;

/// Outcome of a successful login.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    /// Fresh session id to hand back in the session cookie.
    pub session_id: String,
    pub username: String,
}

/// Anonymous -> Authenticated via `login`, back via `logout`.
///
/// The logged-in gauge tracks bound sessions: every login binds a brand new
/// session id and increments once, and a logout decrements only when its
/// `delete` actually removed a bound session. Racing logouts on one id
/// therefore decrement at most once.
pub struct SessionAuthenticator {
    credentials: Arc<dyn CredentialLookup>,
    sessions: Arc<dyn SessionStore>,
    logged_in: Arc<Gauge>,
}

impl SessionAuthenticator {
    pub fn new(
        credentials: Arc<dyn CredentialLookup>,
        sessions: Arc<dyn SessionStore>,
        logged_in: Arc<Gauge>,
    ) -> Self {
        Self {
            credentials,
            sessions,
            logged_in,
        }
    }

    /// Bind a new session for `username`. Any session the caller already
    /// holds is left untouched.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginGrant> {
        let user = self
            .credentials
            .lookup(username)
            .filter(|u| u.password == password)
            .ok_or_else(|| {
                tracing::info!(%username, "login rejected");
                MarqueeError::InvalidCredentials
            })?;

        let session_id = Uuid::new_v4().to_string();
        // The id is not yet known to any client, so no logout can observe the
        // session before the gauge counts it.
        self.logged_in.inc();
        self.sessions
            .put(&session_id, SessionData::authenticated(&user.username));

        tracing::info!(username = %user.username, "login successful");
        Ok(LoginGrant {
            session_id,
            username: user.username,
        })
    }

    pub fn logout(&self, session_id: Option<&str>) -> Result<()> {
        let id = session_id.ok_or(MarqueeError::NotLoggedIn)?;
        let removed = self.sessions.delete(id).and_then(|s| s.user);
        let Some(user) = removed else {
            return Err(MarqueeError::NotLoggedIn);
        };

        if !self.logged_in.dec() {
            tracing::error!(username = %user.username, "logged-in gauge already at zero on logout");
        }
        tracing::info!(username = %user.username, "logout successful");
        Ok(())
    }

    /// User bound to `session_id`, if any.
    pub fn current_user(&self, session_id: &str) -> Option<SessionUser> {
        self.sessions.get(session_id).and_then(|s| s.user)
    }

    pub fn logged_in_users(&self) -> i64 {
        self.logged_in.get()
    }
}
