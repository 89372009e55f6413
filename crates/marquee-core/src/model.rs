//! Domain records shared by the authenticator, the listing gateway and the
//! HTTP layer.

use serde::{Deserialize, Serialize};

/// Maximum number of rows the listing endpoint hands back.
pub const LISTING_LIMIT: usize = 8;

/// Static user registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub username: String,
    pub password: String,
}

/// One row of the listing query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Movie {
    pub title: String,
    pub release_date: String,
    pub tagline: String,
}

/// The user bound to a session. Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
}

/// Server-held session data, referenced by an opaque cookie id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub user: Option<SessionUser>,
}

impl SessionData {
    /// Session bound to `username`.
    pub fn authenticated(username: impl Into<String>) -> Self {
        Self {
            user: Some(SessionUser {
                username: username.into(),
            }),
        }
    }
}
