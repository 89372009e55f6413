//! Shared error type across marquee crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Credentials rejected.
    AuthFailed,
    /// Caller holds no authenticated session.
    NotLoggedIn,
    /// Internal server error (includes listing query failures).
    Internal,
}

impl ClientCode {
    /// String representation used in logs and diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::NotLoggedIn => "NOT_LOGGED_IN",
            ClientCode::Internal => "INTERNAL",
        }
    }

    /// Equivalent HTTP status code.
    pub fn http_status(self) -> u16 {
        match self {
            ClientCode::AuthFailed | ClientCode::NotLoggedIn => 401,
            ClientCode::Internal => 500,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MarqueeError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum MarqueeError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("listing query failed: {0}")]
    DataQuery(String),
    /// Startup-only: rejected config file. Never produced while serving.
    #[error("invalid config: {0}")]
    Config(String),
    #[error("invalid metric: {0}")]
    InvalidMetric(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MarqueeError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            MarqueeError::InvalidCredentials => ClientCode::AuthFailed,
            MarqueeError::NotLoggedIn => ClientCode::NotLoggedIn,
            MarqueeError::DataQuery(_)
            | MarqueeError::Config(_)
            | MarqueeError::InvalidMetric(_)
            | MarqueeError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Message safe to hand to an HTTP client.
    ///
    /// Server-side failures never leak their detail; it stays in the logs.
    pub fn public_message(&self) -> String {
        match self.client_code() {
            ClientCode::Internal => "Internal Server Error".to_string(),
            _ => self.to_string(),
        }
    }
}
