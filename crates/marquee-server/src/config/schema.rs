use std::collections::HashSet;
use std::net::SocketAddr;

use serde::Deserialize;

use marquee_core::error::{MarqueeError, Result};
use marquee_core::model::{Movie, User};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub session: SessionSection,

    #[serde(default = "default_users")]
    pub users: Vec<User>,

    #[serde(default)]
    pub catalog: Vec<Movie>,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MarqueeError::Config(format!(
                "unsupported version {} (expected 1)",
                self.version
            )));
        }
        if self.users.is_empty() {
            return Err(MarqueeError::Config("users must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for u in &self.users {
            if u.username.is_empty() {
                return Err(MarqueeError::Config("users[].username must not be empty".into()));
            }
            if !seen.insert(u.username.as_str()) {
                return Err(MarqueeError::Config(format!(
                    "duplicate user: {}",
                    u.username
                )));
            }
        }

        self.server.validate()?;
        self.session.validate()?;
        self.metrics.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            MarqueeError::Config(format!("server.listen must be a valid SocketAddr: {e}"))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSection {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secure_cookie: false,
        }
    }
}

impl SessionSection {
    pub fn validate(&self) -> Result<()> {
        let ok = !self.cookie_name.is_empty()
            && self
                .cookie_name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"-_.".contains(&b));
        if !ok {
            return Err(MarqueeError::Config(
                "session.cookie_name must be non-empty and use [A-Za-z0-9-_.]".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default = "default_query_duration_buckets")]
    pub query_duration_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            query_duration_buckets: default_query_duration_buckets(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        let b = &self.query_duration_buckets;
        if b.is_empty() {
            return Err(MarqueeError::Config(
                "metrics.query_duration_buckets must not be empty".into(),
            ));
        }
        if b.iter().any(|v| !v.is_finite()) || b.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MarqueeError::Config(
                "metrics.query_duration_buckets must be finite and strictly increasing".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_cookie_name() -> String {
    "sessionId".into()
}
fn default_query_duration_buckets() -> Vec<f64> {
    vec![0.005, 0.01, 0.025, 0.05, 0.075, 0.1]
}
fn default_users() -> Vec<User> {
    vec![
        User { username: "user1".into(), password: "password1".into() },
        User { username: "user2".into(), password: "password2".into() },
    ]
}
