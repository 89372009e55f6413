//! Shared application state for the marquee server.
//!
//! One explicitly constructed metrics registry is owned here and handed to the
//! authenticator and instrumentor by `Arc`; nothing lives in a global.

use std::sync::Arc;

use marquee_core::error::Result;

use crate::auth::{
    CredentialLookup, MemorySessionStore, SessionAuthenticator, SessionStore, StaticCredentials,
};
use crate::config::AppConfig;
use crate::instrument::{InstrumentedRoutes, Instrumentor};
use crate::listing::{ListingGateway, StaticCatalog};
use crate::obs::AppMetrics;

/// External capabilities the server is wired with.
pub struct Collaborators {
    pub credentials: Arc<dyn CredentialLookup>,
    pub sessions: Arc<dyn SessionStore>,
    pub listing: Arc<dyn ListingGateway>,
}

impl Collaborators {
    /// In-memory defaults built from config.
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            credentials: Arc::new(StaticCredentials::new(cfg.users.iter().cloned())),
            sessions: Arc::new(MemorySessionStore::new()),
            listing: Arc::new(StaticCatalog::new(cfg.catalog.clone())),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: AppConfig,
    metrics: Arc<AppMetrics>,
    authenticator: SessionAuthenticator,
    listing: Arc<dyn ListingGateway>,
    instrumentor: Instrumentor,
}

impl AppState {
    /// Build application state with the in-memory collaborators.
    pub fn new(cfg: AppConfig) -> Result<Self> {
        let parts = Collaborators::from_config(&cfg);
        Self::with_collaborators(cfg, parts)
    }

    pub fn with_collaborators(cfg: AppConfig, parts: Collaborators) -> Result<Self> {
        let routes = Arc::new(InstrumentedRoutes::standard());
        let metrics = Arc::new(AppMetrics::new(&routes, &cfg.metrics.query_duration_buckets)?);

        let authenticator = SessionAuthenticator::new(
            parts.credentials,
            parts.sessions,
            Arc::clone(&metrics.logged_in_users),
        );
        let instrumentor = Instrumentor::new(Arc::clone(&metrics), routes);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                metrics,
                authenticator,
                listing: parts.listing,
                instrumentor,
            }),
        })
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> Arc<AppMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub fn authenticator(&self) -> &SessionAuthenticator {
        &self.inner.authenticator
    }

    pub fn listing(&self) -> Arc<dyn ListingGateway> {
        Arc::clone(&self.inner.listing)
    }

    pub fn instrumentor(&self) -> Instrumentor {
        self.inner.instrumentor.clone()
    }
}
