//! Declared per-route instrumentation.
//!
//! Which routes are counted, query-timed and size-tracked is a static table
//! built at startup. The metric label sets are derived from it, which keeps
//! `(method, route)` cardinality closed.

use std::collections::HashSet;

use marquee_core::error::{MarqueeError, Result};

use crate::obs::LabelSet;

pub const LISTING_ROUTE: &str = "/";
pub const LOGIN_ROUTE: &str = "/login";
pub const LOGOUT_ROUTE: &str = "/logout";

/// `GET /`: counted, query-timed and size-tracked.
pub const LISTING: RouteInstrumentation = RouteInstrumentation::counted("GET", LISTING_ROUTE)
    .with_query_timing()
    .with_response_size();
pub const LOGIN: RouteInstrumentation = RouteInstrumentation::counted("POST", LOGIN_ROUTE);
pub const LOGOUT: RouteInstrumentation = RouteInstrumentation::counted("POST", LOGOUT_ROUTE);

/// What gets measured for one `(method, route)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteInstrumentation {
    pub method: &'static str,
    pub route: &'static str,
    pub count_requests: bool,
    pub time_queries: bool,
    pub track_response_size: bool,
}

impl RouteInstrumentation {
    pub const fn counted(method: &'static str, route: &'static str) -> Self {
        Self {
            method,
            route,
            count_requests: true,
            time_queries: false,
            track_response_size: false,
        }
    }

    pub const fn with_query_timing(self) -> Self {
        Self {
            time_queries: true,
            ..self
        }
    }

    pub const fn with_response_size(self) -> Self {
        Self {
            track_response_size: true,
            ..self
        }
    }

    fn label_set(&self) -> LabelSet {
        vec![self.method.to_string(), self.route.to_string()]
    }
}

#[derive(Debug, Clone)]
pub struct InstrumentedRoutes {
    entries: Vec<RouteInstrumentation>,
}

impl InstrumentedRoutes {
    /// Build a table, rejecting duplicate `(method, route)` entries.
    pub fn new(entries: Vec<RouteInstrumentation>) -> Result<Self> {
        let mut seen = HashSet::new();
        for e in &entries {
            if !seen.insert((e.method, e.route)) {
                return Err(MarqueeError::InvalidMetric(format!(
                    "route {} {} declared twice",
                    e.method, e.route
                )));
            }
        }
        Ok(Self { entries })
    }

    /// The server's route table: the listing is fully instrumented, session
    /// routes are counted only.
    pub fn standard() -> Self {
        Self {
            entries: vec![LISTING, LOGIN, LOGOUT],
        }
    }

    pub fn lookup(&self, method: &str, route: &str) -> Option<RouteInstrumentation> {
        self.entries
            .iter()
            .find(|e| e.method == method && e.route == route)
            .copied()
    }

    fn label_sets(&self, pick: impl Fn(&RouteInstrumentation) -> bool) -> Vec<LabelSet> {
        self.entries
            .iter()
            .filter(|e| pick(e))
            .map(RouteInstrumentation::label_set)
            .collect()
    }

    pub fn counted_label_sets(&self) -> Vec<LabelSet> {
        self.label_sets(|e| e.count_requests)
    }

    pub fn query_timed_label_sets(&self) -> Vec<LabelSet> {
        self.label_sets(|e| e.time_queries)
    }

    pub fn size_tracked_label_sets(&self) -> Vec<LabelSet> {
        self.label_sets(|e| e.track_response_size)
    }
}
