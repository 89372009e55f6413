//! Application instruments for the marquee server.

use std::sync::Arc;

use marquee_core::error::Result;

use crate::instrument::InstrumentedRoutes;
use crate::obs::registry::{CounterVec, Gauge, HistogramVec, MetricsRegistry, SummaryVec};

/// Label names shared by every per-route instrument.
pub const ROUTE_LABELS: [&str; 2] = ["method", "route"];

/// Whole-request latency buckets, seconds.
pub const REQUEST_DURATION_BUCKETS: [f64; 7] = [0.05, 0.1, 0.5, 1.0, 3.0, 5.0, 10.0];

pub struct AppMetrics {
    registry: MetricsRegistry,
    pub http_requests: Arc<CounterVec>,
    pub logged_in_users: Arc<Gauge>,
    pub request_duration: Arc<HistogramVec>, // seconds
    pub query_duration: Arc<HistogramVec>,   // seconds
    pub response_size: Arc<SummaryVec>,      // bytes
}

impl AppMetrics {
    /// Register the instruments. Label sets come from the declared route table,
    /// so every series that can ever exist is known here.
    pub fn new(routes: &InstrumentedRoutes, query_buckets: &[f64]) -> Result<Self> {
        let mut registry = MetricsRegistry::new();

        let http_requests = registry.counter(
            "http_requests_total",
            "Total number of http requests",
            &ROUTE_LABELS,
            &routes.counted_label_sets(),
        )?;
        let request_duration = registry.histogram(
            "http_request_duration_seconds",
            "Duration of instrumented http requests in seconds",
            &ROUTE_LABELS,
            &routes.counted_label_sets(),
            &REQUEST_DURATION_BUCKETS,
        )?;
        let logged_in_users =
            registry.gauge("logged_in_users", "Number of currently logged-in users")?;
        let query_duration = registry.histogram(
            "db_query_duration_seconds",
            "Histogram of database query durations in seconds",
            &ROUTE_LABELS,
            &routes.query_timed_label_sets(),
            query_buckets,
        )?;
        let response_size = registry.summary(
            "http_response_size_bytes",
            "Summary of http response size in bytes",
            &ROUTE_LABELS,
            &routes.size_tracked_label_sets(),
        )?;

        Ok(Self {
            registry,
            http_requests,
            logged_in_users,
            request_duration,
            query_duration,
            response_size,
        })
    }

    /// Render every registered instrument.
    pub fn render(&self) -> String {
        self.registry.render()
    }
}
