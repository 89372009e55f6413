//! Lightweight in-process metrics.
//!
//! Instruments are stored as atomics and rendered in the Prometheus text
//! exposition format by the `/metrics` handler.

pub mod metrics;
pub mod registry;

pub use metrics::{AppMetrics, REQUEST_DURATION_BUCKETS, ROUTE_LABELS};
pub use registry::{CounterVec, Gauge, HistogramVec, LabelSet, MetricsRegistry, SummaryVec};
