//! marquee server library entry.
//!
//! Wires config, the metrics registry, the session authenticator, the listing
//! gateway, and request instrumentation into an axum router. Consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod auth;
pub mod config;
pub mod http;
pub mod instrument;
pub mod listing;
pub mod obs;
pub mod router;
