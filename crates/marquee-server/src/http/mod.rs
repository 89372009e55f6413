//! HTTP handlers.
//!
//! Handlers translate between axum extractors and the authenticator/listing
//! calls; instrumentation is applied around them by the route layer.

pub mod cookie;
pub mod error;
pub mod listing;
pub mod ops;
pub mod session;

pub use error::ApiError;
