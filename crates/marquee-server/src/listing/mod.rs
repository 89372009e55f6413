//! Listing gateway seam.
//!
//! Query execution lives behind [`ListingGateway`]; the server only consumes
//! the rows and bounds how many reach the client.

use async_trait::async_trait;

use marquee_core::error::Result;
use marquee_core::model::{Movie, LISTING_LIMIT};

/// Executes the listing query. Failures surface as `MarqueeError::DataQuery`.
///
/// No timeout is applied by callers: a gateway that never resolves hangs the
/// request that awaits it.
#[async_trait]
pub trait ListingGateway: Send + Sync {
    async fn fetch_listing(&self) -> Result<Vec<Movie>>;
}

/// In-memory catalog served from config.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    rows: Vec<Movie>,
}

impl StaticCatalog {
    pub fn new(rows: Vec<Movie>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl ListingGateway for StaticCatalog {
    async fn fetch_listing(&self) -> Result<Vec<Movie>> {
        Ok(self.rows.clone())
    }
}

/// Keep at most [`LISTING_LIMIT`] rows, preserving gateway order.
pub fn bound_listing(mut rows: Vec<Movie>) -> Vec<Movie> {
    rows.truncate(LISTING_LIMIT);
    rows
}
