//! Request instrumentation.
//!
//! The middleware counts each instrumented request on entry, exposes a
//! [`RequestContext`] to handlers so they can time their data query, and
//! measures the serialized response body on size-tracked routes after the
//! handler has returned. The whole-request duration is observed last.
//! Handlers never touch instruments directly.

pub mod routes;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use marquee_core::error::Result;

use crate::obs::AppMetrics;

pub use routes::{InstrumentedRoutes, RouteInstrumentation};

/// Per-request facts captured on entry. Dropped with the request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: String,
    route: String,
    started: Instant,
    instrumentation: RouteInstrumentation,
}

impl RequestContext {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    fn labels(&self) -> [&str; 2] {
        [self.method.as_str(), self.route.as_str()]
    }
}

#[derive(Clone)]
pub struct Instrumentor {
    metrics: Arc<AppMetrics>,
    routes: Arc<InstrumentedRoutes>,
}

impl Instrumentor {
    pub fn new(metrics: Arc<AppMetrics>, routes: Arc<InstrumentedRoutes>) -> Self {
        Self { metrics, routes }
    }

    /// Open a request context for `(method, route)` and count the request.
    /// Returns `None` for routes absent from the table.
    pub fn begin(&self, method: &str, route: &str) -> Option<RequestContext> {
        let instrumentation = self.routes.lookup(method, route)?;
        let ctx = RequestContext {
            method: method.to_string(),
            route: route.to_string(),
            started: Instant::now(),
            instrumentation,
        };
        if instrumentation.count_requests {
            self.metrics.http_requests.inc(&ctx.labels());
        }
        Some(ctx)
    }

    /// Await a data query and observe its duration in seconds.
    ///
    /// Only the query itself is inside the timing window. Failed attempts are
    /// never observed; the error is handed back untouched.
    pub async fn time_query<T, F>(&self, ctx: &RequestContext, query: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let out = query.await;
        let elapsed = started.elapsed().as_secs_f64();

        match &out {
            Ok(_) if ctx.instrumentation.time_queries => {
                self.metrics.query_duration.observe(&ctx.labels(), elapsed);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(method = %ctx.method, route = %ctx.route, error = %e, elapsed, "data query failed");
            }
        }
        out
    }

    /// Record the size of an outgoing payload. No-op off size-tracked routes
    /// and for empty payloads.
    pub fn record_response_size(&self, ctx: &RequestContext, bytes: usize) {
        if !ctx.instrumentation.track_response_size || bytes == 0 {
            return;
        }
        self.metrics.response_size.observe(&ctx.labels(), bytes as f64);
    }

    /// Close the request: observe the time since `begin` in seconds.
    pub fn finish(&self, ctx: &RequestContext) {
        if !ctx.instrumentation.count_requests {
            return;
        }
        let elapsed = ctx.started.elapsed().as_secs_f64();
        self.metrics.request_duration.observe(&ctx.labels(), elapsed);
    }
}

/// Route-layer middleware; must be installed with `Router::route_layer` so the
/// matched route template is available.
pub async fn instrument_request(
    State(instrumentor): State<Instrumentor>,
    mut request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string());
    let method = request.method().as_str().to_string();

    let Some(ctx) = route.and_then(|route| instrumentor.begin(&method, &route)) else {
        return next.run(request).await;
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if ctx.instrumentation.track_response_size {
        response = measure_response_size(&instrumentor, &ctx, response).await;
    }

    instrumentor.finish(&ctx);
    response
}

/// Buffer the outgoing body, record its length, and hand it back unchanged.
async fn measure_response_size(
    instrumentor: &Instrumentor,
    ctx: &RequestContext,
    response: Response,
) -> Response {
    let (parts, body) = response.into_parts();
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            instrumentor.record_response_size(ctx, bytes.len());
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            tracing::error!(method = %ctx.method, route = %ctx.route, error = %e, "response body read failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
