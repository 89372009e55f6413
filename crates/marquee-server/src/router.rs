//! Axum router wiring.
//!
//! Session and listing routes sit behind the instrumentation route layer;
//! operational routes do not. Every request, including unmatched ones, gets a
//! request span and a completion log line from the trace layer.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::app_state::AppState;
use crate::http::{listing, ops, session};
use crate::instrument::instrument_request;
use crate::instrument::routes::{LISTING_ROUTE, LOGIN_ROUTE, LOGOUT_ROUTE};

pub fn build_router(state: AppState) -> Router {
    let instrumented = Router::new()
        .route(LISTING_ROUTE, get(listing::list_movies))
        .route(LOGIN_ROUTE, post(session::login))
        .route(LOGOUT_ROUTE, post(session::logout))
        .route_layer(middleware::from_fn_with_state(
            state.instrumentor(),
            instrument_request,
        ));

    let operational = Router::new()
        .route("/metrics", get(ops::metrics))
        .route("/healthz", get(ops::healthz));

    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    instrumented
        .merge(operational)
        .layer(trace)
        .with_state(state)
}
