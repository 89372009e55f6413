//! `GET /`: bounded movie listing.

use axum::{extract::State, Extension, Json};

use marquee_core::model::Movie;

use crate::app_state::AppState;
use crate::http::ApiError;
use crate::instrument::RequestContext;
use crate::listing::bound_listing;

/// Methods outside the route table (axum also routes `HEAD` here) arrive
/// without a [`RequestContext`] and run the query untimed.
pub async fn list_movies(
    State(app): State<AppState>,
    ctx: Option<Extension<RequestContext>>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let gateway = app.listing();
    let rows = match ctx {
        Some(Extension(ctx)) => {
            app.instrumentor()
                .time_query(&ctx, gateway.fetch_listing())
                .await?
        }
        None => gateway.fetch_listing().await?,
    };
    Ok(Json(bound_listing(rows)))
}
