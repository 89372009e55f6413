//! `POST /login` and `POST /logout`.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::app_state::AppState;
use crate::http::{cookie, ApiError};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(app): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let grant = app.authenticator().login(&form.username, &form.password)?;
    let set_cookie = cookie::issue(&app.cfg().session, &grant.session_id);

    Ok((
        [(header::SET_COOKIE, set_cookie)],
        Json(json!({ "message": "Login successful", "username": grant.username })),
    )
        .into_response())
}

pub async fn logout(State(app): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let session = &app.cfg().session;
    let sid = cookie::session_id(&headers, &session.cookie_name);
    app.authenticator().logout(sid.as_deref())?;

    Ok((
        [(header::SET_COOKIE, cookie::expire(session))],
        Json(json!({ "message": "Logout successful" })),
    )
        .into_response())
}
