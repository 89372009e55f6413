//! Session cookie helpers. The cookie carries only the opaque session id.

use axum::http::{header, HeaderMap};

use crate::config::SessionSection;

/// Extract the session id from the request's `Cookie` headers.
pub fn session_id(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == cookie_name)
        .map(|(_, v)| v.trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}

/// `Set-Cookie` value binding `session_id`.
pub fn issue(cfg: &SessionSection, session_id: &str) -> String {
    let mut c = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", cfg.cookie_name, session_id);
    if cfg.secure_cookie {
        c.push_str("; Secure");
    }
    c
}

/// `Set-Cookie` value that expires the session cookie.
pub fn expire(cfg: &SessionSection) -> String {
    let mut c = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", cfg.cookie_name);
    if cfg.secure_cookie {
        c.push_str("; Secure");
    }
    c
}
