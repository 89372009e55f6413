//! marquee server
//!
//! - `POST /login`, `POST /logout` : cookie-backed sessions
//! - `GET /` : bounded movie listing
//! - `GET /metrics` : Prometheus exposition

use tracing_subscriber::{fmt, EnvFilter};

use marquee_core::error::{MarqueeError, Result};
use marquee_server::{app_state::AppState, config, router};

const DEFAULT_CONFIG_PATH: &str = "marquee.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("MARQUEE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.server.listen_addr()?;

    let state = AppState::new(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "marquee-server starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| MarqueeError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| MarqueeError::Internal(format!("server failed: {e}")))
}
