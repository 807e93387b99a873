//! HTTP surface of the service.
//!
//! # Endpoints
//!
//! - `GET /health` - liveness check
//! - `GET /` - plain text index
//! - `GET /metrics` (configurable) - rate-limit gauges in Prometheus text format

use std::fmt::Write as _;
use std::future::Future;
use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde_json::json;

use hookwatch::{RateLimitSnapshot, RateLimitTracker};

const INDEX_TEXT: &str = "Webhook Server go to /webhook";

/// State shared by the handlers.
#[derive(Clone)]
pub struct AppState {
    pub rate_limit: RateLimitTracker,
}

/// Build the router. `metrics_path` of `None` disables the metrics route.
pub fn build_router(state: AppState, metrics_path: Option<&str>) -> Router {
    let mut router = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler));

    if let Some(path) = metrics_path {
        if path == "/" || path == "/health" {
            tracing::warn!(path, "metrics endpoint collides with a built-in route, disabled");
        } else {
            router = router.route(path, get(metrics_handler));
        }
    }

    router.with_state(state)
}

/// Serve `router` on `0.0.0.0:{port}` until `shutdown` resolves.
pub async fn serve<F>(port: u16, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "http server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn index_handler() -> &'static str {
    INDEX_TEXT
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "Status": "UP" }))
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_metrics(&state.rate_limit.snapshot(), Utc::now());
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// Render the rate-limit gauges. Unknown values are left out.
pub fn render_metrics(snapshot: &RateLimitSnapshot, now: DateTime<Utc>) -> String {
    let gauges = [
        (
            "ratelimit_used",
            "GitHub API requests used in the current window.",
            snapshot.used,
        ),
        (
            "ratelimit_remaining",
            "GitHub API requests remaining in the current window.",
            snapshot.remaining,
        ),
        (
            "ratelimit_total",
            "GitHub API request limit per window.",
            snapshot.total,
        ),
        (
            "ratelimit_reset",
            "Seconds until the GitHub API rate limit window resets.",
            snapshot.seconds_until_reset(now),
        ),
    ];

    let mut out = String::new();
    for (name, help, value) in gauges {
        let Some(value) = value else { continue };
        let _ = writeln!(out, "# HELP {name} {help}");
        let _ = writeln!(out, "# TYPE {name} gauge");
        let _ = writeln!(out, "{name} {value}");
    }
    out
}
