//! Liveness HTTP server
//!
//! Lets an external uptime pinger keep the bot's host awake and exposes
//! Prometheus metrics. Runs next to the bot on `PORT` (default 8080).

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::Instant;

use crate::core::metrics;
use crate::relay::RelayService;

/// Body of `GET /`
pub const ALIVE_TEXT: &str = "I'm alive";

struct AppState {
    start_time: Instant,
    service: Arc<RelayService>,
}

/// Builds the router with all liveness endpoints:
/// - `/` - plain-text liveness ping
/// - `/health` - JSON with status, uptime, version and relay load
/// - `/metrics` - Prometheus metrics in text format
pub fn router(service: Arc<RelayService>) -> Router {
    let state = AppState {
        start_time: Instant::now(),
        service,
    };

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(Arc::new(state))
}

/// Start the liveness HTTP server on all interfaces.
pub async fn start_health_server(port: u16, service: Arc<RelayService>) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;

    log::info!("Starting liveness server on http://{}", addr);
    log::info!("  /        - Liveness ping");
    log::info!("  /health  - Health check (JSON)");
    log::info!("  /metrics - Prometheus metrics");

    serve(listener, service).await
}

/// Serves the liveness endpoints on an already bound listener.
pub async fn serve(listener: TcpListener, service: Arc<RelayService>) -> std::io::Result<()> {
    axum::serve(listener, router(service)).await
}

async fn root_handler() -> &'static str {
    ALIVE_TEXT
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed();
    let service = &state.service;
    let cache_stats = service.cache().stats();
    let tracked_users = service.rate_limiter().tracked_users().await;
    let cached_posts = service.cache().entry_count().await;

    let health_status = serde_json::json!({
        "status": "healthy",
        "service": "igrelay",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": uptime.as_secs(),
        "uptime": format_uptime(uptime),
        "relay": {
            "in_flight": service.queue().in_flight(),
            "capacity": service.queue().capacity(),
            "tracked_users": tracked_users,
            "cached_posts": cached_posts,
            "cache_hit_rate": cache_stats.hit_rate(),
        },
    });

    (StatusCode::OK, axum::Json(health_status))
}

async fn metrics_handler() -> Response {
    match metrics::gather_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            log::error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to encode metrics: {}", e)).into_response()
        }
    }
}

/// Uptime as its non-zero units, largest first (`"1d 5s"`, `"0s"` right after start).
fn format_uptime(duration: Duration) -> String {
    let total = duration.as_secs();
    let units = [
        (total / 86_400, "d"),
        (total % 86_400 / 3_600, "h"),
        (total % 3_600 / 60, "m"),
        (total % 60, "s"),
    ];

    let parts: Vec<String> = units
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}
