//! Metrics collection using Prometheus
//!
//! All metrics live in the default registry and are exported by the liveness
//! server at `/metrics`:
//! - Traffic (requests by source, rate-limit refusals)
//! - Cache efficiency (hits/misses)
//! - Upstream health (extraction duration, failures by category)
//! - Relay load (in-flight relays, send failures)

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter, CounterVec, Encoder, Gauge,
    Histogram, TextEncoder,
};

/// Inbound relay requests
/// Labels: source (direct/inline/callback)
pub static REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "igrelay_requests_total",
        "Total number of relay requests by source",
        &["source"]
    )
    .expect("Failed to register igrelay_requests_total")
});

/// Requests refused by the per-user rate limiter
/// Labels: source
pub static RATE_LIMITED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "igrelay_rate_limited_total",
        "Total number of requests refused by the rate limiter",
        &["source"]
    )
    .expect("Failed to register igrelay_rate_limited_total")
});

pub static CACHE_HITS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!("igrelay_cache_hits_total", "Extractions served from the media cache")
        .expect("Failed to register igrelay_cache_hits_total")
});

pub static CACHE_MISSES_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!("igrelay_cache_misses_total", "Extractions that called the upstream API")
        .expect("Failed to register igrelay_cache_misses_total")
});

/// Extraction failures
/// Labels: category (see ExtractError::subcategory)
pub static EXTRACTION_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "igrelay_extraction_failures_total",
        "Total number of failed extractions by category",
        &["category"]
    )
    .expect("Failed to register igrelay_extraction_failures_total")
});

/// Upstream call duration, successful or not
pub static EXTRACTION_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "igrelay_extraction_duration_seconds",
        "Time spent waiting for the extraction API",
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register igrelay_extraction_duration_seconds")
});

/// Relays currently holding a queue slot
pub static RELAYS_IN_FLIGHT: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("igrelay_relays_in_flight", "Relays currently holding a queue slot")
        .expect("Failed to register igrelay_relays_in_flight")
});

/// Failed Telegram sends
/// Labels: operation (photo/video/album/text)
pub static SEND_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "igrelay_send_failures_total",
        "Total number of failed Telegram send operations",
        &["operation"]
    )
    .expect("Failed to register igrelay_send_failures_total")
});

/// Initialize metrics (call this at startup to register all metrics)
pub fn init_metrics() {
    log::info!("Initializing metrics registry...");

    let _ = &*CACHE_HITS_TOTAL;
    let _ = &*CACHE_MISSES_TOTAL;
    let _ = &*EXTRACTION_DURATION_SECONDS;
    let _ = &*RELAYS_IN_FLIGHT;

    // Pre-create label sets so they appear in /metrics with 0 values
    for source in ["direct", "inline", "callback"] {
        REQUESTS_TOTAL.with_label_values(&[source]);
        RATE_LIMITED_TOTAL.with_label_values(&[source]);
    }
    for category in ["empty_result", "timeout", "no_response", "http_status", "malformed"] {
        EXTRACTION_FAILURES_TOTAL.with_label_values(&[category]);
    }
    for operation in ["photo", "video", "album", "text"] {
        SEND_FAILURES_TOTAL.with_label_values(&[operation]);
    }

    log::info!("Metrics registry initialized");
}

pub fn record_request(source: &str) {
    REQUESTS_TOTAL.with_label_values(&[source]).inc();
}

pub fn record_rate_limited(source: &str) {
    RATE_LIMITED_TOTAL.with_label_values(&[source]).inc();
}

pub fn record_extraction_failure(category: &str) {
    EXTRACTION_FAILURES_TOTAL.with_label_values(&[category]).inc();
}

pub fn record_send_failure(operation: &str) {
    SEND_FAILURES_TOTAL.with_label_values(&[operation]).inc();
}

/// Renders the default registry in the Prometheus text format.
pub fn gather_text() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
