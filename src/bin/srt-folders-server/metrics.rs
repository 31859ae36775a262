use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts as PromOpts, Registry,
    TextEncoder,
};

use srt_folders::TranscriptionOutcome;

struct Metrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_in_flight_requests: IntGauge,
    outcomes_total: IntCounterVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

fn build() -> prometheus::Result<Metrics> {
    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        PromOpts::new(
            "srt_folders_http_requests_total",
            "Total HTTP requests served by srt-folders-server.",
        ),
        &["status"],
    )?;
    let http_request_duration_seconds = HistogramVec::new(
        HistogramOpts::new(
            "srt_folders_http_request_duration_seconds",
            "HTTP request latency in seconds.",
        ),
        &["status"],
    )?;
    let http_in_flight_requests = IntGauge::new(
        "srt_folders_http_in_flight_requests",
        "Current number of in-flight HTTP requests.",
    )?;
    let outcomes_total = IntCounterVec::new(
        PromOpts::new(
            "srt_folders_outcomes_total",
            "Per-file subtitle outcomes, by status.",
        ),
        &["status"],
    )?;

    registry.register(Box::new(http_requests_total.clone()))?;
    registry.register(Box::new(http_request_duration_seconds.clone()))?;
    registry.register(Box::new(http_in_flight_requests.clone()))?;
    registry.register(Box::new(outcomes_total.clone()))?;

    Ok(Metrics {
        registry,
        http_requests_total,
        http_request_duration_seconds,
        http_in_flight_requests,
        outcomes_total,
    })
}

/// Build and install the registry. Until this succeeds every recording call is a no-op.
pub fn init() -> prometheus::Result<()> {
    if METRICS.get().is_none() {
        let _ = METRICS.set(build()?);
    }
    Ok(())
}

pub fn record_outcomes(outcomes: &[TranscriptionOutcome]) {
    let Some(m) = METRICS.get() else {
        return;
    };
    for outcome in outcomes {
        m.outcomes_total
            .with_label_values(&[outcome.status().as_str()])
            .inc();
    }
}

pub async fn prometheus_metrics() -> Response {
    let Some(m) = METRICS.get() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "metrics disabled").into_response();
    };

    let mut buf = Vec::new();
    if TextEncoder::new().encode(&m.registry.gather(), &mut buf).is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to encode metrics",
        )
            .into_response();
    }

    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
        )],
        buf,
    )
        .into_response()
}

pub async fn track_http_metrics(req: Request<Body>, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str())
        .unwrap_or_else(|| req.uri().path())
        .to_owned();

    let Some(m) = METRICS.get() else {
        return next.run(req).await;
    };
    if route == "/metrics" || route == "/healthz" {
        return next.run(req).await;
    }

    let start = Instant::now();

    m.http_in_flight_requests.inc();
    let response = next.run(req).await;
    m.http_in_flight_requests.dec();

    let status = response.status().as_u16().to_string();
    m.http_requests_total.with_label_values(&[&status]).inc();
    m.http_request_duration_seconds
        .with_label_values(&[&status])
        .observe(start.elapsed().as_secs_f64());

    response
}
