use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

const REQUEST_DURATION: &str = "http_request_duration_seconds";
const ACTIVE_REQUESTS: &str = "http_requests_active";

/// Latency buckets in seconds, tuned for a database-backed JSON API.
const LATENCY_BUCKETS: &[f64] = &[
    0.002, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// `OBSERVABILITY_ENABLED` unless set to `false` or `0`. Read once.
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0"))
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and its upkeep task.
/// Returns `Ok(None)` when observability is disabled.
pub fn init_metrics() -> Result<Option<PrometheusHandle>, BuildError> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), LATENCY_BUCKETS)?
        .install_recorder()?;

    let upkeep = handle.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(5));
        loop {
            ticker.tick().await;
            upkeep.run_upkeep();
        }
    });

    Ok(Some(handle))
}

/// Counts a request as in flight until dropped, so cancelled requests are
/// released as well.
struct InFlight;

impl InFlight {
    fn enter() -> Self {
        gauge!(ACTIVE_REQUESTS).increment(1.0);
        Self
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        gauge!(ACTIVE_REQUESTS).decrement(1.0);
    }
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let method = req.method().as_str().to_owned();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    let _in_flight = InFlight::enter();
    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed().as_secs_f64();

    let status = response.status().as_u16();
    histogram!(REQUEST_DURATION, "method" => method.clone(), "path" => route.clone())
        .record(elapsed);
    counter!(
        "http_requests_total",
        "method" => method,
        "path" => route,
        "status" => status.to_string(),
        "class" => status_class(status),
    )
    .increment(1);

    response
}

fn status_class(status: u16) -> &'static str {
    match status / 100 {
        2 => "2xx",
        3 => "3xx",
        4 => "4xx",
        5 => "5xx",
        _ => "other",
    }
}

/// Router exposing `/metrics` in the Prometheus text format.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

// Business metrics

pub fn track_user_created(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_created_total", "role" => role.to_string()).increment(1);
}

pub fn track_application_submitted(reserved_slot: bool) {
    if !is_observability_enabled() {
        return;
    }
    let screening = if reserved_slot { "reserved" } else { "chosen" };
    counter!("applications_submitted_total", "screening" => screening).increment(1);
}

pub fn track_admission_decision(status: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("admission_decisions_total", "status" => status.to_string()).increment(1);
}

pub fn track_screening_reservation(success: bool) {
    if !is_observability_enabled() {
        return;
    }
    let outcome = if success { "reserved" } else { "exhausted" };
    counter!("screening_reservations_total", "outcome" => outcome).increment(1);
}

pub fn track_document_upload(kind: &str, success: bool) {
    if !is_observability_enabled() {
        return;
    }
    let status = if success { "success" } else { "failure" };
    counter!("application_documents_total", "kind" => kind.to_string(), "status" => status)
        .increment(1);
}

pub fn track_result_recorded(grade: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("results_recorded_total", "grade" => grade.to_string()).increment(1);
}

pub fn track_students_promoted(count: u64) {
    if !is_observability_enabled() {
        return;
    }
    counter!("students_promoted_total").increment(count);
}

pub fn track_schedule_conflict(kind: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("schedule_conflicts_total", "kind" => kind.to_string()).increment(1);
}
