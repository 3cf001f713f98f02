//! Request metrics
//!
//! Prometheus text on `/metrics`, the same counters as JSON on
//! `/metrics.json`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, info_span, Instrument};

pub struct Metrics {
    pub http_requests_total: AtomicU64,
    /// By status class
    pub http_requests_2xx: AtomicU64,
    pub http_requests_4xx: AtomicU64,
    pub http_requests_5xx: AtomicU64,
    /// Commands the workflow refused (409/422)
    pub commands_rejected: AtomicU64,
    /// Journal entries written since start
    pub journals_recorded: AtomicU64,
    pub http_request_duration_ms_total: AtomicU64,
    pub active_requests: AtomicU64,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            http_requests_total: AtomicU64::new(0),
            http_requests_2xx: AtomicU64::new(0),
            http_requests_4xx: AtomicU64::new(0),
            http_requests_5xx: AtomicU64::new(0),
            commands_rejected: AtomicU64::new(0),
            journals_recorded: AtomicU64::new(0),
            http_request_duration_ms_total: AtomicU64::new(0),
            active_requests: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_request(&self, status: StatusCode, duration_ms: u64) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);
        self.http_request_duration_ms_total
            .fetch_add(duration_ms, Ordering::Relaxed);

        let code = status.as_u16();
        if (200..300).contains(&code) {
            self.http_requests_2xx.fetch_add(1, Ordering::Relaxed);
        } else if (400..500).contains(&code) {
            self.http_requests_4xx.fetch_add(1, Ordering::Relaxed);
        } else if code >= 500 {
            self.http_requests_5xx.fetch_add(1, Ordering::Relaxed);
        }

        if matches!(status, StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY) {
            self.commands_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_journal(&self) {
        self.journals_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();
        let mut counter = |name: &str, kind: &str, help: &str, samples: &[(&str, u64)]| {
            output.push_str(&format!("# HELP {name} {help}\n# TYPE {name} {kind}\n"));
            for (labels, value) in samples {
                output.push_str(&format!("{name}{labels} {value}\n"));
            }
        };

        counter(
            "http_requests_total",
            "counter",
            "Total number of HTTP requests",
            &[("", self.http_requests_total.load(Ordering::Relaxed))],
        );
        counter(
            "http_requests_by_status",
            "counter",
            "HTTP requests by status code range",
            &[
                ("{status=\"2xx\"}", self.http_requests_2xx.load(Ordering::Relaxed)),
                ("{status=\"4xx\"}", self.http_requests_4xx.load(Ordering::Relaxed)),
                ("{status=\"5xx\"}", self.http_requests_5xx.load(Ordering::Relaxed)),
            ],
        );
        counter(
            "salesflow_commands_rejected_total",
            "counter",
            "Workflow commands refused with 409 or 422",
            &[("", self.commands_rejected.load(Ordering::Relaxed))],
        );
        counter(
            "salesflow_journals_recorded_total",
            "counter",
            "Journal entries written",
            &[("", self.journals_recorded.load(Ordering::Relaxed))],
        );
        counter(
            "http_request_duration_ms_total",
            "counter",
            "Total HTTP request duration in milliseconds",
            &[("", self.http_request_duration_ms_total.load(Ordering::Relaxed))],
        );
        counter(
            "active_requests",
            "gauge",
            "Requests currently being served",
            &[("", self.active_requests.load(Ordering::Relaxed))],
        );
        counter(
            "uptime_seconds",
            "gauge",
            "Server uptime in seconds",
            &[("", self.uptime_seconds())],
        );

        output
    }

    pub fn export_json(&self) -> serde_json::Value {
        serde_json::json!({
            "http": {
                "requests_total": self.http_requests_total.load(Ordering::Relaxed),
                "requests_2xx": self.http_requests_2xx.load(Ordering::Relaxed),
                "requests_4xx": self.http_requests_4xx.load(Ordering::Relaxed),
                "requests_5xx": self.http_requests_5xx.load(Ordering::Relaxed),
                "request_duration_ms_total": self.http_request_duration_ms_total.load(Ordering::Relaxed),
                "active_requests": self.active_requests.load(Ordering::Relaxed),
            },
            "workflow": {
                "commands_rejected": self.commands_rejected.load(Ordering::Relaxed),
                "journals_recorded": self.journals_recorded.load(Ordering::Relaxed),
            },
            "uptime_seconds": self.uptime_seconds(),
        })
    }
}

/// Metrics middleware
pub async fn metrics_middleware(
    State(metrics): State<Arc<Metrics>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    metrics.active_requests.fetch_add(1, Ordering::Relaxed);

    let response = next
        .run(request)
        .instrument(info_span!("http_request", %method, %uri))
        .await;

    let duration = start.elapsed();
    let status = response.status();

    debug!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    metrics.record_request(status, duration.as_millis() as u64);
    metrics.active_requests.fetch_sub(1, Ordering::Relaxed);

    response
}

/// GET /metrics
pub async fn prometheus_metrics(State(metrics): State<Arc<Metrics>>) -> String {
    metrics.export_prometheus()
}

/// GET /metrics.json
pub async fn json_metrics(State(metrics): State<Arc<Metrics>>) -> axum::Json<serde_json::Value> {
    axum::Json(metrics.export_json())
}
