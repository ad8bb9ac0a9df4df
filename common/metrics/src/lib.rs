use std::collections::HashMap;
use std::sync::Mutex;

use metrics::{Key, KeyName, Label, Level, Metadata, Recorder};
use metrics_exporter_prometheus::{
    BuildError, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};
use thiserror::Error;
use tracing::debug;

#[cfg(any(test, feature = "test-utils"))]
mod exposition;

#[cfg(any(test, feature = "test-utils"))]
pub use exposition::find_sample;

/// Histogram buckets for request latency, in seconds.
pub const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

const REQUEST_LABELS: &[&str] = &["method", "path", "status"];
const DURATION_LABELS: &[&str] = &["method", "path"];

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("invalid metric name: {0}")]
    InvalidName(String),

    #[error("metric {name} is already registered as a {existing:?} with labels {existing_labels:?}")]
    Conflict {
        name: String,
        existing: MetricKind,
        existing_labels: Vec<&'static str>,
    },

    #[error("failed to build prometheus recorder: {0}")]
    Build(#[from] BuildError),

    #[error("metrics registry lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Histogram,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Family {
    kind: MetricKind,
    labels: Vec<&'static str>,
}

/// Request counters and latency histograms for one service.
///
/// Each registry owns its own Prometheus recorder and is never installed as the
/// global recorder, so any number of them can live in one process (tests build
/// one per router). Updates go straight to the recorder's atomic storage and
/// need no locking from callers; the only lock guards metric registration.
pub struct MetricsRegistry {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    families: Mutex<HashMap<String, Family>>,
    requests_total: String,
    duration_seconds: String,
}

impl MetricsRegistry {
    /// Create a registry whose HTTP metrics are named `{prefix}_http_requests_total`
    /// and `{prefix}_http_duration_seconds`.
    pub fn new(prefix: &str) -> Result<Self, MetricsError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets(DURATION_BUCKETS)?
            .build_recorder();
        let handle = recorder.handle();

        let registry = Self {
            recorder,
            handle,
            families: Mutex::new(HashMap::new()),
            requests_total: format!("{prefix}_http_requests_total"),
            duration_seconds: format!("{prefix}_http_duration_seconds"),
        };

        registry.register(
            &registry.requests_total,
            MetricKind::Counter,
            REQUEST_LABELS,
            "Total HTTP requests",
        )?;
        registry.register(
            &registry.duration_seconds,
            MetricKind::Histogram,
            DURATION_LABELS,
            "Request duration",
        )?;

        Ok(registry)
    }

    /// Declare a metric family. Registering the same name again with the same kind and
    /// labels is a no-op; a different kind or label set is an error.
    pub fn register(
        &self,
        name: &str,
        kind: MetricKind,
        labels: &[&'static str],
        help: &'static str,
    ) -> Result<(), MetricsError> {
        if !is_valid_metric_name(name) {
            return Err(MetricsError::InvalidName(name.to_owned()));
        }

        let family = Family {
            kind,
            labels: labels.to_vec(),
        };

        let mut families = self.families.lock().map_err(|_| MetricsError::Poisoned)?;
        match families.get(name) {
            Some(existing) if *existing == family => return Ok(()),
            Some(existing) => {
                return Err(MetricsError::Conflict {
                    name: name.to_owned(),
                    existing: existing.kind,
                    existing_labels: existing.labels.clone(),
                })
            }
            None => {}
        }

        let key_name = KeyName::from(name.to_owned());
        match kind {
            MetricKind::Counter => self.recorder.describe_counter(key_name, None, help.into()),
            MetricKind::Histogram => self.recorder.describe_histogram(key_name, None, help.into()),
        }
        families.insert(name.to_owned(), family);
        debug!(name, ?kind, ?labels, "registered metric family");

        Ok(())
    }

    pub fn increment_request(&self, method: &str, path: &str, status: u16) {
        let key = Key::from_parts(
            self.requests_total.clone(),
            vec![
                Label::new("method", method.to_owned()),
                Label::new("path", path.to_owned()),
                Label::new("status", status.to_string()),
            ],
        );
        self.recorder.register_counter(&key, &metadata()).increment(1);
    }

    pub fn observe_duration(&self, method: &str, path: &str, seconds: f64) {
        let key = Key::from_parts(
            self.duration_seconds.clone(),
            vec![
                Label::new("method", method.to_owned()),
                Label::new("path", path.to_owned()),
            ],
        );
        self.recorder.register_histogram(&key, &metadata()).record(seconds);
    }

    /// Prometheus text exposition of everything recorded so far.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

fn metadata() -> Metadata<'static> {
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()))
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
