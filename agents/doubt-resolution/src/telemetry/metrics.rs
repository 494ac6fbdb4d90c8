//! Prometheus metrics for the resolution pipeline
//!
//! - `doubt_resolution_requests_total` (counter) - Resolutions by path
//! - `doubt_resolution_duration_seconds` (histogram) - Resolution latency by path
//! - `doubt_resolution_flag_read_failures_total` (counter) - Failed exam-mode reads
//! - `doubt_resolution_match_score` (histogram) - Best fuzzy score per question

use prometheus::{
    Counter, CounterVec, Encoder, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};

use super::{Result, TelemetryError};
use crate::contracts::ResolutionPath;

/// Pipeline metrics, owning their registry
#[derive(Clone)]
pub struct DoubtMetrics {
    registry: Registry,
    requests_total: CounterVec,
    duration_seconds: HistogramVec,
    flag_read_failures_total: Counter,
    match_score: Histogram,
}

impl DoubtMetrics {
    pub fn new() -> Result<Self> {
        Self::with_registry(Registry::new())
    }

    /// Register all metrics with `registry`
    pub fn with_registry(registry: Registry) -> Result<Self> {
        let requests_total = CounterVec::new(
            Opts::new("requests_total", "Total number of doubt resolutions")
                .namespace("doubt_resolution"),
            &["path"],
        )?;

        let duration_seconds = HistogramVec::new(
            HistogramOpts::new("duration_seconds", "Doubt resolution duration in seconds")
                .namespace("doubt_resolution")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["path"],
        )?;

        let flag_read_failures_total = Counter::with_opts(
            Opts::new(
                "flag_read_failures_total",
                "Exam-mode reads that failed and defaulted to off",
            )
            .namespace("doubt_resolution"),
        )?;

        let match_score = Histogram::with_opts(
            HistogramOpts::new("match_score", "Best token-set score against the canned catalog")
                .namespace("doubt_resolution")
                .buckets(vec![20.0, 40.0, 60.0, 70.0, 80.0, 90.0, 100.0]),
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;
        registry.register(Box::new(flag_read_failures_total.clone()))?;
        registry.register(Box::new(match_score.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            duration_seconds,
            flag_read_failures_total,
            match_score,
        })
    }

    /// Record a completed resolution
    pub fn record_resolution(&self, path: ResolutionPath, duration_secs: f64) {
        self.requests_total.with_label_values(&[path.as_str()]).inc();
        self.duration_seconds
            .with_label_values(&[path.as_str()])
            .observe(duration_secs);
    }

    pub fn record_flag_read_failure(&self) {
        self.flag_read_failures_total.inc();
    }

    pub fn observe_match_score(&self, score: u8) {
        self.match_score.observe(f64::from(score));
    }

    /// Number of resolutions recorded for `path`
    pub fn requests_for(&self, path: ResolutionPath) -> u64 {
        self.requests_total.with_label_values(&[path.as_str()]).get() as u64
    }

    pub fn flag_read_failures(&self) -> u64 {
        self.flag_read_failures_total.get() as u64
    }

    /// Render the registry in the Prometheus text format
    pub fn gather_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::EncodingError(e.to_string()))
    }
}
