//! Prometheus metrics for the client core.
//!
//! All metrics follow the naming convention: `sfs_<area>_<metric>_<unit>`
//!
//! Labels are membership kinds (`favorite_material`, `upvote_material`,
//! `favorite_course`, `enrollment`) so each toggle surface can be watched
//! on its own.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Registry for all client metrics
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // TOGGLE METRICS
    // =========================================================================

    /// Optimistic toggles applied locally with a remote write started
    pub static ref TOGGLES_DISPATCHED: CounterVec = CounterVec::new(
        Opts::new("sfs_toggles_dispatched_total", "Optimistic toggles dispatched"),
        &["kind"]
    ).expect("metric creation failed");

    /// Toggles confirmed by the backend
    pub static ref TOGGLES_COMMITTED: CounterVec = CounterVec::new(
        Opts::new("sfs_toggles_committed_total", "Toggles confirmed remotely"),
        &["kind"]
    ).expect("metric creation failed");

    /// Toggles undone after a failed or timed out write
    pub static ref TOGGLES_ROLLED_BACK: CounterVec = CounterVec::new(
        Opts::new("sfs_toggles_rolled_back_total", "Toggles rolled back after a failed write"),
        &["kind"]
    ).expect("metric creation failed");

    /// Toggles dropped because one was already in flight
    pub static ref TOGGLES_IGNORED: CounterVec = CounterVec::new(
        Opts::new("sfs_toggles_ignored_total", "Toggles ignored while a write was pending"),
        &["kind"]
    ).expect("metric creation failed");

    /// Toggles refused because nobody was signed in
    pub static ref SIGN_IN_REFUSALS: Counter = Counter::new(
        "sfs_toggles_sign_in_refusals_total",
        "Toggles refused for lack of a session"
    ).expect("metric creation failed");

    /// Remote write latency
    pub static ref REMOTE_WRITE_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "sfs_remote_write_duration_seconds",
            "Time from dispatch to remote confirmation or failure"
        ).buckets(exponential_buckets(0.005, 2.0, 12).expect("valid buckets")),
        &["kind", "outcome"]  // outcome: committed/rolled_back
    ).expect("metric creation failed");

    /// Course progress writes by outcome
    pub static ref PROGRESS_UPDATES: CounterVec = CounterVec::new(
        Opts::new("sfs_progress_updates_total", "Course progress writes"),
        &["outcome"]  // outcome: committed/rolled_back
    ).expect("metric creation failed");

    // =========================================================================
    // LOAD METRICS
    // =========================================================================

    /// Bulk membership loads by outcome
    pub static ref MEMBERSHIP_LOADS: CounterVec = CounterVec::new(
        Opts::new("sfs_membership_loads_total", "Bulk membership loads"),
        &["kind", "outcome"]  // outcome: loaded/failed
    ).expect("metric creation failed");

    // =========================================================================
    // NOTICE METRICS
    // =========================================================================

    /// Notices shown to the user
    pub static ref NOTICES_POSTED: CounterVec = CounterVec::new(
        Opts::new("sfs_notices_posted_total", "Notices posted to the user"),
        &["kind"]
    ).expect("metric creation failed");
}

/// Register all metrics with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(TOGGLES_DISPATCHED.clone()),
        Box::new(TOGGLES_COMMITTED.clone()),
        Box::new(TOGGLES_ROLLED_BACK.clone()),
        Box::new(TOGGLES_IGNORED.clone()),
        Box::new(SIGN_IN_REFUSALS.clone()),
        Box::new(REMOTE_WRITE_DURATION.clone()),
        Box::new(PROGRESS_UPDATES.clone()),
        Box::new(MEMBERSHIP_LOADS.clone()),
        Box::new(NOTICES_POSTED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
