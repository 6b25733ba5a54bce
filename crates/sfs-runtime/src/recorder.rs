//! Turns bus events into Prometheus samples.

use sfs_telemetry::{
    metric_inc, metric_observe, MEMBERSHIP_LOADS, NOTICES_POSTED, PROGRESS_UPDATES,
    REMOTE_WRITE_DURATION,
    SIGN_IN_REFUSALS, TOGGLES_COMMITTED, TOGGLES_DISPATCHED, TOGGLES_IGNORED, TOGGLES_ROLLED_BACK,
};
use shared_bus::{NoticeKind, StoreEvent};
use shared_types::MembershipKind;
use tracing::trace;

/// Stateless event-to-metric mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn record(&self, event: &StoreEvent) {
        trace!(topic = ?event.topic(), "Recording event");
        match event {
            StoreEvent::ToggleDispatched { kind, .. } => {
                metric_inc!(TOGGLES_DISPATCHED, &[kind.as_str()]);
            }
            StoreEvent::ToggleCommitted {
                kind, latency_ms, ..
            } => {
                metric_inc!(TOGGLES_COMMITTED, &[kind.as_str()]);
                metric_observe!(
                    REMOTE_WRITE_DURATION,
                    &[kind.as_str(), "committed"],
                    millis_to_secs(*latency_ms)
                );
            }
            StoreEvent::ToggleRolledBack {
                kind, latency_ms, ..
            } => {
                metric_inc!(TOGGLES_ROLLED_BACK, &[kind.as_str()]);
                metric_observe!(
                    REMOTE_WRITE_DURATION,
                    &[kind.as_str(), "rolled_back"],
                    millis_to_secs(*latency_ms)
                );
            }
            StoreEvent::ToggleIgnored { kind, .. } => {
                metric_inc!(TOGGLES_IGNORED, &[kind.as_str()]);
            }
            StoreEvent::ProgressCommitted { latency_ms, .. } => {
                metric_inc!(PROGRESS_UPDATES, &["committed"]);
                metric_observe!(
                    REMOTE_WRITE_DURATION,
                    &[MembershipKind::Enrollment.as_str(), "committed"],
                    millis_to_secs(*latency_ms)
                );
            }
            StoreEvent::ProgressRolledBack { latency_ms, .. } => {
                metric_inc!(PROGRESS_UPDATES, &["rolled_back"]);
                metric_observe!(
                    REMOTE_WRITE_DURATION,
                    &[MembershipKind::Enrollment.as_str(), "rolled_back"],
                    millis_to_secs(*latency_ms)
                );
            }
            StoreEvent::MembershipsLoaded { kind, .. } => {
                metric_inc!(MEMBERSHIP_LOADS, &[kind.as_str(), "loaded"]);
            }
            StoreEvent::Notice(notice) => {
                metric_inc!(NOTICES_POSTED, &[notice_label(notice.kind)]);
                if notice.kind == NoticeKind::SignInRequired {
                    metric_inc!(SIGN_IN_REFUSALS);
                }
            }
            StoreEvent::ItemStateChanged { .. }
            | StoreEvent::SessionStarted { .. }
            | StoreEvent::SessionEnded { .. } => {}
        }
    }
}

fn millis_to_secs(millis: u64) -> f64 {
    millis as f64 / 1000.0
}

fn notice_label(kind: NoticeKind) -> &'static str {
    match kind {
        NoticeKind::SignInRequired => "sign_in_required",
        NoticeKind::ToggleFailed => "toggle_failed",
        NoticeKind::LoadFailed => "load_failed",
        NoticeKind::ProgressFailed => "progress_failed",
        NoticeKind::SubmissionFailed => "submission_failed",
    }
}
