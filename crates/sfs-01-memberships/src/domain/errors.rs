//! Membership error types.
//!
//! Local refusals only. Remote failures travel as `BackendError` and are
//! turned into rollbacks by the service, never into errors.

use shared_types::{ItemId, MembershipKind};
use thiserror::Error;

/// Why the store refused to start a toggle or a progress update.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MembershipError {
    /// No authenticated user in the current session.
    #[error("Sign-in required")]
    NotSignedIn,

    /// A write for this (kind, item) is already in flight.
    #[error("Toggle already pending for {kind} {item}")]
    AlreadyPending { kind: MembershipKind, item: ItemId },

    /// Progress can only be tracked for enrolled courses.
    #[error("Not enrolled in course {course}")]
    NotEnrolled { course: ItemId },

    /// A progress write for this course is already in flight.
    #[error("Progress update already pending for course {course}")]
    ProgressPending { course: ItemId },
}
