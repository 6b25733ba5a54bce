//! # Inbound Port - MembershipApi
//!
//! Driving port used by the view layer and the CLI.
//!
//! | Method | Effect |
//! |--------|--------|
//! | `sign_in` | Install a session, reload memberships if the user changed |
//! | `sign_out` | Discard all membership state |
//! | `load_memberships` | Bulk load every kind for the current user |
//! | `toggle` | Optimistic flip with remote write and rollback |
//! | `set_course_progress` | Optimistic progress write on an enrollment |

use crate::domain::{ItemSnapshot, LoadStatus, UserProfile};
use crate::service::{LoadReport, ProgressOutcome, ToggleOutcome};
use async_trait::async_trait;
use shared_types::{ItemId, MembershipKind, Session};

/// Primary API of the membership subsystem.
#[async_trait]
pub trait MembershipApi: Send + Sync {
    /// Install a session. A different user discards the previous state and
    /// triggers a bulk load.
    async fn sign_in(&self, session: Session) -> Option<LoadReport>;

    /// Drop the session and every membership set.
    async fn sign_out(&self);

    /// Fetch every kind for the signed-in user.
    async fn load_memberships(&self) -> LoadReport;

    /// Flip membership of `item` for `kind`.
    async fn toggle(&self, kind: MembershipKind, item: ItemId) -> ToggleOutcome;

    /// Record how far the user got through an enrolled course.
    async fn set_course_progress(&self, course: ItemId, progress: u8) -> ProgressOutcome;

    /// Progress of an enrolled course (0 if unknown).
    fn course_progress(&self, course: &ItemId) -> u8;

    /// Profile loaded with the session, if any.
    fn profile(&self) -> Option<UserProfile>;

    /// Rendered membership (pending items report their target).
    fn is_member(&self, kind: MembershipKind, item: &ItemId) -> bool;

    /// Full view of one (kind, item) pair.
    fn snapshot(&self, kind: MembershipKind, item: &ItemId) -> ItemSnapshot;

    /// Members of one kind in a stable order.
    fn members(&self, kind: MembershipKind) -> Vec<ItemId>;

    fn load_status(&self, kind: MembershipKind) -> LoadStatus;
}
