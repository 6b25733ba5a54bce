//! # Outbound Ports
//!
//! Traits for the hosted backend the membership service writes to. Besides
//! the membership rows it serves the per-enrollment progress column and the
//! user's profile row, both read during the bulk load.

use crate::domain::UserProfile;
use async_trait::async_trait;
use shared_types::{BackendError, ItemId, MembershipKind, UserId};
use std::collections::{HashMap, HashSet};

/// What a single membership write did on the remote side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The row was inserted or deleted.
    Applied,
    /// The remote already held the requested state (duplicate insert,
    /// delete of a missing row).
    Conflict,
}

/// Membership rows keyed by (user, item), one table per kind.
///
/// Counters are derived server-side; there is no counter-write call.
#[async_trait]
pub trait MembershipBackend: Send + Sync {
    /// Insert the (user, item) row for `kind`.
    async fn insert_membership(
        &self,
        user: &UserId,
        kind: MembershipKind,
        item: &ItemId,
    ) -> Result<WriteOutcome, BackendError>;

    /// Delete the (user, item) row for `kind`.
    async fn delete_membership(
        &self,
        user: &UserId,
        kind: MembershipKind,
        item: &ItemId,
    ) -> Result<WriteOutcome, BackendError>;

    /// Every item `user` holds for `kind`.
    async fn list_memberships(
        &self,
        user: &UserId,
        kind: MembershipKind,
    ) -> Result<HashSet<ItemId>, BackendError>;

    /// Current aggregate counts for the given items. Items the backend
    /// does not know are omitted.
    async fn list_counters(
        &self,
        kind: MembershipKind,
        items: &[ItemId],
    ) -> Result<HashMap<ItemId, u64>, BackendError>;

    /// Progress (percent complete) of every course `user` is enrolled in.
    async fn list_progress(&self, user: &UserId) -> Result<HashMap<ItemId, u8>, BackendError>;

    /// Sets the progress column of an existing enrollment row.
    /// `BackendError::NotFound` if the user is not enrolled.
    async fn update_progress(
        &self,
        user: &UserId,
        course: &ItemId,
        progress: u8,
    ) -> Result<(), BackendError>;

    /// The user's profile row, if one exists.
    async fn get_profile(&self, user: &UserId) -> Result<Option<UserProfile>, BackendError>;
}
