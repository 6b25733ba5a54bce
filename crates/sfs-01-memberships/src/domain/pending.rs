//! Pending operation registry.
//!
//! At most one in-flight write per (kind, item). The entry remembers the
//! pre-toggle flag and counter so a failure can restore both. A reload that
//! lands while the write is in flight rebases those values onto what the
//! backend reported.

use shared_types::{ItemId, ItemState, MembershipKind};
use std::collections::HashMap;
use uuid::Uuid;

/// One optimistic toggle awaiting its remote result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingOperation {
    /// Distinguishes this op from a later one on the same key.
    pub id: Uuid,
    pub kind: MembershipKind,
    pub item: ItemId,
    /// State the item was in when the toggle started.
    pub from_state: ItemState,
    /// Membership to restore on failure.
    pub prior_member: bool,
    /// Counter to restore on failure (counter-backed kinds only).
    pub prior_count: Option<u64>,
    /// Membership the toggle moves towards.
    pub target_member: bool,
    /// Session generation the op was started under.
    pub generation: u64,
}

impl PendingOperation {
    pub fn key(&self) -> (MembershipKind, ItemId) {
        (self.kind, self.item.clone())
    }

    /// In-flight state while the write is outstanding.
    pub fn pending_state(&self) -> ItemState {
        ItemState::pending(self.target_member)
    }
}

/// In-flight operations keyed by (kind, item).
#[derive(Debug, Default)]
pub struct PendingRegistry {
    ops: HashMap<(MembershipKind, ItemId), PendingOperation>,
}

impl PendingRegistry {
    pub fn contains(&self, kind: MembershipKind, item: &ItemId) -> bool {
        self.ops.contains_key(&(kind, item.clone()))
    }

    pub fn get(&self, kind: MembershipKind, item: &ItemId) -> Option<&PendingOperation> {
        self.ops.get(&(kind, item.clone()))
    }

    /// The registered op with the same key and id as `op`.
    pub fn current(&self, op: &PendingOperation) -> Option<&PendingOperation> {
        self.ops.get(&op.key()).filter(|current| current.id == op.id)
    }

    /// Registers an op. Returns false if the key is already taken.
    pub fn register(&mut self, op: PendingOperation) -> bool {
        let key = op.key();
        if self.ops.contains_key(&key) {
            return false;
        }
        self.ops.insert(key, op);
        true
    }

    /// Removes the op only if it is the one identified by `id`.
    pub fn finish(&mut self, op: &PendingOperation) -> Option<PendingOperation> {
        self.current(op)?;
        self.ops.remove(&op.key())
    }

    /// Pending ops of one kind.
    pub fn for_kind(&self, kind: MembershipKind) -> impl Iterator<Item = &PendingOperation> {
        self.ops.values().filter(move |op| op.kind == kind)
    }

    pub fn for_kind_mut(
        &mut self,
        kind: MembershipKind,
    ) -> impl Iterator<Item = &mut PendingOperation> {
        self.ops.values_mut().filter(move |op| op.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

/// One optimistic course-progress write awaiting its remote result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub id: Uuid,
    pub course: ItemId,
    /// Progress to restore on failure.
    pub prior: u8,
    pub target: u8,
    pub generation: u64,
}
