//! Client state store.
//!
//! Holds every membership set, counter map, pending operation and load
//! status for the current session. The service keeps it behind one mutex;
//! every method here is synchronous so the lock is never held across an
//! await point.
//!
//! Every change to a membership flag goes through `ItemState::next`, so
//! the store only ever makes transitions the state machine allows.
//!
//! ## Session generation
//!
//! `generation` is bumped whenever the session changes. Pending operations
//! and loads carry the generation they started under; results that come
//! back under a different generation are dropped.

use super::entities::{CounterMap, ItemSnapshot, LoadStatus, MembershipSet, UserProfile, MAX_PROGRESS};
use super::errors::MembershipError;
use super::pending::{PendingOperation, PendingRegistry, ProgressUpdate};
use shared_types::{ItemEvent, ItemId, ItemState, MembershipKind, Session, UserId};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Per-session membership state.
#[derive(Debug, Default)]
pub struct MembershipStore {
    session: Option<Session>,
    generation: u64,
    sets: HashMap<MembershipKind, MembershipSet>,
    counters: HashMap<MembershipKind, CounterMap>,
    status: HashMap<MembershipKind, LoadStatus>,
    pending: PendingRegistry,
    /// Percent complete per enrolled course.
    progress: HashMap<ItemId, u8>,
    progress_pending: HashMap<ItemId, ProgressUpdate>,
    profile: Option<UserProfile>,
}

impl MembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // SESSION
    // =========================================================================

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&UserId> {
        self.session.as_ref().map(|s| &s.user_id)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while the session `generation` was taken from is still active.
    pub fn is_current(&self, generation: u64) -> bool {
        self.session.is_some() && self.generation == generation
    }

    /// Installs a session. Returns true if the user changed, in which case
    /// all state of the previous user was discarded.
    pub fn begin_session(&mut self, session: Session) -> bool {
        if self.user() == Some(&session.user_id) {
            self.session = Some(session);
            return false;
        }
        self.reset();
        self.session = Some(session);
        true
    }

    /// Discards everything. Returns the user that was signed in.
    pub fn end_session(&mut self) -> Option<UserId> {
        let user = self.session.take().map(|s| s.user_id);
        self.reset();
        user
    }

    fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.sets.clear();
        self.counters.clear();
        self.status.clear();
        self.pending.clear();
        self.progress.clear();
        self.progress_pending.clear();
        self.profile = None;
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Rendered membership. Pending items report their optimistic target.
    pub fn is_member(&self, kind: MembershipKind, item: &ItemId) -> bool {
        self.sets.get(&kind).is_some_and(|set| set.contains(item))
    }

    pub fn count(&self, kind: MembershipKind, item: &ItemId) -> Option<u64> {
        self.counters.get(&kind).and_then(|c| c.get(item))
    }

    /// Members of one kind in a stable order.
    pub fn members(&self, kind: MembershipKind) -> Vec<ItemId> {
        self.sets.get(&kind).map(|s| s.sorted()).unwrap_or_default()
    }

    pub fn load_status(&self, kind: MembershipKind) -> LoadStatus {
        self.status.get(&kind).copied().unwrap_or_default()
    }

    pub fn is_pending(&self, kind: MembershipKind, item: &ItemId) -> bool {
        self.pending.contains(kind, item)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn item_state(&self, kind: MembershipKind, item: &ItemId) -> ItemState {
        if let Some(op) = self.pending.get(kind, item) {
            return op.pending_state();
        }
        if self.is_member(kind, item) {
            ItemState::Present
        } else if self.load_status(kind) == LoadStatus::Loaded {
            ItemState::Absent
        } else {
            ItemState::Unknown
        }
    }

    /// Progress of an enrolled course; 0 when unknown or not enrolled.
    pub fn course_progress(&self, course: &ItemId) -> u8 {
        if !self.is_member(MembershipKind::Enrollment, course) {
            return 0;
        }
        self.progress.get(course).copied().unwrap_or(0)
    }

    pub fn is_progress_pending(&self, course: &ItemId) -> bool {
        self.progress_pending.contains_key(course)
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn snapshot(&self, kind: MembershipKind, item: &ItemId) -> ItemSnapshot {
        let state = self.item_state(kind, item);
        ItemSnapshot {
            kind,
            item: item.clone(),
            state,
            member: self.is_member(kind, item),
            count: self.count(kind, item),
        }
    }

    /// Caches counter values from a listing. Items with a write in flight
    /// keep their local value.
    pub fn seed_counters(
        &mut self,
        kind: MembershipKind,
        counts: impl IntoIterator<Item = (ItemId, u64)>,
    ) {
        let pending = &self.pending;
        let counters = self.counters.entry(kind).or_default();
        for (item, count) in counts {
            if !pending.contains(kind, &item) {
                counters.set(item, count);
            }
        }
    }

    // =========================================================================
    // TOGGLE
    // =========================================================================

    /// Checks the guards and registers a pending op. Does not touch the
    /// membership set yet.
    pub fn prepare_toggle(
        &mut self,
        kind: MembershipKind,
        item: &ItemId,
    ) -> Result<PendingOperation, MembershipError> {
        if self.session.is_none() {
            return Err(MembershipError::NotSignedIn);
        }
        let from_state = self.item_state(kind, item);
        let Some(pending_state) = from_state.next(ItemEvent::Toggled) else {
            return Err(MembershipError::AlreadyPending {
                kind,
                item: item.clone(),
            });
        };

        let op = PendingOperation {
            id: Uuid::new_v4(),
            kind,
            item: item.clone(),
            from_state,
            prior_member: from_state.is_member(),
            prior_count: self.count(kind, item),
            target_member: pending_state.is_member(),
            generation: self.generation,
        };
        self.pending.register(op.clone());
        Ok(op)
    }

    /// Flips the flag and moves the counter by one in a single step.
    pub fn apply_toggle(&mut self, op: &PendingOperation) -> Option<ItemSnapshot> {
        if !self.owns(op) {
            return None;
        }
        self.set_member(op.kind, &op.item, op.pending_state());
        if op.kind.is_counter_backed() {
            self.counters
                .entry(op.kind)
                .or_default()
                .adjust(&op.item, op.target_member);
        }
        Some(self.snapshot(op.kind, &op.item))
    }

    /// Restores the flag and counter recorded in the registry. Those are
    /// the pre-toggle values unless a reload rebased them. `None` if the op
    /// is stale.
    pub fn revert_toggle(&mut self, op: &PendingOperation) -> Option<ItemSnapshot> {
        if self.generation != op.generation {
            return None;
        }
        let current = self.pending.finish(op)?;
        let restored = current
            .pending_state()
            .next(ItemEvent::WriteFailed {
                restore: current.prior_member,
            })
            .unwrap_or(ItemState::steady(current.prior_member));
        self.set_member(current.kind, &current.item, restored);
        if current.kind.is_counter_backed() {
            self.counters
                .entry(current.kind)
                .or_default()
                .restore(&current.item, current.prior_count);
        }
        Some(self.snapshot(current.kind, &current.item))
    }

    /// Keeps the optimistic state and clears the pending entry.
    pub fn settle_toggle(&mut self, op: &PendingOperation) -> Option<ItemSnapshot> {
        if self.generation != op.generation {
            return None;
        }
        let current = self.pending.finish(op)?;
        let settled = current
            .pending_state()
            .next(ItemEvent::WriteSucceeded)
            .unwrap_or(ItemState::steady(current.target_member));
        self.set_member(current.kind, &current.item, settled);
        Some(self.snapshot(current.kind, &current.item))
    }

    fn owns(&self, op: &PendingOperation) -> bool {
        op.generation == self.generation && self.pending.current(op).is_some()
    }

    fn set_member(&mut self, kind: MembershipKind, item: &ItemId, state: ItemState) {
        self.sets
            .entry(kind)
            .or_default()
            .set(item.clone(), state.is_member());
    }

    // =========================================================================
    // COURSE PROGRESS
    // =========================================================================

    /// Registers a progress write for an enrolled course. Values above 100
    /// are clamped.
    pub fn prepare_progress(
        &mut self,
        course: &ItemId,
        progress: u8,
    ) -> Result<ProgressUpdate, MembershipError> {
        if self.session.is_none() {
            return Err(MembershipError::NotSignedIn);
        }
        if !self.is_member(MembershipKind::Enrollment, course) {
            return Err(MembershipError::NotEnrolled {
                course: course.clone(),
            });
        }
        if self.progress_pending.contains_key(course) {
            return Err(MembershipError::ProgressPending {
                course: course.clone(),
            });
        }

        let update = ProgressUpdate {
            id: Uuid::new_v4(),
            course: course.clone(),
            prior: self.course_progress(course),
            target: progress.min(MAX_PROGRESS),
            generation: self.generation,
        };
        self.progress_pending
            .insert(course.clone(), update.clone());
        Ok(update)
    }

    pub fn apply_progress(&mut self, update: &ProgressUpdate) -> Option<u8> {
        self.owned_progress(update)?;
        self.progress.insert(update.course.clone(), update.target);
        Some(update.target)
    }

    /// Clears the pending entry and keeps the new value.
    pub fn settle_progress(&mut self, update: &ProgressUpdate) -> Option<u8> {
        self.owned_progress(update)?;
        self.progress_pending.remove(&update.course);
        Some(self.course_progress(&update.course))
    }

    /// Restores the registered prior value, rebased by any reload.
    pub fn revert_progress(&mut self, update: &ProgressUpdate) -> Option<u8> {
        let prior = self.owned_progress(update)?.prior;
        self.progress_pending.remove(&update.course);
        self.progress.insert(update.course.clone(), prior);
        Some(self.course_progress(&update.course))
    }

    fn owned_progress(&self, update: &ProgressUpdate) -> Option<&ProgressUpdate> {
        if update.generation != self.generation {
            return None;
        }
        self.progress_pending
            .get(&update.course)
            .filter(|current| current.id == update.id)
    }

    // =========================================================================
    // BULK LOAD
    // =========================================================================

    /// Replaces one kind's set with a loaded one. In-flight toggles keep
    /// their optimistic target on screen, and the values they restore on
    /// failure are rebased onto the loaded ones. Returns false if the load
    /// belongs to an old session.
    pub fn apply_load(
        &mut self,
        generation: u64,
        kind: MembershipKind,
        items: HashSet<ItemId>,
        counts: HashMap<ItemId, u64>,
    ) -> bool {
        if generation != self.generation {
            return false;
        }

        let counters = self.counters.entry(kind).or_default();
        for op in self.pending.for_kind_mut(kind) {
            op.prior_member = items.contains(&op.item);
            if let Some(&count) = counts.get(&op.item) {
                op.prior_count = Some(count);
                counters.set(op.item.clone(), count);
                if op.prior_member != op.target_member {
                    counters.adjust(&op.item, op.target_member);
                }
            }
        }

        let pending: Vec<(ItemId, ItemState)> = self
            .pending
            .for_kind(kind)
            .map(|op| {
                let loaded = ItemEvent::Loaded {
                    member: op.prior_member,
                };
                let state = op.pending_state().next(loaded).unwrap_or(op.pending_state());
                (op.item.clone(), state)
            })
            .collect();
        self.sets.entry(kind).or_default().replace(items);
        for (item, state) in pending {
            self.set_member(kind, &item, state);
        }

        if !counts.is_empty() {
            self.seed_counters(kind, counts);
        }
        self.status.insert(kind, LoadStatus::Loaded);
        true
    }

    /// Replaces enrollment progress with loaded values. Courses with a
    /// progress write in flight keep the optimistic value and rebase their
    /// restore point.
    pub fn apply_progress_load(&mut self, generation: u64, progress: HashMap<ItemId, u8>) -> bool {
        if generation != self.generation {
            return false;
        }
        for update in self.progress_pending.values_mut() {
            update.prior = progress.get(&update.course).copied().unwrap_or(0);
        }
        let mut loaded: HashMap<ItemId, u8> = progress
            .into_iter()
            .map(|(course, value)| (course, value.min(MAX_PROGRESS)))
            .collect();
        for update in self.progress_pending.values() {
            loaded.insert(update.course.clone(), update.target);
        }
        self.progress = loaded;
        true
    }

    /// Marks a kind as failed to load. Existing entries are kept.
    pub fn mark_load_failed(&mut self, generation: u64, kind: MembershipKind) -> bool {
        if generation != self.generation {
            return false;
        }
        self.status.insert(kind, LoadStatus::Failed);
        true
    }

    /// Installs the profile fetched for the current session.
    pub fn apply_profile(&mut self, generation: u64, profile: Option<UserProfile>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.profile = profile;
        true
    }
}
