//! In-memory membership backend.
//!
//! Mirrors the hosted backend closely enough to drive the service offline:
//! duplicate inserts fail with a unique violation, upvote rows move the
//! derived counter, enrollment rows carry a progress column, and writes can
//! be failed or held back on demand.

use crate::domain::UserProfile;
use crate::ports::{MembershipBackend, WriteOutcome};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{BackendError, ItemId, MembershipKind, UserId, PG_UNIQUE_VIOLATION};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::trace;

/// Membership rows held in process memory.
pub struct InMemoryMembershipBackend {
    rows: Mutex<HashMap<(UserId, MembershipKind), HashSet<ItemId>>>,
    /// Derived counters for counter-backed kinds.
    counters: Mutex<HashMap<ItemId, u64>>,
    /// Progress column of enrollment rows.
    progress: Mutex<HashMap<(UserId, ItemId), u8>>,
    profiles: Mutex<HashMap<UserId, UserProfile>>,
    writes: AtomicU64,
    write_failure: Mutex<Option<BackendError>>,
    failing_loads: Mutex<HashSet<MembershipKind>>,
    /// While true, writes wait before touching any row.
    paused: watch::Sender<bool>,
}

impl Default for InMemoryMembershipBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMembershipBackend {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            rows: Mutex::new(HashMap::new()),
            counters: Mutex::new(HashMap::new()),
            progress: Mutex::new(HashMap::new()),
            profiles: Mutex::new(HashMap::new()),
            writes: AtomicU64::new(0),
            write_failure: Mutex::new(None),
            failing_loads: Mutex::new(HashSet::new()),
            paused,
        }
    }

    /// Puts rows in place without counting as writes.
    pub fn seed(&self, user: &UserId, kind: MembershipKind, items: impl IntoIterator<Item = ItemId>) {
        let mut rows = self.rows.lock();
        let set = rows.entry((user.clone(), kind)).or_default();
        for item in items {
            if set.insert(item.clone()) && kind.is_counter_backed() {
                *self.counters.lock().entry(item).or_insert(0) += 1;
            }
        }
    }

    pub fn set_counter(&self, item: ItemId, count: u64) {
        self.counters.lock().insert(item, count);
    }

    pub fn counter(&self, item: &ItemId) -> Option<u64> {
        self.counters.lock().get(item).copied()
    }

    /// Sets the progress column of an enrollment row without counting as a
    /// write.
    pub fn seed_progress(&self, user: &UserId, course: &ItemId, progress: u8) {
        self.progress
            .lock()
            .insert((user.clone(), course.clone()), progress);
    }

    /// Progress stored for an enrollment row, if the row exists.
    pub fn progress_of(&self, user: &UserId, course: &ItemId) -> Option<u8> {
        if !self.rows(user, MembershipKind::Enrollment).contains(course) {
            return None;
        }
        Some(
            self.progress
                .lock()
                .get(&(user.clone(), course.clone()))
                .copied()
                .unwrap_or(0),
        )
    }

    pub fn set_profile(&self, profile: UserProfile) {
        self.profiles.lock().insert(profile.id.clone(), profile);
    }

    /// Rows currently held for (user, kind).
    pub fn rows(&self, user: &UserId, kind: MembershipKind) -> HashSet<ItemId> {
        self.rows
            .lock()
            .get(&(user.clone(), kind))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of write calls received, failed ones included.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every write fail with `error` until cleared with `None`.
    pub fn fail_writes(&self, error: Option<BackendError>) {
        *self.write_failure.lock() = error;
    }

    /// Makes `list_memberships` fail for `kind`.
    pub fn fail_loads(&self, kind: MembershipKind) {
        self.failing_loads.lock().insert(kind);
    }

    /// Holds writes until `release_writes`.
    pub fn pause_writes(&self) {
        self.paused.send_replace(true);
    }

    pub fn release_writes(&self) {
        self.paused.send_replace(false);
    }

    async fn begin_write(&self) -> Result<(), BackendError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut paused = self.paused.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = paused.wait_for(|held| !*held).await;
        match self.write_failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MembershipBackend for InMemoryMembershipBackend {
    async fn insert_membership(
        &self,
        user: &UserId,
        kind: MembershipKind,
        item: &ItemId,
    ) -> Result<WriteOutcome, BackendError> {
        self.begin_write().await?;
        let mut rows = self.rows.lock();
        let set = rows.entry((user.clone(), kind)).or_default();
        if !set.insert(item.clone()) {
            return Err(BackendError::Api {
                status: 409,
                code: PG_UNIQUE_VIOLATION.to_string(),
                message: format!("duplicate key value violates unique constraint ({kind})"),
            });
        }
        if kind.is_counter_backed() {
            *self.counters.lock().entry(item.clone()).or_insert(0) += 1;
        }
        trace!(user = %user, kind = %kind, item = %item, "Row inserted");
        Ok(WriteOutcome::Applied)
    }

    async fn delete_membership(
        &self,
        user: &UserId,
        kind: MembershipKind,
        item: &ItemId,
    ) -> Result<WriteOutcome, BackendError> {
        self.begin_write().await?;
        let mut rows = self.rows.lock();
        let removed = rows
            .get_mut(&(user.clone(), kind))
            .is_some_and(|set| set.remove(item));
        if !removed {
            return Ok(WriteOutcome::Conflict);
        }
        if kind.is_counter_backed() {
            if let Some(count) = self.counters.lock().get_mut(item) {
                *count = count.saturating_sub(1);
            }
        }
        if kind == MembershipKind::Enrollment {
            self.progress.lock().remove(&(user.clone(), item.clone()));
        }
        trace!(user = %user, kind = %kind, item = %item, "Row deleted");
        Ok(WriteOutcome::Applied)
    }

    async fn list_memberships(
        &self,
        user: &UserId,
        kind: MembershipKind,
    ) -> Result<HashSet<ItemId>, BackendError> {
        if self.failing_loads.lock().contains(&kind) {
            return Err(BackendError::Transport(format!("{kind} listing unavailable")));
        }
        Ok(self.rows(user, kind))
    }

    async fn list_counters(
        &self,
        _kind: MembershipKind,
        items: &[ItemId],
    ) -> Result<HashMap<ItemId, u64>, BackendError> {
        let counters = self.counters.lock();
        Ok(items
            .iter()
            .filter_map(|item| counters.get(item).map(|c| (item.clone(), *c)))
            .collect())
    }

    async fn list_progress(&self, user: &UserId) -> Result<HashMap<ItemId, u8>, BackendError> {
        if self.failing_loads.lock().contains(&MembershipKind::Enrollment) {
            return Err(BackendError::Transport("progress listing unavailable".into()));
        }
        Ok(self
            .rows(user, MembershipKind::Enrollment)
            .into_iter()
            .map(|course| {
                let progress = self.progress_of(user, &course).unwrap_or(0);
                (course, progress)
            })
            .collect())
    }

    async fn update_progress(
        &self,
        user: &UserId,
        course: &ItemId,
        progress: u8,
    ) -> Result<(), BackendError> {
        self.begin_write().await?;
        if !self.rows(user, MembershipKind::Enrollment).contains(course) {
            return Err(BackendError::NotFound(format!("enrollment {course}")));
        }
        self.progress
            .lock()
            .insert((user.clone(), course.clone()), progress);
        trace!(user = %user, course = %course, progress, "Progress updated");
        Ok(())
    }

    async fn get_profile(&self, user: &UserId) -> Result<Option<UserProfile>, BackendError> {
        Ok(self.profiles.lock().get(user).cloned())
    }
}
