//! Membership Service - dispatcher and reconciler
//!
//! Wires the store, the backend port and the event bus together.
//!
//! - `toggle` is the mutation dispatcher, built on `optimistic_toggle`.
//! - `load_memberships` is the reconciler: it replaces local sets with
//!   what the backend holds, keeping in-flight toggles on top. It also
//!   fetches enrollment progress and the user's profile.
//! - `set_course_progress` writes the progress column of an enrollment
//!   with the same apply / confirm / revert cycle as a toggle.
//!
//! The store lock is only taken inside synchronous sections.

use super::optimistic::{optimistic_toggle, Resolution};
use crate::domain::{
    ItemSnapshot, ItemState, LoadStatus, MembershipConfig, MembershipError, MembershipStore,
    PendingOperation, ProgressUpdate, UserProfile,
};
use crate::ports::{MembershipApi, MembershipBackend, WriteOutcome};
use async_trait::async_trait;
use futures::future::{join, join_all};
use parking_lot::Mutex;
use shared_bus::{EventPublisher, Notice, NoticeKind, StoreEvent};
use shared_types::{BackendError, ItemId, MembershipKind, Session, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of one `toggle` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The remote write succeeded (or the remote already agreed).
    Committed(ItemSnapshot),
    /// A write for this item was already in flight; nothing changed.
    Ignored(ItemSnapshot),
    /// No session. Nothing was sent.
    SignInRequired,
    /// The remote write failed; local state is back to what it was.
    RolledBack {
        snapshot: ItemSnapshot,
        reason: String,
    },
    /// The session changed while the write was in flight.
    Discarded,
}

impl ToggleOutcome {
    pub fn snapshot(&self) -> Option<&ItemSnapshot> {
        match self {
            ToggleOutcome::Committed(s) | ToggleOutcome::Ignored(s) => Some(s),
            ToggleOutcome::RolledBack { snapshot, .. } => Some(snapshot),
            ToggleOutcome::SignInRequired | ToggleOutcome::Discarded => None,
        }
    }
}

/// Result of one `set_course_progress` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressOutcome {
    /// The remote row now holds this value.
    Committed(u8),
    /// A progress write for this course was already in flight.
    Ignored(u8),
    /// No session. Nothing was sent.
    SignInRequired,
    /// The user is not enrolled in the course. Nothing was sent.
    NotEnrolled,
    /// The remote write failed; the previous value is back.
    RolledBack { progress: u8, reason: String },
    /// The session changed while the write was in flight.
    Discarded,
}

/// Result of one bulk load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<MembershipKind>,
    pub failed: Vec<(MembershipKind, BackendError)>,
    /// Set when the profile row could not be fetched.
    pub profile_failed: Option<BackendError>,
    /// The session changed before some results arrived.
    pub discarded: bool,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.profile_failed.is_none() && !self.discarded
    }
}

/// Everything fetched for one kind.
struct Fetched {
    items: HashSet<ItemId>,
    counts: HashMap<ItemId, u64>,
    /// Enrollment progress; empty for other kinds.
    progress: HashMap<ItemId, u8>,
}

/// Membership subsystem service.
pub struct MembershipService<B: MembershipBackend> {
    backend: Arc<B>,
    store: Arc<Mutex<MembershipStore>>,
    publisher: Arc<dyn EventPublisher>,
    config: MembershipConfig,
}

impl<B: MembershipBackend> Clone for MembershipService<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            store: Arc::clone(&self.store),
            publisher: Arc::clone(&self.publisher),
            config: self.config.clone(),
        }
    }
}

impl<B: MembershipBackend + 'static> MembershipService<B> {
    pub fn new(
        backend: Arc<B>,
        publisher: Arc<dyn EventPublisher>,
        config: MembershipConfig,
    ) -> Self {
        Self {
            backend,
            store: Arc::new(Mutex::new(MembershipStore::new())),
            publisher,
            config,
        }
    }

    pub fn config(&self) -> &MembershipConfig {
        &self.config
    }

    // === SESSION ===

    /// Installs a session. Returns the load report if the user changed.
    pub async fn sign_in(&self, session: Session) -> Option<LoadReport> {
        let user = session.user_id.clone();
        let changed = self.store.lock().begin_session(session);
        if !changed {
            debug!(user = %user, "Session refreshed for same user");
            return None;
        }

        info!(user = %user, "Session started");
        self.publisher
            .publish(StoreEvent::SessionStarted { user })
            .await;
        Some(self.load_memberships().await)
    }

    pub async fn sign_out(&self) {
        let user = self.store.lock().end_session();
        info!(user = ?user, "Session ended, membership state discarded");
        self.publisher.publish(StoreEvent::SessionEnded { user }).await;
    }

    pub fn user(&self) -> Option<UserId> {
        self.store.lock().user().cloned()
    }

    // === QUERIES ===

    pub fn is_member(&self, kind: MembershipKind, item: &ItemId) -> bool {
        self.store.lock().is_member(kind, item)
    }

    pub fn count(&self, kind: MembershipKind, item: &ItemId) -> Option<u64> {
        self.store.lock().count(kind, item)
    }

    pub fn item_state(&self, kind: MembershipKind, item: &ItemId) -> ItemState {
        self.store.lock().item_state(kind, item)
    }

    pub fn snapshot(&self, kind: MembershipKind, item: &ItemId) -> ItemSnapshot {
        self.store.lock().snapshot(kind, item)
    }

    pub fn members(&self, kind: MembershipKind) -> Vec<ItemId> {
        self.store.lock().members(kind)
    }

    pub fn load_status(&self, kind: MembershipKind) -> LoadStatus {
        self.store.lock().load_status(kind)
    }

    pub fn pending_count(&self) -> usize {
        self.store.lock().pending_count()
    }

    pub fn course_progress(&self, course: &ItemId) -> u8 {
        self.store.lock().course_progress(course)
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.store.lock().profile().cloned()
    }

    /// Caches counter values seen in a listing (e.g. material upvotes).
    pub fn seed_counters(
        &self,
        kind: MembershipKind,
        counts: impl IntoIterator<Item = (ItemId, u64)>,
    ) {
        self.store.lock().seed_counters(kind, counts);
    }

    // === DISPATCHER ===

    /// Flips membership optimistically and confirms it remotely.
    pub async fn toggle(&self, kind: MembershipKind, item: ItemId) -> ToggleOutcome {
        let backend = Arc::clone(&self.backend);
        let publisher = Arc::clone(&self.publisher);

        let resolution = optimistic_toggle(
            || {
                let mut store = self.store.lock();
                let user = store.user().cloned().ok_or(MembershipError::NotSignedIn)?;
                let op = store.prepare_toggle(kind, &item)?;
                Ok::<_, MembershipError>((op, user))
            },
            |(op, _): &(PendingOperation, UserId)| {
                self.store.lock().apply_toggle(op);
            },
            move |(op, user): &(PendingOperation, UserId)| {
                let op = op.clone();
                let user = user.clone();
                async move {
                    publisher
                        .publish(StoreEvent::ToggleDispatched {
                            kind: op.kind,
                            item: op.item.clone(),
                            target: op.target_member,
                        })
                        .await;
                    publisher
                        .publish(StoreEvent::ItemStateChanged {
                            kind: op.kind,
                            item: op.item.clone(),
                            from: op.from_state,
                            to: op.pending_state(),
                        })
                        .await;
                    let result = if op.target_member {
                        backend.insert_membership(&user, op.kind, &op.item).await
                    } else {
                        backend.delete_membership(&user, op.kind, &op.item).await
                    };
                    match result {
                        Err(err) if err.is_conflict() => Ok(WriteOutcome::Conflict),
                        other => other,
                    }
                }
            },
            |(op, _): &(PendingOperation, UserId)| self.store.lock().revert_toggle(op),
            self.config.remote_timeout,
        )
        .await;

        match resolution {
            Resolution::Refused(MembershipError::NotSignedIn) => {
                info!(kind = %kind, item = %item, "Toggle refused: sign-in required");
                let notice = Notice::sign_in_required(self.config.notice_ttl);
                self.publisher.publish(StoreEvent::Notice(notice)).await;
                ToggleOutcome::SignInRequired
            }
            Resolution::Refused(_) => {
                debug!(kind = %kind, item = %item, "Toggle ignored: write already in flight");
                let snapshot = self.snapshot(kind, &item);
                self.publisher
                    .publish(StoreEvent::ToggleIgnored { kind, item })
                    .await;
                ToggleOutcome::Ignored(snapshot)
            }
            Resolution::Committed {
                prior: (op, user),
                output,
                elapsed,
            } => {
                let settled = self.store.lock().settle_toggle(&op);
                let Some(snapshot) = settled else {
                    debug!(kind = %kind, item = %item, user = %user, "Stale toggle result discarded");
                    return ToggleOutcome::Discarded;
                };
                if output == WriteOutcome::Conflict {
                    debug!(kind = %kind, item = %item, "Remote already converged");
                }
                self.publish_transition(&op, &snapshot).await;
                debug!(
                    kind = %kind,
                    item = %item,
                    member = snapshot.member,
                    latency_ms = millis(elapsed),
                    "Toggle committed"
                );
                self.publisher
                    .publish(StoreEvent::ToggleCommitted {
                        kind,
                        item,
                        member: snapshot.member,
                        count: snapshot.count,
                        latency_ms: millis(elapsed),
                    })
                    .await;
                ToggleOutcome::Committed(snapshot)
            }
            Resolution::Reverted {
                prior: (op, user),
                failure,
                reverted,
                elapsed,
            } => {
                let Some(snapshot) = reverted else {
                    debug!(kind = %kind, item = %item, user = %user, "Stale toggle failure discarded");
                    return ToggleOutcome::Discarded;
                };
                let reason = failure.to_string();
                self.publish_transition(&op, &snapshot).await;
                warn!(
                    kind = %kind,
                    item = %item,
                    user = %user,
                    error = %failure,
                    "Toggle rolled back"
                );
                self.publisher
                    .publish(StoreEvent::ToggleRolledBack {
                        kind,
                        item,
                        member: snapshot.member,
                        count: snapshot.count,
                        reason: reason.clone(),
                        latency_ms: millis(elapsed),
                    })
                    .await;
                let notice = Notice::new(
                    NoticeKind::ToggleFailed,
                    failure_message(kind),
                    self.config.notice_ttl,
                );
                self.publisher.publish(StoreEvent::Notice(notice)).await;
                ToggleOutcome::RolledBack { snapshot, reason }
            }
        }
    }

    async fn publish_transition(&self, op: &PendingOperation, snapshot: &ItemSnapshot) {
        self.publisher
            .publish(StoreEvent::ItemStateChanged {
                kind: op.kind,
                item: op.item.clone(),
                from: op.pending_state(),
                to: snapshot.state,
            })
            .await;
    }

    // === COURSE PROGRESS ===

    /// Records progress on an enrolled course optimistically. Values above
    /// 100 are clamped.
    pub async fn set_course_progress(&self, course: ItemId, progress: u8) -> ProgressOutcome {
        let backend = Arc::clone(&self.backend);

        let resolution = optimistic_toggle(
            || {
                let mut store = self.store.lock();
                let user = store.user().cloned().ok_or(MembershipError::NotSignedIn)?;
                let update = store.prepare_progress(&course, progress)?;
                Ok::<_, MembershipError>((update, user))
            },
            |(update, _): &(ProgressUpdate, UserId)| {
                self.store.lock().apply_progress(update);
            },
            move |(update, user): &(ProgressUpdate, UserId)| {
                let update = update.clone();
                let user = user.clone();
                async move {
                    backend
                        .update_progress(&user, &update.course, update.target)
                        .await
                }
            },
            |(update, _): &(ProgressUpdate, UserId)| self.store.lock().revert_progress(update),
            self.config.remote_timeout,
        )
        .await;

        match resolution {
            Resolution::Refused(MembershipError::NotSignedIn) => {
                info!(course = %course, "Progress refused: sign-in required");
                let notice = Notice::sign_in_required(self.config.notice_ttl);
                self.publisher.publish(StoreEvent::Notice(notice)).await;
                ProgressOutcome::SignInRequired
            }
            Resolution::Refused(MembershipError::NotEnrolled { .. }) => {
                debug!(course = %course, "Progress refused: not enrolled");
                ProgressOutcome::NotEnrolled
            }
            Resolution::Refused(_) => {
                debug!(course = %course, "Progress ignored: write already in flight");
                ProgressOutcome::Ignored(self.course_progress(&course))
            }
            Resolution::Committed {
                prior: (update, user),
                elapsed,
                ..
            } => {
                let Some(progress) = self.store.lock().settle_progress(&update) else {
                    debug!(course = %course, user = %user, "Stale progress result discarded");
                    return ProgressOutcome::Discarded;
                };
                debug!(course = %course, progress, latency_ms = millis(elapsed), "Progress committed");
                self.publisher
                    .publish(StoreEvent::ProgressCommitted {
                        course,
                        progress,
                        latency_ms: millis(elapsed),
                    })
                    .await;
                ProgressOutcome::Committed(progress)
            }
            Resolution::Reverted {
                prior: (_, user),
                failure,
                reverted,
                elapsed,
            } => {
                let Some(progress) = reverted else {
                    debug!(course = %course, user = %user, "Stale progress failure discarded");
                    return ProgressOutcome::Discarded;
                };
                let reason = failure.to_string();
                warn!(course = %course, user = %user, error = %failure, "Progress rolled back");
                self.publisher
                    .publish(StoreEvent::ProgressRolledBack {
                        course,
                        progress,
                        reason: reason.clone(),
                        latency_ms: millis(elapsed),
                    })
                    .await;
                let notice = Notice::new(
                    NoticeKind::ProgressFailed,
                    "Failed to update course progress",
                    self.config.notice_ttl,
                );
                self.publisher.publish(StoreEvent::Notice(notice)).await;
                ProgressOutcome::RolledBack { progress, reason }
            }
        }
    }

    // === RECONCILER ===

    /// Replaces every kind's set with the backend's view for the current
    /// user, and fetches the profile alongside. Kinds are fetched
    /// concurrently and fail independently.
    pub async fn load_memberships(&self) -> LoadReport {
        let (user, generation) = {
            let store = self.store.lock();
            match store.user() {
                Some(user) => (user.clone(), store.generation()),
                None => return LoadReport::default(),
            }
        };

        let fetches = MembershipKind::ALL
            .iter()
            .map(|&kind| self.fetch_kind(&user, kind));
        let (results, profile) = join(join_all(fetches), self.fetch_profile(&user)).await;

        let mut report = LoadReport::default();
        for (kind, result) in results {
            match result {
                Ok(fetched) => {
                    let members = fetched.items.len();
                    let applied = {
                        let mut store = self.store.lock();
                        let applied =
                            store.apply_load(generation, kind, fetched.items, fetched.counts);
                        if applied && kind == MembershipKind::Enrollment {
                            store.apply_progress_load(generation, fetched.progress);
                        }
                        applied
                    };
                    if !applied {
                        report.discarded = true;
                        continue;
                    }
                    debug!(user = %user, kind = %kind, members, "Memberships loaded");
                    self.publisher
                        .publish(StoreEvent::MembershipsLoaded {
                            user: user.clone(),
                            kind,
                            members,
                        })
                        .await;
                    report.loaded.push(kind);
                }
                Err(err) => {
                    let applied = self.store.lock().mark_load_failed(generation, kind);
                    if !applied {
                        report.discarded = true;
                        continue;
                    }
                    warn!(user = %user, kind = %kind, error = %err, "Membership load failed");
                    let notice = Notice::new(
                        NoticeKind::LoadFailed,
                        format!("Failed to load {}", kind_label(kind)),
                        self.config.notice_ttl,
                    );
                    self.publisher.publish(StoreEvent::Notice(notice)).await;
                    report.failed.push((kind, err));
                }
            }
        }

        match profile {
            Ok(profile) => {
                if self.store.lock().apply_profile(generation, profile) {
                    debug!(user = %user, "Profile loaded");
                } else {
                    report.discarded = true;
                }
            }
            Err(err) => {
                if self.store.lock().is_current(generation) {
                    warn!(user = %user, error = %err, "Profile load failed");
                    let notice = Notice::new(
                        NoticeKind::LoadFailed,
                        "Failed to load profile",
                        self.config.notice_ttl,
                    );
                    self.publisher.publish(StoreEvent::Notice(notice)).await;
                    report.profile_failed = Some(err);
                } else {
                    report.discarded = true;
                }
            }
        }

        if report.discarded {
            debug!(user = %user, "Load results from a previous session discarded");
        }
        report
    }

    async fn fetch_kind(
        &self,
        user: &UserId,
        kind: MembershipKind,
    ) -> (MembershipKind, Result<Fetched, BackendError>) {
        let fetch = async {
            let items = self.backend.list_memberships(user, kind).await?;
            let counts = if kind.is_counter_backed() && !items.is_empty() {
                let ids: Vec<ItemId> = items.iter().cloned().collect();
                self.backend.list_counters(kind, &ids).await?
            } else {
                HashMap::new()
            };
            let progress = if kind == MembershipKind::Enrollment && !items.is_empty() {
                self.backend.list_progress(user).await?
            } else {
                HashMap::new()
            };
            Ok::<_, BackendError>(Fetched {
                items,
                counts,
                progress,
            })
        };
        (kind, self.bounded(fetch).await)
    }

    async fn fetch_profile(&self, user: &UserId) -> Result<Option<UserProfile>, BackendError> {
        self.bounded(self.backend.get_profile(user)).await
    }

    /// Runs a backend call under the remote timeout.
    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        let timeout = self.config.remote_timeout;
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                millis: millis(timeout),
            }),
        }
    }
}

#[async_trait]
impl<B: MembershipBackend + 'static> MembershipApi for MembershipService<B> {
    async fn sign_in(&self, session: Session) -> Option<LoadReport> {
        Self::sign_in(self, session).await
    }

    async fn sign_out(&self) {
        Self::sign_out(self).await
    }

    async fn load_memberships(&self) -> LoadReport {
        Self::load_memberships(self).await
    }

    async fn toggle(&self, kind: MembershipKind, item: ItemId) -> ToggleOutcome {
        Self::toggle(self, kind, item).await
    }

    async fn set_course_progress(&self, course: ItemId, progress: u8) -> ProgressOutcome {
        Self::set_course_progress(self, course, progress).await
    }

    fn course_progress(&self, course: &ItemId) -> u8 {
        Self::course_progress(self, course)
    }

    fn profile(&self) -> Option<UserProfile> {
        Self::profile(self)
    }

    fn is_member(&self, kind: MembershipKind, item: &ItemId) -> bool {
        Self::is_member(self, kind, item)
    }

    fn snapshot(&self, kind: MembershipKind, item: &ItemId) -> ItemSnapshot {
        Self::snapshot(self, kind, item)
    }

    fn members(&self, kind: MembershipKind) -> Vec<ItemId> {
        Self::members(self, kind)
    }

    fn load_status(&self, kind: MembershipKind) -> LoadStatus {
        Self::load_status(self, kind)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn kind_label(kind: MembershipKind) -> &'static str {
    match kind {
        MembershipKind::FavoriteMaterial => "favorites",
        MembershipKind::UpvoteMaterial => "upvotes",
        MembershipKind::FavoriteCourse => "course favorites",
        MembershipKind::Enrollment => "enrollments",
    }
}

fn failure_message(kind: MembershipKind) -> &'static str {
    match kind {
        MembershipKind::FavoriteMaterial => "Failed to update favorite",
        MembershipKind::UpvoteMaterial => "Failed to update upvote",
        MembershipKind::FavoriteCourse => "Failed to update course favorite",
        MembershipKind::Enrollment => "Failed to update enrollment",
    }
}
