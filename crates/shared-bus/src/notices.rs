//! # Notices
//!
//! User-visible, dismissible, time-limited messages. Services publish a
//! `StoreEvent::Notice`; a `NoticeBoard` collects them for the view layer.

use crate::events::StoreEvent;
use crate::subscriber::Subscription;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// How long a notice stays up unless dismissed.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(5);

/// What a notice is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    /// An action needs a signed-in user; the view should offer sign-in.
    SignInRequired,
    /// An optimistic toggle was rolled back.
    ToggleFailed,
    /// A bulk load of memberships or the profile failed.
    LoadFailed,
    /// A course progress update was rolled back.
    ProgressFailed,
    /// A material submission was rejected or failed.
    SubmissionFailed,
}

/// A single user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: Uuid,
    pub kind: NoticeKind,
    pub message: String,
    /// Time-to-live in milliseconds.
    pub ttl_ms: u64,
}

impl Notice {
    /// Creates a notice with a fresh id.
    pub fn new(kind: NoticeKind, message: impl Into<String>, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn sign_in_required(ttl: Duration) -> Self {
        Self::new(
            NoticeKind::SignInRequired,
            "Please sign in to save favorites",
            ttl,
        )
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

#[derive(Debug)]
struct Posted {
    notice: Notice,
    expires_at: Instant,
}

/// Collects notices and expires them.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    posted: Mutex<Vec<Posted>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows a notice from `now` until its ttl elapses.
    pub fn post(&self, notice: Notice, now: Instant) {
        let expires_at = now + notice.ttl();
        debug!(id = %notice.id, kind = ?notice.kind, "Notice posted");
        self.posted.lock().push(Posted { notice, expires_at });
    }

    /// Removes a notice. Returns whether it was still up.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut posted = self.posted.lock();
        let before = posted.len();
        posted.retain(|p| p.notice.id != id);
        before != posted.len()
    }

    /// Notices still visible at `now`, oldest first.
    pub fn active(&self, now: Instant) -> Vec<Notice> {
        self.posted
            .lock()
            .iter()
            .filter(|p| p.expires_at > now)
            .map(|p| p.notice.clone())
            .collect()
    }

    /// Drops expired notices. Returns how many were removed.
    pub fn prune(&self, now: Instant) -> usize {
        let mut posted = self.posted.lock();
        let before = posted.len();
        posted.retain(|p| p.expires_at > now);
        before - posted.len()
    }

    pub fn clear(&self) {
        self.posted.lock().clear();
    }

    /// Posts the notice carried by an event, if any.
    pub fn absorb(&self, event: &StoreEvent) -> bool {
        match event {
            StoreEvent::Notice(notice) => {
                self.post(notice.clone(), Instant::now());
                true
            }
            // A new session should not inherit the last user's messages.
            StoreEvent::SessionEnded { .. } => {
                self.clear();
                false
            }
            _ => false,
        }
    }

    /// Feeds the board from a subscription until the bus closes.
    pub fn follow(self: Arc<Self>, mut subscription: Subscription) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                self.absorb(&event);
            }
        })
    }
}
