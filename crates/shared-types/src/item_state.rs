//! Per-item state machine.
//!
//! ```text
//!            Loaded
//! [UNKNOWN] ────────→ [ABSENT] ──toggle──→ [PENDING_ADD] ──ok──→ [PRESENT]
//!     │                  ↑                      │                    │
//!     │ toggle           └──────── fail ────────┘                    │
//!     ↓                                                              │
//! [PENDING_ADD]     [ABSENT] ←──ok── [PENDING_REMOVE] ←──toggle──────┘
//!                                          │
//!                                          └── fail ──→ [PRESENT]
//! ```
//!
//! A toggle issued before the bulk load resolves assumes "not a member".
//! A network timeout is delivered as `WriteFailed`. A failure returns to
//! the steady state the item had before the toggle, or to what a reload
//! reported while the write was in flight.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of one (item, kind) pair as seen by the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemState {
    /// Bulk load not resolved and no local evidence of membership.
    #[default]
    Unknown,
    /// Steady: not a member.
    Absent,
    /// Steady: member.
    Present,
    /// Optimistically added, remote write in flight.
    PendingAdd,
    /// Optimistically removed, remote write in flight.
    PendingRemove,
}

/// Events that drive `ItemState`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemEvent {
    /// The bulk load resolved with this membership.
    Loaded { member: bool },
    /// The user asked to flip membership.
    Toggled,
    /// The remote write succeeded (or converged through a conflict).
    WriteSucceeded,
    /// The remote write failed or timed out. `restore` is the membership
    /// to fall back to.
    WriteFailed { restore: bool },
    /// The session ended.
    SessionEnded,
}

impl ItemState {
    /// Steady state for a membership flag.
    pub fn steady(member: bool) -> Self {
        if member {
            ItemState::Present
        } else {
            ItemState::Absent
        }
    }

    /// In-flight state for a toggle heading towards `target`.
    pub fn pending(target: bool) -> Self {
        if target {
            ItemState::PendingAdd
        } else {
            ItemState::PendingRemove
        }
    }

    /// What the UI should render. Pending states show their target.
    pub fn is_member(self) -> bool {
        matches!(self, ItemState::Present | ItemState::PendingAdd)
    }

    pub fn is_pending(self) -> bool {
        matches!(self, ItemState::PendingAdd | ItemState::PendingRemove)
    }

    /// Successor state, or `None` if the event is not legal here.
    pub fn next(self, event: ItemEvent) -> Option<ItemState> {
        use ItemEvent::*;
        use ItemState::*;

        match (self, event) {
            (_, SessionEnded) => Some(Unknown),

            (Unknown | Absent | Present, Loaded { member }) => Some(Self::steady(member)),
            // In-flight writes outlive a reload.
            (PendingAdd | PendingRemove, Loaded { .. }) => Some(self),

            (Unknown | Absent, Toggled) => Some(PendingAdd),
            (Present, Toggled) => Some(PendingRemove),
            (PendingAdd | PendingRemove, Toggled) => None,

            (PendingAdd, WriteSucceeded) => Some(Present),
            (PendingRemove, WriteSucceeded) => Some(Absent),
            (PendingAdd | PendingRemove, WriteFailed { restore }) => Some(Self::steady(restore)),
            (Unknown | Absent | Present, WriteSucceeded | WriteFailed { .. }) => None,
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemState::Unknown => "unknown",
            ItemState::Absent => "absent",
            ItemState::Present => "present",
            ItemState::PendingAdd => "pending-add",
            ItemState::PendingRemove => "pending-remove",
        };
        f.write_str(name)
    }
}
