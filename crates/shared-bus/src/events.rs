//! # Store Events
//!
//! Everything the client core reports about session, membership and notice
//! changes flows through the bus as a `StoreEvent`.

use crate::notices::Notice;
use serde::{Deserialize, Serialize};
use shared_types::{ItemId, ItemState, MembershipKind, UserId};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreEvent {
    // =========================================================================
    // SESSION
    // =========================================================================
    /// A user signed in (or the signed-in user changed).
    SessionStarted { user: UserId },

    /// The session ended; all membership state was discarded.
    SessionEnded { user: Option<UserId> },

    // =========================================================================
    // MEMBERSHIPS
    // =========================================================================
    /// A bulk load replaced the local membership set for one kind.
    MembershipsLoaded {
        user: UserId,
        kind: MembershipKind,
        members: usize,
    },

    /// An optimistic toggle was applied locally and a remote write started.
    ToggleDispatched {
        kind: MembershipKind,
        item: ItemId,
        /// Membership the toggle is moving towards.
        target: bool,
    },

    /// One (kind, item) pair moved through the per-item state machine.
    ItemStateChanged {
        kind: MembershipKind,
        item: ItemId,
        from: ItemState,
        to: ItemState,
    },

    /// The remote write confirmed the optimistic state.
    ToggleCommitted {
        kind: MembershipKind,
        item: ItemId,
        member: bool,
        count: Option<u64>,
        latency_ms: u64,
    },

    /// A toggle was dropped because one was already in flight.
    ToggleIgnored { kind: MembershipKind, item: ItemId },

    /// The remote write failed and local state was restored.
    ToggleRolledBack {
        kind: MembershipKind,
        item: ItemId,
        member: bool,
        count: Option<u64>,
        reason: String,
        latency_ms: u64,
    },

    /// A course progress write was confirmed.
    ProgressCommitted {
        course: ItemId,
        progress: u8,
        latency_ms: u64,
    },

    /// A course progress write failed and the previous value was restored.
    ProgressRolledBack {
        course: ItemId,
        progress: u8,
        reason: String,
        latency_ms: u64,
    },

    // =========================================================================
    // NOTICES
    // =========================================================================
    /// Something the user should see (and may dismiss).
    Notice(Notice),
}

impl StoreEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::SessionStarted { .. } | Self::SessionEnded { .. } => EventTopic::Session,
            Self::MembershipsLoaded { .. }
            | Self::ItemStateChanged { .. }
            | Self::ToggleDispatched { .. }
            | Self::ToggleCommitted { .. }
            | Self::ToggleIgnored { .. }
            | Self::ToggleRolledBack { .. }
            | Self::ProgressCommitted { .. }
            | Self::ProgressRolledBack { .. } => EventTopic::Membership,
            Self::Notice(_) => EventTopic::Notice,
        }
    }

    /// The membership kind this event concerns, if any.
    #[must_use]
    pub fn kind(&self) -> Option<MembershipKind> {
        match self {
            Self::MembershipsLoaded { kind, .. }
            | Self::ToggleDispatched { kind, .. }
            | Self::ToggleCommitted { kind, .. }
            | Self::ToggleIgnored { kind, .. }
            | Self::ToggleRolledBack { kind, .. }
            | Self::ItemStateChanged { kind, .. } => Some(*kind),
            Self::ProgressCommitted { .. } | Self::ProgressRolledBack { .. } => {
                Some(MembershipKind::Enrollment)
            }
            _ => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// All events.
    All,
    /// Sign-in / sign-out.
    Session,
    /// Membership loads and toggles.
    Membership,
    /// User-visible notices.
    Notice,
}

/// Filter for event subscriptions.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Membership kinds to include. Empty means all kinds.
    pub kinds: Vec<MembershipKind>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            kinds: Vec::new(),
        }
    }

    /// Restrict membership events to the given kinds.
    #[must_use]
    pub fn with_kinds(mut self, kinds: Vec<MembershipKind>) -> Self {
        self.kinds = kinds;
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &StoreEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let kind_match = match event.kind() {
            Some(kind) => self.kinds.is_empty() || self.kinds.contains(&kind),
            None => true,
        };

        topic_match && kind_match
    }
}
