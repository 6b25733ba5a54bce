//! Core domain entities: membership sets, counters and snapshots.

use serde::{Deserialize, Serialize};
use shared_types::{ItemId, ItemState, MembershipKind, UserId};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Default bound on a single remote write or load.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Items the current user has flagged for one kind.
///
/// INVARIANT: no duplicates; insert/remove are idempotent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MembershipSet {
    items: HashSet<ItemId>,
}

impl MembershipSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.items.contains(item)
    }

    /// Returns true if the item was newly added.
    pub fn insert(&mut self, item: ItemId) -> bool {
        self.items.insert(item)
    }

    /// Returns true if the item was present.
    pub fn remove(&mut self, item: &ItemId) -> bool {
        self.items.remove(item)
    }

    /// Sets membership to `member`, whatever it was before.
    pub fn set(&mut self, item: ItemId, member: bool) {
        if member {
            self.items.insert(item);
        } else {
            self.items.remove(&item);
        }
    }

    /// Replaces the whole set.
    pub fn replace(&mut self, items: HashSet<ItemId>) {
        self.items = items;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.items.iter()
    }

    /// Members in a stable order.
    pub fn sorted(&self) -> Vec<ItemId> {
        let mut items: Vec<_> = self.items.iter().cloned().collect();
        items.sort();
        items
    }
}

impl FromIterator<ItemId> for MembershipSet {
    fn from_iter<T: IntoIterator<Item = ItemId>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Cached per-item aggregate counts (e.g. upvotes).
///
/// INVARIANT: counts never go below zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CounterMap {
    counts: HashMap<ItemId, u64>,
}

impl CounterMap {
    pub fn get(&self, item: &ItemId) -> Option<u64> {
        self.counts.get(item).copied()
    }

    pub fn set(&mut self, item: ItemId, count: u64) {
        self.counts.insert(item, count);
    }

    /// Restores a previously observed value; `None` forgets the item.
    pub fn restore(&mut self, item: &ItemId, count: Option<u64>) {
        match count {
            Some(c) => {
                self.counts.insert(item.clone(), c);
            }
            None => {
                self.counts.remove(item);
            }
        }
    }

    /// Moves a known count by one, saturating at zero. Unknown items stay
    /// unknown.
    pub fn adjust(&mut self, item: &ItemId, up: bool) -> Option<u64> {
        let count = self.counts.get_mut(item)?;
        *count = if up {
            count.saturating_add(1)
        } else {
            count.saturating_sub(1)
        };
        Some(*count)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Whether a kind's bulk load has resolved for the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoadStatus {
    #[default]
    Unloaded,
    Loaded,
    Failed,
}

/// Point-in-time view of one (item, kind) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub kind: MembershipKind,
    pub item: ItemId,
    pub state: ItemState,
    /// What the UI should render.
    pub member: bool,
    /// Counter value for counter-backed kinds, if known.
    pub count: Option<u64>,
}

/// Highest course progress value (percent complete).
pub const MAX_PROGRESS: u8 = 100;

/// Profile row of the signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl UserProfile {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            full_name: None,
            email: None,
            display_name: None,
        }
    }

    /// Best name to greet the user with.
    pub fn greeting_name(&self) -> &str {
        [&self.display_name, &self.full_name, &self.email]
            .into_iter()
            .filter_map(|name| name.as_deref())
            .find(|name| !name.trim().is_empty())
            .unwrap_or(self.id.as_str())
    }
}

/// Tunables for the membership service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipConfig {
    /// Bound on one remote write or load; expiry counts as a failure.
    pub remote_timeout: Duration,
    /// How long failure notices stay up.
    pub notice_ttl: Duration,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            notice_ttl: shared_bus::DEFAULT_NOTICE_TTL,
        }
    }
}
