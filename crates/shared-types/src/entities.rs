//! # Core Domain Entities
//!
//! Identifiers and relationship kinds shared by every crate in the workspace.
//!
//! ## Clusters
//!
//! - **Identity**: `UserId`, `Session`
//! - **Items**: `ItemId` (materials and courses are both opaque items)
//! - **Relationships**: `MembershipKind`

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Identifier of an authenticated user (the auth provider's user uuid).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Creates a user identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// An authenticated session as handed over by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The signed-in user.
    pub user_id: UserId,
    /// Email reported by the auth provider, if any.
    pub email: Option<String>,
}

impl Session {
    /// Creates a session for a user without profile details.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            email: None,
        }
    }
}

// =============================================================================
// CLUSTER B: ITEMS
// =============================================================================

/// Opaque identifier of a toggle-able item (study material or course).
///
/// The backend hands these out either as JSON strings or as integers
/// depending on the table, so deserialization accepts both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Creates an item identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => ItemId(s),
            Raw::Unsigned(n) => ItemId(n.to_string()),
            Raw::Signed(n) => ItemId(n.to_string()),
        })
    }
}

// =============================================================================
// CLUSTER C: RELATIONSHIPS
// =============================================================================

/// A boolean user-item relationship tracked in a membership set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipKind {
    /// User bookmarked a study material.
    FavoriteMaterial,
    /// User upvoted a study material. Backed by `upvote_count`.
    UpvoteMaterial,
    /// User bookmarked a course.
    FavoriteCourse,
    /// User is enrolled in a course.
    Enrollment,
}

impl MembershipKind {
    /// Every kind, in load order.
    pub const ALL: [MembershipKind; 4] = [
        MembershipKind::FavoriteMaterial,
        MembershipKind::UpvoteMaterial,
        MembershipKind::FavoriteCourse,
        MembershipKind::Enrollment,
    ];

    /// Stable name used in logs, metrics labels and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipKind::FavoriteMaterial => "favorite_material",
            MembershipKind::UpvoteMaterial => "upvote_material",
            MembershipKind::FavoriteCourse => "favorite_course",
            MembershipKind::Enrollment => "enrollment",
        }
    }

    /// Whether the kind carries a per-item aggregate counter.
    pub fn is_counter_backed(&self) -> bool {
        matches!(self, MembershipKind::UpvoteMaterial)
    }
}

impl fmt::Display for MembershipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "favorite_material" | "favorite" => Ok(MembershipKind::FavoriteMaterial),
            "upvote_material" | "upvote" => Ok(MembershipKind::UpvoteMaterial),
            "favorite_course" => Ok(MembershipKind::FavoriteCourse),
            "enrollment" | "enroll" => Ok(MembershipKind::Enrollment),
            other => Err(format!("unknown membership kind: {other}")),
        }
    }
}
