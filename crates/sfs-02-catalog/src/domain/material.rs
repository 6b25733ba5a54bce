//! Study material entity.

use super::youtube::youtube_thumbnail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{ItemId, UserId};
use std::fmt;
use std::str::FromStr;

/// What kind of resource a material points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    /// Website or article.
    Link,
    Youtube,
    /// Uploaded PDF held in storage.
    Pdf,
    /// Google Doc or other hosted document.
    Document,
    /// Full course on an external LMS.
    Course,
}

impl MaterialType {
    pub const ALL: [MaterialType; 5] = [
        MaterialType::Link,
        MaterialType::Youtube,
        MaterialType::Pdf,
        MaterialType::Document,
        MaterialType::Course,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialType::Link => "link",
            MaterialType::Youtube => "youtube",
            MaterialType::Pdf => "pdf",
            MaterialType::Document => "document",
            MaterialType::Course => "course",
        }
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MaterialType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown material type: {s}"))
    }
}

/// Moderation state of a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of `study_materials`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: ItemId,
    /// Submitter.
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub material_type: MaterialType,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Public storage URL for uploaded files.
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub difficulties: Vec<String>,
    pub status: ReviewStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewer_notes: Option<String>,
    #[serde(default)]
    pub upvote_count: u64,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl Material {
    /// Preview image: derived for YouTube, stored otherwise.
    pub fn thumbnail(&self) -> Option<String> {
        match self.material_type {
            MaterialType::Youtube => self.url.as_deref().and_then(youtube_thumbnail),
            _ => self.thumbnail_url.clone(),
        }
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.user_id == user
    }

    /// Last path segment of the stored file, if any.
    pub fn stored_file_name(&self) -> Option<&str> {
        self.file_url
            .as_deref()
            .and_then(|url| url.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }
}

/// A record to insert into `study_materials`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMaterial {
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub material_type: MaterialType,
    pub title: String,
    pub url: Option<String>,
    pub file_url: Option<String>,
    pub description: Option<String>,
    pub subjects: Vec<String>,
    pub difficulties: Vec<String>,
    pub status: ReviewStatus,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewer_notes: Option<String>,
}

impl NewMaterial {
    /// Turns the record into a stored row.
    pub fn into_material(self, id: ItemId) -> Material {
        Material {
            id,
            user_id: self.user_id,
            material_type: self.material_type,
            title: self.title,
            url: self.url,
            file_url: self.file_url,
            description: self.description,
            subjects: self.subjects,
            difficulties: self.difficulties,
            status: self.status,
            submitted_at: self.submitted_at,
            reviewed_at: self.reviewed_at,
            reviewer_notes: self.reviewer_notes,
            upvote_count: 0,
            thumbnail_url: None,
        }
    }
}
