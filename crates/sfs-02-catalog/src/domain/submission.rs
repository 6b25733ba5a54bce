//! Material submission drafts and their validation.

use super::material::{MaterialType, NewMaterial, ReviewStatus};
use super::youtube::is_valid_youtube_url;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::UserId;
use std::fmt;

/// Content type required for uploaded documents.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Storage bucket for uploaded files.
pub const DEFAULT_BUCKET: &str = "study-materials";

/// A file attached to a draft.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Extension after the last dot, or the whole name if there is none.
    pub fn extension(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// What the upload form collects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialDraft {
    pub material_type: MaterialType,
    pub title: String,
    pub url: String,
    pub description: String,
    pub subjects: Vec<String>,
    pub difficulties: Vec<String>,
    pub file: Option<UploadFile>,
}

impl MaterialDraft {
    pub fn new(material_type: MaterialType, title: impl Into<String>) -> Self {
        Self {
            material_type,
            title: title.into(),
            url: String::new(),
            description: String::new(),
            subjects: Vec::new(),
            difficulties: Vec::new(),
            file: None,
        }
    }

    /// Checks every field and reports all problems at once.
    pub fn validate(&self) -> Result<(), SubmissionErrors> {
        let mut errors = SubmissionErrors::default();

        if self.title.trim().is_empty() {
            errors.title = Some("Title is required".into());
        }

        let is_pdf = self.material_type == MaterialType::Pdf;
        let url = self.url.trim();
        if !is_pdf && url.is_empty() {
            errors.url = Some("URL is required".into());
        }
        if self.material_type == MaterialType::Youtube && !url.is_empty() && !is_valid_youtube_url(url) {
            errors.url = Some("Please enter a valid YouTube URL".into());
        }

        if is_pdf {
            match &self.file {
                None => errors.file = Some("Please upload a PDF file".into()),
                Some(file) if file.content_type != PDF_CONTENT_TYPE => {
                    errors.file = Some("Please upload a PDF file".into())
                }
                Some(_) => {}
            }
        }

        if self.subjects.is_empty() {
            errors.subjects = Some("Please select at least one subject".into());
        }
        if self.difficulties.is_empty() {
            errors.difficulties = Some("Please select at least one difficulty level".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Builds the pending row. `file_url` is the public URL of an already
    /// uploaded file.
    pub fn into_record(self, user: UserId, file_url: Option<String>, now: DateTime<Utc>) -> NewMaterial {
        let url = if self.material_type == MaterialType::Pdf || self.url.trim().is_empty() {
            file_url.clone()
        } else {
            Some(self.url.trim().to_string())
        };
        let description = Some(self.description.trim().to_string()).filter(|d| !d.is_empty());

        NewMaterial {
            user_id: user,
            material_type: self.material_type,
            title: self.title.trim().to_string(),
            url,
            file_url,
            description,
            subjects: self.subjects,
            difficulties: self.difficulties,
            status: ReviewStatus::Pending,
            submitted_at: now,
            reviewed_at: None,
            reviewer_notes: None,
        }
    }
}

/// Per-field validation messages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionErrors {
    pub title: Option<String>,
    pub url: Option<String>,
    pub file: Option<String>,
    pub subjects: Option<String>,
    pub difficulties: Option<String>,
}

impl SubmissionErrors {
    pub fn is_empty(&self) -> bool {
        self.messages().is_empty()
    }

    /// (field, message) pairs in form order.
    pub fn messages(&self) -> Vec<(&'static str, &str)> {
        [
            ("title", &self.title),
            ("url", &self.url),
            ("file", &self.file),
            ("subjects", &self.subjects),
            ("difficulties", &self.difficulties),
        ]
        .into_iter()
        .filter_map(|(field, msg)| msg.as_deref().map(|m| (field, m)))
        .collect()
    }
}

impl fmt::Display for SubmissionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .messages()
            .into_iter()
            .map(|(field, msg)| format!("{field}: {msg}"))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Object path for an upload: `{user}/{millis}_{suffix}.{ext}`.
pub fn storage_path(user: &UserId, file: &UploadFile, millis: i64, suffix: &str) -> String {
    format!("{}/{}_{}.{}", user, millis, suffix, file.extension())
}
