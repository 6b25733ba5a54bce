//! # Outbound Ports
//!
//! Storage of material rows, uploaded files and favorite records.

use crate::domain::{FavoriteRecord, Material, MaterialFilter, NewMaterial, ReviewStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{BackendError, ItemId, UserId};

/// The `study_materials` table plus its storage bucket.
#[async_trait]
pub trait MaterialRepository: Send + Sync {
    /// Approved materials matching `filter`, newest submission first.
    async fn list_approved(&self, filter: &MaterialFilter) -> Result<Vec<Material>, BackendError>;

    /// Materials awaiting review, oldest submission first.
    async fn list_pending(&self) -> Result<Vec<Material>, BackendError>;

    /// Everything `user` submitted, newest first.
    async fn list_by_owner(&self, user: &UserId) -> Result<Vec<Material>, BackendError>;

    async fn get_material(&self, id: &ItemId) -> Result<Option<Material>, BackendError>;

    /// Approved materials among `ids`.
    async fn get_materials(&self, ids: &[ItemId]) -> Result<Vec<Material>, BackendError>;

    async fn insert_material(&self, record: NewMaterial) -> Result<Material, BackendError>;

    /// Sets the review outcome and returns the updated row.
    async fn set_review(
        &self,
        id: &ItemId,
        status: ReviewStatus,
        notes: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Material, BackendError>;

    async fn delete_material(&self, id: &ItemId) -> Result<(), BackendError>;

    /// Stores a file without overwriting; returns its public URL.
    async fn upload_file(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError>;

    async fn remove_files(&self, paths: &[String]) -> Result<(), BackendError>;

    /// `user`'s favorite rows, newest first.
    async fn list_favorite_records(&self, user: &UserId) -> Result<Vec<FavoriteRecord>, BackendError>;
}
