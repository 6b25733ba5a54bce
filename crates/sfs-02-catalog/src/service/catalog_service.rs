//! Catalog Service - browsing, submission, review and favorites.

use crate::domain::{
    assemble_favorites, filter_by_category, search_materials, storage_path, CatalogError,
    FavoriteEntry, Material, MaterialDraft, MaterialFilter, ReviewStatus,
};
use crate::ports::{CatalogApi, MaterialRepository};
use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use shared_bus::{EventPublisher, Notice, NoticeKind, StoreEvent, DEFAULT_NOTICE_TTL};
use shared_types::{ItemId, UserId};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Length of the random part of an upload's object name.
const UPLOAD_SUFFIX_LEN: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogConfig {
    /// How long submission failure notices stay up.
    pub notice_ttl: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }
}

pub struct CatalogService<R: MaterialRepository> {
    repo: Arc<R>,
    publisher: Arc<dyn EventPublisher>,
    config: CatalogConfig,
}

impl<R: MaterialRepository> Clone for CatalogService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            publisher: Arc::clone(&self.publisher),
            config: self.config.clone(),
        }
    }
}

impl<R: MaterialRepository> CatalogService<R> {
    pub fn new(repo: Arc<R>, publisher: Arc<dyn EventPublisher>, config: CatalogConfig) -> Self {
        Self {
            repo,
            publisher,
            config,
        }
    }

    // === BROWSING ===

    /// Approved materials, newest first.
    pub async fn approved_materials(
        &self,
        filter: &MaterialFilter,
    ) -> Result<Vec<Material>, CatalogError> {
        let mut materials = self.repo.list_approved(filter).await?;
        materials.retain(|m| m.status == ReviewStatus::Approved && filter.matches(m));
        materials.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        debug!(count = materials.len(), "Approved materials listed");
        Ok(materials)
    }

    /// Approved materials whose title, description or subjects mention `term`.
    pub async fn search(&self, term: &str) -> Result<Vec<Material>, CatalogError> {
        let all = self.approved_materials(&MaterialFilter::default()).await?;
        Ok(search_materials(&all, term).into_iter().cloned().collect())
    }

    pub async fn by_category(&self, slug: &str) -> Result<Vec<Material>, CatalogError> {
        let all = self.approved_materials(&MaterialFilter::default()).await?;
        Ok(filter_by_category(&all, slug).into_iter().cloned().collect())
    }

    // === SUBMISSION ===

    /// Validates, uploads the attached file and stores a pending row.
    pub async fn submit(
        &self,
        user: Option<&UserId>,
        draft: MaterialDraft,
    ) -> Result<Material, CatalogError> {
        let Some(user) = user else {
            self.publisher
                .publish(StoreEvent::Notice(Notice::sign_in_required(self.config.notice_ttl)))
                .await;
            return Err(CatalogError::SignInRequired);
        };
        draft.validate().map_err(CatalogError::Validation)?;

        let mut uploaded = None;
        if let Some(file) = &draft.file {
            let path = storage_path(user, file, Utc::now().timestamp_millis(), &upload_suffix());
            debug!(user = %user, path = %path, size = file.bytes.len(), "Uploading file");
            match self
                .repo
                .upload_file(&path, &file.content_type, file.bytes.clone())
                .await
            {
                Ok(url) => uploaded = Some((path, url)),
                Err(err) => {
                    warn!(user = %user, error = %err, "File upload failed");
                    self.submission_failed().await;
                    return Err(err.into());
                }
            }
        }

        let file_url = uploaded.as_ref().map(|(_, url)| url.clone());
        let record = draft.into_record(user.clone(), file_url, Utc::now());
        match self.repo.insert_material(record).await {
            Ok(material) => {
                info!(user = %user, material = %material.id, kind = %material.material_type, "Material submitted for review");
                Ok(material)
            }
            Err(err) => {
                warn!(user = %user, error = %err, "Material insert failed");
                if let Some((path, _)) = uploaded {
                    if let Err(cleanup) = self.repo.remove_files(&[path]).await {
                        warn!(user = %user, error = %cleanup, "Orphaned upload not removed");
                    }
                }
                self.submission_failed().await;
                Err(err.into())
            }
        }
    }

    async fn submission_failed(&self) {
        let notice = Notice::new(
            NoticeKind::SubmissionFailed,
            "Failed to submit material. Please try again.",
            self.config.notice_ttl,
        );
        self.publisher.publish(StoreEvent::Notice(notice)).await;
    }

    pub async fn user_submissions(&self, user: &UserId) -> Result<Vec<Material>, CatalogError> {
        let mut materials = self.repo.list_by_owner(user).await?;
        materials.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(materials)
    }

    /// Deletes a material the user owns, stored file first.
    pub async fn delete(&self, id: &ItemId, user: &UserId) -> Result<(), CatalogError> {
        let material = self
            .repo
            .get_material(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

        if !material.is_owned_by(user) {
            warn!(user = %user, material = %id, owner = %material.user_id, "Delete refused");
            return Err(CatalogError::Forbidden {
                material: id.clone(),
                user: user.clone(),
            });
        }

        if let Some(name) = material.stored_file_name() {
            self.repo.remove_files(&[format!("{user}/{name}")]).await?;
        }
        self.repo.delete_material(id).await?;
        info!(user = %user, material = %id, "Material deleted");
        Ok(())
    }

    // === REVIEW ===

    /// Materials awaiting review, oldest first.
    pub async fn pending_materials(&self) -> Result<Vec<Material>, CatalogError> {
        let mut materials = self.repo.list_pending().await?;
        materials.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(materials)
    }

    pub async fn approve(&self, id: &ItemId, notes: Option<String>) -> Result<Material, CatalogError> {
        self.review(id, ReviewStatus::Approved, notes).await
    }

    pub async fn reject(&self, id: &ItemId, notes: Option<String>) -> Result<Material, CatalogError> {
        self.review(id, ReviewStatus::Rejected, notes).await
    }

    async fn review(
        &self,
        id: &ItemId,
        status: ReviewStatus,
        notes: Option<String>,
    ) -> Result<Material, CatalogError> {
        let material = self
            .repo
            .set_review(id, status, notes, Utc::now())
            .await
            .map_err(|err| match err {
                shared_types::BackendError::NotFound(_) => CatalogError::NotFound(id.clone()),
                other => CatalogError::Backend(other),
            })?;
        info!(material = %id, status = %status, "Material reviewed");
        Ok(material)
    }

    // === FAVORITES ===

    /// Favorited approved materials, newest favorite first. `live` is the
    /// current favorite set, which may be ahead of the stored records.
    pub async fn favorites_page(
        &self,
        user: &UserId,
        live: &HashSet<ItemId>,
        search: Option<&str>,
    ) -> Result<Vec<FavoriteEntry>, CatalogError> {
        if live.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.repo.list_favorite_records(user).await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<ItemId> = records.iter().map(|r| r.material_id.clone()).collect();
        let materials = self.repo.get_materials(&ids).await?;
        Ok(assemble_favorites(&records, materials, live, search))
    }
}

fn upload_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(UPLOAD_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

#[async_trait]
impl<R: MaterialRepository> CatalogApi for CatalogService<R> {
    async fn approved_materials(&self, filter: &MaterialFilter) -> Result<Vec<Material>, CatalogError> {
        Self::approved_materials(self, filter).await
    }

    async fn search(&self, term: &str) -> Result<Vec<Material>, CatalogError> {
        Self::search(self, term).await
    }

    async fn by_category(&self, slug: &str) -> Result<Vec<Material>, CatalogError> {
        Self::by_category(self, slug).await
    }

    async fn submit(&self, user: Option<&UserId>, draft: MaterialDraft) -> Result<Material, CatalogError> {
        Self::submit(self, user, draft).await
    }

    async fn pending_materials(&self) -> Result<Vec<Material>, CatalogError> {
        Self::pending_materials(self).await
    }

    async fn approve(&self, id: &ItemId, notes: Option<String>) -> Result<Material, CatalogError> {
        Self::approve(self, id, notes).await
    }

    async fn reject(&self, id: &ItemId, notes: Option<String>) -> Result<Material, CatalogError> {
        Self::reject(self, id, notes).await
    }

    async fn user_submissions(&self, user: &UserId) -> Result<Vec<Material>, CatalogError> {
        Self::user_submissions(self, user).await
    }

    async fn delete(&self, id: &ItemId, user: &UserId) -> Result<(), CatalogError> {
        Self::delete(self, id, user).await
    }

    async fn favorites_page(
        &self,
        user: &UserId,
        live: &HashSet<ItemId>,
        search: Option<&str>,
    ) -> Result<Vec<FavoriteEntry>, CatalogError> {
        Self::favorites_page(self, user, live, search).await
    }
}
