//! In-memory material repository for offline use and tests.

use crate::domain::{FavoriteRecord, Material, MaterialFilter, NewMaterial, ReviewStatus};
use crate::ports::MaterialRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use shared_types::{BackendError, ItemId, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

const PUBLIC_BASE: &str = "memory://study-materials";

#[derive(Default)]
pub struct InMemoryMaterialRepository {
    materials: Mutex<Vec<Material>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    favorites: Mutex<HashMap<UserId, Vec<FavoriteRecord>>>,
    next_id: AtomicU64,
    fail_inserts: Mutex<Option<BackendError>>,
}

impl InMemoryMaterialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a row as-is. Later inserts get ids above any numeric seeded id.
    pub fn seed(&self, material: Material) {
        if let Ok(n) = material.id.0.parse::<u64>() {
            self.next_id.fetch_max(n, Ordering::SeqCst);
        }
        self.materials.lock().push(material);
    }

    pub fn record_favorite(&self, user: &UserId, material: ItemId, at: DateTime<Utc>) {
        self.favorites
            .lock()
            .entry(user.clone())
            .or_default()
            .push(FavoriteRecord {
                material_id: material,
                favorited_at: at,
            });
    }

    pub fn file_paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.files.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn fail_inserts(&self, error: Option<BackendError>) {
        *self.fail_inserts.lock() = error;
    }

    fn by_status(&self, status: ReviewStatus) -> Vec<Material> {
        self.materials
            .lock()
            .iter()
            .filter(|m| m.status == status)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MaterialRepository for InMemoryMaterialRepository {
    async fn list_approved(&self, filter: &MaterialFilter) -> Result<Vec<Material>, BackendError> {
        let mut materials = self.by_status(ReviewStatus::Approved);
        materials.retain(|m| filter.matches(m));
        materials.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(materials)
    }

    async fn list_pending(&self) -> Result<Vec<Material>, BackendError> {
        let mut materials = self.by_status(ReviewStatus::Pending);
        materials.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(materials)
    }

    async fn list_by_owner(&self, user: &UserId) -> Result<Vec<Material>, BackendError> {
        Ok(self
            .materials
            .lock()
            .iter()
            .filter(|m| &m.user_id == user)
            .cloned()
            .collect())
    }

    async fn get_material(&self, id: &ItemId) -> Result<Option<Material>, BackendError> {
        Ok(self.materials.lock().iter().find(|m| &m.id == id).cloned())
    }

    async fn get_materials(&self, ids: &[ItemId]) -> Result<Vec<Material>, BackendError> {
        Ok(self
            .materials
            .lock()
            .iter()
            .filter(|m| m.status == ReviewStatus::Approved && ids.contains(&m.id))
            .cloned()
            .collect())
    }

    async fn insert_material(&self, record: NewMaterial) -> Result<Material, BackendError> {
        if let Some(err) = self.fail_inserts.lock().clone() {
            return Err(err);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let material = record.into_material(ItemId::from(id));
        self.materials.lock().push(material.clone());
        Ok(material)
    }

    async fn set_review(
        &self,
        id: &ItemId,
        status: ReviewStatus,
        notes: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Material, BackendError> {
        let mut materials = self.materials.lock();
        let material = materials
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("study_materials {id}")))?;
        material.status = status;
        material.reviewed_at = Some(reviewed_at);
        material.reviewer_notes = notes;
        Ok(material.clone())
    }

    async fn delete_material(&self, id: &ItemId) -> Result<(), BackendError> {
        self.materials.lock().retain(|m| &m.id != id);
        Ok(())
    }

    async fn upload_file(
        &self,
        path: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError> {
        let mut files = self.files.lock();
        if files.contains_key(path) {
            return Err(BackendError::Conflict(format!("object {path} already exists")));
        }
        files.insert(path.to_string(), bytes);
        Ok(format!("{PUBLIC_BASE}/{path}"))
    }

    async fn remove_files(&self, paths: &[String]) -> Result<(), BackendError> {
        let mut files = self.files.lock();
        for path in paths {
            files.remove(path);
        }
        Ok(())
    }

    async fn list_favorite_records(&self, user: &UserId) -> Result<Vec<FavoriteRecord>, BackendError> {
        let mut records = self.favorites.lock().get(user).cloned().unwrap_or_default();
        records.sort_by(|a, b| b.favorited_at.cmp(&a.favorited_at));
        Ok(records)
    }
}
