//! `MaterialRepository` over `study_materials` and the materials bucket.

use crate::client::{contains_all, eq, in_list, SupabaseClient};
use crate::error::SupabaseError;
use crate::memberships::{membership_table, MATERIALS_TABLE};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sfs_02_catalog::{FavoriteRecord, Material, MaterialFilter, MaterialRepository, NewMaterial, ReviewStatus};
use shared_types::{BackendError, ItemId, MembershipKind, UserId};
use tracing::{debug, info};

const NEWEST_FIRST: &str = "submitted_at.desc";
const OLDEST_FIRST: &str = "submitted_at.asc";

/// Query for approved materials narrowed by `filter`.
fn approved_query(filter: &MaterialFilter) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("select", "*".to_string()),
        ("status", eq(ReviewStatus::Approved)),
        ("order", NEWEST_FIRST.to_string()),
    ];
    if !filter.subjects.is_empty() {
        query.push(("subjects", contains_all(&filter.subjects)));
    }
    if !filter.difficulties.is_empty() {
        query.push(("difficulties", contains_all(&filter.difficulties)));
    }
    if let Some(material_type) = filter.material_type {
        query.push(("type", eq(material_type)));
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        query.push(("title", format!("ilike.*{term}*")));
    }
    query
}

fn single(mut rows: Vec<Material>, id: &ItemId) -> Result<Material, BackendError> {
    if rows.is_empty() {
        return Err(BackendError::NotFound(format!("material {id}")));
    }
    Ok(rows.swap_remove(0))
}

#[async_trait]
impl MaterialRepository for SupabaseClient {
    async fn list_approved(&self, filter: &MaterialFilter) -> Result<Vec<Material>, BackendError> {
        let rows = self.select(MATERIALS_TABLE, &approved_query(filter)).await?;
        Ok(rows)
    }

    async fn list_pending(&self) -> Result<Vec<Material>, BackendError> {
        let query = [
            ("select", "*".to_string()),
            ("status", eq(ReviewStatus::Pending)),
            ("order", OLDEST_FIRST.to_string()),
        ];
        Ok(self.select(MATERIALS_TABLE, &query).await?)
    }

    async fn list_by_owner(&self, user: &UserId) -> Result<Vec<Material>, BackendError> {
        let query = [
            ("select", "*".to_string()),
            ("user_id", eq(user)),
            ("order", NEWEST_FIRST.to_string()),
        ];
        Ok(self.select(MATERIALS_TABLE, &query).await?)
    }

    async fn get_material(&self, id: &ItemId) -> Result<Option<Material>, BackendError> {
        let query = [("select", "*".to_string()), ("id", eq(id))];
        let rows: Vec<Material> = self.select(MATERIALS_TABLE, &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn get_materials(&self, ids: &[ItemId]) -> Result<Vec<Material>, BackendError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = [
            ("select", "*".to_string()),
            ("id", in_list(ids)),
            ("status", eq(ReviewStatus::Approved)),
        ];
        Ok(self.select(MATERIALS_TABLE, &query).await?)
    }

    async fn insert_material(&self, record: NewMaterial) -> Result<Material, BackendError> {
        let rows: Vec<Material> = self.insert_returning(MATERIALS_TABLE, &[&record]).await?;
        let material = rows
            .into_iter()
            .next()
            .ok_or_else(|| SupabaseError::Decode("insert returned no row".into()))?;
        info!(id = %material.id, title = %material.title, "Material submitted");
        Ok(material)
    }

    async fn set_review(
        &self,
        id: &ItemId,
        status: ReviewStatus,
        notes: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Material, BackendError> {
        let body = json!({
            "status": status,
            "reviewed_at": reviewed_at,
            "reviewer_notes": notes,
        });
        let rows = self
            .update_returning(MATERIALS_TABLE, &[("id", eq(id))], &body)
            .await?;
        single(rows, id)
    }

    async fn delete_material(&self, id: &ItemId) -> Result<(), BackendError> {
        let rows: Vec<serde_json::Value> = self
            .delete_returning(MATERIALS_TABLE, &[("id", eq(id))])
            .await?;
        debug!(id = %id, deleted = rows.len(), "Material row deleted");
        Ok(())
    }

    async fn upload_file(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError> {
        let size = bytes.len();
        let url = self.upload(path, content_type, bytes).await?;
        debug!(path, size, "File uploaded");
        Ok(url)
    }

    async fn remove_files(&self, paths: &[String]) -> Result<(), BackendError> {
        if paths.is_empty() {
            return Ok(());
        }
        Ok(self.remove(paths).await?)
    }

    async fn list_favorite_records(&self, user: &UserId) -> Result<Vec<FavoriteRecord>, BackendError> {
        let (table, column) = membership_table(MembershipKind::FavoriteMaterial);
        let query = [
            ("select", format!("{column},favorited_at")),
            ("user_id", eq(user)),
            ("order", "favorited_at.desc".to_string()),
        ];
        Ok(self.select(table, &query).await?)
    }
}
