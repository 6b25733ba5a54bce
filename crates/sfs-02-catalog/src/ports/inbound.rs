//! # Inbound Port - CatalogApi
//!
//! | Method | Caller |
//! |--------|--------|
//! | `approved_materials`, `search`, `by_category` | Browsing views |
//! | `submit`, `user_submissions`, `delete` | Signed-in submitters |
//! | `pending_materials`, `approve`, `reject` | Reviewers |
//! | `favorites_page` | Favorites view |

use crate::domain::{CatalogError, FavoriteEntry, Material, MaterialDraft, MaterialFilter};
use async_trait::async_trait;
use shared_types::{ItemId, UserId};
use std::collections::HashSet;

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn approved_materials(&self, filter: &MaterialFilter) -> Result<Vec<Material>, CatalogError>;

    async fn search(&self, term: &str) -> Result<Vec<Material>, CatalogError>;

    async fn by_category(&self, slug: &str) -> Result<Vec<Material>, CatalogError>;

    async fn submit(&self, user: Option<&UserId>, draft: MaterialDraft) -> Result<Material, CatalogError>;

    async fn pending_materials(&self) -> Result<Vec<Material>, CatalogError>;

    async fn approve(&self, id: &ItemId, notes: Option<String>) -> Result<Material, CatalogError>;

    async fn reject(&self, id: &ItemId, notes: Option<String>) -> Result<Material, CatalogError>;

    async fn user_submissions(&self, user: &UserId) -> Result<Vec<Material>, CatalogError>;

    async fn delete(&self, id: &ItemId, user: &UserId) -> Result<(), CatalogError>;

    async fn favorites_page(
        &self,
        user: &UserId,
        live: &HashSet<ItemId>,
        search: Option<&str>,
    ) -> Result<Vec<FavoriteEntry>, CatalogError>;
}
