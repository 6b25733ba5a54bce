//! Favorites page assembly.

use super::filter::matches_search;
use super::material::Material;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::ItemId;
use std::collections::{HashMap, HashSet};

/// A row of `user_favorited_materials`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub material_id: ItemId,
    pub favorited_at: DateTime<Utc>,
}

/// A material as shown on the favorites page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FavoriteEntry {
    #[serde(flatten)]
    pub material: Material,
    pub favorited_at: DateTime<Utc>,
}

/// Joins favorite records with materials, newest favorite first.
///
/// Materials no longer in `live` (removed optimistically since the records
/// were fetched) are dropped. `search` then narrows the result.
pub fn assemble_favorites(
    records: &[FavoriteRecord],
    materials: Vec<Material>,
    live: &HashSet<ItemId>,
    search: Option<&str>,
) -> Vec<FavoriteEntry> {
    let favorited_at: HashMap<&ItemId, DateTime<Utc>> = records
        .iter()
        .map(|r| (&r.material_id, r.favorited_at))
        .collect();

    let mut entries: Vec<FavoriteEntry> = materials
        .into_iter()
        .filter(|m| live.contains(&m.id))
        .filter(|m| search.map_or(true, |term| term.is_empty() || matches_search(m, term)))
        .filter_map(|material| {
            let at = *favorited_at.get(&material.id)?;
            Some(FavoriteEntry {
                material,
                favorited_at: at,
            })
        })
        .collect();

    entries.sort_by(|a, b| b.favorited_at.cmp(&a.favorited_at));
    entries
}
