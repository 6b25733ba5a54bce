//! Listing filters and free-text search.

use super::material::{Material, MaterialType};
use super::vocab::subject_for_category;
use serde::{Deserialize, Serialize};

/// Filters applied to the approved listing.
///
/// `subjects` and `difficulties` are "contains all": a material must carry
/// every listed value. `search` is a case-insensitive title substring.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialFilter {
    pub subjects: Vec<String>,
    pub difficulties: Vec<String>,
    pub material_type: Option<MaterialType>,
    pub search: Option<String>,
}

impl MaterialFilter {
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
            && self.difficulties.is_empty()
            && self.material_type.is_none()
            && self.search.as_deref().map_or(true, str::is_empty)
    }

    pub fn matches(&self, material: &Material) -> bool {
        let has_all = |wanted: &[String], have: &[String]| wanted.iter().all(|w| have.contains(w));

        has_all(&self.subjects, &material.subjects)
            && has_all(&self.difficulties, &material.difficulties)
            && self
                .material_type
                .map_or(true, |t| t == material.material_type)
            && self
                .search
                .as_deref()
                .map_or(true, |term| contains_ci(&material.title, term))
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Whether `term` appears in the title, description or any subject.
pub fn matches_search(material: &Material, term: &str) -> bool {
    let term = term.to_lowercase();
    material.title.to_lowercase().contains(&term)
        || material
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&term))
        || material
            .subjects
            .iter()
            .any(|s| s.to_lowercase().contains(&term))
}

/// Materials matching a free-text search.
pub fn search_materials<'a>(materials: &'a [Material], term: &str) -> Vec<&'a Material> {
    materials.iter().filter(|m| matches_search(m, term)).collect()
}

/// Materials in a sidebar category: a subject equal to the mapped subject
/// name, or containing the slug itself.
pub fn filter_by_category<'a>(materials: &'a [Material], slug: &str) -> Vec<&'a Material> {
    let subject = subject_for_category(slug).to_lowercase();
    let slug = slug.to_lowercase();
    materials
        .iter()
        .filter(|m| {
            m.subjects.iter().any(|s| {
                let s = s.to_lowercase();
                s == subject || s.contains(&slug)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::material::ReviewStatus;
    use chrono::Utc;
    use shared_types::{ItemId, UserId};

    fn material(id: &str, title: &str, subjects: &[&str], difficulties: &[&str]) -> Material {
        Material {
            id: ItemId::from(id),
            user_id: UserId::from("owner"),
            material_type: MaterialType::Link,
            title: title.into(),
            url: Some("https://example.com".into()),
            file_url: None,
            description: None,
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            difficulties: difficulties.iter().map(|s| s.to_string()).collect(),
            status: ReviewStatus::Approved,
            submitted_at: Utc::now(),
            reviewed_at: None,
            reviewer_notes: None,
            upvote_count: 0,
            thumbnail_url: None,
        }
    }

    #[test]
    fn test_contains_all_semantics() {
        let m = material("1", "Calculus", &["Math", "AP Courses"], &["Advanced"]);
        let mut filter = MaterialFilter {
            subjects: vec!["Math".into()],
            ..Default::default()
        };
        assert!(filter.matches(&m));

        filter.subjects.push("Physics".into());
        assert!(!filter.matches(&m));
    }

    #[test]
    fn test_title_search_ignores_case() {
        let m = material("1", "Organic Chemistry Notes", &["Chemistry"], &["Beginner"]);
        let filter = MaterialFilter {
            search: Some("chemistry".into()),
            ..Default::default()
        };
        assert!(filter.matches(&m));
        assert!(MaterialFilter::default().is_empty());
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_search_covers_description_and_subjects() {
        let mut a = material("a", "Flashcards", &["Biology"], &[]);
        a.description = Some("Cell structure review".into());
        let b = material("b", "Essay tips", &["English"], &[]);
        let all = vec![a, b];

        assert_eq!(search_materials(&all, "CELL").len(), 1);
        assert_eq!(search_materials(&all, "bio")[0].id, ItemId::from("a"));
        assert_eq!(search_materials(&all, "eng")[0].id, ItemId::from("b"));
    }

    #[test]
    fn test_category_uses_mapped_subject() {
        let all = vec![
            material("cs", "Rust intro", &["Computer Science"], &[]),
            material("sci", "Lab safety", &["Science"], &[]),
        ];
        let hits = filter_by_category(&all, "computer-science");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, ItemId::from("cs"));

        // "science" is contained in "Computer Science" too.
        assert_eq!(filter_by_category(&all, "science").len(), 2);
    }
}
