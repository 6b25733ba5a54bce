//! Catalog service tests against the in-memory repository.

use super::*;
use crate::adapters::InMemoryMaterialRepository;
use crate::ports::MaterialRepository;
use crate::domain::{
    CatalogError, Material, MaterialDraft, MaterialFilter, MaterialType, ReviewStatus, UploadFile,
    PDF_CONTENT_TYPE,
};
use chrono::{Duration, TimeZone, Utc};
use shared_bus::{EventFilter, InMemoryEventBus, NoticeKind, StoreEvent};
use shared_types::{BackendError, ItemId, UserId};
use std::collections::HashSet;
use std::sync::Arc;

fn setup() -> (Arc<InMemoryMaterialRepository>, Arc<InMemoryEventBus>, CatalogService<InMemoryMaterialRepository>) {
    let repo = Arc::new(InMemoryMaterialRepository::new());
    let bus = Arc::new(InMemoryEventBus::new());
    let service = CatalogService::new(repo.clone(), bus.clone(), CatalogConfig::default());
    (repo, bus, service)
}

fn approved(id: &str, title: &str, subjects: &[&str], hours_ago: i64) -> Material {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Material {
        id: ItemId::from(id),
        user_id: UserId::from("owner"),
        material_type: MaterialType::Link,
        title: title.into(),
        url: Some(format!("https://example.com/{id}")),
        file_url: None,
        description: None,
        subjects: subjects.iter().map(|s| s.to_string()).collect(),
        difficulties: vec!["Beginner".into()],
        status: ReviewStatus::Approved,
        submitted_at: base - Duration::hours(hours_ago),
        reviewed_at: None,
        reviewer_notes: None,
        upvote_count: 0,
        thumbnail_url: None,
    }
}

fn link_draft(title: &str) -> MaterialDraft {
    let mut draft = MaterialDraft::new(MaterialType::Link, title);
    draft.url = "https://example.com/notes".into();
    draft.subjects = vec!["Math".into()];
    draft.difficulties = vec!["Beginner".into()];
    draft
}

#[tokio::test]
async fn test_listing_newest_first_with_filters() {
    let (repo, _, service) = setup();
    repo.seed(approved("old", "Algebra basics", &["Math"], 48));
    repo.seed(approved("new", "Geometry proofs", &["Math"], 1));
    repo.seed(approved("bio", "Cell biology", &["Biology"], 5));

    let all = service.approved_materials(&MaterialFilter::default()).await.unwrap();
    let ids: Vec<_> = all.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "bio", "old"]);

    let math = MaterialFilter {
        subjects: vec!["Math".into()],
        search: Some("geo".into()),
        ..Default::default()
    };
    let hits = service.approved_materials(&math).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, ItemId::from("new"));
}

#[tokio::test]
async fn test_search_and_category() {
    let (repo, _, service) = setup();
    repo.seed(approved("cs", "Intro to Rust", &["Computer Science"], 1));
    repo.seed(approved("hist", "World War notes", &["History"], 2));

    assert_eq!(service.search("rust").await.unwrap().len(), 1);
    assert_eq!(service.search("HISTORY").await.unwrap()[0].id, ItemId::from("hist"));
    assert_eq!(service.by_category("computer-science").await.unwrap()[0].id, ItemId::from("cs"));
    assert!(service.by_category("music").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_requires_sign_in() {
    let (_, bus, service) = setup();
    let mut sub = bus.subscribe(EventFilter::all());

    let err = service.submit(None, link_draft("Notes")).await.unwrap_err();
    assert_eq!(err, CatalogError::SignInRequired);
    assert!(matches!(
        sub.drain().as_slice(),
        [StoreEvent::Notice(n)] if n.kind == NoticeKind::SignInRequired
    ));
}

#[tokio::test]
async fn test_invalid_draft_is_rejected_before_any_write() {
    let (repo, _, service) = setup();
    let user = UserId::from("u1");
    let draft = MaterialDraft::new(MaterialType::Pdf, "");

    let err = service.submit(Some(&user), draft).await.unwrap_err();
    match err {
        CatalogError::Validation(errors) => {
            assert!(errors.title.is_some());
            assert!(errors.file.is_some());
            assert!(errors.url.is_none());
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(repo.file_paths().is_empty());
    assert!(service.pending_materials().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pdf_submission_uploads_then_inserts_pending() {
    let (repo, _, service) = setup();
    let user = UserId::from("u1");
    let mut draft = MaterialDraft::new(MaterialType::Pdf, "Chem notes");
    draft.subjects = vec!["Chemistry".into()];
    draft.difficulties = vec!["Advanced".into()];
    draft.file = Some(UploadFile {
        name: "chem.pdf".into(),
        content_type: PDF_CONTENT_TYPE.into(),
        bytes: b"%PDF".to_vec(),
    });

    let material = service.submit(Some(&user), draft).await.unwrap();
    assert_eq!(material.status, ReviewStatus::Pending);
    assert_eq!(material.url, material.file_url);

    let paths = repo.file_paths();
    assert_eq!(paths.len(), 1);
    assert!(paths[0].starts_with("u1/"));
    assert!(paths[0].ends_with(".pdf"));

    let pending = service.pending_materials().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert!(service.approved_materials(&MaterialFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_insert_cleans_upload_and_posts_notice() {
    let (repo, bus, service) = setup();
    let mut sub = bus.subscribe(EventFilter::all());
    repo.fail_inserts(Some(BackendError::Transport("offline".into())));

    let mut draft = MaterialDraft::new(MaterialType::Pdf, "Notes");
    draft.subjects = vec!["Math".into()];
    draft.difficulties = vec!["Beginner".into()];
    draft.file = Some(UploadFile {
        name: "n.pdf".into(),
        content_type: PDF_CONTENT_TYPE.into(),
        bytes: vec![1, 2, 3],
    });

    let err = service.submit(Some(&UserId::from("u1")), draft).await.unwrap_err();
    assert!(matches!(err, CatalogError::Backend(BackendError::Transport(_))));
    assert!(repo.file_paths().is_empty());
    assert!(sub.drain().iter().any(
        |e| matches!(e, StoreEvent::Notice(n) if n.kind == NoticeKind::SubmissionFailed)
    ));
}

#[tokio::test]
async fn test_review_flow() {
    let (_, _, service) = setup();
    let user = UserId::from("u1");
    let first = service.submit(Some(&user), link_draft("First")).await.unwrap();
    let second = service.submit(Some(&user), link_draft("Second")).await.unwrap();

    let approved = service.approve(&first.id, Some("Great".into())).await.unwrap();
    assert_eq!(approved.status, ReviewStatus::Approved);
    assert!(approved.reviewed_at.is_some());
    assert_eq!(approved.reviewer_notes.as_deref(), Some("Great"));

    let rejected = service.reject(&second.id, None).await.unwrap();
    assert_eq!(rejected.status, ReviewStatus::Rejected);

    assert!(service.pending_materials().await.unwrap().is_empty());
    assert_eq!(service.approved_materials(&MaterialFilter::default()).await.unwrap().len(), 1);
    assert_eq!(service.user_submissions(&user).await.unwrap().len(), 2);

    let missing = service.approve(&ItemId::from("nope"), None).await.unwrap_err();
    assert_eq!(missing, CatalogError::NotFound(ItemId::from("nope")));
}

#[tokio::test]
async fn test_only_owner_deletes() {
    let (repo, _, service) = setup();
    let owner = UserId::from("owner");
    let mut material = approved("m1", "Notes", &["Math"], 1);
    material.file_url = Some("memory://study-materials/owner/1_abc.pdf".into());
    repo.seed(material);
    repo.upload_file("owner/1_abc.pdf", PDF_CONTENT_TYPE, vec![0]).await.unwrap();

    let err = service.delete(&ItemId::from("m1"), &UserId::from("intruder")).await.unwrap_err();
    assert!(matches!(err, CatalogError::Forbidden { .. }));

    service.delete(&ItemId::from("m1"), &owner).await.unwrap();
    assert!(repo.file_paths().is_empty());
    assert_eq!(
        service.delete(&ItemId::from("m1"), &owner).await.unwrap_err(),
        CatalogError::NotFound(ItemId::from("m1"))
    );
}

#[tokio::test]
async fn test_favorites_page_respects_live_set() {
    let (repo, _, service) = setup();
    let user = UserId::from("u1");
    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    repo.seed(approved("a", "Alpha", &["Math"], 3));
    repo.seed(approved("b", "Beta", &["Math"], 2));
    repo.record_favorite(&user, ItemId::from("a"), t0);
    repo.record_favorite(&user, ItemId::from("b"), t0 + Duration::minutes(5));

    let live: HashSet<ItemId> = ["a", "b"].into_iter().map(ItemId::from).collect();
    let page = service.favorites_page(&user, &live, None).await.unwrap();
    let ids: Vec<_> = page.iter().map(|e| e.material.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);

    // "b" was just un-favorited optimistically.
    let live: HashSet<ItemId> = [ItemId::from("a")].into_iter().collect();
    let page = service.favorites_page(&user, &live, None).await.unwrap();
    assert_eq!(page.len(), 1);

    assert!(service.favorites_page(&user, &HashSet::new(), None).await.unwrap().is_empty());
}
