//! # Catalog Flows
//!
//! `CatalogService` over `SupabaseClient` against a mocked PostgREST and
//! Storage API.
//!
//! ```text
//! submit ──→ POST /storage/v1/object/… ──→ POST /rest/v1/study_materials
//!                                               │ fails
//!                                               └──→ DELETE /storage/v1/object/… (cleanup)
//! ```

#[cfg(test)]
mod tests {
    use crate::integration::support::{empty_reads, hosted, material_row};
    use serde_json::json;
    use sfs_01_memberships::ToggleOutcome;
    use sfs_02_catalog::{CatalogError, MaterialDraft, MaterialType, ReviewStatus, UploadFile};
    use shared_bus::NoticeKind;
    use shared_types::{ItemId, MembershipKind, UserId};
    use std::collections::HashSet;
    use wiremock::matchers::{body_json, header, method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const UPLOAD_PATH: &str = r"^/storage/v1/object/study-materials/u1/\d+_[a-z0-9]{6}\.pdf$";

    fn pdf_draft() -> MaterialDraft {
        let mut draft = MaterialDraft::new(MaterialType::Pdf, "Stoichiometry worksheet");
        draft.subjects = vec!["Chemistry".into()];
        draft.difficulties = vec!["Intermediate".into()];
        draft.file = Some(UploadFile {
            name: "worksheet.pdf".into(),
            content_type: "application/pdf".into(),
            bytes: b"%PDF-1.7 worksheet".to_vec(),
        });
        draft
    }

    async fn mount_upload(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path_regex(UPLOAD_PATH))
            .and(header("x-upsert", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "study-materials/u1/upload.pdf" })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_pdf_submission_uploads_then_inserts_pending_row() {
        let server = MockServer::start().await;
        mount_upload(&server).await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/study_materials"))
            .and(header("prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([material_row(31, "u1", "pending")])))
            .expect(1)
            .mount(&server)
            .await;

        let (container, _) = hosted(&server, Some("u1"));
        let material = container
            .catalog
            .submit(Some(&UserId::from("u1")), pdf_draft())
            .await
            .unwrap();
        assert_eq!(material.id, ItemId::from("31"));
        assert_eq!(material.status, ReviewStatus::Pending);
    }

    #[tokio::test]
    async fn test_failed_insert_removes_orphaned_upload() {
        let server = MockServer::start().await;
        mount_upload(&server).await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/study_materials"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "23514",
                "message": "new row violates check constraint"
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/study-materials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let (container, _) = hosted(&server, Some("u1"));
        let err = container
            .catalog
            .submit(Some(&UserId::from("u1")), pdf_draft())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Backend(_)));

        let notices = container.active_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::SubmissionFailed);
    }

    #[tokio::test]
    async fn test_invalid_draft_touches_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let (container, _) = hosted(&server, Some("u1"));
        let mut draft = pdf_draft();
        draft.file = None;
        draft.subjects.clear();

        match container.catalog.submit(Some(&UserId::from("u1")), draft).await {
            Err(CatalogError::Validation(errors)) => {
                assert!(errors.file.is_some());
                assert!(errors.subjects.is_some());
            }
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_owner_delete_removes_file_then_row() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/study_materials"))
            .and(query_param("id", "eq.9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([material_row(9, "u1", "approved")])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/study-materials"))
            .and(body_json(json!({ "prefixes": ["u1/9_notes.pdf"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/study_materials"))
            .and(query_param("id", "eq.9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([material_row(9, "u1", "approved")])))
            .expect(1)
            .mount(&server)
            .await;

        let (container, _) = hosted(&server, Some("u1"));
        container
            .catalog
            .delete(&ItemId::from("9"), &UserId::from("u1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_is_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/study_materials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([material_row(9, "u2", "approved")])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let (container, _) = hosted(&server, Some("u1"));
        let err = container
            .catalog
            .delete(&ItemId::from("9"), &UserId::from("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_review_of_unknown_material_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/study_materials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let (container, _) = hosted(&server, None);
        let err = container
            .catalog
            .reject(&ItemId::from("404"), Some("duplicate".into()))
            .await
            .unwrap_err();
        assert_eq!(err, CatalogError::NotFound(ItemId::from("404")));
    }

    #[tokio::test]
    async fn test_favorites_page_follows_optimistic_removal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_favorited_materials"))
            .and(query_param("select", "material_id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "material_id": 4 },
                { "material_id": 1 }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_favorited_materials"))
            .and(query_param("select", "material_id,favorited_at"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "material_id": 4, "favorited_at": "2024-10-02T08:00:00+00:00" },
                { "material_id": 1, "favorited_at": "2024-10-01T08:00:00+00:00" }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/study_materials"))
            .and(query_param("status", "eq.approved"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                material_row(1, "u2", "approved"),
                material_row(4, "u2", "approved")
            ])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/user_favorited_materials"))
            .and(query_param("material_id", "eq.1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "material_id": 1 }])))
            .mount(&server)
            .await;
        empty_reads(&server).await;

        let (container, config) = hosted(&server, Some("u1"));
        container.start_session(&config).await;
        let user = UserId::from("u1");
        let fav = MembershipKind::FavoriteMaterial;

        let live: HashSet<ItemId> = container.memberships.members(fav).into_iter().collect();
        let page = container.catalog.favorites_page(&user, &live, None).await.unwrap();
        let ids: Vec<&ItemId> = page.iter().map(|e| &e.material.id).collect();
        assert_eq!(ids, vec![&ItemId::from("4"), &ItemId::from("1")]);

        let outcome = container.memberships.toggle(fav, ItemId::from("1")).await;
        assert!(matches!(outcome, ToggleOutcome::Committed(_)));

        let live: HashSet<ItemId> = container.memberships.members(fav).into_iter().collect();
        let page = container.catalog.favorites_page(&user, &live, None).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].material.id, ItemId::from("4"));
    }
}
