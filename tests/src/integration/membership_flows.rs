//! # Membership Flows
//!
//! The optimistic toggle end to end: `MembershipService` →
//! `SupabaseClient` → PostgREST (mocked), with notices read back from the
//! container's notice board.
//!
//! ## Properties Covered
//!
//! 1. Toggle twice returns to the starting state
//! 2. A second toggle while the first is in flight sends no request
//! 3. A failed write restores the flag and the counter
//! 4. Loaded set {A, C}: toggle B then A gives {B, C}
//! 5. A new user never sees the previous user's flags
//! 6. A duplicate insert converges to present without a notice
//! 7. A failed progress PATCH restores the loaded progress

#[cfg(test)]
mod tests {
    use crate::integration::support::{empty_reads, hosted, hosted_config, wait_until};
    use serde_json::json;
    use sfs_01_memberships::{ItemState, ProgressOutcome, ToggleOutcome};
    use sfs_runtime::HostedContainer;
    use shared_bus::NoticeKind;
    use shared_types::{ItemId, MembershipKind, UserId};
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FAVORITES: &str = "/rest/v1/user_favorited_materials";
    const UPVOTES: &str = "/rest/v1/user_upvoted_materials";
    const ENROLLMENTS: &str = "/rest/v1/user_enrolled_courses";
    const FAV: MembershipKind = MembershipKind::FavoriteMaterial;

    fn id(s: &str) -> ItemId {
        ItemId::from(s)
    }

    async fn mount_insert(server: &MockServer, table: &str, status: u16, expected: u64) {
        Mock::given(method("POST"))
            .and(path(table))
            .respond_with(ResponseTemplate::new(status))
            .expect(expected)
            .mount(server)
            .await;
    }

    async fn mount_delete(server: &MockServer, table: &str, row: serde_json::Value) {
        Mock::given(method("DELETE"))
            .and(path(table))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
            .mount(server)
            .await;
    }

    // =========================================================================
    // PROPERTY 1: ROUND TRIP
    // =========================================================================

    #[tokio::test]
    async fn test_toggle_round_trip_over_http() {
        let server = MockServer::start().await;
        empty_reads(&server).await;
        mount_insert(&server, FAVORITES, 201, 1).await;
        mount_delete(&server, FAVORITES, json!({ "user_id": "u1", "material_id": "x" })).await;

        let (container, config) = hosted(&server, Some("u1"));
        container.start_session(&config).await;

        let first = container.memberships.toggle(FAV, id("x")).await;
        assert!(matches!(first, ToggleOutcome::Committed(ref s) if s.state == ItemState::Present));

        let second = container.memberships.toggle(FAV, id("x")).await;
        assert!(matches!(second, ToggleOutcome::Committed(ref s) if s.state == ItemState::Absent));
        assert!(container.active_notices().is_empty());
    }

    // =========================================================================
    // PROPERTY 2: ONE WRITE PER PENDING TOGGLE
    // =========================================================================

    #[tokio::test]
    async fn test_double_toggle_sends_one_request() {
        let server = MockServer::start().await;
        empty_reads(&server).await;
        Mock::given(method("POST"))
            .and(path(FAVORITES))
            .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_millis(300)))
            .expect(1)
            .mount(&server)
            .await;

        let (container, config) = hosted(&server, Some("u1"));
        container.start_session(&config).await;

        let service = container.memberships.clone();
        let first = tokio::spawn(async move { service.toggle(FAV, id("x")).await });
        wait_until(|| container.memberships.pending_count() == 1).await;

        let second = container.memberships.toggle(FAV, id("x")).await;
        assert!(matches!(second, ToggleOutcome::Ignored(ref s) if s.state == ItemState::PendingAdd));

        assert!(matches!(first.await.unwrap(), ToggleOutcome::Committed(_)));
        assert!(container.memberships.is_member(FAV, &id("x")));
    }

    // =========================================================================
    // PROPERTY 3: FULL ROLLBACK
    // =========================================================================

    #[tokio::test]
    async fn test_server_error_rolls_back_flag_and_counter() {
        let server = MockServer::start().await;
        empty_reads(&server).await;
        Mock::given(method("POST"))
            .and(path(UPVOTES))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "code": "XX000",
                "message": "internal error"
            })))
            .mount(&server)
            .await;

        let (container, config) = hosted(&server, Some("u1"));
        container.start_session(&config).await;
        container
            .memberships
            .seed_counters(MembershipKind::UpvoteMaterial, [(id("m1"), 7)]);

        let outcome = container
            .memberships
            .toggle(MembershipKind::UpvoteMaterial, id("m1"))
            .await;
        match outcome {
            ToggleOutcome::RolledBack { snapshot, .. } => {
                assert_eq!(snapshot.state, ItemState::Absent);
                assert_eq!(snapshot.count, Some(7));
            }
            other => panic!("expected rollback, got {other:?}"),
        }
        assert_eq!(
            container.memberships.count(MembershipKind::UpvoteMaterial, &id("m1")),
            Some(7)
        );

        let notices = container.active_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::ToggleFailed);
        assert_eq!(notices[0].message, "Failed to update upvote");
    }

    #[tokio::test]
    async fn test_slow_server_counts_as_failure() {
        let server = MockServer::start().await;
        empty_reads(&server).await;
        Mock::given(method("POST"))
            .and(path(FAVORITES))
            .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let mut config = hosted_config(&server, Some("u1"));
        config.set_timeout(Duration::from_millis(200));
        let container = HostedContainer::connect(&config).unwrap();
        container.start_session(&config).await;

        let outcome = container.memberships.toggle(FAV, id("x")).await;
        assert!(matches!(outcome, ToggleOutcome::RolledBack { ref snapshot, .. } if !snapshot.member));
        assert!(!container.memberships.is_member(FAV, &id("x")));
        assert_eq!(container.memberships.pending_count(), 0);
    }

    // =========================================================================
    // PROPERTY 4: TOGGLES ON A LOADED SET
    // =========================================================================

    #[tokio::test]
    async fn test_toggles_on_loaded_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FAVORITES))
            .and(query_param("user_id", "eq.u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "material_id": "A" },
                { "material_id": "C" }
            ])))
            .mount(&server)
            .await;
        empty_reads(&server).await;
        Mock::given(method("POST"))
            .and(path(FAVORITES))
            .and(body_json(json!({ "user_id": "u1", "material_id": "B" })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(FAVORITES))
            .and(query_param("material_id", "eq.A"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "user_id": "u1", "material_id": "A" }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (container, config) = hosted(&server, Some("u1"));
        let report = container.start_session(&config).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(container.memberships.members(FAV), vec![id("A"), id("C")]);

        container.memberships.toggle(FAV, id("B")).await;
        assert_eq!(container.memberships.members(FAV), vec![id("A"), id("B"), id("C")]);

        container.memberships.toggle(FAV, id("A")).await;
        assert_eq!(container.memberships.members(FAV), vec![id("B"), id("C")]);
    }

    // =========================================================================
    // PROPERTY 5: USER SWITCH
    // =========================================================================

    #[tokio::test]
    async fn test_user_switch_never_leaks_flags() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FAVORITES))
            .and(query_param("user_id", "eq.u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "material_id": "A" }])))
            .mount(&server)
            .await;
        empty_reads(&server).await;

        let (container, config) = hosted(&server, Some("u1"));
        container.start_session(&config).await;
        assert_eq!(container.memberships.members(FAV), vec![id("A")]);

        container.memberships.sign_out().await;
        let mut second = config.clone();
        second.user = Some(UserId::from("u2"));
        container.start_session(&second).await;

        assert!(container.memberships.members(FAV).is_empty());
        assert!(!container.memberships.is_member(FAV, &id("A")));
    }

    // =========================================================================
    // PROPERTY 6: CONFLICT IS SUCCESS
    // =========================================================================

    #[tokio::test]
    async fn test_duplicate_insert_is_silent_success() {
        let server = MockServer::start().await;
        empty_reads(&server).await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/user_enrolled_courses"))
            .and(header("authorization", "Bearer user-jwt"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint \"user_enrolled_courses_pkey\""
            })))
            .mount(&server)
            .await;

        let (container, config) = hosted(&server, Some("u1"));
        container.start_session(&config).await;

        let outcome = container
            .memberships
            .toggle(MembershipKind::Enrollment, id("intro-bio"))
            .await;
        assert!(matches!(outcome, ToggleOutcome::Committed(ref s) if s.state == ItemState::Present));
        assert!(container.active_notices().is_empty());
    }

    // =========================================================================
    // PROPERTY 7: PROGRESS ROLLBACK
    // =========================================================================

    #[tokio::test]
    async fn test_failed_progress_patch_restores_loaded_value() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENROLLMENTS))
            .and(query_param("select", "course_id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "course_id": "c1" }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(ENROLLMENTS))
            .and(query_param("select", "course_id,progress"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "course_id": "c1", "progress": 30 }])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "u1", "full_name": "Grace Hopper" }
            ])))
            .mount(&server)
            .await;
        empty_reads(&server).await;
        Mock::given(method("PATCH"))
            .and(path(ENROLLMENTS))
            .and(query_param("course_id", "eq.c1"))
            .and(body_json(json!({ "progress": 80 })))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "code": "XX000",
                "message": "internal error"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (container, config) = hosted(&server, Some("u1"));
        let report = container.start_session(&config).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(container.memberships.course_progress(&id("c1")), 30);
        assert_eq!(
            container.memberships.profile().map(|p| p.greeting_name().to_string()),
            Some("Grace Hopper".to_string())
        );

        let outcome = container.memberships.set_course_progress(id("c1"), 80).await;
        assert!(matches!(outcome, ProgressOutcome::RolledBack { progress: 30, .. }));
        assert_eq!(container.memberships.course_progress(&id("c1")), 30);

        let notices = container.active_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::ProgressFailed);
    }

    // =========================================================================
    // SESSION
    // =========================================================================

    #[tokio::test]
    async fn test_signed_out_toggle_sends_nothing() {
        let server = MockServer::start().await;
        mount_insert(&server, FAVORITES, 201, 0).await;

        let (container, config) = hosted(&server, None);
        assert!(container.start_session(&config).await.is_none());

        let outcome = container.memberships.toggle(FAV, id("x")).await;
        assert_eq!(outcome, ToggleOutcome::SignInRequired);
        let notices = container.active_notices();
        assert_eq!(notices[0].kind, NoticeKind::SignInRequired);
    }

    #[tokio::test]
    async fn test_expired_token_fails_only_that_load() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_favorited_courses"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "PGRST301",
                "message": "JWT expired"
            })))
            .mount(&server)
            .await;
        empty_reads(&server).await;

        let (container, config) = hosted(&server, Some("u1"));
        let report = container.start_session(&config).await.unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, MembershipKind::FavoriteCourse);
        assert_eq!(report.loaded.len(), 3);

        let notices = container.active_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::LoadFailed);
    }
}
