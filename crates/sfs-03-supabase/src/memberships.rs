//! `MembershipBackend` over the four membership tables.

use crate::client::{eq, in_list, SupabaseClient};
use crate::error::SupabaseError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use sfs_01_memberships::{MembershipBackend, UserProfile, WriteOutcome, MAX_PROGRESS};
use shared_types::{BackendError, ItemId, MembershipKind, UserId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Table that backs the upvote counter.
pub const MATERIALS_TABLE: &str = "study_materials";

/// Table holding display names for signed-in users.
pub const PROFILES_TABLE: &str = "user_profiles";

/// Table and item column for a membership kind.
pub fn membership_table(kind: MembershipKind) -> (&'static str, &'static str) {
    match kind {
        MembershipKind::FavoriteMaterial => ("user_favorited_materials", "material_id"),
        MembershipKind::UpvoteMaterial => ("user_upvoted_materials", "material_id"),
        MembershipKind::FavoriteCourse => ("user_favorited_courses", "course_id"),
        MembershipKind::Enrollment => ("user_enrolled_courses", "course_id"),
    }
}

#[derive(Deserialize)]
struct CounterRow {
    id: ItemId,
    #[serde(default)]
    upvote_count: Option<u64>,
}

#[derive(Deserialize)]
struct ProgressRow {
    course_id: ItemId,
    #[serde(default)]
    progress: Option<f64>,
}

/// Progress is stored as a plain number; anything outside 0..=100 is clamped.
fn percent(raw: Option<f64>) -> u8 {
    match raw {
        Some(value) if value.is_finite() => value.round().clamp(0.0, f64::from(MAX_PROGRESS)) as u8,
        _ => 0,
    }
}

#[async_trait]
impl MembershipBackend for SupabaseClient {
    async fn insert_membership(
        &self,
        user: &UserId,
        kind: MembershipKind,
        item: &ItemId,
    ) -> Result<WriteOutcome, BackendError> {
        let (table, column) = membership_table(kind);
        let mut row = Map::new();
        row.insert("user_id".into(), Value::String(user.0.clone()));
        row.insert(column.into(), Value::String(item.0.clone()));

        match self.insert(table, &row).await {
            Ok(()) => Ok(WriteOutcome::Applied),
            Err(err) if err.is_conflict() => {
                debug!(table, item = %item, "Row already present");
                Ok(WriteOutcome::Conflict)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_membership(
        &self,
        user: &UserId,
        kind: MembershipKind,
        item: &ItemId,
    ) -> Result<WriteOutcome, BackendError> {
        let (table, column) = membership_table(kind);
        let query = [("user_id", eq(user)), (column, eq(item))];
        let deleted: Vec<Value> = self.delete_returning(table, &query).await?;
        if deleted.is_empty() {
            debug!(table, item = %item, "Row already absent");
            Ok(WriteOutcome::Conflict)
        } else {
            Ok(WriteOutcome::Applied)
        }
    }

    async fn list_memberships(
        &self,
        user: &UserId,
        kind: MembershipKind,
    ) -> Result<HashSet<ItemId>, BackendError> {
        let (table, column) = membership_table(kind);
        let query = [("select", column.to_string()), ("user_id", eq(user))];
        let rows: Vec<Map<String, Value>> = self.select(table, &query).await?;

        rows.into_iter()
            .map(|mut row| -> Result<ItemId, BackendError> {
                let value = row
                    .remove(column)
                    .ok_or_else(|| SupabaseError::Decode(format!("row without {column}")))?;
                serde_json::from_value::<ItemId>(value)
                    .map_err(|e| SupabaseError::Decode(e.to_string()).into())
            })
            .collect()
    }

    async fn list_counters(
        &self,
        kind: MembershipKind,
        items: &[ItemId],
    ) -> Result<HashMap<ItemId, u64>, BackendError> {
        if !kind.is_counter_backed() || items.is_empty() {
            return Ok(HashMap::new());
        }
        let query = [
            ("select", "id,upvote_count".to_string()),
            ("id", in_list(items)),
        ];
        let rows: Vec<CounterRow> = self.select(MATERIALS_TABLE, &query).await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.id, row.upvote_count.unwrap_or(0)))
            .collect())
    }

    async fn list_progress(&self, user: &UserId) -> Result<HashMap<ItemId, u8>, BackendError> {
        let (table, _) = membership_table(MembershipKind::Enrollment);
        let query = [("select", "course_id,progress".to_string()), ("user_id", eq(user))];
        let rows: Vec<ProgressRow> = self.select(table, &query).await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.course_id, percent(row.progress)))
            .collect())
    }

    async fn update_progress(
        &self,
        user: &UserId,
        course: &ItemId,
        progress: u8,
    ) -> Result<(), BackendError> {
        let (table, column) = membership_table(MembershipKind::Enrollment);
        let query = [("user_id", eq(user)), (column, eq(course))];
        let body = serde_json::json!({ "progress": progress.min(MAX_PROGRESS) });
        let updated: Vec<Value> = self.update_returning(table, &query, &body).await?;
        if updated.is_empty() {
            return Err(BackendError::NotFound(format!("enrollment in {course}")));
        }
        Ok(())
    }

    async fn get_profile(&self, user: &UserId) -> Result<Option<UserProfile>, BackendError> {
        let query = [
            ("select", "id,full_name,email,display_name".to_string()),
            ("id", eq(user)),
        ];
        let mut rows: Vec<UserProfile> = self.select(PROFILES_TABLE, &query).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SupabaseConfig;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> SupabaseClient {
        let config = SupabaseConfig::new(server.uri(), "anon-key").with_access_token("user-jwt");
        SupabaseClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_insert_sends_row_with_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/user_favorited_materials"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer user-jwt"))
            .and(header("prefer", "return=minimal"))
            .and(body_json(json!({ "user_id": "u1", "material_id": "42" })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server)
            .await
            .insert_membership(&UserId::from("u1"), MembershipKind::FavoriteMaterial, &ItemId::from("42"))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Applied);
    }

    #[tokio::test]
    async fn test_unique_violation_is_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/user_enrolled_courses"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint"
            })))
            .mount(&server)
            .await;

        let outcome = client(&server)
            .await
            .insert_membership(&UserId::from("u1"), MembershipKind::Enrollment, &ItemId::from("c9"))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Conflict);
    }

    #[tokio::test]
    async fn test_delete_of_missing_row_is_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/user_upvoted_materials"))
            .and(query_param("user_id", "eq.u1"))
            .and(query_param("material_id", "eq.7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let outcome = client(&server)
            .await
            .delete_membership(&UserId::from("u1"), MembershipKind::UpvoteMaterial, &ItemId::from("7"))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Conflict);
    }

    #[tokio::test]
    async fn test_list_accepts_numeric_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_favorited_courses"))
            .and(query_param("select", "course_id"))
            .and(query_param("user_id", "eq.u1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "course_id": 3 }, { "course_id": "intro-bio" }])),
            )
            .mount(&server)
            .await;

        let items = client(&server)
            .await
            .list_memberships(&UserId::from("u1"), MembershipKind::FavoriteCourse)
            .await
            .unwrap();
        let expected: HashSet<ItemId> = [ItemId::from("3"), ItemId::from("intro-bio")].into_iter().collect();
        assert_eq!(items, expected);
    }

    #[tokio::test]
    async fn test_counters_for_upvotes_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/study_materials"))
            .and(query_param("select", "id,upvote_count"))
            .and(query_param("id", r#"in.("1","2")"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "upvote_count": 5 },
                { "id": 2, "upvote_count": null }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        let ids = [ItemId::from("1"), ItemId::from("2")];
        let counts = client
            .list_counters(MembershipKind::UpvoteMaterial, &ids)
            .await
            .unwrap();
        assert_eq!(counts.get(&ItemId::from("1")), Some(&5));
        assert_eq!(counts.get(&ItemId::from("2")), Some(&0));

        let none = client
            .list_counters(MembershipKind::FavoriteMaterial, &ids)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_expired_token_maps_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "PGRST301",
                "message": "JWT expired"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .list_memberships(&UserId::from("u1"), MembershipKind::FavoriteMaterial)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unauthorized(ref m) if m.contains("JWT expired")));
    }

    #[tokio::test]
    async fn test_progress_rows_are_clamped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_enrolled_courses"))
            .and(query_param("select", "course_id,progress"))
            .and(query_param("user_id", "eq.u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "course_id": "c1", "progress": 42.6 },
                { "course_id": "c2", "progress": null },
                { "course_id": 3, "progress": 180 }
            ])))
            .mount(&server)
            .await;

        let progress = client(&server)
            .await
            .list_progress(&UserId::from("u1"))
            .await
            .unwrap();
        assert_eq!(progress.get(&ItemId::from("c1")), Some(&43));
        assert_eq!(progress.get(&ItemId::from("c2")), Some(&0));
        assert_eq!(progress.get(&ItemId::from("3")), Some(&100));
    }

    #[tokio::test]
    async fn test_progress_patch_targets_enrollment_row() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/user_enrolled_courses"))
            .and(query_param("user_id", "eq.u1"))
            .and(query_param("course_id", "eq.c1"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!({ "progress": 60 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "user_id": "u1", "course_id": "c1", "progress": 60 }
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(query_param("course_id", "eq.c2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let user = UserId::from("u1");
        client.update_progress(&user, &ItemId::from("c1"), 60).await.unwrap();

        let err = client
            .update_progress(&user, &ItemId::from("c2"), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_profile_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_profiles"))
            .and(query_param("id", "eq.u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "u1", "full_name": "Ada Lovelace", "email": "ada@example.edu" }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_profiles"))
            .and(query_param("id", "eq.u2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let profile = client.get_profile(&UserId::from("u1")).await.unwrap().unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(profile.display_name, None);
        assert!(client.get_profile(&UserId::from("u2")).await.unwrap().is_none());
    }
}
