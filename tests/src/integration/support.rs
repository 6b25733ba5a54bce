//! Fixtures shared by the HTTP flows.

use serde_json::{json, Value};
use sfs_03_supabase::SupabaseConfig;
use sfs_runtime::{AppConfig, HostedContainer};
use shared_types::UserId;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration pointing at `server` with `user` signed in.
pub fn hosted_config(server: &MockServer, user: Option<&str>) -> AppConfig {
    let mut config = AppConfig {
        supabase: SupabaseConfig::new(server.uri(), "anon-key").with_access_token("user-jwt"),
        user: user.map(UserId::from),
        ..AppConfig::default()
    };
    config.set_timeout(Duration::from_secs(2));
    config
}

pub fn hosted(server: &MockServer, user: Option<&str>) -> (HostedContainer, AppConfig) {
    let config = hosted_config(server, user);
    let container = HostedContainer::connect(&config).expect("valid config");
    (container, config)
}

/// Any read not matched by a more specific mock answers with no rows.
pub async fn empty_reads(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .with_priority(10)
        .mount(server)
        .await;
}

pub fn material_row(id: u64, owner: &str, status: &str) -> Value {
    json!({
        "id": id,
        "user_id": owner,
        "type": "pdf",
        "title": format!("Study notes #{id}"),
        "url": null,
        "file_url": format!("https://x.supabase.co/storage/v1/object/public/study-materials/{owner}/{id}_notes.pdf"),
        "description": null,
        "subjects": ["Chemistry"],
        "difficulties": ["Intermediate"],
        "status": status,
        "submitted_at": "2024-09-01T12:00:00+00:00",
        "reviewed_at": null,
        "reviewer_notes": null,
        "upvote_count": 4,
        "thumbnail_url": null
    })
}

/// Polls until `done` holds; HTTP calls run on real time.
pub async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..200 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition never held");
}
