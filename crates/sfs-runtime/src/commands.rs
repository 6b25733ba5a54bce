//! Executes parsed CLI commands against a container.
//!
//! Every command answers with a JSON value; notices raised on the way are
//! collected separately by the caller.

use crate::cli::{Command, ListArgs, SubmitArgs};
use crate::config::AppConfig;
use crate::container::Container;
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use sfs_01_memberships::{MembershipBackend, MembershipService, ProgressOutcome, ToggleOutcome};
use sfs_02_catalog::{
    Material, MaterialDraft, MaterialFilter, MaterialRepository, UploadFile, PDF_CONTENT_TYPE,
};
use shared_bus::Notice;
use shared_types::{ItemId, MembershipKind, UserId};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// What one CLI invocation produced.
#[derive(Debug)]
pub struct RunOutput {
    pub result: Result<Value>,
    pub notices: Vec<Notice>,
}

/// Starts the session, runs one command and collects notices.
pub async fn run_command<B, R>(container: &Container<B, R>, config: &AppConfig, command: Command) -> RunOutput
where
    B: MembershipBackend + 'static,
    R: MaterialRepository + 'static,
{
    container.start_session(config).await;
    let result = execute(container, command).await;
    RunOutput {
        result,
        notices: container.active_notices(),
    }
}

pub async fn execute<B, R>(container: &Container<B, R>, command: Command) -> Result<Value>
where
    B: MembershipBackend + 'static,
    R: MaterialRepository + 'static,
{
    let memberships = &container.memberships;
    let catalog = &container.catalog;
    debug!(command = ?command, "Executing command");

    match command {
        Command::Materials(args) => {
            let materials = catalog.approved_materials(&list_filter(args)).await?;
            material_list(memberships, &materials)
        }
        Command::Search { term } => {
            let materials = catalog.search(&term).await?;
            material_list(memberships, &materials)
        }
        Command::Category { slug } => {
            let materials = catalog.by_category(&slug).await?;
            material_list(memberships, &materials)
        }
        Command::Favorites { search } => {
            let user = require_user(memberships)?;
            let live: HashSet<ItemId> = memberships
                .members(MembershipKind::FavoriteMaterial)
                .into_iter()
                .collect();
            let entries = catalog.favorites_page(&user, &live, search.as_deref()).await?;
            Ok(serde_json::to_value(entries)?)
        }
        Command::Memberships => {
            let sets: Vec<Value> = MembershipKind::ALL
                .into_iter()
                .map(|kind| {
                    json!({
                        "kind": kind,
                        "status": memberships.load_status(kind),
                        "members": memberships.members(kind),
                    })
                })
                .collect();
            let progress: serde_json::Map<String, Value> = memberships
                .members(MembershipKind::Enrollment)
                .into_iter()
                .map(|course| {
                    let value = memberships.course_progress(&course);
                    (course.to_string(), json!(value))
                })
                .collect();
            Ok(json!({ "user": memberships.user(), "sets": sets, "progress": progress }))
        }
        Command::Toggle { kind, item } => {
            let kind = MembershipKind::from(kind);
            let outcome = memberships.toggle(kind, ItemId::new(item.clone())).await;
            Ok(toggle_view(kind, &item, &outcome))
        }
        Command::Progress { course, value } => {
            let outcome = memberships
                .set_course_progress(ItemId::new(course.clone()), value)
                .await;
            Ok(progress_view(&course, &outcome))
        }
        Command::Profile => {
            let user = require_user(memberships)?;
            let profile = memberships.profile();
            let greeting = profile.as_ref().map(|p| p.greeting_name());
            Ok(json!({ "user": user, "profile": profile, "greeting": greeting }))
        }
        Command::Submit(args) => {
            let draft = draft_from(args).await?;
            let user = memberships.user();
            let material = catalog.submit(user.as_ref(), draft).await?;
            Ok(serde_json::to_value(material)?)
        }
        Command::Mine => {
            let user = require_user(memberships)?;
            let materials = catalog.user_submissions(&user).await?;
            Ok(serde_json::to_value(materials)?)
        }
        Command::Pending => Ok(serde_json::to_value(catalog.pending_materials().await?)?),
        Command::Approve { id, notes } => {
            let material = catalog.approve(&ItemId::new(id), notes).await?;
            Ok(serde_json::to_value(material)?)
        }
        Command::Reject { id, notes } => {
            let material = catalog.reject(&ItemId::new(id), notes).await?;
            Ok(serde_json::to_value(material)?)
        }
        Command::Delete { id } => {
            let user = require_user(memberships)?;
            catalog.delete(&ItemId::new(id.clone()), &user).await?;
            Ok(json!({ "deleted": id }))
        }
    }
}

fn require_user<B: MembershipBackend + 'static>(memberships: &MembershipService<B>) -> Result<UserId> {
    memberships
        .user()
        .ok_or_else(|| anyhow!("Sign in required: pass --user or set SFS_USER_ID"))
}

fn list_filter(args: ListArgs) -> MaterialFilter {
    MaterialFilter {
        subjects: args.subjects,
        difficulties: args.difficulties,
        material_type: args.material_type,
        search: args.search,
    }
}

/// Materials with the user's flags and live upvote counts.
fn material_list<B: MembershipBackend + 'static>(
    memberships: &MembershipService<B>,
    materials: &[Material],
) -> Result<Value> {
    memberships.seed_counters(
        MembershipKind::UpvoteMaterial,
        materials.iter().map(|m| (m.id.clone(), m.upvote_count)),
    );

    let views = materials
        .iter()
        .map(|material| {
            let mut view = serde_json::to_value(material)?;
            if let Value::Object(fields) = &mut view {
                let upvotes = memberships
                    .count(MembershipKind::UpvoteMaterial, &material.id)
                    .unwrap_or(material.upvote_count);
                fields.insert("upvote_count".into(), json!(upvotes));
                fields.insert("thumbnail".into(), json!(material.thumbnail()));
                fields.insert(
                    "favorited".into(),
                    json!(memberships.is_member(MembershipKind::FavoriteMaterial, &material.id)),
                );
                fields.insert(
                    "upvoted".into(),
                    json!(memberships.is_member(MembershipKind::UpvoteMaterial, &material.id)),
                );
            }
            Ok(view)
        })
        .collect::<Result<Vec<Value>>>()?;
    Ok(Value::Array(views))
}

fn toggle_view(kind: MembershipKind, item: &str, outcome: &ToggleOutcome) -> Value {
    let (label, reason) = match outcome {
        ToggleOutcome::Committed(_) => ("committed", None),
        ToggleOutcome::Ignored(_) => ("ignored", None),
        ToggleOutcome::SignInRequired => ("sign_in_required", None),
        ToggleOutcome::RolledBack { reason, .. } => ("rolled_back", Some(reason.as_str())),
        ToggleOutcome::Discarded => ("discarded", None),
    };
    json!({
        "kind": kind,
        "item": item,
        "outcome": label,
        "reason": reason,
        "snapshot": outcome.snapshot(),
    })
}

fn progress_view(course: &str, outcome: &ProgressOutcome) -> Value {
    let (label, progress, reason) = match outcome {
        ProgressOutcome::Committed(value) => ("committed", Some(*value), None),
        ProgressOutcome::Ignored(value) => ("ignored", Some(*value), None),
        ProgressOutcome::SignInRequired => ("sign_in_required", None, None),
        ProgressOutcome::NotEnrolled => ("not_enrolled", None, None),
        ProgressOutcome::RolledBack { progress, reason } => {
            ("rolled_back", Some(*progress), Some(reason.as_str()))
        }
        ProgressOutcome::Discarded => ("discarded", None, None),
    };
    json!({
        "course": course,
        "outcome": label,
        "progress": progress,
        "reason": reason,
    })
}

async fn draft_from(args: SubmitArgs) -> Result<MaterialDraft> {
    let mut draft = MaterialDraft::new(args.material_type, args.title);
    draft.url = args.url;
    draft.description = args.description;
    draft.subjects = args.subjects;
    draft.difficulties = args.difficulties;
    if let Some(path) = args.file {
        draft.file = Some(read_upload(&path).await?);
    }
    Ok(draft)
}

async fn read_upload(path: &Path) -> Result<UploadFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} is not a file", path.display()))?;
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    let content_type = if is_pdf {
        PDF_CONTENT_TYPE
    } else {
        "application/octet-stream"
    };
    Ok(UploadFile {
        name,
        content_type: content_type.to_string(),
        bytes,
    })
}
