//! Command-line surface of the `sfs` binary.

use crate::config::AppConfig;
use crate::demo::DEMO_USER;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sfs_02_catalog::MaterialType;
use shared_types::{MembershipKind, UserId};
use std::path::PathBuf;
use std::time::Duration;

/// Students-for-Students: browse, save and share study materials
#[derive(Parser, Debug)]
#[command(name = "sfs", version)]
#[command(about = "Command-line client for the Students-for-Students platform")]
pub struct Cli {
    /// Run against built-in demo data instead of the hosted backend
    #[arg(long)]
    pub offline: bool,

    /// Signed-in user id (offline runs default to the demo student)
    #[arg(long, env = "SFS_USER_ID")]
    pub user: Option<String>,

    /// Supabase project URL (overrides SFS_SUPABASE_URL)
    #[arg(long)]
    pub supabase_url: Option<String>,

    /// Request and write timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Log filter, e.g. `debug` or `sfs_01_memberships=trace`
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Print Prometheus metrics to stderr before exiting
    #[arg(long)]
    pub print_metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List approved materials, newest first
    Materials(ListArgs),

    /// Search approved materials by title, description or subject
    Search { term: String },

    /// Approved materials in a category (e.g. `computer-science`)
    Category { slug: String },

    /// The signed-in user's favorite materials
    Favorites {
        #[arg(long)]
        search: Option<String>,
    },

    /// Every membership set of the signed-in user
    Memberships,

    /// Flip a favorite, upvote, course favorite or enrollment
    Toggle { kind: ToggleKind, item: String },

    /// Record how far through an enrolled course you are (0-100)
    Progress {
        course: String,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        value: u8,
    },

    /// The signed-in user's profile
    Profile,

    /// Submit a material for review
    Submit(SubmitArgs),

    /// Materials the signed-in user submitted
    Mine,

    /// Materials awaiting review, oldest first
    Pending,

    /// Approve a pending material
    Approve {
        id: String,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Reject a pending material
    Reject {
        id: String,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete one of your own materials
    Delete { id: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleKind {
    Favorite,
    Upvote,
    FavoriteCourse,
    Enroll,
}

impl From<ToggleKind> for MembershipKind {
    fn from(kind: ToggleKind) -> Self {
        match kind {
            ToggleKind::Favorite => MembershipKind::FavoriteMaterial,
            ToggleKind::Upvote => MembershipKind::UpvoteMaterial,
            ToggleKind::FavoriteCourse => MembershipKind::FavoriteCourse,
            ToggleKind::Enroll => MembershipKind::Enrollment,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only materials tagged with every given subject
    #[arg(long = "subject")]
    pub subjects: Vec<String>,

    /// Only materials tagged with every given difficulty
    #[arg(long = "difficulty")]
    pub difficulties: Vec<String>,

    #[arg(long = "type")]
    pub material_type: Option<MaterialType>,

    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    #[arg(long = "type")]
    pub material_type: MaterialType,

    #[arg(long)]
    pub title: String,

    /// Resource URL (not used for PDFs)
    #[arg(long, default_value = "")]
    pub url: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long = "subject")]
    pub subjects: Vec<String>,

    #[arg(long = "difficulty")]
    pub difficulties: Vec<String>,

    /// PDF to upload
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl Cli {
    /// Environment configuration with flags applied on top.
    pub fn app_config(&self) -> AppConfig {
        let mut config = AppConfig::from_env();
        config.offline |= self.offline;

        if let Some(url) = &self.supabase_url {
            config.supabase.url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.set_timeout(Duration::from_secs(secs));
        }
        if let Some(level) = &self.log_level {
            config.telemetry.log_level = level.clone();
        }
        if self.json_logs {
            config.telemetry.json_logs = true;
        }

        config.user = match &self.user {
            Some(user) => Some(UserId::new(user.clone())),
            None if config.offline => Some(UserId::from(DEMO_USER)),
            None => None,
        };
        config
    }
}
