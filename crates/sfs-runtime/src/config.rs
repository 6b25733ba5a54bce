//! # Application Configuration
//!
//! One struct for every subsystem's settings. Environment first, command
//! line flags on top.
//!
//! ## Requirements
//!
//! - A hosted run needs both the project URL and the anon key
//! - `--offline` needs neither

use sfs_01_memberships::MembershipConfig;
use sfs_02_catalog::CatalogConfig;
use sfs_03_supabase::SupabaseConfig;
use sfs_telemetry::TelemetryConfig;
use shared_types::{Session, UserId};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Complete client configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub telemetry: TelemetryConfig,
    pub supabase: SupabaseConfig,
    pub memberships: MembershipConfig,
    pub catalog: CatalogConfig,
    /// Use the in-memory demo backend.
    pub offline: bool,
    /// Signed-in user, if any.
    pub user: Option<UserId>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SFS_SUPABASE_URL is not set (use --offline to run against demo data)")]
    MissingUrl,

    #[error("SFS_SUPABASE_ANON_KEY is not set")]
    MissingAnonKey,

    #[error("Supabase URL must start with http:// or https://, got {0}")]
    InvalidUrl(String),

    #[error("Timeout must be greater than zero")]
    ZeroTimeout,
}

impl AppConfig {
    /// Reads every section from the environment.
    ///
    /// `SFS_OFFLINE` (`true`/`1`) selects the demo backend. The membership
    /// write bound follows the HTTP timeout.
    pub fn from_env() -> Self {
        let supabase = SupabaseConfig::from_env();
        let memberships = MembershipConfig {
            remote_timeout: supabase.timeout,
            ..MembershipConfig::default()
        };
        Self {
            telemetry: TelemetryConfig::from_env(),
            supabase,
            memberships,
            catalog: CatalogConfig::default(),
            offline: env::var("SFS_OFFLINE")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            user: None,
        }
    }

    /// Applies one timeout to HTTP requests and membership writes alike.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.supabase.timeout = timeout;
        self.memberships.remote_timeout = timeout;
    }

    /// Sets the notice lifetime for every service.
    pub fn set_notice_ttl(&mut self, ttl: Duration) {
        self.memberships.notice_ttl = ttl;
        self.catalog.notice_ttl = ttl;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memberships.remote_timeout.is_zero() || self.supabase.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.offline {
            return Ok(());
        }
        let url = self.supabase.base_url();
        if url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::InvalidUrl(url.to_string()));
        }
        if self.supabase.anon_key.is_empty() {
            return Err(ConfigError::MissingAnonKey);
        }
        Ok(())
    }

    /// Session for the configured user.
    pub fn session(&self) -> Option<Session> {
        self.user.as_ref().map(|user| Session {
            user_id: user.clone(),
            email: None,
        })
    }
}
