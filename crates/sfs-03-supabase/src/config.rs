//! Backend connection settings from environment variables.

use std::env;
use std::time::Duration;

/// Default `x-application-name` header value.
pub const APPLICATION_NAME: &str = "students-for-students";

/// Bucket holding uploaded study materials.
pub const STORAGE_BUCKET: &str = "study-materials";

/// Connection settings for the hosted Supabase project.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abc.supabase.co`
    pub url: String,

    /// Public anon key, sent as `apikey` on every request
    pub anon_key: String,

    /// User access token. Requests fall back to the anon key without one.
    pub access_token: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,

    pub application_name: String,

    pub storage_bucket: String,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            access_token: None,
            timeout: Duration::from_secs(10),
            application_name: APPLICATION_NAME.to_string(),
            storage_bucket: STORAGE_BUCKET.to_string(),
        }
    }
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &redact(&self.anon_key))
            .field("access_token", &self.access_token.as_deref().map(redact))
            .field("timeout", &self.timeout)
            .field("application_name", &self.application_name)
            .field("storage_bucket", &self.storage_bucket)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

impl SupabaseConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SFS_SUPABASE_URL`: Project URL (default: empty)
    /// - `SFS_SUPABASE_ANON_KEY`: Anon key (default: empty)
    /// - `SFS_ACCESS_TOKEN`: Signed-in user's access token (default: none)
    /// - `SFS_HTTP_TIMEOUT_SECS`: Request timeout in seconds (default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env::var("SFS_SUPABASE_URL").unwrap_or_default(),
            anon_key: env::var("SFS_SUPABASE_ANON_KEY").unwrap_or_default(),
            access_token: env::var("SFS_ACCESS_TOKEN").ok().filter(|t| !t.is_empty()),
            timeout: env::var("SFS_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            ..defaults
        }
    }

    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            ..Self::default()
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Project URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Token for the `Authorization` header.
    pub fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }
}
