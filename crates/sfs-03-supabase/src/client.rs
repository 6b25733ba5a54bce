//! HTTP client for PostgREST (`/rest/v1`) and Storage (`/storage/v1`).

use crate::config::SupabaseConfig;
use crate::error::SupabaseError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

const PREFER: &str = "prefer";
const RETURN_MINIMAL: &str = "return=minimal";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Query pairs appended to a REST URL.
pub type Query<'a> = [(&'a str, String)];

/// Typed access to the hosted backend.
pub struct SupabaseClient {
    http: Client,
    config: SupabaseConfig,
}

impl SupabaseClient {
    /// Builds a client whose requests all carry `apikey` and
    /// `x-application-name`.
    pub fn new(config: SupabaseConfig) -> Result<Self, SupabaseError> {
        if config.base_url().is_empty() {
            return Err(SupabaseError::Config("SFS_SUPABASE_URL is not set".into()));
        }
        if config.anon_key.is_empty() {
            return Err(SupabaseError::Config("SFS_SUPABASE_ANON_KEY is not set".into()));
        }

        let mut headers = HeaderMap::new();
        let mut apikey = header_value(&config.anon_key)?;
        apikey.set_sensitive(true);
        headers.insert(HeaderName::from_static("apikey"), apikey);
        headers.insert(
            HeaderName::from_static("x-application-name"),
            header_value(&config.application_name)?,
        );

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| SupabaseError::Config(e.to_string()))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url(), table)
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.base_url(),
            self.config.storage_bucket,
            path
        )
    }

    /// Public URL of an object in the materials bucket.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.base_url(),
            self.config.storage_bucket,
            path
        )
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        trace!(method = %method, url = %url, "Backend request");
        self.http
            .request(method, url)
            .bearer_auth(self.config.bearer())
    }

    fn timeout_millis(&self) -> u64 {
        u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Sends a request and turns non-2xx answers into `SupabaseError::Status`.
    async fn send(&self, request: RequestBuilder) -> Result<Response, SupabaseError> {
        let response = request
            .send()
            .await
            .map_err(|e| SupabaseError::from_reqwest(e, self.timeout_millis()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = SupabaseError::from_body(status.as_u16(), &body);
        debug!(status = status.as_u16(), error = %err, "Backend rejected request");
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SupabaseError> {
        let response = self.send(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SupabaseError::from_reqwest(e, self.timeout_millis()))?;
        serde_json::from_slice(&bytes).map_err(|e| SupabaseError::Decode(e.to_string()))
    }

    // === REST ===

    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
    ) -> Result<Vec<T>, SupabaseError> {
        self.send_json(self.request(Method::GET, self.rest_url(table)).query(query))
            .await
    }

    pub async fn insert<B: Serialize + ?Sized>(&self, table: &str, body: &B) -> Result<(), SupabaseError> {
        let request = self
            .request(Method::POST, self.rest_url(table))
            .header(PREFER, RETURN_MINIMAL)
            .json(body);
        self.send(request).await.map(|_| ())
    }

    pub async fn insert_returning<B, T>(&self, table: &str, body: &B) -> Result<Vec<T>, SupabaseError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(Method::POST, self.rest_url(table))
            .header(PREFER, RETURN_REPRESENTATION)
            .json(body);
        self.send_json(request).await
    }

    pub async fn update_returning<B, T>(
        &self,
        table: &str,
        query: &Query<'_>,
        body: &B,
    ) -> Result<Vec<T>, SupabaseError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(Method::PATCH, self.rest_url(table))
            .query(query)
            .header(PREFER, RETURN_REPRESENTATION)
            .json(body);
        self.send_json(request).await
    }

    /// Deletes matching rows and returns them.
    pub async fn delete_returning<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
    ) -> Result<Vec<T>, SupabaseError> {
        let request = self
            .request(Method::DELETE, self.rest_url(table))
            .query(query)
            .header(PREFER, RETURN_REPRESENTATION);
        self.send_json(request).await
    }

    // === STORAGE ===

    /// Uploads without overwriting and returns the public URL.
    pub async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, SupabaseError> {
        let request = self
            .request(Method::POST, self.object_url(path))
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .header("cache-control", "max-age=3600")
            .body(bytes);
        self.send(request).await?;
        Ok(self.public_url(path))
    }

    pub async fn remove(&self, paths: &[String]) -> Result<(), SupabaseError> {
        let url = format!(
            "{}/storage/v1/object/{}",
            self.config.base_url(),
            self.config.storage_bucket
        );
        let request = self
            .request(Method::DELETE, url)
            .json(&serde_json::json!({ "prefixes": paths }));
        self.send(request).await.map(|_| ())
    }
}

fn header_value(value: &str) -> Result<HeaderValue, SupabaseError> {
    HeaderValue::from_str(value).map_err(|e| SupabaseError::Config(format!("invalid header value: {e}")))
}

/// `eq.` filter value.
pub fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// `in.(...)` filter with every value quoted.
pub fn in_list<I, V>(values: I) -> String
where
    I: IntoIterator<Item = V>,
    V: std::fmt::Display,
{
    let quoted: Vec<String> = values.into_iter().map(|v| quote(&v.to_string())).collect();
    format!("in.({})", quoted.join(","))
}

/// `cs.{...}` array-contains filter.
pub fn contains_all(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
    format!("cs.{{{}}}", quoted.join(","))
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
