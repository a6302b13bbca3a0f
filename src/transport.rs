//! Thin HTTP wrapper bound to one versioned API base URL.
//!
//! Every failure is translated into [`ApiError`] here, so repositories only
//! ever propagate with `?`.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{ApiError, Result};
use crate::provider::ApiVersion;

pub const ACCESS_KEY_HEADER: &str = "X-Access-Key";
pub const CLIENT_IDENTIFIER_HEADER: &str = "X-User-Agent";
pub const CLIENT_IDENTIFIER: &str = concat!("tenderly-sdk-rs/", env!("CARGO_PKG_VERSION"));

/// Query string pairs; repeated keys are allowed (`tags[]=a&tags[]=b`).
pub type QueryParams = Vec<(String, String)>;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(api_base_url: &str, version: ApiVersion, access_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            ACCESS_KEY_HEADER,
            HeaderValue::from_str(access_key)
                .map_err(|e| ApiError::request_setup(format!("Invalid access key header: {}", e)))?,
        );
        headers.insert(
            CLIENT_IDENTIFIER_HEADER,
            HeaderValue::from_static(CLIENT_IDENTIFIER),
        );

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::request_setup(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: format!("{}/{}", api_base_url.trim_end_matches('/'), version.as_str()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str, query: &[(String, String)]) -> Result<R> {
        self.execute::<Value, R>(Method::GET, path, None, query).await
    }

    pub async fn post<B, R>(&self, path: &str, body: Option<&B>) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.execute(Method::POST, path, body, &[]).await
    }

    pub async fn put<B, R>(&self, path: &str, body: Option<&B>, query: &[(String, String)]) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.execute(Method::PUT, path, body, query).await
    }

    pub async fn delete<B>(&self, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.execute::<B, Value>(Method::DELETE, path, body, &[])
            .await
            .map(|_| ())
    }

    fn url_for(&self, path: &str, query: &[(String, String)]) -> std::result::Result<Url, ApiError> {
        let path: String = path.chars().filter(|c| !c.is_whitespace()).collect();
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ApiError::request_setup(format!("Invalid request URL '{}': {}", path, e)))?;

        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        Ok(url)
    }

    async fn execute<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: &[(String, String)],
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url_for(path, query)?;
        debug!("{} {}", method, url);

        let mut builder = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let request = builder.build().map_err(|e| {
            warn!("Failed to build {} request to {}: {}", method, url, e);
            ApiError::request_setup(e.to_string())
        })?;

        let response = self.http.execute(request).await.map_err(|e| {
            warn!("No response for {} {}: {}", method, url, e);
            ApiError::no_response(e.to_string())
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            warn!("Failed to read response body for {} {}: {}", method, url, e);
            ApiError::no_response(format!("Failed to read response body: {}", e))
        })?;

        if !status.is_success() {
            let error = ApiError::from_response(status.as_u16(), error_payload(&bytes));
            warn!(
                "{} {} failed with status {} ({})",
                method, url, status, error.slug
            );
            return Err(error.into());
        }

        decode_body(status, &bytes)
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

fn error_payload(bytes: &[u8]) -> Option<Value> {
    if is_blank(bytes) {
        return None;
    }

    Some(
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
    )
}

/// Blank bodies decode as JSON `null`, so `()` and `Option<_>` results work.
fn decode_body<R: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> Result<R> {
    let parsed = if is_blank(bytes) {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(bytes)
    };

    parsed.map_err(|e| {
        warn!("Failed to decode response body: {}", e);
        ApiError::invalid_body(
            status.as_u16(),
            format!("Failed to decode response body: {}", e),
            error_payload(bytes),
        )
        .into()
    })
}
