//! Error taxonomy shared by every client operation.
//!
//! Local errors (`InvalidConstructorParameters`, `InvalidArguments`) are raised
//! before any request is sent. `Api` covers everything the transport observed,
//! including the cases where no response arrived at all.

use serde_json::Value;
use thiserror::Error;

use crate::verification::{BytecodeMismatchDetail, CompilationErrorDetail};

pub type Result<T> = std::result::Result<T, SdkError>;

/// Slug used when the request was sent but no response was received.
pub const NO_RESPONSE: &str = "NO_RESPONSE";
/// Slug used when the request could not be built.
pub const REQUEST_SETUP_ERROR: &str = "REQUEST_SETUP_ERROR";
/// Slug used when a 2xx response body could not be decoded.
pub const INVALID_RESPONSE_BODY: &str = "INVALID_RESPONSE_BODY";
/// Slug used when the remote error body carried none.
pub const UNKNOWN_API_ERROR: &str = "unknown_error";

/// Failure reported by (or while talking to) the remote API.
#[derive(Debug, Clone, Error)]
#[error("API request failed ({}, {slug}): {message}", status_label(.status))]
pub struct ApiError {
    /// HTTP status, absent when no response was received.
    pub status: Option<u16>,
    /// Machine readable code: the body's `slug`, or one of the transport slugs.
    pub slug: String,
    pub id: Option<String>,
    pub message: String,
    /// Raw response payload for caller inspection.
    pub data: Option<Value>,
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "no status".to_string(),
    }
}

impl ApiError {
    pub fn no_response(message: impl Into<String>) -> Self {
        Self {
            status: None,
            slug: NO_RESPONSE.to_string(),
            id: None,
            message: message.into(),
            data: None,
        }
    }

    pub fn request_setup(message: impl Into<String>) -> Self {
        Self {
            status: None,
            slug: REQUEST_SETUP_ERROR.to_string(),
            id: None,
            message: message.into(),
            data: None,
        }
    }

    pub fn invalid_body(status: u16, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            status: Some(status),
            slug: INVALID_RESPONSE_BODY.to_string(),
            id: None,
            message: message.into(),
            data,
        }
    }

    /// Builds the error for a non-2xx response from whatever the body contains.
    ///
    /// The platform answers either `{"error": {"id", "slug", "message"}}` or a
    /// flat object with the same keys; anything else is kept only as `data`.
    pub fn from_response(status: u16, body: Option<Value>) -> Self {
        let details = body
            .as_ref()
            .map(|value| value.get("error").unwrap_or(value));

        let field = |name: &str| -> Option<String> {
            details
                .and_then(|d| d.get(name))
                .and_then(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
        };

        Self {
            status: Some(status),
            slug: field("slug").unwrap_or_else(|| UNKNOWN_API_ERROR.to_string()),
            id: field("id"),
            message: field("message")
                .unwrap_or_else(|| format!("Remote API responded with status {}", status)),
            data: body,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SdkError {
    #[error("invalid constructor parameters: {message}")]
    InvalidConstructorParameters { message: String },

    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{message}")]
    NotFound { message: String },

    #[error("failed to encode state overrides: {message}")]
    Encoding {
        message: String,
        #[source]
        source: Option<ApiError>,
    },

    #[error("contract compilation failed: {message}")]
    Compilation {
        message: String,
        errors: Vec<CompilationErrorDetail>,
    },

    #[error("bytecode mismatch: {message}")]
    BytecodeMismatch {
        message: String,
        diagnostic: BytecodeMismatchDetail,
    },

    #[error("unexpected verification response: {message}")]
    UnexpectedVerification {
        message: String,
        data: Option<Value>,
    },
}

impl SdkError {
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        SdkError::InvalidArguments {
            message: message.into(),
        }
    }

    pub fn invalid_constructor(message: impl Into<String>) -> Self {
        SdkError::InvalidConstructorParameters {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        SdkError::NotFound {
            message: message.into(),
        }
    }

    pub fn slug(&self) -> &str {
        match self {
            SdkError::InvalidConstructorParameters { .. } => "invalid_constructor_parameters",
            SdkError::InvalidArguments { .. } => "invalid_arguments",
            SdkError::Api(err) => &err.slug,
            SdkError::NotFound { .. } => "resource_not_found",
            SdkError::Encoding { .. } => "encoding_error",
            SdkError::Compilation { .. } => "compilation_error",
            SdkError::BytecodeMismatch { .. } => "bytecode_mismatch_error",
            SdkError::UnexpectedVerification { .. } => "unexpected_verification_error",
        }
    }

    /// Identifier assigned by the remote API, when it sent one.
    pub fn id(&self) -> Option<&str> {
        match self {
            SdkError::Api(err) => err.id.as_deref(),
            SdkError::Encoding {
                source: Some(err), ..
            } => err.id.as_deref(),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SdkError::InvalidConstructorParameters { message }
            | SdkError::InvalidArguments { message }
            | SdkError::NotFound { message }
            | SdkError::Encoding { message, .. }
            | SdkError::Compilation { message, .. }
            | SdkError::BytecodeMismatch { message, .. }
            | SdkError::UnexpectedVerification { message, .. } => message,
            SdkError::Api(err) => &err.message,
        }
    }

    /// True for errors raised without talking to the remote API.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SdkError::InvalidConstructorParameters { .. } | SdkError::InvalidArguments { .. }
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            SdkError::Api(err) => err.status,
            SdkError::Encoding {
                source: Some(err), ..
            } => err.status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_response_reads_nested_error_object() {
        let body = json!({
            "error": {
                "id": "a1b2",
                "slug": "contract_not_found",
                "message": "Contract not found"
            }
        });

        let err = ApiError::from_response(404, Some(body.clone()));
        assert_eq!(err.status, Some(404));
        assert_eq!(err.slug, "contract_not_found");
        assert_eq!(err.id.as_deref(), Some("a1b2"));
        assert_eq!(err.message, "Contract not found");
        assert_eq!(err.data, Some(body));
    }

    #[test]
    fn test_from_response_without_body() {
        let err = ApiError::from_response(502, None);
        assert_eq!(err.slug, UNKNOWN_API_ERROR);
        assert!(err.message.contains("502"));
        assert!(err.data.is_none());
    }

    #[test]
    fn test_local_and_remote_errors_are_distinguishable() {
        let local = SdkError::invalid_constructor("accessKey is required");
        let remote = SdkError::from(ApiError::no_response("connection refused"));

        assert!(local.is_local());
        assert!(!remote.is_local());
        assert_eq!(remote.slug(), NO_RESPONSE);
        assert_eq!(remote.status(), None);
        assert_eq!(SdkError::not_found("gone").slug(), "resource_not_found");
    }
}
