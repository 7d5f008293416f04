//! Error types for Trellis.
//!
//! Three families of failure show up while serving a request, and each is
//! kept in its own type so callers can tell them apart:
//!
//! | Type | Raised by | Typical status |
//! |---|---|---|
//! | [`ParseError`] | body and multipart accessors on the context | caller decides |
//! | [`DecodeError`] | the typed adapter, before the handler runs | 400 / 413 / 415 |
//! | [`HandlerError`] | the typed handler itself | per [`ErrorCategory`] |
//!
//! Missing headers, parameters and query values are not errors at all: the
//! context returns an empty string for them.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias using [`HandlerError`].
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Categories of handler errors for classification and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Request validation errors (invalid input, business rule violations).
    Validation,
    /// Authentication errors (invalid/missing credentials).
    Authentication,
    /// Authorization errors (permission denied).
    Authorization,
    /// Resource not found.
    NotFound,
    /// Rate limiting.
    RateLimited,
    /// Internal server errors.
    Internal,
    /// External service errors (downstream failures).
    External,
    /// Request timeout.
    Timeout,
    /// Conflict (e.g., concurrent modification).
    Conflict,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::External => StatusCode::BAD_GATEWAY,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Conflict => StatusCode::CONFLICT,
        }
    }
}

/// Error returned by a typed handler.
///
/// The typed adapter maps every variant to a status code through
/// [`ErrorCategory`] and writes an [`ErrorEnvelope`] as the response body.
///
/// # Example
///
/// ```
/// use trellis_core::{HandlerError, ErrorCategory};
///
/// fn find_item(id: &str) -> Result<(), HandlerError> {
///     if id.is_empty() {
///         return Err(HandlerError::validation("id must not be empty"));
///     }
///     Err(HandlerError::not_found_resource("Item", id))
/// }
///
/// let err = find_item("42").unwrap_err();
/// assert_eq!(err.category(), ErrorCategory::NotFound);
/// ```
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Request validation failed.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
        /// Field-specific validation errors.
        #[source]
        field_errors: Option<FieldErrors>,
    },

    /// Authentication failed.
    #[error("Authentication error: {message}")]
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// Authorization denied.
    #[error("Authorization denied: {message}")]
    Authorization {
        /// Human-readable error message.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
        /// The type of resource that was not found.
        resource_type: Option<String>,
        /// The identifier of the resource.
        resource_id: Option<String>,
    },

    /// Rate limit exceeded.
    #[error("Rate limited: {message}")]
    RateLimited {
        /// Human-readable error message.
        message: String,
        /// Seconds until the rate limit resets.
        retry_after_seconds: Option<u64>,
    },

    /// Internal server error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (never exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Downstream service error.
    #[error("External service error: {message}")]
    External {
        /// Human-readable error message.
        message: String,
        /// The name of the external service.
        service: Option<String>,
    },

    /// The handler gave up waiting on something.
    #[error("Timeout: {message}")]
    Timeout {
        /// Human-readable error message.
        message: String,
    },

    /// Conflict error (e.g., concurrent modification).
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable error message.
        message: String,
    },
}

impl HandlerError {
    /// Creates a validation error with a message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    /// Creates a validation error with field-specific errors.
    #[must_use]
    pub fn validation_with_fields(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates an authorization error.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            resource_type: None,
            resource_id: None,
        }
    }

    /// Creates a not found error naming the missing resource.
    #[must_use]
    pub fn not_found_resource(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        let resource_type = resource_type.into();
        let resource_id = resource_id.into();
        Self::NotFound {
            message: format!("{resource_type} with ID '{resource_id}' not found"),
            resource_type: Some(resource_type),
            resource_id: Some(resource_id),
        }
    }

    /// Creates a rate limited error.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>, retry_after_seconds: Option<u64>) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after_seconds,
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an external service error.
    #[must_use]
    pub fn external(message: impl Into<String>, service: Option<impl Into<String>>) -> Self {
        Self::External {
            message: message.into(),
            service: service.map(Into::into),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::Authorization { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::RateLimited { .. } => ErrorCategory::RateLimited,
            Self::Internal { .. } => ErrorCategory::Internal,
            Self::External { .. } => ErrorCategory::External,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Conflict { .. } => ErrorCategory::Conflict,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Authentication { .. } => "AUTHENTICATION_ERROR",
            Self::Authorization { .. } => "AUTHORIZATION_DENIED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Internal { .. } => "INTERNAL_ERROR",
            Self::External { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Conflict { .. } => "CONFLICT",
        }
    }

    /// Converts this error to a serializable error envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(ErrorDetail {
            code: self.error_code().to_string(),
            message: self.to_string(),
            category: Some(self.category()),
            details: self.error_details(),
        })
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation {
                field_errors: Some(errors),
                ..
            } => serde_json::to_value(errors).ok(),
            Self::NotFound {
                resource_type: Some(rt),
                resource_id: Some(rid),
                ..
            } => Some(serde_json::json!({
                "resource_type": rt,
                "resource_id": rid
            })),
            Self::RateLimited {
                retry_after_seconds: Some(seconds),
                ..
            } => Some(serde_json::json!({
                "retry_after_seconds": seconds
            })),
            Self::External {
                service: Some(service),
                ..
            } => Some(serde_json::json!({ "service": service })),
            _ => None,
        }
    }
}

/// Field-specific validation errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Error)]
#[error("Field validation errors")]
pub struct FieldErrors {
    /// Map of field path to list of error messages.
    pub fields: HashMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates a new empty `FieldErrors`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns `true` if there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Errors from reading or parsing the request body.
///
/// Returned by [`RequestBody`](crate::RequestBody) reads and by
/// [`Context::request_multipart_form`](crate::Context::request_multipart_form).
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body exceeded the caller-supplied memory limit.
    #[error("request body exceeds the {limit} byte limit")]
    TooLarge {
        /// The limit that was exceeded, in bytes.
        limit: u64,
    },

    /// The request is not `multipart/form-data`.
    #[error("expected multipart/form-data, got {content_type:?}")]
    NotMultipart {
        /// The content type that was sent, empty when absent.
        content_type: String,
    },

    /// The multipart content type has no boundary parameter.
    #[error("multipart boundary missing from content type")]
    MissingBoundary,

    /// The multipart stream could not be parsed.
    #[error("malformed multipart body: {0}")]
    Malformed(String),

    /// The body was already consumed or explicitly closed.
    #[error("request body already consumed or closed")]
    BodyClosed,

    /// The underlying transport failed while reading.
    #[error("failed to read request body: {0}")]
    Read(String),
}

impl ParseError {
    /// Returns the HTTP status code a handler would typically answer with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotMultipart { .. } | Self::MissingBoundary => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            Self::Malformed(_) | Self::BodyClosed | Self::Read(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Errors raised while building the typed request value.
///
/// These never reach the typed handler; the adapter answers them directly.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body's content type is not one the codec understands.
    #[error("unsupported media type {content_type:?}, expected {expected}")]
    UnsupportedMediaType {
        /// The content type that was sent.
        content_type: String,
        /// The content type the codec accepts.
        expected: &'static str,
    },

    /// The body could not be decoded into the request type.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// Path or query parameters could not be decoded into the request type.
    #[error("invalid request parameters: {0}")]
    InvalidParams(String),

    /// The body is larger than the codec accepts.
    #[error("request body exceeds the {limit} byte limit")]
    TooLarge {
        /// The limit that was exceeded, in bytes.
        limit: u64,
    },

    /// Reading the body failed.
    #[error(transparent)]
    Body(#[from] ParseError),
}

impl DecodeError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::InvalidBody(_) | Self::InvalidParams(_) => StatusCode::BAD_REQUEST,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Body(err) => err.status_code(),
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
            Self::InvalidBody(_) => "INVALID_REQUEST_BODY",
            Self::InvalidParams(_) => "INVALID_PARAMETERS",
            Self::TooLarge { .. } | Self::Body(ParseError::TooLarge { .. }) => "PAYLOAD_TOO_LARGE",
            Self::Body(_) => "INVALID_REQUEST_BODY",
        }
    }

    /// Converts this error to a serializable error envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(ErrorDetail {
            code: self.error_code().to_string(),
            message: self.to_string(),
            category: Some(ErrorCategory::Validation),
            details: None,
        })
    }
}

/// Errors raised while encoding the typed response value.
#[derive(Debug, Error)]
#[error("failed to encode response: {0}")]
pub struct EncodeError(pub String);

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// The operation that failed, when the route declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
}

impl ErrorEnvelope {
    /// Creates an envelope with no correlation fields set.
    #[must_use]
    pub fn new(error: ErrorDetail) -> Self {
        Self {
            error,
            request_id: None,
            operation_id: None,
        }
    }

    /// Builds an envelope from a bare code and message.
    #[must_use]
    pub fn from_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorDetail {
            code: code.into(),
            message: message.into(),
            category: None,
            details: None,
        })
    }

    /// Sets the request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Sets the operation ID, if any.
    #[must_use]
    pub fn with_operation_id(mut self, operation_id: Option<&str>) -> Self {
        self.operation_id = operation_id.map(ToString::to_string);
        self
    }
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    /// Additional error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
