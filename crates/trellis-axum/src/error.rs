//! Binding error types.

use http::Method;
use thiserror::Error;

/// Errors raised while registering routes with the axum router.
///
/// Request handling never produces these; every dispatched request ends in
/// a response.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The path pattern cannot be translated into axum syntax.
    #[error("invalid route path {path:?}: {reason}")]
    InvalidPath {
        /// The offending path pattern.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// axum has no method filter for this method.
    #[error("HTTP method {method} cannot be registered with axum")]
    UnsupportedMethod {
        /// The rejected method.
        method: Method,
    },

    /// An equivalent route is already registered.
    #[error("route {method} {path} conflicts with registered path {existing}")]
    Conflict {
        /// Method of the rejected route.
        method: Method,
        /// Translated path of the rejected route.
        path: String,
        /// Translated path of the route already registered.
        existing: String,
    },
}

/// Errors raised while serving a router.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The configured address.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The listener failed while serving.
    #[error("server I/O error: {0}")]
    Io(#[source] std::io::Error),
}

impl AdapterError {
    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_path_message() {
        let err = AdapterError::invalid_path("items", "must start with '/'");
        assert!(err.to_string().contains("\"items\""));
        assert!(err.to_string().contains("must start with '/'"));
    }

    #[test]
    fn test_unsupported_method_message() {
        let method = Method::from_bytes(b"PURGE").unwrap();
        let err = AdapterError::UnsupportedMethod { method };
        assert!(err.to_string().contains("PURGE"));
    }
}
