//! Error types for unrolling operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across the unroller crates, plus [`UnrollError`], which is what the
//! unroll operations return when an upstream fetch fails.

use thiserror::Error;

use crate::content::Content;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while reading, validating or unrolling content.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport or decode failure talking to an upstream content source.
    #[error("Request to {app} failed: {message}")]
    Fetch {
        /// Upstream application name.
        app: String,
        /// Human readable description.
        message: String,
        /// Underlying cause, when there is one.
        #[source]
        source: Option<BoxError>,
    },

    /// Upstream content source answered with a non-success status.
    #[error("Request to {app} failed with status code {status}")]
    UpstreamStatus {
        /// Upstream application name.
        app: String,
        /// HTTP status code received.
        status: u16,
    },

    /// The submitted document is not something we can unroll.
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// The submitted document has no usable `id` field.
    #[error("Missing or invalid id field: {0}")]
    MissingId(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a fetch error without an underlying cause.
    pub fn fetch(app: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            app: app.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a fetch error wrapping an underlying cause.
    pub fn fetch_with_source(
        app: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Fetch {
            app: app.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an upstream status error.
    pub fn upstream_status(app: impl Into<String>, status: u16) -> Self {
        Self::UpstreamStatus {
            app: app.into(),
            status,
        }
    }

    /// Create an invalid content error.
    pub fn invalid_content(msg: impl Into<String>) -> Self {
        Self::InvalidContent(msg.into())
    }

    /// Create a missing id error.
    pub fn missing_id(msg: impl Into<String>) -> Self {
        Self::MissingId(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether repeating the same request could succeed.
    ///
    /// Transport failures and 5xx answers are retryable; client errors,
    /// validation failures and decode failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch { source, .. } => source
                .as_ref()
                .and_then(|s| s.downcast_ref::<reqwest::Error>())
                .is_some_and(|e| e.is_timeout() || e.is_connect() || e.is_request()),
            Self::UpstreamStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether this error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidContent(_) | Self::MissingId(_) | Self::Serialization(_)
        )
    }
}

/// Result type alias using the unroller's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of an unroll operation.
///
/// Carries the caller's document exactly as it was submitted, so the
/// boundary layer can still report something identifiable.
#[derive(Error, Debug)]
#[error("Error while unrolling content for uuid:{uuid}: {source}")]
pub struct UnrollError {
    /// UUID of the document being unrolled.
    pub uuid: String,
    /// The unmodified input document.
    pub original: Content,
    /// What went wrong upstream.
    #[source]
    pub source: Error,
}

impl UnrollError {
    /// Wrap `source` together with the untouched input document.
    pub fn new(uuid: impl Into<String>, original: Content, source: Error) -> Self {
        Self {
            uuid: uuid.into(),
            original,
            source,
        }
    }

    /// Split into the original document and the cause.
    pub fn into_parts(self) -> (Content, Error) {
        (self.original, self.source)
    }
}
