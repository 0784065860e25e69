//! Pipeline error types.
//!
//! The error variant is chosen at the point the error is raised, never
//! inferred later from a sentinel value. `NotFound` renders as a 404 under
//! HTTP; everything else is an `Internal` with its detail serialized into
//! the 500 body.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error carried by a context (`iopa.Error`) or rejected through the
/// middleware chain.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PipelineError {
    /// The requested resource does not exist.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// Any other failure, with a human-readable detail.
    #[error("{detail}")]
    Internal { detail: String },
}

impl PipelineError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }

    /// HTTP status code this error renders as.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Internal { .. } => 500,
        }
    }

    /// HTTP reason phrase this error renders as.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "Not Found",
            Self::Internal { .. } => "Server Error",
        }
    }
}
