//! Crate-level error types for the GreenRoute engine.
//!
//! Every failure the engine can report is an [`EngineError`]: a tagged value
//! carrying an [`ErrorKind`], a human-readable message and an optional
//! structured detail payload. Request paths return [`EngineResult`];
//! persistence paths that benefit from layered context return
//! [`EngineReport`], an [`error_stack::Report`] over the same type.
//!
//! # Usage
//!
//! ```rust,ignore
//! use greenroute_kernel::error::{EngineError, EngineReport};
//! use error_stack::ResultExt;
//!
//! fn read_artifact(path: &std::path::Path) -> EngineReport<Vec<u8>> {
//!     std::fs::read(path)
//!         .map_err(EngineError::from)
//!         .map_err(error_stack::Report::new)
//!         .attach(format!("reading {}", path.display()))
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Category of an [`EngineError`].
///
/// No kind represents a process-fatal condition; all of them are scoped to
/// the request or training attempt that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorKind {
    /// Bad preference combination, out-of-range threshold, malformed
    /// coordinates or an invalid route / vehicle.
    Validation,
    /// Prediction requested before the models were trained.
    NotReady,
    /// Training invoked with an unusable batch.
    NotTrainable,
    /// The signal store could not be reached. Never escapes the cache.
    CacheUnavailable,
    /// An external signal provider failed.
    ExternalSignal,
    /// Model bundle or document storage failure.
    Persistence,
    /// Configuration could not be loaded.
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotReady => "not_ready",
            ErrorKind::NotTrainable => "not_trainable",
            ErrorKind::CacheUnavailable => "cache_unavailable",
            ErrorKind::ExternalSignal => "external_signal",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Config => "config",
        }
    }

    /// Whether the caller can reasonably recover without operator action.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ErrorKind::NotTrainable | ErrorKind::Persistence)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The engine's error value.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind} error: {message}")]
pub struct EngineError {
    /// What went wrong
    pub kind: ErrorKind,
    /// Human readable description
    pub message: String,
    /// Structured detail for callers that surface errors to users
    pub details: Option<serde_json::Value>,
}

impl EngineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Attach a structured detail payload.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_ready(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotReady, message)
    }

    pub fn not_trainable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotTrainable, message)
    }

    pub fn cache_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CacheUnavailable, message)
    }

    pub fn external_signal(source: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::ExternalSignal,
            format!("error calling {} provider: {}", source, message.into()),
        )
        .with_details(serde_json::json!({ "source": source }))
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Persistence, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::persistence(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::persistence(format!("serialization: {}", err))
    }
}

#[cfg(feature = "config")]
impl From<crate::config::ConfigError> for EngineError {
    fn from(err: crate::config::ConfigError) -> Self {
        EngineError::config(err.to_string())
    }
}

/// Result alias for request-scoped engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result alias using [`error_stack::Report`] for paths that attach context.
///
/// Equivalent to `Result<T, error_stack::Report<EngineError>>`.
pub type EngineReport<T> = Result<T, error_stack::Report<EngineError>>;

/// Extension trait to convert `Result<T, EngineError>` into [`EngineReport<T>`].
pub trait IntoEngineReport<T> {
    /// Wrap the error in an `error_stack::Report`.
    fn into_report(self) -> EngineReport<T>;
}

impl<T> IntoEngineReport<T> for Result<T, EngineError> {
    #[inline]
    fn into_report(self) -> EngineReport<T> {
        self.map_err(error_stack::Report::new)
    }
}
