//! Error types for diff computation and patch application.
//!
//! Diff-time errors abort the whole call and are returned to the caller.
//! Patch-time errors are always local to one changelog entry: they are
//! recorded on the corresponding [`PatchLogEntry`](crate::patch::PatchLogEntry)
//! and never abort the batch.

use thiserror::Error;

use crate::change::ChangeKind;
use crate::value::Kind;

/// Errors raised while computing a changelog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DiffError {
    /// The two compared values disagree on their fundamental kind and the
    /// differ was not configured to tolerate mismatches.
    #[error("type mismatch between compared values")]
    TypeMismatch,

    /// `struct_values` was invoked with a change kind other than create
    /// or delete.
    #[error("invalid change kind for struct itemization: {0}")]
    InvalidChangeKind(ChangeKind),

    /// The operation has no comparator for this value kind.
    #[error("unsupported value kind: {0}")]
    UnsupportedKind(Kind),
}

/// Convenient result type for diff operations.
pub type Result<T> = std::result::Result<T, DiffError>;

/// A patch-time failure recorded on a single patch log entry.
///
/// Errors chain: a fallback-scan failure can be wrapped by a higher-level
/// "could not locate patch target" error while preserving the root cause,
/// reachable through [`std::error::Error::source`] or [`PatchError::cause`].
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct PatchError {
    message: String,
    #[source]
    cause: Option<Box<PatchError>>,
}

impl PatchError {
    /// Create a new error with no cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Attach a cause to this error, consuming it.
    #[must_use]
    pub fn with_cause(mut self, cause: PatchError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// The error directly underlying this one, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&PatchError> {
        self.cause.as_deref()
    }

    /// Walk the cause chain down to its deepest error.
    #[must_use]
    pub fn root_cause(&self) -> &PatchError {
        let mut cur = self;
        while let Some(next) = cur.cause() {
            cur = next;
        }
        cur
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_error_chain() {
        let err = PatchError::new("could not locate patch target")
            .with_cause(PatchError::new("scanning for value index"));

        assert_eq!(err.to_string(), "could not locate patch target");
        assert_eq!(
            err.cause().map(ToString::to_string),
            Some("scanning for value index".to_string())
        );
        assert_eq!(err.root_cause().to_string(), "scanning for value index");
    }

    #[test]
    fn test_patch_error_source() {
        use std::error::Error as _;

        let err = PatchError::new("outer").with_cause(PatchError::new("inner"));
        let source = err.source().expect("chained cause is exposed as source");
        assert_eq!(source.to_string(), "inner");
    }

    #[test]
    fn test_diff_error_display() {
        assert_eq!(
            DiffError::TypeMismatch.to_string(),
            "type mismatch between compared values"
        );
        assert_eq!(
            DiffError::InvalidChangeKind(ChangeKind::Update).to_string(),
            "invalid change kind for struct itemization: update"
        );
    }
}
