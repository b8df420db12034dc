//! Error types for command execution.
//!
//! All errors a caller can observe are represented by the [`Error`] enum.
//! These errors are:
//! - **Kinded**: one variant per caller-visible kind, so callers branch on
//!   the variant and never on message text
//! - **Serializable**: they cross the transport as typed descriptors
//! - **Closed**: store-internal failure types never appear here; the
//!   translation layer maps them first

use serde::{Deserialize, Serialize};

/// Caller-visible failure descriptor.
///
/// # Categories
///
/// | Variant | Raised for |
/// |---------|------------|
/// | `NotFound` | missing instance, migration, aggregate, membership, host |
/// | `InvalidArgument` | disallowed update keys, bad timestamps, bad selectors, bad uuids |
/// | `Conflict` | duplicate aggregate membership, unexpected task state |
/// | `NotImplemented` | unsupported contract version, missing driver capability |
/// | `PermissionDenied` | host actions that need administrative privilege |
/// | `Internal` | every failure an operation does not declare |
///
/// # Example
///
/// ```ignore
/// use conductor_executor::{Command, Error, Executor};
///
/// match executor.execute(&ctx, cmd) {
///     Ok(output) => { /* handle success */ }
///     Err(Error::NotFound { reason }) => println!("missing: {}", reason),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    /// The addressed entity does not exist
    #[error("not found: {reason}")]
    NotFound { reason: String },

    /// The caller supplied something malformed
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The request contradicts current state
    #[error("conflict: {reason}")]
    Conflict { reason: String },

    /// Unsupported version or missing capability
    #[error("not implemented: {reason}")]
    NotImplemented { reason: String },

    /// The caller lacks the privilege the action needs
    #[error("permission denied: {reason}")]
    PermissionDenied { reason: String },

    /// Anything else (bug or infrastructure failure)
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

/// Fieldless discriminant of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`Error::NotFound`]
    NotFound,
    /// See [`Error::InvalidArgument`]
    InvalidArgument,
    /// See [`Error::Conflict`]
    Conflict,
    /// See [`Error::NotImplemented`]
    NotImplemented,
    /// See [`Error::PermissionDenied`]
    PermissionDenied,
    /// See [`Error::Internal`]
    Internal,
}

impl Error {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::NotImplemented { .. } => ErrorKind::NotImplemented,
            Error::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Error::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// The human-readable explanation.
    pub fn reason(&self) -> &str {
        match self {
            Error::NotFound { reason }
            | Error::InvalidArgument { reason }
            | Error::Conflict { reason }
            | Error::NotImplemented { reason }
            | Error::PermissionDenied { reason }
            | Error::Internal { reason } => reason,
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub(crate) fn internal(reason: impl Into<String>) -> Self {
        Error::Internal {
            reason: reason.into(),
        }
    }
}
