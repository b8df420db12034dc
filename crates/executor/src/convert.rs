//! Error translation from store failures.
//!
//! Each operation declares which store failure kinds it lets through
//! ([`Operation::allowed_failures`]). A declared failure is mapped to its
//! caller-visible kind with its message preserved. An undeclared failure is
//! a defect somewhere below the facade: it is logged and surfaces as
//! [`Error::Internal`], never as a success and never as a declared kind.

use conductor_core::{StoreError, StoreErrorKind, StoreResult};

use crate::operation::Operation;
use crate::Error;

/// The caller-visible error for a declared store failure.
fn expose(err: StoreError) -> Error {
    let reason = err.to_string();
    match err.kind() {
        StoreErrorKind::InstanceNotFound
        | StoreErrorKind::MigrationNotFound
        | StoreErrorKind::AggregateNotFound
        | StoreErrorKind::AggregateHostNotFound
        | StoreErrorKind::AggregateMetadataNotFound
        | StoreErrorKind::InstanceTypeNotFound
        | StoreErrorKind::SecurityGroupNotFound
        | StoreErrorKind::BlockDeviceMappingNotFound
        | StoreErrorKind::ActionNotFound
        | StoreErrorKind::HostNotFound => Error::NotFound { reason },
        StoreErrorKind::InvalidUuid | StoreErrorKind::Invalid => Error::InvalidArgument { reason },
        StoreErrorKind::AggregateHostExists | StoreErrorKind::UnexpectedTaskState => {
            Error::Conflict { reason }
        }
        StoreErrorKind::NotImplemented => Error::NotImplemented { reason },
        StoreErrorKind::AdminRequired => Error::PermissionDenied { reason },
        StoreErrorKind::Internal => Error::Internal { reason },
    }
}

/// Translate a store failure raised inside `operation`, given the kinds it
/// declares.
pub(crate) fn translate(operation: &str, allowed: &[StoreErrorKind], err: StoreError) -> Error {
    let kind = err.kind();
    if allowed.contains(&kind) {
        tracing::debug!(target: "conductor::translate", operation, ?kind, "Passing declared failure through");
        return expose(err);
    }
    tracing::error!(
        target: "conductor::translate",
        operation,
        ?kind,
        error = %err,
        "Undeclared store failure"
    );
    Error::Internal {
        reason: format!("{} failed: {}", operation, err),
    }
}

/// Convert a store result inside a facade operation.
pub(crate) fn convert_result<T>(operation: Operation, result: StoreResult<T>) -> crate::Result<T> {
    result.map_err(|err| translate(operation.as_str(), operation.allowed_failures(), err))
}
