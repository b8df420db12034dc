//! Failures raised by the store and the host driver
//!
//! These are the implementation-side failure kinds. They never reach a
//! caller as-is: the executor's translation layer checks each one against
//! the calling operation's allow-list and maps it to a caller-visible kind,
//! or to an internal error when the operation does not declare it.

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Fieldless discriminant of [`StoreError`], used in allow-list tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// No instance matches the given id or uuid
    InstanceNotFound,
    /// The given string is not a well-formed uuid
    InvalidUuid,
    /// The instance's task state did not match the expected task state
    UnexpectedTaskState,
    /// No migration matches the given id
    MigrationNotFound,
    /// No aggregate matches the given id
    AggregateNotFound,
    /// The host is already a member of the aggregate
    AggregateHostExists,
    /// The host is not a member of the aggregate
    AggregateHostNotFound,
    /// The aggregate has no metadata entry for the key
    AggregateMetadataNotFound,
    /// No instance type matches the given id
    InstanceTypeNotFound,
    /// No security group matches the given id
    SecurityGroupNotFound,
    /// No block device mapping matches the given id
    BlockDeviceMappingNotFound,
    /// No instance action matches an action-event request
    ActionNotFound,
    /// No compute host matches the given name
    HostNotFound,
    /// The operation requires administrative privileges
    AdminRequired,
    /// The underlying driver does not implement the capability
    NotImplemented,
    /// The store rejected an argument (bad type, bad shape)
    Invalid,
    /// Anything else: connection loss, corruption, bugs
    Internal,
}

/// Kind-tagged failure raised by a store or host driver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Instance lookup failed
    #[error("instance {instance} could not be found")]
    InstanceNotFound {
        /// The id or uuid that was looked up
        instance: String,
    },

    /// Malformed uuid
    #[error("expected a uuid but received {uuid}")]
    InvalidUuid {
        /// The rejected string
        uuid: String,
    },

    /// Task-state precondition failed
    #[error("unexpected task state: expecting {expected} but the actual state is {actual}")]
    UnexpectedTaskState {
        /// The acceptable states, rendered
        expected: String,
        /// The state found
        actual: String,
    },

    /// Migration lookup failed
    #[error("migration {migration_id} could not be found")]
    MigrationNotFound {
        /// The migration id
        migration_id: i64,
    },

    /// Aggregate lookup failed
    #[error("aggregate {aggregate_id} could not be found")]
    AggregateNotFound {
        /// The aggregate id
        aggregate_id: i64,
    },

    /// Duplicate aggregate membership
    #[error("aggregate {aggregate_id} already has host {host}")]
    AggregateHostExists {
        /// The aggregate id
        aggregate_id: i64,
        /// The host
        host: String,
    },

    /// Missing aggregate membership
    #[error("aggregate {aggregate_id} has no host {host}")]
    AggregateHostNotFound {
        /// The aggregate id
        aggregate_id: i64,
        /// The host
        host: String,
    },

    /// Missing aggregate metadata key
    #[error("aggregate {aggregate_id} has no metadata with key {key}")]
    AggregateMetadataNotFound {
        /// The aggregate id
        aggregate_id: i64,
        /// The metadata key
        key: String,
    },

    /// Instance type lookup failed
    #[error("instance type {instance_type_id} could not be found")]
    InstanceTypeNotFound {
        /// The instance type id
        instance_type_id: i64,
    },

    /// Security group lookup failed
    #[error("security group {security_group_id} could not be found")]
    SecurityGroupNotFound {
        /// The security group id
        security_group_id: i64,
    },

    /// Block device mapping lookup failed
    #[error("block device mapping {bdm_id} could not be found")]
    BlockDeviceMappingNotFound {
        /// The mapping id
        bdm_id: i64,
    },

    /// Action lookup failed
    #[error("action for request {request_id} on instance {instance_uuid} not found")]
    ActionNotFound {
        /// The originating request id
        request_id: String,
        /// The instance uuid
        instance_uuid: String,
    },

    /// Host lookup failed
    #[error("compute host {host} could not be found")]
    HostNotFound {
        /// The host name
        host: String,
    },

    /// Privilege check failed
    #[error("user does not have admin privileges")]
    AdminRequired,

    /// Capability missing in the driver
    #[error("not implemented: {capability}")]
    NotImplemented {
        /// The missing capability
        capability: String,
    },

    /// Argument rejected by the store
    #[error("invalid: {message}")]
    Invalid {
        /// What was wrong
        message: String,
    },

    /// Anything else
    #[error("internal store error: {message}")]
    Internal {
        /// What happened
        message: String,
    },
}

impl StoreError {
    /// The fieldless kind of this failure.
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::InstanceNotFound { .. } => StoreErrorKind::InstanceNotFound,
            StoreError::InvalidUuid { .. } => StoreErrorKind::InvalidUuid,
            StoreError::UnexpectedTaskState { .. } => StoreErrorKind::UnexpectedTaskState,
            StoreError::MigrationNotFound { .. } => StoreErrorKind::MigrationNotFound,
            StoreError::AggregateNotFound { .. } => StoreErrorKind::AggregateNotFound,
            StoreError::AggregateHostExists { .. } => StoreErrorKind::AggregateHostExists,
            StoreError::AggregateHostNotFound { .. } => StoreErrorKind::AggregateHostNotFound,
            StoreError::AggregateMetadataNotFound { .. } => {
                StoreErrorKind::AggregateMetadataNotFound
            }
            StoreError::InstanceTypeNotFound { .. } => StoreErrorKind::InstanceTypeNotFound,
            StoreError::SecurityGroupNotFound { .. } => StoreErrorKind::SecurityGroupNotFound,
            StoreError::BlockDeviceMappingNotFound { .. } => {
                StoreErrorKind::BlockDeviceMappingNotFound
            }
            StoreError::ActionNotFound { .. } => StoreErrorKind::ActionNotFound,
            StoreError::HostNotFound { .. } => StoreErrorKind::HostNotFound,
            StoreError::AdminRequired => StoreErrorKind::AdminRequired,
            StoreError::NotImplemented { .. } => StoreErrorKind::NotImplemented,
            StoreError::Invalid { .. } => StoreErrorKind::Invalid,
            StoreError::Internal { .. } => StoreErrorKind::Internal,
        }
    }

    /// Shorthand for [`StoreError::Invalid`].
    pub fn invalid(message: impl Into<String>) -> Self {
        StoreError::Invalid {
            message: message.into(),
        }
    }

    /// Shorthand for [`StoreError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        StoreError::Internal {
            message: message.into(),
        }
    }

    /// Shorthand for [`StoreError::NotImplemented`].
    pub fn not_implemented(capability: impl Into<String>) -> Self {
        StoreError::NotImplemented {
            capability: capability.into(),
        }
    }
}
