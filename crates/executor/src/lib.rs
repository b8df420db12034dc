//! # Conductor Executor
//!
//! The mediator between compute workers and the shared store. Workers never
//! touch the store directly: they send versioned [`Command`]s, and the
//! [`Executor`] validates, forwards, translates failures and normalizes
//! results.
//!
//! This is the only crate callers need to import. It provides:
//! - [`Executor`] - the stateless command dispatcher
//! - [`Command`]/[`Output`]/[`Request`] - the wire-level call interface
//! - [`Error`] - the closed set of caller-visible failure kinds
//! - [`HostService`] - operator host-management actions
//!
//! ## Quick Start
//!
//! ```text
//! use std::sync::Arc;
//! use conductor_executor::{Command, Executor, RequestContext, Value};
//! use conductor_storage::MemoryStore;
//!
//! let executor = Executor::new(Arc::new(MemoryStore::new()));
//! let ctx = RequestContext::new("user", "project");
//!
//! let pong = executor.execute(&ctx, Command::Ping { arg: Value::from("hi") })?;
//! ```
//!
//! ## Request Pipeline
//!
//! | Stage | Module | Applies to |
//! |-------|--------|------------|
//! | Version negotiation | `version`, `operation` | every request |
//! | Whitelist validation | `validate` | update sets |
//! | Store call + translation | `convert` | every store call |
//! | Normalization | `normalize` | every result |

#![warn(missing_docs)]

mod command;
mod config;
mod convert;
mod error;
mod executor;
mod host;
mod normalize;
mod operation;
mod output;
mod validate;
mod version;

// Handler modules
mod handlers;

// Test modules
#[cfg(test)]
mod tests;

// =============================================================================
// Public API - Everything callers need is re-exported here
// =============================================================================

pub use command::{Command, Request};
pub use config::{ConductorConfig, CONFIG_FILE_NAME};
pub use error::{Error, ErrorKind};
pub use executor::Executor;
pub use host::HostService;
pub use normalize::{to_primitive, to_primitive_all};
pub use operation::Operation;
pub use output::Output;
pub use validate::{validate_updates, HostField, UpdateWhitelist};
pub use version::RpcVersion;

// Re-export core vocabulary so callers don't need conductor-core directly
pub use conductor_core::{
    ChangeNotifier, HostApi, InstanceField, NoopNotifier, Object, PowerAction, RequestContext,
    SortDir, Store, StoreError, StoreErrorKind, Timestamp, Value,
};

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, Error>;
