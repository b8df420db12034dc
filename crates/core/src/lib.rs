//! Core types and contracts for the conductor
//!
//! This crate defines the vocabulary shared by the store and the executor:
//! - Value: the closed, wire-safe value model
//! - Timestamp: the canonical temporal type and its one string format
//! - RequestContext: the caller identity forwarded to the store
//! - Entities: the rich shapes a store returns
//! - InstanceField: the closed set of updatable instance fields
//! - StoreError: kind-tagged store and driver failures
//! - Traits: Store, ChangeNotifier, HostApi

#![warn(clippy::all)]

pub mod context;
pub mod entities;
pub mod error;
pub mod fields;
pub mod timestamp;
pub mod traits;
pub mod value;

pub use context::{ReadDeleted, RequestContext};
pub use entities::*;
pub use error::{StoreError, StoreErrorKind, StoreResult};
pub use fields::{InstanceField, InstanceUpdates, SortDir, UpdateValue};
pub use timestamp::{Timestamp, TimestampParseError, CANONICAL_FORMAT};
pub use traits::{ChangeNotifier, HostApi, NoopNotifier, PowerAction, Store};
pub use value::{json_to_value, value_to_json, Object, Value};
