//! Conductor - mediating facade between compute workers and the store
//!
//! Workers never touch the store directly. Every call goes through the
//! [`Executor`], which checks the caller's contract version, validates
//! update sets against a field whitelist, translates store failures into a
//! small set of caller-visible error kinds, and normalizes every result to
//! the wire value model.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use conductor::{Command, Executor, RequestContext};
//! use conductor::storage::MemoryStore;
//!
//! let executor = Executor::new(Arc::new(MemoryStore::new()));
//! let ctx = RequestContext::new("user", "project");
//!
//! let pong = executor.execute(&ctx, Command::Ping { arg: "hello".into() })?;
//! ```
//!
//! # Architecture
//!
//! The store and the host driver are collaborators behind traits
//! ([`Store`], [`HostApi`]); `conductor-storage` ships an in-memory store
//! and scripted drivers for tests.

// Re-export the public API from conductor-executor
pub use conductor_executor::*;

/// Reference store and test collaborators.
pub mod storage {
    pub use conductor_storage::testing;
    pub use conductor_storage::MemoryStore;
}
