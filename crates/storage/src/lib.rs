//! Storage layer for the conductor
//!
//! This crate provides the reference implementation of the
//! [`Store`](conductor_core::Store) contract:
//! - MemoryStore: table-per-entity storage behind one RwLock
//! - Typed column application for loose wire values
//! - Testing collaborators: a recording change notifier and a scripted
//!   host driver

#![warn(missing_docs)]
#![warn(clippy::all)]

mod apply;
pub mod memory;
pub mod testing;

pub use memory::MemoryStore;
