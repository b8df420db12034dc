//! Conductor Facade Test Suite
//!
//! Exercises the public surface end to end over the in-memory store:
//! versioned requests on the wire, the properties every operation must
//! hold for all inputs, and concurrent callers.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test conductor
//!
//! # Properties only
//! cargo test --test conductor properties::
//!
//! # With the conductor's own logs
//! RUST_LOG=conductor=debug cargo test --test conductor -- --nocapture
//! ```

mod common;

mod concurrency;
mod properties;
mod wire;
