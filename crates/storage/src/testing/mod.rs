//! Testing collaborators for the conductor
//!
//! - **RecordingNotifier**: keeps every change event it receives
//! - **ScriptedHostApi**: a host driver with a fixed host inventory and
//!   switchable capabilities
//!
//! # Example
//!
//! ```ignore
//! use conductor_storage::testing::{RecordingNotifier, ScriptedHostApi};
//!
//! let notifier = RecordingNotifier::new();
//! let hosts = ScriptedHostApi::new().with_host("h1", "compute", "nova");
//! hosts.disable("set_host_maintenance");
//! ```

mod host_api;
mod notifier;

pub use host_api::{HostCall, ScriptedHostApi};
pub use notifier::RecordingNotifier;
