//! Output enum for command execution results.
//!
//! Every command produces exactly one output variant, documented on the
//! command. All payloads are already normalized to the wire value model.

use conductor_core::Value;
use serde::{Deserialize, Serialize};

/// Successful command execution results.
///
/// # Example
///
/// ```text
/// use conductor_executor::{Command, Output};
///
/// match executor.execute(&ctx, Command::AgentBuildGetByTriple { .. })? {
///     Output::Maybe(Some(build)) => println!("agent at {:?}", build.get("url")),
///     Output::Maybe(None) => println!("no agent build"),
///     _ => unreachable!("AgentBuildGetByTriple always returns Maybe"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// No return value (destroy, delete, fire-and-forget updates)
    Unit,

    /// One normalized entity or mapping
    Value(Value),

    /// A lookup that may find nothing
    Maybe(Option<Value>),

    /// A normalized sequence of entities
    Values(Vec<Value>),
}

impl Output {
    /// The payload as one value: `Unit` and `Maybe(None)` read as null,
    /// sequences as an array.
    pub fn into_value(self) -> Value {
        match self {
            Output::Unit | Output::Maybe(None) => Value::Null,
            Output::Value(v) | Output::Maybe(Some(v)) => v,
            Output::Values(vs) => Value::Array(vs),
        }
    }
}
