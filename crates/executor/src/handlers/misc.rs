//! Service plumbing handlers.

use conductor_core::{Object, Value};

use crate::config::ConductorConfig;
use crate::{Output, Result};

/// Handle Ping command: echo the argument back under the service name.
pub fn ping(arg: Value) -> Result<Output> {
    let mut reply = Object::new();
    reply.insert("service".to_string(), Value::from("conductor"));
    reply.insert("arg".to_string(), arg);
    Ok(Output::Value(Value::Object(reply)))
}

/// Handle GetBackdoorPort command.
pub fn get_backdoor_port(config: &ConductorConfig) -> Result<Output> {
    Ok(Output::Maybe(
        config.backdoor_port.map(|port| Value::Int(i64::from(port))),
    ))
}
