//! Instance action event handlers. Pass-through: the store enforces
//! everything about the values.

use conductor_core::{ActionEventValues, RequestContext, Store};

use crate::convert::convert_result;
use crate::normalize::to_primitive;
use crate::operation::Operation;
use crate::{Output, Result};

/// Handle ActionEventStart command.
pub fn action_event_start(
    store: &dyn Store,
    ctx: &RequestContext,
    values: &ActionEventValues,
) -> Result<Output> {
    let event = convert_result(
        Operation::ActionEventStart,
        store.action_event_start(ctx, values),
    )?;
    Ok(Output::Value(to_primitive(&event)?))
}

/// Handle ActionEventFinish command.
pub fn action_event_finish(
    store: &dyn Store,
    ctx: &RequestContext,
    values: &ActionEventValues,
) -> Result<Output> {
    let event = convert_result(
        Operation::ActionEventFinish,
        store.action_event_finish(ctx, values),
    )?;
    Ok(Output::Value(to_primitive(&event)?))
}
