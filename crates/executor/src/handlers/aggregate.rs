//! Aggregate command handlers. Every aggregate call runs elevated.

use std::collections::BTreeMap;

use conductor_core::{RequestContext, Store};

use crate::convert::convert_result;
use crate::normalize::{to_primitive, to_primitive_all};
use crate::operation::Operation;
use crate::{Output, Result};

/// Handle AggregateGet command.
pub fn aggregate_get(store: &dyn Store, ctx: &RequestContext, aggregate_id: i64) -> Result<Output> {
    let aggregate = convert_result(
        Operation::AggregateGet,
        store.aggregate_get(&ctx.elevated(), aggregate_id),
    )?;
    Ok(Output::Value(to_primitive(&aggregate)?))
}

/// Handle AggregateGetByHost command.
pub fn aggregate_get_by_host(
    store: &dyn Store,
    ctx: &RequestContext,
    host: &str,
    key: Option<&str>,
) -> Result<Output> {
    let aggregates = convert_result(
        Operation::AggregateGetByHost,
        store.aggregate_get_by_host(&ctx.elevated(), host, key),
    )?;
    Ok(Output::Values(to_primitive_all(&aggregates)?))
}

/// Handle AggregateHostAdd command.
pub fn aggregate_host_add(
    store: &dyn Store,
    ctx: &RequestContext,
    aggregate_id: i64,
    host: &str,
) -> Result<Output> {
    let membership = convert_result(
        Operation::AggregateHostAdd,
        store.aggregate_host_add(&ctx.elevated(), aggregate_id, host),
    )?;
    Ok(Output::Value(to_primitive(&membership)?))
}

/// Handle AggregateHostDelete command.
pub fn aggregate_host_delete(
    store: &dyn Store,
    ctx: &RequestContext,
    aggregate_id: i64,
    host: &str,
) -> Result<Output> {
    convert_result(
        Operation::AggregateHostDelete,
        store.aggregate_host_delete(&ctx.elevated(), aggregate_id, host),
    )?;
    Ok(Output::Unit)
}

/// Handle AggregateMetadataAdd command.
///
/// With `set_delete`, the aggregate ends up holding exactly `metadata`.
pub fn aggregate_metadata_add(
    store: &dyn Store,
    ctx: &RequestContext,
    aggregate_id: i64,
    metadata: &BTreeMap<String, String>,
    set_delete: bool,
) -> Result<Output> {
    let merged = convert_result(
        Operation::AggregateMetadataAdd,
        store.aggregate_metadata_add(&ctx.elevated(), aggregate_id, metadata, set_delete),
    )?;
    Ok(Output::Value(to_primitive(&merged)?))
}

/// Handle AggregateMetadataDelete command.
pub fn aggregate_metadata_delete(
    store: &dyn Store,
    ctx: &RequestContext,
    aggregate_id: i64,
    key: &str,
) -> Result<Output> {
    convert_result(
        Operation::AggregateMetadataDelete,
        store.aggregate_metadata_delete(&ctx.elevated(), aggregate_id, key),
    )?;
    Ok(Output::Unit)
}
