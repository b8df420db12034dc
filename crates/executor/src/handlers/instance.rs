//! Instance command handlers.

use std::time::Duration;

use conductor_core::{
    ChangeNotifier, InstanceField, Object, RequestContext, SortDir, Store, Timestamp,
};

use crate::convert::convert_result;
use crate::normalize::{to_primitive, to_primitive_all};
use crate::operation::Operation;
use crate::validate::validate_updates;
use crate::{Output, Result};

/// Handle InstanceUpdate command.
///
/// The update set is validated in full before the store is touched. The
/// store applies it atomically and hands back both states, which are
/// published before the new state is returned.
pub fn instance_update(
    store: &dyn Store,
    notifier: &dyn ChangeNotifier,
    ctx: &RequestContext,
    instance_uuid: &str,
    updates: &Object,
) -> Result<Output> {
    let updates = validate_updates::<InstanceField>(instance_uuid, updates)?;
    let (old, new) = convert_result(
        Operation::InstanceUpdate,
        store.instance_update_and_get_original(ctx, instance_uuid, &updates),
    )?;
    notifier.send_update(ctx, &old, &new);
    Ok(Output::Value(to_primitive(&new)?))
}

/// Handle InstanceGet command.
pub fn instance_get(store: &dyn Store, ctx: &RequestContext, instance_id: i64) -> Result<Output> {
    let instance = convert_result(Operation::InstanceGet, store.instance_get(ctx, instance_id))?;
    Ok(Output::Value(to_primitive(&instance)?))
}

/// Handle InstanceGetByUuid command.
pub fn instance_get_by_uuid(
    store: &dyn Store,
    ctx: &RequestContext,
    instance_uuid: &str,
) -> Result<Output> {
    let instance = convert_result(
        Operation::InstanceGetByUuid,
        store.instance_get_by_uuid(ctx, instance_uuid),
    )?;
    Ok(Output::Value(to_primitive(&instance)?))
}

/// Handle InstanceGetAll command.
pub fn instance_get_all(store: &dyn Store, ctx: &RequestContext) -> Result<Output> {
    let instances = convert_result(Operation::InstanceGetAll, store.instance_get_all(ctx))?;
    Ok(Output::Values(to_primitive_all(&instances)?))
}

/// Handle InstanceGetAllByHost command. Runs elevated.
pub fn instance_get_all_by_host(
    store: &dyn Store,
    ctx: &RequestContext,
    host: &str,
) -> Result<Output> {
    let instances = convert_result(
        Operation::InstanceGetAllByHost,
        store.instance_get_all_by_host(&ctx.elevated(), host),
    )?;
    Ok(Output::Values(to_primitive_all(&instances)?))
}

/// Handle InstanceGetAllByFilters command.
pub fn instance_get_all_by_filters(
    store: &dyn Store,
    ctx: &RequestContext,
    filters: &Object,
    sort_key: &str,
    sort_dir: SortDir,
) -> Result<Output> {
    let instances = convert_result(
        Operation::InstanceGetAllByFilters,
        store.instance_get_all_by_filters(ctx, filters, sort_key, sort_dir),
    )?;
    Ok(Output::Values(to_primitive_all(&instances)?))
}

/// Handle InstanceGetAllHungInRebooting command.
pub fn instance_get_all_hung_in_rebooting(
    store: &dyn Store,
    ctx: &RequestContext,
    timeout_secs: u64,
) -> Result<Output> {
    let instances = convert_result(
        Operation::InstanceGetAllHungInRebooting,
        store.instance_get_all_hung_in_rebooting(ctx, Duration::from_secs(timeout_secs)),
    )?;
    Ok(Output::Values(to_primitive_all(&instances)?))
}

/// Handle InstanceGetActiveByWindow command.
pub fn instance_get_active_by_window(
    store: &dyn Store,
    ctx: &RequestContext,
    begin: Timestamp,
    end: Option<Timestamp>,
    project_id: Option<&str>,
    host: Option<&str>,
) -> Result<Output> {
    let instances = convert_result(
        Operation::InstanceGetActiveByWindow,
        store.instance_get_active_by_window(ctx, begin, end, project_id, host),
    )?;
    Ok(Output::Values(to_primitive_all(&instances)?))
}

/// Handle InstanceDestroy command.
pub fn instance_destroy(
    store: &dyn Store,
    ctx: &RequestContext,
    instance_uuid: &str,
) -> Result<Output> {
    convert_result(
        Operation::InstanceDestroy,
        store.instance_destroy(ctx, instance_uuid),
    )?;
    Ok(Output::Unit)
}

/// Handle InstanceInfoCacheDelete command.
pub fn instance_info_cache_delete(
    store: &dyn Store,
    ctx: &RequestContext,
    instance_uuid: &str,
) -> Result<Output> {
    convert_result(
        Operation::InstanceInfoCacheDelete,
        store.instance_info_cache_delete(ctx, instance_uuid),
    )?;
    Ok(Output::Unit)
}

/// Handle InstanceInfoCacheUpdate command.
pub fn instance_info_cache_update(
    store: &dyn Store,
    ctx: &RequestContext,
    instance_uuid: &str,
    values: &Object,
) -> Result<Output> {
    convert_result(
        Operation::InstanceInfoCacheUpdate,
        store.instance_info_cache_update(ctx, instance_uuid, values),
    )?;
    Ok(Output::Unit)
}

/// Handle InstanceTypeGet command.
pub fn instance_type_get(
    store: &dyn Store,
    ctx: &RequestContext,
    instance_type_id: i64,
) -> Result<Output> {
    let flavor = convert_result(
        Operation::InstanceTypeGet,
        store.instance_type_get(ctx, instance_type_id),
    )?;
    Ok(Output::Value(to_primitive(&flavor)?))
}
