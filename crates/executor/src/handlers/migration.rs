//! Migration command handlers. Lookups and updates run elevated.

use std::time::Duration;

use conductor_core::{RequestContext, Store};

use crate::convert::convert_result;
use crate::normalize::{to_primitive, to_primitive_all};
use crate::operation::Operation;
use crate::{Output, Result};

/// Handle MigrationGet command.
pub fn migration_get(store: &dyn Store, ctx: &RequestContext, migration_id: i64) -> Result<Output> {
    let migration = convert_result(
        Operation::MigrationGet,
        store.migration_get(&ctx.elevated(), migration_id),
    )?;
    Ok(Output::Value(to_primitive(&migration)?))
}

/// Handle MigrationUpdate command. Only the status changes.
pub fn migration_update(
    store: &dyn Store,
    ctx: &RequestContext,
    migration_id: i64,
    status: &str,
) -> Result<Output> {
    let migration = convert_result(
        Operation::MigrationUpdate,
        store.migration_update(&ctx.elevated(), migration_id, status),
    )?;
    Ok(Output::Value(to_primitive(&migration)?))
}

/// Handle MigrationGetUnconfirmedByDestCompute command.
pub fn migration_get_unconfirmed_by_dest_compute(
    store: &dyn Store,
    ctx: &RequestContext,
    confirm_window_secs: u64,
    dest_compute: &str,
) -> Result<Output> {
    let migrations = convert_result(
        Operation::MigrationGetUnconfirmedByDestCompute,
        store.migration_get_unconfirmed_by_dest_compute(
            ctx,
            Duration::from_secs(confirm_window_secs),
            dest_compute,
        ),
    )?;
    Ok(Output::Values(to_primitive_all(&migrations)?))
}
