//! Usage accounting handlers.

use conductor_core::{BandwidthCounters, RequestContext, Store, Timestamp, VolumeCounters};

use crate::convert::convert_result;
use crate::normalize::{to_primitive, to_primitive_all};
use crate::operation::Operation;
use crate::{Output, Result};

/// Handle BwUsageUpdate command.
///
/// Writes only when at least one counter is given; either way the current
/// reading for the interface and period is returned.
pub fn bw_usage_update(
    store: &dyn Store,
    ctx: &RequestContext,
    instance_uuid: &str,
    mac: &str,
    start_period: Timestamp,
    counters: BandwidthCounters,
    last_refreshed: Option<Timestamp>,
) -> Result<Output> {
    if !counters.is_empty() {
        convert_result(
            Operation::BwUsageUpdate,
            store.bw_usage_update(ctx, instance_uuid, mac, start_period, &counters, last_refreshed),
        )?;
    }
    let usage = convert_result(
        Operation::BwUsageUpdate,
        store.bw_usage_get(ctx, instance_uuid, start_period, mac),
    )?;
    Ok(Output::Maybe(usage.as_ref().map(to_primitive).transpose()?))
}

/// Handle VolGetUsageByTime command.
pub fn vol_get_usage_by_time(
    store: &dyn Store,
    ctx: &RequestContext,
    start_time: Timestamp,
) -> Result<Output> {
    let usage = convert_result(
        Operation::VolGetUsageByTime,
        store.vol_get_usage_by_time(ctx, start_time),
    )?;
    Ok(Output::Values(to_primitive_all(&usage)?))
}

/// Handle VolUsageUpdate command.
pub fn vol_usage_update(
    store: &dyn Store,
    ctx: &RequestContext,
    volume_id: &str,
    counters: VolumeCounters,
    instance_uuid: &str,
    last_refreshed: Option<Timestamp>,
    update_totals: bool,
) -> Result<Output> {
    convert_result(
        Operation::VolUsageUpdate,
        store.vol_usage_update(
            ctx,
            volume_id,
            counters,
            instance_uuid,
            last_refreshed,
            update_totals,
        ),
    )?;
    Ok(Output::Unit)
}
