//! Block device mapping handlers.

use conductor_core::{Object, RequestContext, Store, Value};

use crate::convert::convert_result;
use crate::normalize::to_primitive_all;
use crate::operation::Operation;
use crate::{Error, Output, Result};

/// Handle BlockDeviceMappingUpdateOrCreate command.
///
/// `create` absent upserts on (instance, device name), `Some(true)` always
/// creates, `Some(false)` updates the mapping named by `values.id`.
pub fn block_device_mapping_update_or_create(
    store: &dyn Store,
    ctx: &RequestContext,
    values: &Object,
    create: Option<bool>,
) -> Result<Output> {
    let op = Operation::BlockDeviceMappingUpdateOrCreate;
    match create {
        None => convert_result(op, store.block_device_mapping_update_or_create(ctx, values))?,
        Some(true) => convert_result(op, store.block_device_mapping_create(ctx, values))?,
        Some(false) => {
            let id = values.get("id").and_then(Value::as_int).ok_or_else(|| {
                Error::invalid_argument("updating a block device mapping requires an integer id")
            })?;
            convert_result(op, store.block_device_mapping_update(ctx, id, values))?
        }
    };
    Ok(Output::Unit)
}

/// Handle BlockDeviceMappingGetAllByInstance command.
pub fn block_device_mapping_get_all_by_instance(
    store: &dyn Store,
    ctx: &RequestContext,
    instance_uuid: &str,
) -> Result<Output> {
    let bdms = convert_result(
        Operation::BlockDeviceMappingGetAllByInstance,
        store.block_device_mapping_get_all_by_instance(ctx, instance_uuid),
    )?;
    Ok(Output::Values(to_primitive_all(&bdms)?))
}

/// Which mappings a destroy call targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroySelector<'a> {
    /// Mappings by id
    Mappings(&'a [i64]),
    /// An instance's mappings to one volume
    InstanceVolume { instance_uuid: &'a str, volume_id: &'a str },
    /// An instance's mappings at one device name
    InstanceDevice { instance_uuid: &'a str, device_name: &'a str },
}

impl<'a> DestroySelector<'a> {
    /// Resolve the loose destroy arguments to exactly one selector shape.
    ///
    /// Anything other than exactly one complete shape, with no stray
    /// argument beside it, is an invalid invocation.
    pub fn resolve(
        bdms: Option<&'a [i64]>,
        instance_uuid: Option<&'a str>,
        volume_id: Option<&'a str>,
        device_name: Option<&'a str>,
    ) -> Result<Self> {
        match (bdms, instance_uuid, volume_id, device_name) {
            (Some(ids), None, None, None) => Ok(DestroySelector::Mappings(ids)),
            (None, Some(instance_uuid), Some(volume_id), None) => {
                Ok(DestroySelector::InstanceVolume {
                    instance_uuid,
                    volume_id,
                })
            }
            (None, Some(instance_uuid), None, Some(device_name)) => {
                Ok(DestroySelector::InstanceDevice {
                    instance_uuid,
                    device_name,
                })
            }
            _ => Err(Error::invalid_argument(
                "invalid block_device_mapping_destroy invocation",
            )),
        }
    }
}

/// Handle BlockDeviceMappingDestroy command.
pub fn block_device_mapping_destroy(
    store: &dyn Store,
    ctx: &RequestContext,
    selector: DestroySelector<'_>,
) -> Result<Output> {
    let op = Operation::BlockDeviceMappingDestroy;
    match selector {
        DestroySelector::Mappings(ids) => {
            for id in ids {
                convert_result(op, store.block_device_mapping_destroy(ctx, *id))?;
            }
        }
        DestroySelector::InstanceVolume {
            instance_uuid,
            volume_id,
        } => convert_result(
            op,
            store.block_device_mapping_destroy_by_instance_and_volume(ctx, instance_uuid, volume_id),
        )?,
        DestroySelector::InstanceDevice {
            instance_uuid,
            device_name,
        } => convert_result(
            op,
            store.block_device_mapping_destroy_by_instance_and_device(
                ctx,
                instance_uuid,
                device_name,
            ),
        )?,
    }
    Ok(Output::Unit)
}
