//! Conversion of loose wire values into typed entity columns.
//!
//! The store is the last line of type enforcement: a value that passed the
//! conductor's whitelist may still have the wrong shape for its column.

use std::cmp::Ordering;

use conductor_core::{
    json_to_value, BlockDeviceMapping, Instance, InstanceField, Object, StoreError, StoreResult,
    Timestamp, UpdateValue, Value, VmState,
};
use serde::Serialize;
use uuid::Uuid;

/// Parse an instance uuid, rejecting malformed strings.
pub(crate) fn parse_uuid(s: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(s).map_err(|_| StoreError::InvalidUuid {
        uuid: s.to_string(),
    })
}

/// Project any entity into the wire value model, for filtering and sorting.
pub(crate) fn project<T: Serialize>(entity: &T) -> StoreResult<Value> {
    let json = serde_json::to_value(entity).map_err(|e| StoreError::internal(e.to_string()))?;
    json_to_value(&json).map_err(StoreError::internal)
}

fn mismatch(column: &str, expected: &str, got: &Value) -> StoreError {
    StoreError::invalid(format!(
        "column {} expects {}, got {}",
        column,
        expected,
        got.type_name()
    ))
}

fn opt_string(column: &str, v: &Value) -> StoreResult<Option<String>> {
    match v {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(mismatch(column, "string or null", other)),
    }
}

fn int(column: &str, v: &Value) -> StoreResult<i64> {
    v.as_int().ok_or_else(|| mismatch(column, "integer", v))
}

fn opt_int(column: &str, v: &Value) -> StoreResult<Option<i64>> {
    match v {
        Value::Null => Ok(None),
        Value::Int(i) => Ok(Some(*i)),
        other => Err(mismatch(column, "integer or null", other)),
    }
}

fn boolean(column: &str, v: &Value) -> StoreResult<bool> {
    v.as_bool().ok_or_else(|| mismatch(column, "boolean", v))
}

fn opt_time(column: &str, v: &UpdateValue) -> StoreResult<Option<Timestamp>> {
    match v {
        UpdateValue::Time(ts) => Ok(Some(*ts)),
        UpdateValue::Plain(Value::Null) => Ok(None),
        UpdateValue::Plain(Value::String(s)) => Timestamp::parse_canonical(s)
            .map(Some)
            .map_err(|e| StoreError::invalid(e.to_string())),
        UpdateValue::Plain(other) => Err(mismatch(column, "timestamp or null", other)),
    }
}

/// Check the `expected_task_state` precondition against an instance.
///
/// The expectation is either one state (a string or null) or a list of
/// acceptable states.
pub(crate) fn check_expected_task_state(
    instance: &Instance,
    expected: &UpdateValue,
) -> StoreResult<()> {
    let expected = expected.to_value();
    let accepted: Vec<Option<String>> = match &expected {
        Value::Array(items) => items
            .iter()
            .map(|v| opt_string("expected_task_state", v))
            .collect::<StoreResult<_>>()?,
        single => vec![opt_string("expected_task_state", single)?],
    };
    if accepted.contains(&instance.task_state) {
        Ok(())
    } else {
        let render = |s: &Option<String>| s.clone().unwrap_or_else(|| "None".to_string());
        Err(StoreError::UnexpectedTaskState {
            expected: accepted.iter().map(render).collect::<Vec<_>>().join(", "),
            actual: render(&instance.task_state),
        })
    }
}

/// Apply one resolved field to an instance.
pub(crate) fn apply_instance_field(
    instance: &mut Instance,
    field: InstanceField,
    value: &UpdateValue,
) -> StoreResult<()> {
    let column = field.as_str();
    if field.is_temporal() {
        let ts = opt_time(column, value)?;
        match field {
            InstanceField::LaunchedAt => instance.launched_at = ts,
            _ => instance.terminated_at = ts,
        }
        return Ok(());
    }
    let v = value.to_value();
    match field {
        InstanceField::ExpectedTaskState => {}
        InstanceField::TaskState => instance.task_state = opt_string(column, &v)?,
        InstanceField::VmState => {
            let name = v.as_str().ok_or_else(|| mismatch(column, "string", &v))?;
            instance.vm_state = name.parse::<VmState>().map_err(StoreError::invalid)?;
        }
        InstanceField::PowerState => instance.power_state = int(column, &v)?,
        InstanceField::AccessIpV4 => instance.access_ip_v4 = opt_string(column, &v)?,
        InstanceField::AccessIpV6 => instance.access_ip_v6 = opt_string(column, &v)?,
        InstanceField::Host => instance.host = opt_string(column, &v)?,
        InstanceField::Node => instance.node = opt_string(column, &v)?,
        InstanceField::MemoryMb => instance.memory_mb = int(column, &v)?,
        InstanceField::Vcpus => instance.vcpus = int(column, &v)?,
        InstanceField::RootGb => instance.root_gb = int(column, &v)?,
        InstanceField::EphemeralGb => instance.ephemeral_gb = int(column, &v)?,
        InstanceField::InstanceTypeId => instance.instance_type_id = opt_int(column, &v)?,
        InstanceField::RootDeviceName => instance.root_device_name = opt_string(column, &v)?,
        InstanceField::LaunchedOn => instance.launched_on = opt_string(column, &v)?,
        InstanceField::Progress => instance.progress = int(column, &v)?,
        InstanceField::VmMode => instance.vm_mode = opt_string(column, &v)?,
        InstanceField::DefaultEphemeralDevice => {
            instance.default_ephemeral_device = opt_string(column, &v)?
        }
        InstanceField::DefaultSwapDevice => {
            instance.default_swap_device = opt_string(column, &v)?
        }
        InstanceField::LaunchedAt | InstanceField::TerminatedAt => {}
    }
    Ok(())
}

/// Apply raw values to a block device mapping.
///
/// `id` is accepted and ignored; any other unknown column is rejected.
pub(crate) fn apply_bdm_values(bdm: &mut BlockDeviceMapping, values: &Object) -> StoreResult<()> {
    for (column, v) in values {
        match column.as_str() {
            "id" => {}
            "instance_uuid" => {
                let s = v.as_str().ok_or_else(|| mismatch(column, "string", v))?;
                bdm.instance_uuid = parse_uuid(s)?;
            }
            "device_name" => bdm.device_name = opt_string(column, v)?,
            "volume_id" => bdm.volume_id = opt_string(column, v)?,
            "snapshot_id" => bdm.snapshot_id = opt_string(column, v)?,
            "volume_size" => bdm.volume_size = opt_int(column, v)?,
            "virtual_name" => bdm.virtual_name = opt_string(column, v)?,
            "delete_on_termination" => bdm.delete_on_termination = boolean(column, v)?,
            "no_device" => bdm.no_device = boolean(column, v)?,
            "connection_info" => bdm.connection_info = opt_string(column, v)?,
            other => {
                return Err(StoreError::invalid(format!(
                    "unknown block device mapping column {}",
                    other
                )))
            }
        }
    }
    Ok(())
}

/// Does a projected entity satisfy one filter?
///
/// A list filter matches any of its members. A filter on a column the
/// entity does not have is ignored.
pub(crate) fn matches_filter(projected: &Value, column: &str, wanted: &Value) -> bool {
    match projected.get(column) {
        None => true,
        Some(actual) => match wanted {
            Value::Array(options) => options.contains(actual),
            single => single == actual,
        },
    }
}

/// Total order over scalar values for sorting listings. Nulls sort first.
pub(crate) fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)).unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.type_name().cmp(b.type_name()),
    }
}
