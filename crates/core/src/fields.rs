//! Field vocabulary for instance updates and listings.
//!
//! The set of instance fields a caller may change is closed: each one is a
//! variant of [`InstanceField`]. The executor's validator resolves caller
//! keys against this set; the store applies the resolved updates.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;
use crate::value::Value;

/// An instance field that may appear in an update set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceField {
    TaskState,
    VmState,
    /// Precondition on the current task state, not a stored column
    ExpectedTaskState,
    PowerState,
    AccessIpV4,
    AccessIpV6,
    LaunchedAt,
    TerminatedAt,
    Host,
    Node,
    MemoryMb,
    Vcpus,
    RootGb,
    EphemeralGb,
    InstanceTypeId,
    RootDeviceName,
    LaunchedOn,
    Progress,
    VmMode,
    DefaultEphemeralDevice,
    DefaultSwapDevice,
}

impl InstanceField {
    /// Every updatable field.
    pub const ALL: [InstanceField; 21] = [
        InstanceField::TaskState,
        InstanceField::VmState,
        InstanceField::ExpectedTaskState,
        InstanceField::PowerState,
        InstanceField::AccessIpV4,
        InstanceField::AccessIpV6,
        InstanceField::LaunchedAt,
        InstanceField::TerminatedAt,
        InstanceField::Host,
        InstanceField::Node,
        InstanceField::MemoryMb,
        InstanceField::Vcpus,
        InstanceField::RootGb,
        InstanceField::EphemeralGb,
        InstanceField::InstanceTypeId,
        InstanceField::RootDeviceName,
        InstanceField::LaunchedOn,
        InstanceField::Progress,
        InstanceField::VmMode,
        InstanceField::DefaultEphemeralDevice,
        InstanceField::DefaultSwapDevice,
    ];

    /// The wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceField::TaskState => "task_state",
            InstanceField::VmState => "vm_state",
            InstanceField::ExpectedTaskState => "expected_task_state",
            InstanceField::PowerState => "power_state",
            InstanceField::AccessIpV4 => "access_ip_v4",
            InstanceField::AccessIpV6 => "access_ip_v6",
            InstanceField::LaunchedAt => "launched_at",
            InstanceField::TerminatedAt => "terminated_at",
            InstanceField::Host => "host",
            InstanceField::Node => "node",
            InstanceField::MemoryMb => "memory_mb",
            InstanceField::Vcpus => "vcpus",
            InstanceField::RootGb => "root_gb",
            InstanceField::EphemeralGb => "ephemeral_gb",
            InstanceField::InstanceTypeId => "instance_type_id",
            InstanceField::RootDeviceName => "root_device_name",
            InstanceField::LaunchedOn => "launched_on",
            InstanceField::Progress => "progress",
            InstanceField::VmMode => "vm_mode",
            InstanceField::DefaultEphemeralDevice => "default_ephemeral_device",
            InstanceField::DefaultSwapDevice => "default_swap_device",
        }
    }

    /// Exact lookup by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    /// Fields whose string values are parsed into timestamps.
    pub fn is_temporal(&self) -> bool {
        matches!(self, InstanceField::LaunchedAt | InstanceField::TerminatedAt)
    }
}

impl fmt::Display for InstanceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, type-coerced update value.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    /// Passed through as received
    Plain(Value),
    /// Parsed from a canonical timestamp string
    Time(Timestamp),
}

impl UpdateValue {
    /// The wire form of this value.
    pub fn to_value(&self) -> Value {
        match self {
            UpdateValue::Plain(v) => v.clone(),
            UpdateValue::Time(ts) => Value::String(ts.to_canonical()),
        }
    }
}

/// Validated instance updates, keyed by resolved field.
pub type InstanceUpdates = BTreeMap<InstanceField, UpdateValue>;

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    /// Ascending
    Asc,
    /// Descending
    #[default]
    Desc,
}
