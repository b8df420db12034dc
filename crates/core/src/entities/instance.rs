//! Instance-centred entities: instances, flavors, migrations, action log.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timestamp::Timestamp;
use crate::value::Value;

/// Lifecycle state of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmState {
    /// Running or ready to run
    Active,
    /// Being created
    Building,
    /// Paused in memory
    Paused,
    /// Suspended to disk
    Suspended,
    /// Powered off
    Stopped,
    /// Booted from a rescue image
    Rescued,
    /// Resized, awaiting confirmation
    Resized,
    /// Deleted but recoverable
    SoftDeleted,
    /// Deleted
    Deleted,
    /// Failed
    Error,
}

impl VmState {
    /// The wire name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            VmState::Active => "active",
            VmState::Building => "building",
            VmState::Paused => "paused",
            VmState::Suspended => "suspended",
            VmState::Stopped => "stopped",
            VmState::Rescued => "rescued",
            VmState::Resized => "resized",
            VmState::SoftDeleted => "soft_deleted",
            VmState::Deleted => "deleted",
            VmState::Error => "error",
        }
    }
}

impl fmt::Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VmState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "active" => VmState::Active,
            "building" => VmState::Building,
            "paused" => VmState::Paused,
            "suspended" => VmState::Suspended,
            "stopped" => VmState::Stopped,
            "rescued" => VmState::Rescued,
            "resized" => VmState::Resized,
            "soft_deleted" => VmState::SoftDeleted,
            "deleted" => VmState::Deleted,
            "error" => VmState::Error,
            other => return Err(format!("unknown vm_state '{}'", other)),
        })
    }
}

/// Cached network information attached to an instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceInfoCache {
    /// Owning instance
    pub instance_uuid: Uuid,
    /// Opaque network description
    pub network_info: Value,
    /// Last refresh
    pub updated_at: Option<Timestamp>,
}

/// A guest instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: String,
    pub project_id: String,
    pub display_name: Option<String>,
    pub host: Option<String>,
    pub node: Option<String>,
    pub launched_on: Option<String>,
    pub vm_state: VmState,
    pub task_state: Option<String>,
    pub power_state: i64,
    pub memory_mb: i64,
    pub vcpus: i64,
    pub root_gb: i64,
    pub ephemeral_gb: i64,
    pub instance_type_id: Option<i64>,
    pub access_ip_v4: Option<String>,
    pub access_ip_v6: Option<String>,
    pub root_device_name: Option<String>,
    pub default_ephemeral_device: Option<String>,
    pub default_swap_device: Option<String>,
    pub vm_mode: Option<String>,
    pub progress: i64,
    pub launched_at: Option<Timestamp>,
    pub terminated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
    pub deleted: bool,
    pub info_cache: Option<InstanceInfoCache>,
}

impl Instance {
    /// A freshly built instance with zeroed resources.
    pub fn new(id: i64, uuid: Uuid, user_id: &str, project_id: &str) -> Self {
        Self {
            id,
            uuid,
            user_id: user_id.to_string(),
            project_id: project_id.to_string(),
            display_name: None,
            host: None,
            node: None,
            launched_on: None,
            vm_state: VmState::Building,
            task_state: None,
            power_state: 0,
            memory_mb: 0,
            vcpus: 0,
            root_gb: 0,
            ephemeral_gb: 0,
            instance_type_id: None,
            access_ip_v4: None,
            access_ip_v6: None,
            root_device_name: None,
            default_ephemeral_device: None,
            default_swap_device: None,
            vm_mode: None,
            progress: 0,
            launched_at: None,
            terminated_at: None,
            created_at: Timestamp::now(),
            updated_at: None,
            deleted_at: None,
            deleted: false,
            info_cache: None,
        }
    }
}

/// A flavor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceType {
    pub id: i64,
    pub name: String,
    pub flavorid: String,
    pub memory_mb: i64,
    pub vcpus: i64,
    pub root_gb: i64,
    pub ephemeral_gb: i64,
    pub swap: i64,
    pub rxtx_factor: f64,
    pub is_public: bool,
    pub extra_specs: BTreeMap<String, String>,
}

/// A resize or live migration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Migration {
    pub id: i64,
    pub instance_uuid: Uuid,
    pub source_compute: Option<String>,
    pub dest_compute: Option<String>,
    pub source_node: Option<String>,
    pub dest_node: Option<String>,
    pub dest_host: Option<String>,
    pub old_instance_type_id: Option<i64>,
    pub new_instance_type_id: Option<i64>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

/// A user-visible action taken on an instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceAction {
    pub id: i64,
    pub action: String,
    pub instance_uuid: Uuid,
    pub request_id: String,
    pub user_id: String,
    pub project_id: String,
    pub start_time: Timestamp,
    pub finish_time: Option<Timestamp>,
    pub message: Option<String>,
}

/// One step of an [`InstanceAction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub id: i64,
    pub action_id: i64,
    pub event: String,
    pub start_time: Timestamp,
    pub finish_time: Option<Timestamp>,
    pub result: Option<String>,
    pub traceback: Option<String>,
}

/// Caller-supplied values for starting or finishing an action event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEventValues {
    /// Event name
    pub event: String,
    /// Request that started the owning action
    pub request_id: String,
    /// Instance the action belongs to
    pub instance_uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_time: Option<Timestamp>,
    /// `"Success"` or `"Error"` when finishing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}
