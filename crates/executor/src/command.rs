//! Command enum defining every conductor operation.
//!
//! Commands are the wire form of a facade call. Each variant carries every
//! argument the operation takes; the caller context travels beside it in a
//! [`Request`].
//!
//! Commands are:
//! - **Self-contained**: all parameters needed for execution are in the variant
//! - **Serializable**: the transport carries them as JSON
//! - **Strict**: unknown argument names are rejected at decode time

use std::collections::BTreeMap;

use conductor_core::{ActionEventValues, Object, RequestContext, SortDir, Timestamp, Value};
use serde::{Deserialize, Serialize};

use crate::operation::Operation;
use crate::version::RpcVersion;

/// A facade call.
///
/// Instances are addressed by uuid string except where an integer id is
/// named. Every command maps to exactly one [`Operation`].
///
/// # Example
///
/// ```ignore
/// use conductor_executor::Command;
///
/// let cmd = Command::MigrationUpdate {
///     migration_id: 12,
///     status: "finished".into(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Command {
    // ==================== Instances (12) ====================
    /// Apply whitelisted field updates and publish the change.
    /// Returns: `Output::Value` (the updated instance)
    InstanceUpdate {
        instance_uuid: String,
        updates: Object,
    },

    /// Returns: `Output::Value`
    InstanceGet { instance_id: i64 },

    /// Returns: `Output::Value`
    InstanceGetByUuid { instance_uuid: String },

    /// Returns: `Output::Values`
    InstanceGetAll,

    /// Returns: `Output::Values`
    InstanceGetAllByHost { host: String },

    /// Filtered listing; ordering is the store's.
    /// Returns: `Output::Values`
    InstanceGetAllByFilters {
        #[serde(default)]
        filters: Object,
        sort_key: String,
        #[serde(default)]
        sort_dir: SortDir,
    },

    /// Returns: `Output::Values`
    InstanceGetAllHungInRebooting { timeout_secs: u64 },

    /// Returns: `Output::Values`
    InstanceGetActiveByWindow {
        begin: Timestamp,
        #[serde(default)]
        end: Option<Timestamp>,
        #[serde(default)]
        project_id: Option<String>,
        #[serde(default)]
        host: Option<String>,
    },

    /// Returns: `Output::Unit`
    InstanceDestroy { instance_uuid: String },

    /// Returns: `Output::Unit`
    InstanceInfoCacheDelete { instance_uuid: String },

    /// Returns: `Output::Unit`
    InstanceInfoCacheUpdate {
        instance_uuid: String,
        values: Object,
    },

    /// Returns: `Output::Value`
    InstanceTypeGet { instance_type_id: i64 },

    // ==================== Migrations (3) ====================
    /// Returns: `Output::Value`
    MigrationGet { migration_id: i64 },

    /// Set a migration's status.
    /// Returns: `Output::Value`
    MigrationUpdate { migration_id: i64, status: String },

    /// Returns: `Output::Values`
    MigrationGetUnconfirmedByDestCompute {
        confirm_window_secs: u64,
        dest_compute: String,
    },

    // ==================== Aggregates (6) ====================
    /// Returns: `Output::Value`
    AggregateGet { aggregate_id: i64 },

    /// Returns: `Output::Values`
    AggregateGetByHost {
        host: String,
        #[serde(default)]
        key: Option<String>,
    },

    /// Returns: `Output::Value` (the membership record)
    AggregateHostAdd { aggregate_id: i64, host: String },

    /// Returns: `Output::Unit`
    AggregateHostDelete { aggregate_id: i64, host: String },

    /// Merge metadata; with `set_delete`, keys not given are removed.
    /// Returns: `Output::Value` (the resulting metadata)
    AggregateMetadataAdd {
        aggregate_id: i64,
        metadata: BTreeMap<String, String>,
        #[serde(default)]
        set_delete: bool,
    },

    /// Returns: `Output::Unit`
    AggregateMetadataDelete { aggregate_id: i64, key: String },

    // ==================== Usage (3) ====================
    /// Record bandwidth counters; writes only when a counter is given.
    /// Returns: `Output::Maybe` (the current reading)
    BwUsageUpdate {
        instance_uuid: String,
        mac: String,
        start_period: Timestamp,
        #[serde(default)]
        bw_in: Option<i64>,
        #[serde(default)]
        bw_out: Option<i64>,
        #[serde(default)]
        last_ctr_in: Option<i64>,
        #[serde(default)]
        last_ctr_out: Option<i64>,
        #[serde(default)]
        last_refreshed: Option<Timestamp>,
    },

    /// Returns: `Output::Values`
    VolGetUsageByTime { start_time: Timestamp },

    /// Returns: `Output::Unit`
    VolUsageUpdate {
        volume_id: String,
        rd_req: i64,
        rd_bytes: i64,
        wr_req: i64,
        wr_bytes: i64,
        instance_uuid: String,
        #[serde(default)]
        last_refreshed: Option<Timestamp>,
        #[serde(default)]
        update_totals: bool,
    },

    // ==================== Network / agents (4) ====================
    /// Returns: `Output::Values`
    SecurityGroupGetByInstance { instance_id: i64 },

    /// Returns: `Output::Values`
    SecurityGroupRuleGetBySecurityGroup { security_group_id: i64 },

    /// Returns: `Output::Values`
    ProviderFwRuleGetAll,

    /// Returns: `Output::Maybe`
    AgentBuildGetByTriple {
        hypervisor: String,
        os: String,
        architecture: String,
    },

    // ==================== Block devices (3) ====================
    /// `create` absent upserts, `true` creates, `false` updates by `values.id`.
    /// Returns: `Output::Unit`
    BlockDeviceMappingUpdateOrCreate {
        values: Object,
        #[serde(default)]
        create: Option<bool>,
    },

    /// Returns: `Output::Values`
    BlockDeviceMappingGetAllByInstance { instance_uuid: String },

    /// Exactly one selector shape: `bdms`, `instance_uuid` + `volume_id`, or
    /// `instance_uuid` + `device_name`.
    /// Returns: `Output::Unit`
    BlockDeviceMappingDestroy {
        #[serde(default)]
        bdms: Option<Vec<i64>>,
        #[serde(default)]
        instance_uuid: Option<String>,
        #[serde(default)]
        volume_id: Option<String>,
        #[serde(default)]
        device_name: Option<String>,
    },

    // ==================== Services / audit (3) ====================
    /// Returns: `Output::Values`
    ServiceGetAllBy {
        #[serde(default)]
        topic: Option<String>,
        #[serde(default)]
        host: Option<String>,
    },

    /// Returns: `Output::Value`
    ActionEventStart { values: ActionEventValues },

    /// Returns: `Output::Value`
    ActionEventFinish { values: ActionEventValues },

    // ==================== Service plumbing (2) ====================
    /// Returns: `Output::Value` (`{"service": "conductor", "arg": arg}`)
    Ping {
        #[serde(default)]
        arg: Value,
    },

    /// Returns: `Output::Maybe`
    GetBackdoorPort,
}

impl Command {
    /// The operation this command invokes.
    pub fn operation(&self) -> Operation {
        match self {
            Command::InstanceUpdate { .. } => Operation::InstanceUpdate,
            Command::InstanceGet { .. } => Operation::InstanceGet,
            Command::InstanceGetByUuid { .. } => Operation::InstanceGetByUuid,
            Command::InstanceGetAll => Operation::InstanceGetAll,
            Command::InstanceGetAllByHost { .. } => Operation::InstanceGetAllByHost,
            Command::InstanceGetAllByFilters { .. } => Operation::InstanceGetAllByFilters,
            Command::InstanceGetAllHungInRebooting { .. } => {
                Operation::InstanceGetAllHungInRebooting
            }
            Command::InstanceGetActiveByWindow { .. } => Operation::InstanceGetActiveByWindow,
            Command::InstanceDestroy { .. } => Operation::InstanceDestroy,
            Command::InstanceInfoCacheDelete { .. } => Operation::InstanceInfoCacheDelete,
            Command::InstanceInfoCacheUpdate { .. } => Operation::InstanceInfoCacheUpdate,
            Command::InstanceTypeGet { .. } => Operation::InstanceTypeGet,
            Command::MigrationGet { .. } => Operation::MigrationGet,
            Command::MigrationUpdate { .. } => Operation::MigrationUpdate,
            Command::MigrationGetUnconfirmedByDestCompute { .. } => {
                Operation::MigrationGetUnconfirmedByDestCompute
            }
            Command::AggregateGet { .. } => Operation::AggregateGet,
            Command::AggregateGetByHost { .. } => Operation::AggregateGetByHost,
            Command::AggregateHostAdd { .. } => Operation::AggregateHostAdd,
            Command::AggregateHostDelete { .. } => Operation::AggregateHostDelete,
            Command::AggregateMetadataAdd { .. } => Operation::AggregateMetadataAdd,
            Command::AggregateMetadataDelete { .. } => Operation::AggregateMetadataDelete,
            Command::BwUsageUpdate { .. } => Operation::BwUsageUpdate,
            Command::VolGetUsageByTime { .. } => Operation::VolGetUsageByTime,
            Command::VolUsageUpdate { .. } => Operation::VolUsageUpdate,
            Command::SecurityGroupGetByInstance { .. } => Operation::SecurityGroupGetByInstance,
            Command::SecurityGroupRuleGetBySecurityGroup { .. } => {
                Operation::SecurityGroupRuleGetBySecurityGroup
            }
            Command::ProviderFwRuleGetAll => Operation::ProviderFwRuleGetAll,
            Command::AgentBuildGetByTriple { .. } => Operation::AgentBuildGetByTriple,
            Command::BlockDeviceMappingUpdateOrCreate { .. } => {
                Operation::BlockDeviceMappingUpdateOrCreate
            }
            Command::BlockDeviceMappingGetAllByInstance { .. } => {
                Operation::BlockDeviceMappingGetAllByInstance
            }
            Command::BlockDeviceMappingDestroy { .. } => Operation::BlockDeviceMappingDestroy,
            Command::ServiceGetAllBy { .. } => Operation::ServiceGetAllBy,
            Command::ActionEventStart { .. } => Operation::ActionEventStart,
            Command::ActionEventFinish { .. } => Operation::ActionEventFinish,
            Command::Ping { .. } => Operation::Ping,
            Command::GetBackdoorPort => Operation::GetBackdoorPort,
        }
    }
}

/// A versioned call as carried by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    /// Contract version the caller speaks
    pub version: RpcVersion,
    /// Caller identity, forwarded to the store untouched
    pub context: RequestContext,
    /// The call itself
    pub command: Command,
}
