//! The operation catalogue.
//!
//! Every facade operation has a wire name, the contract version that
//! introduced it, and the store failure kinds it lets through to the caller.
//! The allow-list table lives here in one place so an operation without a
//! declaration shows up as an empty row rather than a silent fallthrough.

use std::fmt;

use conductor_core::{StoreErrorKind, StoreErrorKind as K};
use serde::{Deserialize, Serialize};

use crate::version::RpcVersion;

/// A facade operation.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    // Instances
    InstanceUpdate,
    InstanceGet,
    InstanceGetByUuid,
    InstanceGetAll,
    InstanceGetAllByHost,
    InstanceGetAllByFilters,
    InstanceGetAllHungInRebooting,
    InstanceGetActiveByWindow,
    InstanceDestroy,
    InstanceInfoCacheDelete,
    InstanceInfoCacheUpdate,
    InstanceTypeGet,
    // Migrations
    MigrationGet,
    MigrationUpdate,
    MigrationGetUnconfirmedByDestCompute,
    // Aggregates
    AggregateGet,
    AggregateGetByHost,
    AggregateHostAdd,
    AggregateHostDelete,
    AggregateMetadataAdd,
    AggregateMetadataDelete,
    // Usage
    BwUsageUpdate,
    VolGetUsageByTime,
    VolUsageUpdate,
    // Network / agents
    SecurityGroupGetByInstance,
    SecurityGroupRuleGetBySecurityGroup,
    ProviderFwRuleGetAll,
    AgentBuildGetByTriple,
    // Block devices
    BlockDeviceMappingUpdateOrCreate,
    BlockDeviceMappingGetAllByInstance,
    BlockDeviceMappingDestroy,
    // Services and audit log
    ServiceGetAllBy,
    ActionEventStart,
    ActionEventFinish,
    // Service plumbing
    Ping,
    GetBackdoorPort,
}

impl Operation {
    /// Every operation, in catalogue order.
    pub const ALL: [Operation; 36] = [
        Operation::InstanceUpdate,
        Operation::InstanceGet,
        Operation::InstanceGetByUuid,
        Operation::InstanceGetAll,
        Operation::InstanceGetAllByHost,
        Operation::InstanceGetAllByFilters,
        Operation::InstanceGetAllHungInRebooting,
        Operation::InstanceGetActiveByWindow,
        Operation::InstanceDestroy,
        Operation::InstanceInfoCacheDelete,
        Operation::InstanceInfoCacheUpdate,
        Operation::InstanceTypeGet,
        Operation::MigrationGet,
        Operation::MigrationUpdate,
        Operation::MigrationGetUnconfirmedByDestCompute,
        Operation::AggregateGet,
        Operation::AggregateGetByHost,
        Operation::AggregateHostAdd,
        Operation::AggregateHostDelete,
        Operation::AggregateMetadataAdd,
        Operation::AggregateMetadataDelete,
        Operation::BwUsageUpdate,
        Operation::VolGetUsageByTime,
        Operation::VolUsageUpdate,
        Operation::SecurityGroupGetByInstance,
        Operation::SecurityGroupRuleGetBySecurityGroup,
        Operation::ProviderFwRuleGetAll,
        Operation::AgentBuildGetByTriple,
        Operation::BlockDeviceMappingUpdateOrCreate,
        Operation::BlockDeviceMappingGetAllByInstance,
        Operation::BlockDeviceMappingDestroy,
        Operation::ServiceGetAllBy,
        Operation::ActionEventStart,
        Operation::ActionEventFinish,
        Operation::Ping,
        Operation::GetBackdoorPort,
    ];

    /// Wire name of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::InstanceUpdate => "instance_update",
            Operation::InstanceGet => "instance_get",
            Operation::InstanceGetByUuid => "instance_get_by_uuid",
            Operation::InstanceGetAll => "instance_get_all",
            Operation::InstanceGetAllByHost => "instance_get_all_by_host",
            Operation::InstanceGetAllByFilters => "instance_get_all_by_filters",
            Operation::InstanceGetAllHungInRebooting => "instance_get_all_hung_in_rebooting",
            Operation::InstanceGetActiveByWindow => "instance_get_active_by_window",
            Operation::InstanceDestroy => "instance_destroy",
            Operation::InstanceInfoCacheDelete => "instance_info_cache_delete",
            Operation::InstanceInfoCacheUpdate => "instance_info_cache_update",
            Operation::InstanceTypeGet => "instance_type_get",
            Operation::MigrationGet => "migration_get",
            Operation::MigrationUpdate => "migration_update",
            Operation::MigrationGetUnconfirmedByDestCompute => {
                "migration_get_unconfirmed_by_dest_compute"
            }
            Operation::AggregateGet => "aggregate_get",
            Operation::AggregateGetByHost => "aggregate_get_by_host",
            Operation::AggregateHostAdd => "aggregate_host_add",
            Operation::AggregateHostDelete => "aggregate_host_delete",
            Operation::AggregateMetadataAdd => "aggregate_metadata_add",
            Operation::AggregateMetadataDelete => "aggregate_metadata_delete",
            Operation::BwUsageUpdate => "bw_usage_update",
            Operation::VolGetUsageByTime => "vol_get_usage_by_time",
            Operation::VolUsageUpdate => "vol_usage_update",
            Operation::SecurityGroupGetByInstance => "security_group_get_by_instance",
            Operation::SecurityGroupRuleGetBySecurityGroup => {
                "security_group_rule_get_by_security_group"
            }
            Operation::ProviderFwRuleGetAll => "provider_fw_rule_get_all",
            Operation::AgentBuildGetByTriple => "agent_build_get_by_triple",
            Operation::BlockDeviceMappingUpdateOrCreate => {
                "block_device_mapping_update_or_create"
            }
            Operation::BlockDeviceMappingGetAllByInstance => {
                "block_device_mapping_get_all_by_instance"
            }
            Operation::BlockDeviceMappingDestroy => "block_device_mapping_destroy",
            Operation::ServiceGetAllBy => "service_get_all_by",
            Operation::ActionEventStart => "action_event_start",
            Operation::ActionEventFinish => "action_event_finish",
            Operation::Ping => "ping",
            Operation::GetBackdoorPort => "get_backdoor_port",
        }
    }

    /// The contract version that introduced the operation.
    pub fn since(&self) -> RpcVersion {
        let minor = match self {
            Operation::InstanceUpdate => 0,
            Operation::MigrationUpdate => 1,
            Operation::InstanceGetByUuid | Operation::InstanceGetAllByHost => 2,
            Operation::AggregateHostAdd | Operation::AggregateHostDelete => 3,
            Operation::MigrationGet => 4,
            Operation::BwUsageUpdate => 5,
            Operation::GetBackdoorPort => 6,
            Operation::AggregateGetByHost
            | Operation::AggregateMetadataAdd
            | Operation::AggregateMetadataDelete => 7,
            Operation::SecurityGroupGetByInstance
            | Operation::SecurityGroupRuleGetBySecurityGroup => 8,
            Operation::ProviderFwRuleGetAll => 9,
            Operation::AgentBuildGetByTriple => 10,
            Operation::AggregateGet => 11,
            Operation::BlockDeviceMappingUpdateOrCreate => 12,
            Operation::BlockDeviceMappingGetAllByInstance => 13,
            Operation::BlockDeviceMappingDestroy => 14,
            Operation::InstanceGetAllByFilters
            | Operation::InstanceGetAllHungInRebooting
            | Operation::InstanceGetActiveByWindow => 15,
            Operation::InstanceDestroy => 16,
            Operation::InstanceInfoCacheDelete => 17,
            Operation::InstanceTypeGet => 18,
            Operation::VolGetUsageByTime | Operation::VolUsageUpdate => 19,
            Operation::MigrationGetUnconfirmedByDestCompute => 20,
            Operation::ServiceGetAllBy => 21,
            Operation::Ping => 22,
            Operation::InstanceGetAll => 23,
            Operation::InstanceGet => 24,
            Operation::ActionEventStart | Operation::ActionEventFinish => 25,
            Operation::InstanceInfoCacheUpdate => 26,
        };
        RpcVersion::new(1, minor)
    }

    /// Store failure kinds this operation lets through to the caller.
    ///
    /// Anything not listed surfaces as an internal error.
    pub fn allowed_failures(&self) -> &'static [StoreErrorKind] {
        match self {
            Operation::InstanceUpdate => &[
                K::InvalidUuid,
                K::InstanceNotFound,
                K::UnexpectedTaskState,
                K::Invalid,
            ],
            Operation::InstanceGet | Operation::InstanceGetByUuid => &[K::InstanceNotFound],
            Operation::MigrationGet | Operation::MigrationUpdate => &[K::MigrationNotFound],
            Operation::AggregateGet => &[K::AggregateNotFound],
            Operation::AggregateHostAdd => &[K::AggregateHostExists],
            Operation::AggregateHostDelete => &[K::AggregateHostNotFound],
            Operation::AggregateMetadataDelete => &[K::AggregateMetadataNotFound],
            _ => &[],
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
