//! Per-instance resources: block devices, usage counters, network policy,
//! guest agents.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timestamp::Timestamp;

/// Attachment of a volume, snapshot or local device to an instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDeviceMapping {
    pub id: i64,
    pub instance_uuid: Uuid,
    pub device_name: Option<String>,
    pub volume_id: Option<String>,
    pub snapshot_id: Option<String>,
    pub volume_size: Option<i64>,
    pub virtual_name: Option<String>,
    pub delete_on_termination: bool,
    pub no_device: bool,
    pub connection_info: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

/// Network counters of one interface over one audit period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandwidthUsage {
    pub instance_uuid: String,
    pub mac: String,
    pub start_period: Timestamp,
    pub bw_in: i64,
    pub bw_out: i64,
    pub last_ctr_in: i64,
    pub last_ctr_out: i64,
    pub last_refreshed: Option<Timestamp>,
}

/// Counters reported by a bandwidth poll. Absent counters keep their
/// previous value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BandwidthCounters {
    pub bw_in: Option<i64>,
    pub bw_out: Option<i64>,
    pub last_ctr_in: Option<i64>,
    pub last_ctr_out: Option<i64>,
}

impl BandwidthCounters {
    /// True when no counter was supplied.
    pub fn is_empty(&self) -> bool {
        self.bw_in.is_none()
            && self.bw_out.is_none()
            && self.last_ctr_in.is_none()
            && self.last_ctr_out.is_none()
    }
}

/// Volume I/O counters, split into a running total and the current period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeUsage {
    pub id: i64,
    pub volume_id: String,
    pub instance_uuid: Uuid,
    pub tot_last_refreshed: Option<Timestamp>,
    pub tot_reads: i64,
    pub tot_read_bytes: i64,
    pub tot_writes: i64,
    pub tot_write_bytes: i64,
    pub curr_last_refreshed: Option<Timestamp>,
    pub curr_reads: i64,
    pub curr_read_bytes: i64,
    pub curr_writes: i64,
    pub curr_write_bytes: i64,
}

/// Raw counters from one volume usage poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeCounters {
    pub rd_req: i64,
    pub rd_bytes: i64,
    pub wr_req: i64,
    pub wr_bytes: i64,
}

/// One ingress rule of a security group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroupRule {
    pub id: i64,
    pub parent_group_id: i64,
    pub protocol: Option<String>,
    pub from_port: Option<i64>,
    pub to_port: Option<i64>,
    pub cidr: Option<String>,
    pub group_id: Option<i64>,
}

/// A security group and its rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub user_id: String,
    pub project_id: String,
    pub instance_ids: Vec<i64>,
    pub rules: Vec<SecurityGroupRule>,
}

/// A provider-level firewall rule applied to every instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderFirewallRule {
    pub id: i64,
    pub protocol: String,
    pub from_port: i64,
    pub to_port: i64,
    pub cidr: String,
}

/// A guest agent build for one hypervisor/os/architecture triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentBuild {
    pub id: i64,
    pub hypervisor: String,
    pub os: String,
    pub architecture: String,
    pub version: String,
    pub url: String,
    pub md5hash: String,
}
