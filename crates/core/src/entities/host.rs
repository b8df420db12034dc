//! Host-centred entities: services, compute nodes, aggregates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

/// The service topic that has a dedicated host join.
pub const COMPUTE_TOPIC: &str = "compute";

/// Hypervisor resources reported by a compute service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeNode {
    pub id: i64,
    pub service_id: i64,
    pub hypervisor_hostname: String,
    pub hypervisor_type: String,
    pub vcpus: i64,
    pub memory_mb: i64,
    pub local_gb: i64,
    pub vcpus_used: i64,
    pub memory_mb_used: i64,
    pub local_gb_used: i64,
}

/// A registered service process.
///
/// `compute_node` is only populated by the compute-by-host join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub host: String,
    pub binary: String,
    pub topic: String,
    pub report_count: i64,
    pub disabled: bool,
    pub availability_zone: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_node: Option<ComputeNode>,
}

/// A host aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub id: i64,
    pub name: String,
    pub availability_zone: Option<String>,
    pub hosts: Vec<String>,
    pub metadetails: BTreeMap<String, String>,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

/// Membership row returned when a host joins an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateHost {
    pub aggregate_id: i64,
    pub host: String,
    pub created_at: Timestamp,
}

/// One row of the host listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSummary {
    pub host_name: String,
    pub service: String,
    pub zone: String,
}

/// One resource row of a host description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostResource {
    pub host: String,
    pub project: String,
    pub cpu: i64,
    pub memory_mb: i64,
    pub disk_gb: i64,
}
