//! Entity types returned by the store.
//!
//! These are the rich, store-side shapes (timestamps, uuids, enumerations,
//! nested relations). They are never handed to a caller directly; the
//! executor projects them through the normalizer first.

mod host;
mod instance;
mod resource;

pub use host::{
    Aggregate, AggregateHost, ComputeNode, HostResource, HostSummary, Service, COMPUTE_TOPIC,
};
pub use instance::{
    ActionEvent, ActionEventValues, Instance, InstanceAction, InstanceInfoCache, InstanceType,
    Migration, VmState,
};
pub use resource::{
    AgentBuild, BandwidthCounters, BandwidthUsage, BlockDeviceMapping, ProviderFirewallRule,
    SecurityGroup, SecurityGroupRule, VolumeCounters, VolumeUsage,
};
