//! Collaborator contracts
//!
//! The conductor consumes three collaborators it does not implement:
//!
//! - [`Store`]: the persistent store, returning rich entities and raising
//!   kind-tagged [`StoreError`](crate::StoreError)s
//! - [`ChangeNotifier`]: disseminates instance change events
//! - [`HostApi`]: the compute host driver behind the host-management actions
//!
//! Thread safety: all methods must be safe to call concurrently from
//! multiple threads (requires Send + Sync). The conductor adds no locking of
//! its own; every logically atomic operation below is a single method call
//! that the implementation must apply atomically.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::entities::*;
use crate::error::StoreResult;
use crate::fields::{InstanceUpdates, SortDir};
use crate::timestamp::Timestamp;
use crate::value::Object;

/// Persistent store consumed by the conductor.
///
/// Instance uuids are passed as strings; implementations reject malformed
/// ones with `StoreError::InvalidUuid`.
pub trait Store: Send + Sync {
    // ==================== Instances ====================

    /// Get an instance by integer id.
    fn instance_get(&self, ctx: &RequestContext, id: i64) -> StoreResult<Instance>;

    /// Get an instance by uuid.
    fn instance_get_by_uuid(&self, ctx: &RequestContext, uuid: &str) -> StoreResult<Instance>;

    /// All instances visible to the context.
    fn instance_get_all(&self, ctx: &RequestContext) -> StoreResult<Vec<Instance>>;

    /// All instances visible to the context on a host.
    fn instance_get_all_by_host(
        &self,
        ctx: &RequestContext,
        host: &str,
    ) -> StoreResult<Vec<Instance>>;

    /// Instances matching every filter, ordered by `sort_key` in `sort_dir`.
    fn instance_get_all_by_filters(
        &self,
        ctx: &RequestContext,
        filters: &Object,
        sort_key: &str,
        sort_dir: SortDir,
    ) -> StoreResult<Vec<Instance>>;

    /// Instances stuck in the `rebooting` task state for longer than `timeout`.
    fn instance_get_all_hung_in_rebooting(
        &self,
        ctx: &RequestContext,
        timeout: Duration,
    ) -> StoreResult<Vec<Instance>>;

    /// Instances that were active at some point within `[begin, end]`.
    fn instance_get_active_by_window(
        &self,
        ctx: &RequestContext,
        begin: Timestamp,
        end: Option<Timestamp>,
        project_id: Option<&str>,
        host: Option<&str>,
    ) -> StoreResult<Vec<Instance>>;

    /// Atomically apply `updates` and return `(before, after)`.
    ///
    /// `InstanceField::ExpectedTaskState`, when present, is checked against
    /// the current task state inside the same atomic step.
    fn instance_update_and_get_original(
        &self,
        ctx: &RequestContext,
        uuid: &str,
        updates: &InstanceUpdates,
    ) -> StoreResult<(Instance, Instance)>;

    /// Soft-delete an instance, returning its final state.
    fn instance_destroy(&self, ctx: &RequestContext, uuid: &str) -> StoreResult<Instance>;

    /// Drop an instance's cached network info.
    fn instance_info_cache_delete(&self, ctx: &RequestContext, uuid: &str) -> StoreResult<()>;

    /// Replace fields of an instance's cached network info.
    fn instance_info_cache_update(
        &self,
        ctx: &RequestContext,
        uuid: &str,
        values: &Object,
    ) -> StoreResult<InstanceInfoCache>;

    /// Get a flavor by id.
    fn instance_type_get(&self, ctx: &RequestContext, id: i64) -> StoreResult<InstanceType>;

    // ==================== Migrations ====================

    /// Get a migration by id.
    fn migration_get(&self, ctx: &RequestContext, id: i64) -> StoreResult<Migration>;

    /// Set a migration's status, returning the updated record.
    fn migration_update(
        &self,
        ctx: &RequestContext,
        id: i64,
        status: &str,
    ) -> StoreResult<Migration>;

    /// Finished migrations to `dest_compute` older than `confirm_window`.
    fn migration_get_unconfirmed_by_dest_compute(
        &self,
        ctx: &RequestContext,
        confirm_window: Duration,
        dest_compute: &str,
    ) -> StoreResult<Vec<Migration>>;

    // ==================== Aggregates ====================

    /// Get an aggregate by id.
    fn aggregate_get(&self, ctx: &RequestContext, id: i64) -> StoreResult<Aggregate>;

    /// Aggregates containing `host`, optionally only those with metadata `key`.
    fn aggregate_get_by_host(
        &self,
        ctx: &RequestContext,
        host: &str,
        key: Option<&str>,
    ) -> StoreResult<Vec<Aggregate>>;

    /// Add a host to an aggregate; duplicate membership is an error.
    fn aggregate_host_add(
        &self,
        ctx: &RequestContext,
        id: i64,
        host: &str,
    ) -> StoreResult<AggregateHost>;

    /// Remove a host from an aggregate; missing membership is an error.
    fn aggregate_host_delete(&self, ctx: &RequestContext, id: i64, host: &str)
        -> StoreResult<()>;

    /// Merge `metadata` into an aggregate's metadata and return the result.
    ///
    /// With `set_delete`, keys absent from `metadata` are removed.
    fn aggregate_metadata_add(
        &self,
        ctx: &RequestContext,
        id: i64,
        metadata: &BTreeMap<String, String>,
        set_delete: bool,
    ) -> StoreResult<BTreeMap<String, String>>;

    /// Remove one metadata key; a missing key is an error.
    fn aggregate_metadata_delete(
        &self,
        ctx: &RequestContext,
        id: i64,
        key: &str,
    ) -> StoreResult<()>;

    // ==================== Usage ====================

    /// Record bandwidth counters for one interface and period.
    fn bw_usage_update(
        &self,
        ctx: &RequestContext,
        uuid: &str,
        mac: &str,
        start_period: Timestamp,
        counters: &BandwidthCounters,
        last_refreshed: Option<Timestamp>,
    ) -> StoreResult<()>;

    /// The reading for one interface and period, if any.
    fn bw_usage_get(
        &self,
        ctx: &RequestContext,
        uuid: &str,
        start_period: Timestamp,
        mac: &str,
    ) -> StoreResult<Option<BandwidthUsage>>;

    /// Volume usage rows refreshed after `begin` or never refreshed.
    fn vol_get_usage_by_time(
        &self,
        ctx: &RequestContext,
        begin: Timestamp,
    ) -> StoreResult<Vec<VolumeUsage>>;

    /// Record volume counters; with `update_totals` the current period is
    /// folded into the totals.
    fn vol_usage_update(
        &self,
        ctx: &RequestContext,
        volume_id: &str,
        counters: VolumeCounters,
        instance_uuid: &str,
        last_refreshed: Option<Timestamp>,
        update_totals: bool,
    ) -> StoreResult<VolumeUsage>;

    // ==================== Network / agents ====================

    /// Security groups an instance belongs to.
    fn security_group_get_by_instance(
        &self,
        ctx: &RequestContext,
        instance_id: i64,
    ) -> StoreResult<Vec<SecurityGroup>>;

    /// Rules of one security group.
    fn security_group_rule_get_by_security_group(
        &self,
        ctx: &RequestContext,
        security_group_id: i64,
    ) -> StoreResult<Vec<SecurityGroupRule>>;

    /// Every provider firewall rule.
    fn provider_fw_rule_get_all(
        &self,
        ctx: &RequestContext,
    ) -> StoreResult<Vec<ProviderFirewallRule>>;

    /// The agent build for a triple, if registered.
    fn agent_build_get_by_triple(
        &self,
        ctx: &RequestContext,
        hypervisor: &str,
        os: &str,
        architecture: &str,
    ) -> StoreResult<Option<AgentBuild>>;

    // ==================== Block devices ====================

    /// Create a mapping from raw values.
    fn block_device_mapping_create(
        &self,
        ctx: &RequestContext,
        values: &Object,
    ) -> StoreResult<BlockDeviceMapping>;

    /// Update a mapping by id.
    fn block_device_mapping_update(
        &self,
        ctx: &RequestContext,
        id: i64,
        values: &Object,
    ) -> StoreResult<BlockDeviceMapping>;

    /// Update the mapping with the same instance and device name, or create one.
    fn block_device_mapping_update_or_create(
        &self,
        ctx: &RequestContext,
        values: &Object,
    ) -> StoreResult<BlockDeviceMapping>;

    /// Every mapping of an instance.
    fn block_device_mapping_get_all_by_instance(
        &self,
        ctx: &RequestContext,
        instance_uuid: &str,
    ) -> StoreResult<Vec<BlockDeviceMapping>>;

    /// Remove one mapping by id.
    fn block_device_mapping_destroy(&self, ctx: &RequestContext, id: i64) -> StoreResult<()>;

    /// Remove the mappings of an instance to a volume.
    fn block_device_mapping_destroy_by_instance_and_volume(
        &self,
        ctx: &RequestContext,
        instance_uuid: &str,
        volume_id: &str,
    ) -> StoreResult<()>;

    /// Remove the mappings of an instance at a device name.
    fn block_device_mapping_destroy_by_instance_and_device(
        &self,
        ctx: &RequestContext,
        instance_uuid: &str,
        device_name: &str,
    ) -> StoreResult<()>;

    // ==================== Services ====================

    /// Every service.
    fn service_get_all(&self, ctx: &RequestContext) -> StoreResult<Vec<Service>>;

    /// Compute services on a host, joined with their compute nodes.
    fn service_get_all_compute_by_host(
        &self,
        ctx: &RequestContext,
        host: &str,
    ) -> StoreResult<Vec<Service>>;

    /// The service with an exact host and topic, if any.
    fn service_get_by_host_and_topic(
        &self,
        ctx: &RequestContext,
        host: &str,
        topic: &str,
    ) -> StoreResult<Option<Service>>;

    /// Every service with a topic.
    fn service_get_all_by_topic(&self, ctx: &RequestContext, topic: &str)
        -> StoreResult<Vec<Service>>;

    /// Every service on a host.
    fn service_get_all_by_host(&self, ctx: &RequestContext, host: &str)
        -> StoreResult<Vec<Service>>;

    // ==================== Action log ====================

    /// Append a started event to an existing action.
    fn action_event_start(
        &self,
        ctx: &RequestContext,
        values: &ActionEventValues,
    ) -> StoreResult<ActionEvent>;

    /// Mark an event of an existing action finished.
    fn action_event_finish(
        &self,
        ctx: &RequestContext,
        values: &ActionEventValues,
    ) -> StoreResult<ActionEvent>;
}

/// Receives `(before, after)` instance state whenever an instance update
/// succeeds. Delivery failures are the notifier's own concern.
pub trait ChangeNotifier: Send + Sync {
    /// Publish one change event.
    fn send_update(&self, ctx: &RequestContext, old: &Instance, new: &Instance);
}

/// A notifier that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn send_update(&self, _ctx: &RequestContext, _old: &Instance, _new: &Instance) {}
}

/// Power actions a host driver may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerAction {
    /// Power the host up
    Startup,
    /// Power the host down
    Shutdown,
    /// Power-cycle the host
    Reboot,
}

impl PowerAction {
    /// The wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerAction::Startup => "startup",
            PowerAction::Shutdown => "shutdown",
            PowerAction::Reboot => "reboot",
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "startup" => Ok(PowerAction::Startup),
            "shutdown" => Ok(PowerAction::Shutdown),
            "reboot" => Ok(PowerAction::Reboot),
            other => Err(format!("unknown power action '{}'", other)),
        }
    }
}

/// Compute host driver behind the host-management actions.
///
/// Drivers that lack a capability fail with `StoreError::NotImplemented`.
pub trait HostApi: Send + Sync {
    /// Hosts and the services they run, optionally limited to one zone.
    fn list_hosts(&self, ctx: &RequestContext, zone: Option<&str>)
        -> StoreResult<Vec<HostSummary>>;

    /// Allow or forbid new instances on a host. Expected answers are
    /// `"enabled"` and `"disabled"`.
    fn set_host_enabled(
        &self,
        ctx: &RequestContext,
        host: &str,
        enabled: bool,
    ) -> StoreResult<String>;

    /// Enter or leave maintenance. Expected answers are `"on_maintenance"`
    /// and `"off_maintenance"`.
    fn set_host_maintenance(
        &self,
        ctx: &RequestContext,
        host: &str,
        mode: bool,
    ) -> StoreResult<String>;

    /// Perform a power action; the answer is passed through.
    fn host_power_action(
        &self,
        ctx: &RequestContext,
        host: &str,
        action: PowerAction,
    ) -> StoreResult<String>;

    /// Physical and per-project resource usage of a host.
    fn describe_host(&self, ctx: &RequestContext, host: &str) -> StoreResult<Vec<HostResource>>;
}
