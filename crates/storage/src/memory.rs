//! In-memory reference store
//!
//! `MemoryStore` implements [`Store`] over plain tables behind one
//! `parking_lot::RwLock`. Every logically atomic operation (read-modify-write
//! of an instance, aggregate membership, metadata merge) runs under a single
//! write-lock acquisition, so concurrent callers never observe a torn update.
//!
//! Row-level scoping follows the caller context: a non-admin context only
//! sees instances of its own project, and soft-deleted instances are hidden
//! unless the context asks for them.
//!
//! Two testing hooks are built in:
//! - [`MemoryStore::write_count`] counts committed mutations
//! - [`MemoryStore::inject_fault`] makes the next call of a named operation
//!   fail with a chosen error

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use conductor_core::{
    ActionEvent, ActionEventValues, AgentBuild, Aggregate, AggregateHost, BandwidthCounters,
    BandwidthUsage, BlockDeviceMapping, ComputeNode, Instance, InstanceAction, InstanceField,
    InstanceInfoCache, InstanceType, InstanceUpdates, Migration, Object, ProviderFirewallRule,
    ReadDeleted, RequestContext, SecurityGroup, SecurityGroupRule, Service, SortDir, Store,
    StoreError, StoreResult, Timestamp, Value, VolumeCounters, VolumeUsage, COMPUTE_TOPIC,
};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::apply::{
    apply_bdm_values, apply_instance_field, check_expected_task_state, cmp_values,
    matches_filter, parse_uuid, project,
};

/// Bandwidth usage rows are keyed by (instance uuid, mac, period start).
type BwKey = (String, String, Timestamp);

#[derive(Default)]
struct Tables {
    instances: BTreeMap<i64, Instance>,
    instance_types: FxHashMap<i64, InstanceType>,
    migrations: BTreeMap<i64, Migration>,
    aggregates: BTreeMap<i64, Aggregate>,
    bw_usage: FxHashMap<BwKey, BandwidthUsage>,
    vol_usage: BTreeMap<i64, VolumeUsage>,
    security_groups: BTreeMap<i64, SecurityGroup>,
    provider_fw_rules: Vec<ProviderFirewallRule>,
    agent_builds: Vec<AgentBuild>,
    bdms: BTreeMap<i64, BlockDeviceMapping>,
    services: BTreeMap<i64, Service>,
    compute_nodes: BTreeMap<i64, ComputeNode>,
    actions: BTreeMap<i64, InstanceAction>,
    action_events: BTreeMap<i64, ActionEvent>,
}

/// In-memory implementation of [`Store`].
pub struct MemoryStore {
    tables: RwLock<Tables>,
    next_id: AtomicI64,
    writes: AtomicU64,
    faults: Mutex<FxHashMap<&'static str, StoreError>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn visible(ctx: &RequestContext, instance: &Instance) -> bool {
    let deleted_ok = match ctx.read_deleted {
        ReadDeleted::No => !instance.deleted,
        ReadDeleted::Yes => true,
        ReadDeleted::Only => instance.deleted,
    };
    deleted_ok && (ctx.is_admin || instance.project_id == ctx.project_id)
}

fn instance_not_found(key: impl ToString) -> StoreError {
    StoreError::InstanceNotFound {
        instance: key.to_string(),
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_id: AtomicI64::new(1),
            writes: AtomicU64::new(0),
            faults: Mutex::new(FxHashMap::default()),
        }
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of mutations committed so far. Failed writes are not counted.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    /// Make the next call of `operation` fail with `error`.
    ///
    /// `operation` is the [`Store`] method name, e.g. `"instance_get"`.
    pub fn inject_fault(&self, operation: &'static str, error: StoreError) {
        self.faults.lock().insert(operation, error);
    }

    fn fault(&self, operation: &'static str) -> StoreResult<()> {
        match self.faults.lock().remove(operation) {
            Some(err) => {
                tracing::debug!(target: "conductor::storage", operation, error = %err, "Injected fault fired");
                Err(err)
            }
            None => Ok(()),
        }
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Insert a new instance for a project and return it.
    pub fn create_instance(&self, project_id: &str, user_id: &str) -> Instance {
        let instance = Instance::new(self.allocate_id(), Uuid::new_v4(), user_id, project_id);
        self.put_instance(instance.clone());
        instance
    }

    /// Insert or replace an instance row as-is.
    pub fn put_instance(&self, instance: Instance) {
        self.tables.write().instances.insert(instance.id, instance);
    }

    /// Insert a flavor.
    pub fn put_instance_type(&self, instance_type: InstanceType) {
        self.tables
            .write()
            .instance_types
            .insert(instance_type.id, instance_type);
    }

    /// Insert a migration for an instance and return it.
    pub fn create_migration(&self, instance_uuid: Uuid, status: &str) -> Migration {
        let migration = Migration {
            id: self.allocate_id(),
            instance_uuid,
            source_compute: None,
            dest_compute: None,
            source_node: None,
            dest_node: None,
            dest_host: None,
            old_instance_type_id: None,
            new_instance_type_id: None,
            status: status.to_string(),
            created_at: Timestamp::now(),
            updated_at: None,
        };
        self.put_migration(migration.clone());
        migration
    }

    /// Insert or replace a migration row as-is.
    pub fn put_migration(&self, migration: Migration) {
        self.tables.write().migrations.insert(migration.id, migration);
    }

    /// Insert an empty aggregate and return it.
    pub fn create_aggregate(&self, name: &str, availability_zone: Option<&str>) -> Aggregate {
        let aggregate = Aggregate {
            id: self.allocate_id(),
            name: name.to_string(),
            availability_zone: availability_zone.map(str::to_string),
            hosts: Vec::new(),
            metadetails: BTreeMap::new(),
            created_at: Timestamp::now(),
            updated_at: None,
        };
        self.tables
            .write()
            .aggregates
            .insert(aggregate.id, aggregate.clone());
        aggregate
    }

    /// Register a service and return it.
    pub fn create_service(&self, host: &str, binary: &str, topic: &str) -> Service {
        let service = Service {
            id: self.allocate_id(),
            host: host.to_string(),
            binary: binary.to_string(),
            topic: topic.to_string(),
            report_count: 0,
            disabled: false,
            availability_zone: None,
            created_at: Timestamp::now(),
            updated_at: None,
            compute_node: None,
        };
        self.put_service(service.clone());
        service
    }

    /// Insert or replace a service row as-is.
    pub fn put_service(&self, service: Service) {
        self.tables.write().services.insert(service.id, service);
    }

    /// Attach a compute node to a service.
    pub fn put_compute_node(&self, node: ComputeNode) {
        self.tables.write().compute_nodes.insert(node.id, node);
    }

    /// Insert a security group.
    pub fn put_security_group(&self, group: SecurityGroup) {
        self.tables.write().security_groups.insert(group.id, group);
    }

    /// Insert a provider firewall rule.
    pub fn put_provider_fw_rule(&self, rule: ProviderFirewallRule) {
        self.tables.write().provider_fw_rules.push(rule);
    }

    /// Insert an agent build.
    pub fn put_agent_build(&self, build: AgentBuild) {
        self.tables.write().agent_builds.push(build);
    }

    /// Open an instance action that events can be attached to.
    pub fn action_start(
        &self,
        ctx: &RequestContext,
        action: &str,
        instance_uuid: Uuid,
        request_id: &str,
    ) -> InstanceAction {
        let row = InstanceAction {
            id: self.allocate_id(),
            action: action.to_string(),
            instance_uuid,
            request_id: request_id.to_string(),
            user_id: ctx.user_id.clone(),
            project_id: ctx.project_id.clone(),
            start_time: Timestamp::now(),
            finish_time: None,
            message: None,
        };
        self.tables.write().actions.insert(row.id, row.clone());
        row
    }

    /// Every event recorded against an action.
    pub fn action_events(&self, action_id: i64) -> Vec<ActionEvent> {
        self.tables
            .read()
            .action_events
            .values()
            .filter(|e| e.action_id == action_id)
            .cloned()
            .collect()
    }

    /// An action row by id.
    pub fn action(&self, action_id: i64) -> Option<InstanceAction> {
        self.tables.read().actions.get(&action_id).cloned()
    }

    /// Every block device mapping, in id order.
    pub fn all_block_device_mappings(&self) -> Vec<BlockDeviceMapping> {
        self.tables.read().bdms.values().cloned().collect()
    }

    fn find_instance<'a>(
        tables: &'a Tables,
        ctx: &RequestContext,
        uuid: &Uuid,
    ) -> Option<&'a Instance> {
        tables
            .instances
            .values()
            .find(|i| &i.uuid == uuid && visible(ctx, i))
    }

    fn instance_id_by_uuid(tables: &Tables, ctx: &RequestContext, uuid: &str) -> StoreResult<i64> {
        let parsed = parse_uuid(uuid)?;
        Self::find_instance(tables, ctx, &parsed)
            .map(|i| i.id)
            .ok_or_else(|| instance_not_found(uuid))
    }

    fn list_instances<F>(&self, ctx: &RequestContext, pred: F) -> Vec<Instance>
    where
        F: Fn(&Instance) -> bool,
    {
        self.tables
            .read()
            .instances
            .values()
            .filter(|i| visible(ctx, i) && pred(i))
            .cloned()
            .collect()
    }

    fn with_compute_nodes(tables: &Tables, mut service: Service) -> Service {
        service.compute_node = tables
            .compute_nodes
            .values()
            .find(|n| n.service_id == service.id)
            .cloned();
        service
    }
}

impl Store for MemoryStore {
    // ==================== Instances ====================

    fn instance_get(&self, ctx: &RequestContext, id: i64) -> StoreResult<Instance> {
        self.fault("instance_get")?;
        self.tables
            .read()
            .instances
            .get(&id)
            .filter(|i| visible(ctx, i))
            .cloned()
            .ok_or_else(|| instance_not_found(id))
    }

    fn instance_get_by_uuid(&self, ctx: &RequestContext, uuid: &str) -> StoreResult<Instance> {
        self.fault("instance_get_by_uuid")?;
        let parsed = parse_uuid(uuid)?;
        let tables = self.tables.read();
        Self::find_instance(&tables, ctx, &parsed)
            .cloned()
            .ok_or_else(|| instance_not_found(uuid))
    }

    fn instance_get_all(&self, ctx: &RequestContext) -> StoreResult<Vec<Instance>> {
        self.fault("instance_get_all")?;
        Ok(self.list_instances(ctx, |_| true))
    }

    fn instance_get_all_by_host(
        &self,
        ctx: &RequestContext,
        host: &str,
    ) -> StoreResult<Vec<Instance>> {
        self.fault("instance_get_all_by_host")?;
        Ok(self.list_instances(ctx, |i| i.host.as_deref() == Some(host)))
    }

    fn instance_get_all_by_filters(
        &self,
        ctx: &RequestContext,
        filters: &Object,
        sort_key: &str,
        sort_dir: SortDir,
    ) -> StoreResult<Vec<Instance>> {
        self.fault("instance_get_all_by_filters")?;
        let mut scoped = ctx.clone();
        if let Some(deleted) = filters.get("deleted").and_then(Value::as_bool) {
            scoped.read_deleted = if deleted {
                ReadDeleted::Only
            } else {
                ReadDeleted::No
            };
        }
        let changes_since = match filters.get("changes-since") {
            Some(Value::String(s)) => Some(
                Timestamp::parse_canonical(s).map_err(|e| StoreError::invalid(e.to_string()))?,
            ),
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(StoreError::invalid(format!(
                    "changes-since expects a timestamp, got {}",
                    other.type_name()
                )))
            }
        };

        let mut rows = Vec::new();
        for instance in self.list_instances(&scoped, |_| true) {
            if let Some(since) = changes_since {
                if instance.updated_at.unwrap_or(instance.created_at) < since {
                    continue;
                }
            }
            let projected = project(&instance)?;
            let keep = filters
                .iter()
                .filter(|(k, _)| k.as_str() != "deleted" && k.as_str() != "changes-since")
                .all(|(k, v)| matches_filter(&projected, k, v));
            if keep {
                let key = projected.get(sort_key).cloned().ok_or_else(|| {
                    StoreError::invalid(format!("unknown sort key {}", sort_key))
                })?;
                rows.push((key, instance));
            }
        }
        rows.sort_by(|(a, _), (b, _)| match sort_dir {
            SortDir::Asc => cmp_values(a, b),
            SortDir::Desc => cmp_values(b, a),
        });
        Ok(rows.into_iter().map(|(_, i)| i).collect())
    }

    fn instance_get_all_hung_in_rebooting(
        &self,
        ctx: &RequestContext,
        timeout: Duration,
    ) -> StoreResult<Vec<Instance>> {
        self.fault("instance_get_all_hung_in_rebooting")?;
        let cutoff = Timestamp::now().saturating_sub(timeout);
        Ok(self.list_instances(ctx, |i| {
            i.task_state.as_deref() == Some("rebooting")
                && i.updated_at.unwrap_or(i.created_at) <= cutoff
        }))
    }

    fn instance_get_active_by_window(
        &self,
        ctx: &RequestContext,
        begin: Timestamp,
        end: Option<Timestamp>,
        project_id: Option<&str>,
        host: Option<&str>,
    ) -> StoreResult<Vec<Instance>> {
        self.fault("instance_get_active_by_window")?;
        Ok(self.list_instances(ctx, |i| {
            let alive_after_begin = i.terminated_at.map_or(true, |t| t > begin);
            let launched_before_end = match end {
                Some(end) => i.launched_at.map_or(false, |l| l < end),
                None => true,
            };
            alive_after_begin
                && launched_before_end
                && project_id.map_or(true, |p| i.project_id == p)
                && host.map_or(true, |h| i.host.as_deref() == Some(h))
        }))
    }

    fn instance_update_and_get_original(
        &self,
        ctx: &RequestContext,
        uuid: &str,
        updates: &InstanceUpdates,
    ) -> StoreResult<(Instance, Instance)> {
        self.fault("instance_update_and_get_original")?;
        let mut tables = self.tables.write();
        let id = Self::instance_id_by_uuid(&tables, ctx, uuid)?;
        let row = tables
            .instances
            .get_mut(&id)
            .ok_or_else(|| instance_not_found(uuid))?;

        if let Some(expected) = updates.get(&InstanceField::ExpectedTaskState) {
            check_expected_task_state(row, expected)?;
        }
        let old = row.clone();
        let mut new = row.clone();
        for (field, value) in updates {
            apply_instance_field(&mut new, *field, value)?;
        }
        new.updated_at = Some(Timestamp::now());
        *row = new.clone();
        self.record_write();
        tracing::debug!(target: "conductor::storage", %uuid, fields = updates.len(), "Instance updated");
        Ok((old, new))
    }

    fn instance_destroy(&self, ctx: &RequestContext, uuid: &str) -> StoreResult<Instance> {
        self.fault("instance_destroy")?;
        let mut tables = self.tables.write();
        let id = Self::instance_id_by_uuid(&tables, ctx, uuid)?;
        let row = tables
            .instances
            .get_mut(&id)
            .ok_or_else(|| instance_not_found(uuid))?;
        let now = Timestamp::now();
        row.deleted = true;
        row.deleted_at = Some(now);
        row.updated_at = Some(now);
        row.info_cache = None;
        self.record_write();
        Ok(row.clone())
    }

    fn instance_info_cache_delete(&self, ctx: &RequestContext, uuid: &str) -> StoreResult<()> {
        self.fault("instance_info_cache_delete")?;
        let parsed = parse_uuid(uuid)?;
        let mut tables = self.tables.write();
        if let Some(row) = tables
            .instances
            .values_mut()
            .find(|i| i.uuid == parsed && visible(ctx, i))
        {
            row.info_cache = None;
            self.record_write();
        }
        Ok(())
    }

    fn instance_info_cache_update(
        &self,
        ctx: &RequestContext,
        uuid: &str,
        values: &Object,
    ) -> StoreResult<InstanceInfoCache> {
        self.fault("instance_info_cache_update")?;
        let mut tables = self.tables.write();
        let id = Self::instance_id_by_uuid(&tables, ctx, uuid)?;
        let row = tables
            .instances
            .get_mut(&id)
            .ok_or_else(|| instance_not_found(uuid))?;
        let mut cache = row.info_cache.clone().unwrap_or(InstanceInfoCache {
            instance_uuid: row.uuid,
            network_info: Value::Array(Vec::new()),
            updated_at: None,
        });
        for (column, v) in values {
            match column.as_str() {
                "network_info" => cache.network_info = v.clone(),
                other => {
                    return Err(StoreError::invalid(format!(
                        "unknown info cache column {}",
                        other
                    )))
                }
            }
        }
        cache.updated_at = Some(Timestamp::now());
        row.info_cache = Some(cache.clone());
        self.record_write();
        Ok(cache)
    }

    fn instance_type_get(&self, _ctx: &RequestContext, id: i64) -> StoreResult<InstanceType> {
        self.fault("instance_type_get")?;
        self.tables
            .read()
            .instance_types
            .get(&id)
            .cloned()
            .ok_or(StoreError::InstanceTypeNotFound {
                instance_type_id: id,
            })
    }

    // ==================== Migrations ====================

    fn migration_get(&self, _ctx: &RequestContext, id: i64) -> StoreResult<Migration> {
        self.fault("migration_get")?;
        self.tables
            .read()
            .migrations
            .get(&id)
            .cloned()
            .ok_or(StoreError::MigrationNotFound { migration_id: id })
    }

    fn migration_update(
        &self,
        _ctx: &RequestContext,
        id: i64,
        status: &str,
    ) -> StoreResult<Migration> {
        self.fault("migration_update")?;
        let mut tables = self.tables.write();
        let row = tables
            .migrations
            .get_mut(&id)
            .ok_or(StoreError::MigrationNotFound { migration_id: id })?;
        row.status = status.to_string();
        row.updated_at = Some(Timestamp::now());
        self.record_write();
        Ok(row.clone())
    }

    fn migration_get_unconfirmed_by_dest_compute(
        &self,
        _ctx: &RequestContext,
        confirm_window: Duration,
        dest_compute: &str,
    ) -> StoreResult<Vec<Migration>> {
        self.fault("migration_get_unconfirmed_by_dest_compute")?;
        let cutoff = Timestamp::now().saturating_sub(confirm_window);
        Ok(self
            .tables
            .read()
            .migrations
            .values()
            .filter(|m| {
                m.status == "finished"
                    && m.dest_compute.as_deref() == Some(dest_compute)
                    && m.updated_at.unwrap_or(m.created_at) <= cutoff
            })
            .cloned()
            .collect())
    }

    // ==================== Aggregates ====================

    fn aggregate_get(&self, _ctx: &RequestContext, id: i64) -> StoreResult<Aggregate> {
        self.fault("aggregate_get")?;
        self.tables
            .read()
            .aggregates
            .get(&id)
            .cloned()
            .ok_or(StoreError::AggregateNotFound { aggregate_id: id })
    }

    fn aggregate_get_by_host(
        &self,
        _ctx: &RequestContext,
        host: &str,
        key: Option<&str>,
    ) -> StoreResult<Vec<Aggregate>> {
        self.fault("aggregate_get_by_host")?;
        Ok(self
            .tables
            .read()
            .aggregates
            .values()
            .filter(|a| a.hosts.iter().any(|h| h == host))
            .filter(|a| key.map_or(true, |k| a.metadetails.contains_key(k)))
            .cloned()
            .collect())
    }

    fn aggregate_host_add(
        &self,
        _ctx: &RequestContext,
        id: i64,
        host: &str,
    ) -> StoreResult<AggregateHost> {
        self.fault("aggregate_host_add")?;
        let mut tables = self.tables.write();
        let aggregate = tables
            .aggregates
            .get_mut(&id)
            .ok_or(StoreError::AggregateNotFound { aggregate_id: id })?;
        if aggregate.hosts.iter().any(|h| h == host) {
            return Err(StoreError::AggregateHostExists {
                aggregate_id: id,
                host: host.to_string(),
            });
        }
        aggregate.hosts.push(host.to_string());
        aggregate.updated_at = Some(Timestamp::now());
        self.record_write();
        Ok(AggregateHost {
            aggregate_id: id,
            host: host.to_string(),
            created_at: Timestamp::now(),
        })
    }

    fn aggregate_host_delete(
        &self,
        _ctx: &RequestContext,
        id: i64,
        host: &str,
    ) -> StoreResult<()> {
        self.fault("aggregate_host_delete")?;
        let mut tables = self.tables.write();
        let not_member = || StoreError::AggregateHostNotFound {
            aggregate_id: id,
            host: host.to_string(),
        };
        let aggregate = tables.aggregates.get_mut(&id).ok_or_else(not_member)?;
        let pos = aggregate
            .hosts
            .iter()
            .position(|h| h == host)
            .ok_or_else(not_member)?;
        aggregate.hosts.remove(pos);
        aggregate.updated_at = Some(Timestamp::now());
        self.record_write();
        Ok(())
    }

    fn aggregate_metadata_add(
        &self,
        _ctx: &RequestContext,
        id: i64,
        metadata: &BTreeMap<String, String>,
        set_delete: bool,
    ) -> StoreResult<BTreeMap<String, String>> {
        self.fault("aggregate_metadata_add")?;
        let mut tables = self.tables.write();
        let aggregate = tables
            .aggregates
            .get_mut(&id)
            .ok_or(StoreError::AggregateNotFound { aggregate_id: id })?;
        if set_delete {
            aggregate.metadetails.retain(|k, _| metadata.contains_key(k));
        }
        for (k, v) in metadata {
            aggregate.metadetails.insert(k.clone(), v.clone());
        }
        aggregate.updated_at = Some(Timestamp::now());
        self.record_write();
        Ok(aggregate.metadetails.clone())
    }

    fn aggregate_metadata_delete(
        &self,
        _ctx: &RequestContext,
        id: i64,
        key: &str,
    ) -> StoreResult<()> {
        self.fault("aggregate_metadata_delete")?;
        let mut tables = self.tables.write();
        let removed = tables
            .aggregates
            .get_mut(&id)
            .and_then(|a| a.metadetails.remove(key));
        match removed {
            Some(_) => {
                self.record_write();
                Ok(())
            }
            None => Err(StoreError::AggregateMetadataNotFound {
                aggregate_id: id,
                key: key.to_string(),
            }),
        }
    }

    // ==================== Usage ====================

    fn bw_usage_update(
        &self,
        _ctx: &RequestContext,
        uuid: &str,
        mac: &str,
        start_period: Timestamp,
        counters: &BandwidthCounters,
        last_refreshed: Option<Timestamp>,
    ) -> StoreResult<()> {
        self.fault("bw_usage_update")?;
        let refreshed = last_refreshed.unwrap_or_else(Timestamp::now);
        let mut tables = self.tables.write();
        let row = tables
            .bw_usage
            .entry((uuid.to_string(), mac.to_string(), start_period))
            .or_insert_with(|| BandwidthUsage {
                instance_uuid: uuid.to_string(),
                mac: mac.to_string(),
                start_period,
                bw_in: 0,
                bw_out: 0,
                last_ctr_in: 0,
                last_ctr_out: 0,
                last_refreshed: None,
            });
        if let Some(v) = counters.bw_in {
            row.bw_in = v;
        }
        if let Some(v) = counters.bw_out {
            row.bw_out = v;
        }
        if let Some(v) = counters.last_ctr_in {
            row.last_ctr_in = v;
        }
        if let Some(v) = counters.last_ctr_out {
            row.last_ctr_out = v;
        }
        row.last_refreshed = Some(refreshed);
        self.record_write();
        Ok(())
    }

    fn bw_usage_get(
        &self,
        _ctx: &RequestContext,
        uuid: &str,
        start_period: Timestamp,
        mac: &str,
    ) -> StoreResult<Option<BandwidthUsage>> {
        self.fault("bw_usage_get")?;
        Ok(self
            .tables
            .read()
            .bw_usage
            .get(&(uuid.to_string(), mac.to_string(), start_period))
            .cloned())
    }

    fn vol_get_usage_by_time(
        &self,
        _ctx: &RequestContext,
        begin: Timestamp,
    ) -> StoreResult<Vec<VolumeUsage>> {
        self.fault("vol_get_usage_by_time")?;
        let fresh = |t: Option<Timestamp>| t.map_or(true, |t| t > begin);
        Ok(self
            .tables
            .read()
            .vol_usage
            .values()
            .filter(|u| fresh(u.tot_last_refreshed) || fresh(u.curr_last_refreshed))
            .cloned()
            .collect())
    }

    fn vol_usage_update(
        &self,
        _ctx: &RequestContext,
        volume_id: &str,
        counters: VolumeCounters,
        instance_uuid: &str,
        last_refreshed: Option<Timestamp>,
        update_totals: bool,
    ) -> StoreResult<VolumeUsage> {
        self.fault("vol_usage_update")?;
        let instance_uuid = parse_uuid(instance_uuid)?;
        let refreshed = last_refreshed.unwrap_or_else(Timestamp::now);
        let mut tables = self.tables.write();
        let existing = tables
            .vol_usage
            .values()
            .find(|u| u.volume_id == volume_id)
            .map(|u| u.id);
        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.allocate_id();
                tables.vol_usage.insert(
                    id,
                    VolumeUsage {
                        id,
                        volume_id: volume_id.to_string(),
                        instance_uuid,
                        tot_last_refreshed: None,
                        tot_reads: 0,
                        tot_read_bytes: 0,
                        tot_writes: 0,
                        tot_write_bytes: 0,
                        curr_last_refreshed: None,
                        curr_reads: 0,
                        curr_read_bytes: 0,
                        curr_writes: 0,
                        curr_write_bytes: 0,
                    },
                );
                id
            }
        };
        let row = tables
            .vol_usage
            .get_mut(&id)
            .ok_or_else(|| StoreError::internal("volume usage row vanished"))?;
        row.instance_uuid = instance_uuid;

        if update_totals {
            row.tot_reads += counters.rd_req;
            row.tot_read_bytes += counters.rd_bytes;
            row.tot_writes += counters.wr_req;
            row.tot_write_bytes += counters.wr_bytes;
            row.curr_reads = 0;
            row.curr_read_bytes = 0;
            row.curr_writes = 0;
            row.curr_write_bytes = 0;
            row.tot_last_refreshed = Some(refreshed);
            row.curr_last_refreshed = Some(refreshed);
        } else {
            // A counter lower than last seen means the guest's counters were
            // reset; bank what was accumulated before overwriting.
            if counters.rd_req < row.curr_reads
                || counters.rd_bytes < row.curr_read_bytes
                || counters.wr_req < row.curr_writes
                || counters.wr_bytes < row.curr_write_bytes
            {
                row.tot_reads += row.curr_reads;
                row.tot_read_bytes += row.curr_read_bytes;
                row.tot_writes += row.curr_writes;
                row.tot_write_bytes += row.curr_write_bytes;
            }
            row.curr_reads = counters.rd_req;
            row.curr_read_bytes = counters.rd_bytes;
            row.curr_writes = counters.wr_req;
            row.curr_write_bytes = counters.wr_bytes;
            row.curr_last_refreshed = Some(refreshed);
        }
        self.record_write();
        Ok(row.clone())
    }

    // ==================== Network / agents ====================

    fn security_group_get_by_instance(
        &self,
        _ctx: &RequestContext,
        instance_id: i64,
    ) -> StoreResult<Vec<SecurityGroup>> {
        self.fault("security_group_get_by_instance")?;
        Ok(self
            .tables
            .read()
            .security_groups
            .values()
            .filter(|g| g.instance_ids.contains(&instance_id))
            .cloned()
            .collect())
    }

    fn security_group_rule_get_by_security_group(
        &self,
        _ctx: &RequestContext,
        security_group_id: i64,
    ) -> StoreResult<Vec<SecurityGroupRule>> {
        self.fault("security_group_rule_get_by_security_group")?;
        Ok(self
            .tables
            .read()
            .security_groups
            .get(&security_group_id)
            .map(|g| g.rules.clone())
            .unwrap_or_default())
    }

    fn provider_fw_rule_get_all(
        &self,
        _ctx: &RequestContext,
    ) -> StoreResult<Vec<ProviderFirewallRule>> {
        self.fault("provider_fw_rule_get_all")?;
        Ok(self.tables.read().provider_fw_rules.clone())
    }

    fn agent_build_get_by_triple(
        &self,
        _ctx: &RequestContext,
        hypervisor: &str,
        os: &str,
        architecture: &str,
    ) -> StoreResult<Option<AgentBuild>> {
        self.fault("agent_build_get_by_triple")?;
        Ok(self
            .tables
            .read()
            .agent_builds
            .iter()
            .find(|b| b.hypervisor == hypervisor && b.os == os && b.architecture == architecture)
            .cloned())
    }

    // ==================== Block devices ====================

    fn block_device_mapping_create(
        &self,
        _ctx: &RequestContext,
        values: &Object,
    ) -> StoreResult<BlockDeviceMapping> {
        self.fault("block_device_mapping_create")?;
        if values.get("instance_uuid").is_none() {
            return Err(StoreError::invalid(
                "block device mapping requires instance_uuid",
            ));
        }
        let mut bdm = BlockDeviceMapping {
            id: self.allocate_id(),
            instance_uuid: Uuid::nil(),
            device_name: None,
            volume_id: None,
            snapshot_id: None,
            volume_size: None,
            virtual_name: None,
            delete_on_termination: false,
            no_device: false,
            connection_info: None,
            created_at: Timestamp::now(),
            updated_at: None,
        };
        apply_bdm_values(&mut bdm, values)?;
        self.tables.write().bdms.insert(bdm.id, bdm.clone());
        self.record_write();
        Ok(bdm)
    }

    fn block_device_mapping_update(
        &self,
        _ctx: &RequestContext,
        id: i64,
        values: &Object,
    ) -> StoreResult<BlockDeviceMapping> {
        self.fault("block_device_mapping_update")?;
        let mut tables = self.tables.write();
        let row = tables
            .bdms
            .get_mut(&id)
            .ok_or(StoreError::BlockDeviceMappingNotFound { bdm_id: id })?;
        let mut updated = row.clone();
        apply_bdm_values(&mut updated, values)?;
        updated.updated_at = Some(Timestamp::now());
        *row = updated.clone();
        self.record_write();
        Ok(updated)
    }

    fn block_device_mapping_update_or_create(
        &self,
        ctx: &RequestContext,
        values: &Object,
    ) -> StoreResult<BlockDeviceMapping> {
        self.fault("block_device_mapping_update_or_create")?;
        let instance_uuid = match values.get("instance_uuid").and_then(Value::as_str) {
            Some(s) => parse_uuid(s)?,
            None => {
                return Err(StoreError::invalid(
                    "block device mapping requires instance_uuid",
                ))
            }
        };
        let device_name = values
            .get("device_name")
            .and_then(Value::as_str)
            .map(str::to_string);
        let existing = self
            .tables
            .read()
            .bdms
            .values()
            .find(|b| b.instance_uuid == instance_uuid && b.device_name == device_name)
            .map(|b| b.id);
        match existing {
            Some(id) => self.block_device_mapping_update(ctx, id, values),
            None => self.block_device_mapping_create(ctx, values),
        }
    }

    fn block_device_mapping_get_all_by_instance(
        &self,
        _ctx: &RequestContext,
        instance_uuid: &str,
    ) -> StoreResult<Vec<BlockDeviceMapping>> {
        self.fault("block_device_mapping_get_all_by_instance")?;
        let parsed = parse_uuid(instance_uuid)?;
        Ok(self
            .tables
            .read()
            .bdms
            .values()
            .filter(|b| b.instance_uuid == parsed)
            .cloned()
            .collect())
    }

    fn block_device_mapping_destroy(&self, _ctx: &RequestContext, id: i64) -> StoreResult<()> {
        self.fault("block_device_mapping_destroy")?;
        self.tables.write().bdms.remove(&id);
        self.record_write();
        Ok(())
    }

    fn block_device_mapping_destroy_by_instance_and_volume(
        &self,
        _ctx: &RequestContext,
        instance_uuid: &str,
        volume_id: &str,
    ) -> StoreResult<()> {
        self.fault("block_device_mapping_destroy_by_instance_and_volume")?;
        let parsed = parse_uuid(instance_uuid)?;
        self.tables.write().bdms.retain(|_, b| {
            !(b.instance_uuid == parsed && b.volume_id.as_deref() == Some(volume_id))
        });
        self.record_write();
        Ok(())
    }

    fn block_device_mapping_destroy_by_instance_and_device(
        &self,
        _ctx: &RequestContext,
        instance_uuid: &str,
        device_name: &str,
    ) -> StoreResult<()> {
        self.fault("block_device_mapping_destroy_by_instance_and_device")?;
        let parsed = parse_uuid(instance_uuid)?;
        self.tables.write().bdms.retain(|_, b| {
            !(b.instance_uuid == parsed && b.device_name.as_deref() == Some(device_name))
        });
        self.record_write();
        Ok(())
    }

    // ==================== Services ====================

    fn service_get_all(&self, _ctx: &RequestContext) -> StoreResult<Vec<Service>> {
        self.fault("service_get_all")?;
        Ok(self.tables.read().services.values().cloned().collect())
    }

    fn service_get_all_compute_by_host(
        &self,
        _ctx: &RequestContext,
        host: &str,
    ) -> StoreResult<Vec<Service>> {
        self.fault("service_get_all_compute_by_host")?;
        let tables = self.tables.read();
        Ok(tables
            .services
            .values()
            .filter(|s| s.topic == COMPUTE_TOPIC && s.host == host)
            .cloned()
            .map(|s| Self::with_compute_nodes(&tables, s))
            .collect())
    }

    fn service_get_by_host_and_topic(
        &self,
        _ctx: &RequestContext,
        host: &str,
        topic: &str,
    ) -> StoreResult<Option<Service>> {
        self.fault("service_get_by_host_and_topic")?;
        Ok(self
            .tables
            .read()
            .services
            .values()
            .find(|s| s.host == host && s.topic == topic)
            .cloned())
    }

    fn service_get_all_by_topic(
        &self,
        _ctx: &RequestContext,
        topic: &str,
    ) -> StoreResult<Vec<Service>> {
        self.fault("service_get_all_by_topic")?;
        Ok(self
            .tables
            .read()
            .services
            .values()
            .filter(|s| s.topic == topic && !s.disabled)
            .cloned()
            .collect())
    }

    fn service_get_all_by_host(
        &self,
        _ctx: &RequestContext,
        host: &str,
    ) -> StoreResult<Vec<Service>> {
        self.fault("service_get_all_by_host")?;
        Ok(self
            .tables
            .read()
            .services
            .values()
            .filter(|s| s.host == host)
            .cloned()
            .collect())
    }

    // ==================== Action log ====================

    fn action_event_start(
        &self,
        _ctx: &RequestContext,
        values: &ActionEventValues,
    ) -> StoreResult<ActionEvent> {
        self.fault("action_event_start")?;
        let mut tables = self.tables.write();
        let action_id = find_action(&tables, values)?;
        let event = ActionEvent {
            id: self.allocate_id(),
            action_id,
            event: values.event.clone(),
            start_time: values.start_time.unwrap_or_else(Timestamp::now),
            finish_time: None,
            result: None,
            traceback: None,
        };
        tables.action_events.insert(event.id, event.clone());
        self.record_write();
        Ok(event)
    }

    fn action_event_finish(
        &self,
        _ctx: &RequestContext,
        values: &ActionEventValues,
    ) -> StoreResult<ActionEvent> {
        self.fault("action_event_finish")?;
        let mut tables = self.tables.write();
        let action_id = find_action(&tables, values)?;
        let event = tables
            .action_events
            .values_mut()
            .find(|e| e.action_id == action_id && e.event == values.event)
            .ok_or_else(|| StoreError::ActionNotFound {
                request_id: values.request_id.clone(),
                instance_uuid: values.instance_uuid.to_string(),
            })?;
        event.finish_time = Some(values.finish_time.unwrap_or_else(Timestamp::now));
        event.result = values.result.clone();
        event.traceback = values.traceback.clone();
        let finished = event.clone();

        let failed = values
            .result
            .as_deref()
            .map_or(false, |r| r.eq_ignore_ascii_case("error"));
        if failed {
            if let Some(action) = tables.actions.get_mut(&action_id) {
                action.message = Some("Error".to_string());
            }
        }
        self.record_write();
        Ok(finished)
    }
}

fn find_action(tables: &Tables, values: &ActionEventValues) -> StoreResult<i64> {
    tables
        .actions
        .values()
        .find(|a| a.request_id == values.request_id && a.instance_uuid == values.instance_uuid)
        .map(|a| a.id)
        .ok_or_else(|| StoreError::ActionNotFound {
            request_id: values.request_id.clone(),
            instance_uuid: values.instance_uuid.to_string(),
        })
}
