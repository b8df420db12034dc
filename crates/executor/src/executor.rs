//! The Executor - single entry point to the conductor.
//!
//! The Executor is a stateless dispatcher: it checks the caller's contract
//! version, routes each command to its handler and returns the normalized
//! output. It adds no locking of its own; atomicity of each operation is
//! the store's.

use std::sync::Arc;

use conductor_core::{
    BandwidthCounters, ChangeNotifier, NoopNotifier, RequestContext, Store, VolumeCounters,
};

use crate::config::ConductorConfig;
use crate::handlers;
use crate::handlers::block_device::DestroySelector;
use crate::operation::Operation;
use crate::version::RpcVersion;
use crate::{Command, Error, Output, Request, Result};

/// The command executor.
///
/// The Executor is **stateless**: it holds its collaborators and its
/// configuration but no per-call state.
///
/// # Thread Safety
///
/// Executor is `Send + Sync` and can be shared across threads.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use conductor_executor::{Command, Executor, RequestContext};
/// use conductor_storage::MemoryStore;
///
/// let executor = Executor::new(Arc::new(MemoryStore::new()));
/// let ctx = RequestContext::new("user", "project");
///
/// let output = executor.execute(&ctx, Command::MigrationGet { migration_id: 1 })?;
///
/// let results = executor.execute_many(&ctx, vec![
///     Command::AggregateGet { aggregate_id: 1 },
///     Command::AggregateGet { aggregate_id: 2 },
/// ]);
/// ```
pub struct Executor {
    store: Arc<dyn Store>,
    notifier: Arc<dyn ChangeNotifier>,
    config: ConductorConfig,
}

impl Executor {
    /// Create an executor over a store, with no change notifications and
    /// the default configuration.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            notifier: Arc::new(NoopNotifier),
            config: ConductorConfig::default(),
        }
    }

    /// Publish instance changes to `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ConductorConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &ConductorConfig {
        &self.config
    }

    /// Check that a caller at `version` may invoke `operation`.
    ///
    /// The caller must speak the same major version, be no newer than the
    /// configured cap, and be at least as new as the operation.
    pub fn negotiate(&self, version: RpcVersion, operation: Operation) -> Result<()> {
        if !version.is_compatible_with(&self.config.version_cap) {
            return Err(Error::NotImplemented {
                reason: format!(
                    "unsupported contract version {} (serving up to {})",
                    version, self.config.version_cap
                ),
            });
        }
        if operation.since() > version {
            return Err(Error::NotImplemented {
                reason: format!(
                    "unsupported contract version {} for {} (introduced in {})",
                    version,
                    operation,
                    operation.since()
                ),
            });
        }
        Ok(())
    }

    /// Serve a versioned request.
    pub fn handle(&self, request: Request) -> Result<Output> {
        self.negotiate(request.version, request.command.operation())?;
        self.dispatch(&request.context, request.command)
    }

    /// Execute a single command at the configured version cap.
    pub fn execute(&self, ctx: &RequestContext, cmd: Command) -> Result<Output> {
        self.negotiate(self.config.version_cap, cmd.operation())?;
        self.dispatch(ctx, cmd)
    }

    /// Execute multiple commands sequentially.
    ///
    /// Every command runs regardless of earlier failures; results[i]
    /// corresponds to cmds[i].
    pub fn execute_many(&self, ctx: &RequestContext, cmds: Vec<Command>) -> Vec<Result<Output>> {
        cmds.into_iter().map(|cmd| self.execute(ctx, cmd)).collect()
    }

    fn dispatch(&self, ctx: &RequestContext, cmd: Command) -> Result<Output> {
        let operation = cmd.operation();
        tracing::debug!(target: "conductor::executor", %operation, request_id = %ctx.request_id, "Dispatching");
        let store = self.store.as_ref();
        match cmd {
            // Instances
            Command::InstanceUpdate {
                instance_uuid,
                updates,
            } => handlers::instance::instance_update(
                store,
                self.notifier.as_ref(),
                ctx,
                &instance_uuid,
                &updates,
            ),
            Command::InstanceGet { instance_id } => {
                handlers::instance::instance_get(store, ctx, instance_id)
            }
            Command::InstanceGetByUuid { instance_uuid } => {
                handlers::instance::instance_get_by_uuid(store, ctx, &instance_uuid)
            }
            Command::InstanceGetAll => handlers::instance::instance_get_all(store, ctx),
            Command::InstanceGetAllByHost { host } => {
                handlers::instance::instance_get_all_by_host(store, ctx, &host)
            }
            Command::InstanceGetAllByFilters {
                filters,
                sort_key,
                sort_dir,
            } => handlers::instance::instance_get_all_by_filters(
                store, ctx, &filters, &sort_key, sort_dir,
            ),
            Command::InstanceGetAllHungInRebooting { timeout_secs } => {
                handlers::instance::instance_get_all_hung_in_rebooting(store, ctx, timeout_secs)
            }
            Command::InstanceGetActiveByWindow {
                begin,
                end,
                project_id,
                host,
            } => handlers::instance::instance_get_active_by_window(
                store,
                ctx,
                begin,
                end,
                project_id.as_deref(),
                host.as_deref(),
            ),
            Command::InstanceDestroy { instance_uuid } => {
                handlers::instance::instance_destroy(store, ctx, &instance_uuid)
            }
            Command::InstanceInfoCacheDelete { instance_uuid } => {
                handlers::instance::instance_info_cache_delete(store, ctx, &instance_uuid)
            }
            Command::InstanceInfoCacheUpdate {
                instance_uuid,
                values,
            } => handlers::instance::instance_info_cache_update(store, ctx, &instance_uuid, &values),
            Command::InstanceTypeGet { instance_type_id } => {
                handlers::instance::instance_type_get(store, ctx, instance_type_id)
            }

            // Migrations
            Command::MigrationGet { migration_id } => {
                handlers::migration::migration_get(store, ctx, migration_id)
            }
            Command::MigrationUpdate {
                migration_id,
                status,
            } => handlers::migration::migration_update(store, ctx, migration_id, &status),
            Command::MigrationGetUnconfirmedByDestCompute {
                confirm_window_secs,
                dest_compute,
            } => handlers::migration::migration_get_unconfirmed_by_dest_compute(
                store,
                ctx,
                confirm_window_secs,
                &dest_compute,
            ),

            // Aggregates
            Command::AggregateGet { aggregate_id } => {
                handlers::aggregate::aggregate_get(store, ctx, aggregate_id)
            }
            Command::AggregateGetByHost { host, key } => {
                handlers::aggregate::aggregate_get_by_host(store, ctx, &host, key.as_deref())
            }
            Command::AggregateHostAdd { aggregate_id, host } => {
                handlers::aggregate::aggregate_host_add(store, ctx, aggregate_id, &host)
            }
            Command::AggregateHostDelete { aggregate_id, host } => {
                handlers::aggregate::aggregate_host_delete(store, ctx, aggregate_id, &host)
            }
            Command::AggregateMetadataAdd {
                aggregate_id,
                metadata,
                set_delete,
            } => handlers::aggregate::aggregate_metadata_add(
                store,
                ctx,
                aggregate_id,
                &metadata,
                set_delete,
            ),
            Command::AggregateMetadataDelete { aggregate_id, key } => {
                handlers::aggregate::aggregate_metadata_delete(store, ctx, aggregate_id, &key)
            }

            // Usage
            Command::BwUsageUpdate {
                instance_uuid,
                mac,
                start_period,
                bw_in,
                bw_out,
                last_ctr_in,
                last_ctr_out,
                last_refreshed,
            } => handlers::usage::bw_usage_update(
                store,
                ctx,
                &instance_uuid,
                &mac,
                start_period,
                BandwidthCounters {
                    bw_in,
                    bw_out,
                    last_ctr_in,
                    last_ctr_out,
                },
                last_refreshed,
            ),
            Command::VolGetUsageByTime { start_time } => {
                handlers::usage::vol_get_usage_by_time(store, ctx, start_time)
            }
            Command::VolUsageUpdate {
                volume_id,
                rd_req,
                rd_bytes,
                wr_req,
                wr_bytes,
                instance_uuid,
                last_refreshed,
                update_totals,
            } => handlers::usage::vol_usage_update(
                store,
                ctx,
                &volume_id,
                VolumeCounters {
                    rd_req,
                    rd_bytes,
                    wr_req,
                    wr_bytes,
                },
                &instance_uuid,
                last_refreshed,
                update_totals,
            ),

            // Network / agents
            Command::SecurityGroupGetByInstance { instance_id } => {
                handlers::network::security_group_get_by_instance(store, ctx, instance_id)
            }
            Command::SecurityGroupRuleGetBySecurityGroup { security_group_id } => {
                handlers::network::security_group_rule_get_by_security_group(
                    store,
                    ctx,
                    security_group_id,
                )
            }
            Command::ProviderFwRuleGetAll => handlers::network::provider_fw_rule_get_all(store, ctx),
            Command::AgentBuildGetByTriple {
                hypervisor,
                os,
                architecture,
            } => handlers::network::agent_build_get_by_triple(
                store,
                ctx,
                &hypervisor,
                &os,
                &architecture,
            ),

            // Block devices
            Command::BlockDeviceMappingUpdateOrCreate { values, create } => {
                handlers::block_device::block_device_mapping_update_or_create(
                    store, ctx, &values, create,
                )
            }
            Command::BlockDeviceMappingGetAllByInstance { instance_uuid } => {
                handlers::block_device::block_device_mapping_get_all_by_instance(
                    store,
                    ctx,
                    &instance_uuid,
                )
            }
            Command::BlockDeviceMappingDestroy {
                bdms,
                instance_uuid,
                volume_id,
                device_name,
            } => {
                let selector = DestroySelector::resolve(
                    bdms.as_deref(),
                    instance_uuid.as_deref(),
                    volume_id.as_deref(),
                    device_name.as_deref(),
                )?;
                handlers::block_device::block_device_mapping_destroy(store, ctx, selector)
            }

            // Services / audit
            Command::ServiceGetAllBy { topic, host } => handlers::service::service_get_all_by(
                store,
                ctx,
                topic.as_deref(),
                host.as_deref(),
            ),
            Command::ActionEventStart { values } => {
                handlers::action::action_event_start(store, ctx, &values)
            }
            Command::ActionEventFinish { values } => {
                handlers::action::action_event_finish(store, ctx, &values)
            }

            // Plumbing
            Command::Ping { arg } => handlers::misc::ping(arg),
            Command::GetBackdoorPort => handlers::misc::get_backdoor_port(&self.config),
        }
    }
}
