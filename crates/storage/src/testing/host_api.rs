//! Scripted host driver.
//!
//! Hosts are registered up front; every other host name fails with
//! `HostNotFound`. Capabilities can be switched off per method, after which
//! calls fail with `NotImplemented`.

use std::collections::BTreeMap;

use conductor_core::{
    HostApi, HostResource, HostSummary, PowerAction, RequestContext, StoreError, StoreResult,
};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;

/// One call the driver received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    /// `set_host_enabled(host, enabled)`
    SetEnabled(String, bool),
    /// `set_host_maintenance(host, mode)`
    SetMaintenance(String, bool),
    /// `host_power_action(host, action)`
    Power(String, PowerAction),
    /// `describe_host(host)`
    Describe(String),
}

/// A [`HostApi`] with a fixed inventory.
#[derive(Default)]
pub struct ScriptedHostApi {
    hosts: BTreeMap<String, HostSummary>,
    disabled: Mutex<FxHashSet<&'static str>>,
    answers: Mutex<BTreeMap<&'static str, String>>,
    calls: Mutex<Vec<HostCall>>,
}

impl ScriptedHostApi {
    /// A driver that knows no hosts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host running `service` in `zone`.
    pub fn with_host(mut self, host: &str, service: &str, zone: &str) -> Self {
        self.hosts.insert(
            host.to_string(),
            HostSummary {
                host_name: host.to_string(),
                service: service.to_string(),
                zone: zone.to_string(),
            },
        );
        self
    }

    /// Switch off one capability, named by its [`HostApi`] method.
    pub fn disable(&self, method: &'static str) {
        self.disabled.lock().insert(method);
    }

    /// Force the answer a method returns instead of the usual one.
    pub fn answer(&self, method: &'static str, answer: &str) {
        self.answers.lock().insert(method, answer.to_string());
    }

    /// Calls received so far that reached a known host.
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().clone()
    }

    fn check(&self, method: &'static str, host: &str) -> StoreResult<()> {
        if self.disabled.lock().contains(method) {
            return Err(StoreError::not_implemented(method));
        }
        if !self.hosts.contains_key(host) {
            return Err(StoreError::HostNotFound {
                host: host.to_string(),
            });
        }
        Ok(())
    }

    fn reply(&self, method: &'static str, default: &str) -> String {
        self.answers
            .lock()
            .get(method)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}

impl HostApi for ScriptedHostApi {
    fn list_hosts(&self, _ctx: &RequestContext, zone: Option<&str>) -> StoreResult<Vec<HostSummary>> {
        if self.disabled.lock().contains("list_hosts") {
            return Err(StoreError::not_implemented("list_hosts"));
        }
        Ok(self
            .hosts
            .values()
            .filter(|h| zone.map_or(true, |z| h.zone == z))
            .cloned()
            .collect())
    }

    fn set_host_enabled(
        &self,
        _ctx: &RequestContext,
        host: &str,
        enabled: bool,
    ) -> StoreResult<String> {
        self.check("set_host_enabled", host)?;
        self.calls
            .lock()
            .push(HostCall::SetEnabled(host.to_string(), enabled));
        Ok(self.reply(
            "set_host_enabled",
            if enabled { "enabled" } else { "disabled" },
        ))
    }

    fn set_host_maintenance(
        &self,
        _ctx: &RequestContext,
        host: &str,
        mode: bool,
    ) -> StoreResult<String> {
        self.check("set_host_maintenance", host)?;
        self.calls
            .lock()
            .push(HostCall::SetMaintenance(host.to_string(), mode));
        Ok(self.reply(
            "set_host_maintenance",
            if mode {
                "on_maintenance"
            } else {
                "off_maintenance"
            },
        ))
    }

    fn host_power_action(
        &self,
        _ctx: &RequestContext,
        host: &str,
        action: PowerAction,
    ) -> StoreResult<String> {
        self.check("host_power_action", host)?;
        self.calls
            .lock()
            .push(HostCall::Power(host.to_string(), action));
        Ok(self.reply("host_power_action", action.as_str()))
    }

    fn describe_host(&self, ctx: &RequestContext, host: &str) -> StoreResult<Vec<HostResource>> {
        if !ctx.is_admin {
            return Err(StoreError::AdminRequired);
        }
        self.check("describe_host", host)?;
        self.calls.lock().push(HostCall::Describe(host.to_string()));
        Ok(vec![
            HostResource {
                host: host.to_string(),
                project: "(total)".to_string(),
                cpu: 8,
                memory_mb: 16384,
                disk_gb: 100,
            },
            HostResource {
                host: host.to_string(),
                project: "(used_now)".to_string(),
                cpu: 0,
                memory_mb: 512,
                disk_gb: 0,
            },
        ])
    }
}
