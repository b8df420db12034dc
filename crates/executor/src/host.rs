//! Host management service.
//!
//! The operator-facing host actions (enable/disable, maintenance, power,
//! resource description) go through a [`HostApi`] driver under the same
//! error-kind contract as the facade: each action declares the driver
//! failures it lets through, everything else is internal.
//!
//! Enable, maintenance and power actions are audit-logged at `info`.

use std::sync::Arc;

use conductor_core::{HostApi, Object, PowerAction, RequestContext, StoreErrorKind, Value};

use crate::convert::translate;
use crate::normalize::to_primitive_all;
use crate::validate::{validate_updates, HostField};
use crate::{Error, Result};

const ACTION_FAILURES: &[StoreErrorKind] =
    &[StoreErrorKind::NotImplemented, StoreErrorKind::HostNotFound];
const DESCRIBE_FAILURES: &[StoreErrorKind] =
    &[StoreErrorKind::HostNotFound, StoreErrorKind::AdminRequired];

/// Host-management actions over a compute host driver.
pub struct HostService {
    api: Arc<dyn HostApi>,
}

impl HostService {
    /// Wrap a driver.
    pub fn new(api: Arc<dyn HostApi>) -> Self {
        Self { api }
    }

    /// Hosts and their services, optionally limited to one zone.
    pub fn list_hosts(&self, ctx: &RequestContext, zone: Option<&str>) -> Result<Vec<Value>> {
        let hosts = self
            .api
            .list_hosts(ctx, zone)
            .map_err(|e| translate("list_hosts", &[], e))?;
        to_primitive_all(&hosts)
    }

    /// Allow or forbid new instances on a host.
    ///
    /// Returns `"enabled"` or `"disabled"`; any other driver answer is an
    /// invalid-argument failure carrying the answer.
    pub fn set_host_enabled(
        &self,
        ctx: &RequestContext,
        host: &str,
        enabled: bool,
    ) -> Result<String> {
        if enabled {
            tracing::info!(target: "conductor::host", %host, "Enabling host");
        } else {
            tracing::info!(target: "conductor::host", %host, "Disabling host");
        }
        let answer = self
            .api
            .set_host_enabled(ctx, host, enabled)
            .map_err(|e| translate("set_host_enabled", ACTION_FAILURES, e))?;
        expect_answer(answer, &["enabled", "disabled"])
    }

    /// Enter or leave maintenance.
    ///
    /// Returns `"on_maintenance"` or `"off_maintenance"`; any other driver
    /// answer is an invalid-argument failure carrying the answer.
    pub fn set_host_maintenance(
        &self,
        ctx: &RequestContext,
        host: &str,
        mode: bool,
    ) -> Result<String> {
        tracing::info!(target: "conductor::host", %host, mode, "Setting host maintenance mode");
        let answer = self
            .api
            .set_host_maintenance(ctx, host, mode)
            .map_err(|e| translate("set_host_maintenance", ACTION_FAILURES, e))?;
        expect_answer(answer, &["on_maintenance", "off_maintenance"])
    }

    /// Start up, shut down or reboot a host. Returns `{host, power_action}`.
    pub fn host_power_action(
        &self,
        ctx: &RequestContext,
        host: &str,
        action: PowerAction,
    ) -> Result<Value> {
        tracing::info!(target: "conductor::host", %host, %action, "Host power action");
        let answer = self
            .api
            .host_power_action(ctx, host, action)
            .map_err(|e| translate("host_power_action", ACTION_FAILURES, e))?;
        let mut result = Object::new();
        result.insert("host".to_string(), Value::from(host));
        result.insert("power_action".to_string(), Value::from(answer));
        Ok(Value::Object(result))
    }

    /// Physical and per-project resource usage of a host.
    pub fn describe_host(&self, ctx: &RequestContext, host: &str) -> Result<Vec<Value>> {
        let rows = self
            .api
            .describe_host(ctx, host)
            .map_err(|e| translate("describe_host", DESCRIBE_FAILURES, e))?;
        to_primitive_all(&rows)
    }

    /// Apply a host update set of `status` and/or `maintenance_mode`.
    ///
    /// Keys are trimmed and lower-cased; values must read as `enable` or
    /// `disable`. A null value counts as absent. Returns `{host, status?, maintenance_mode?}` with the
    /// driver's answers.
    pub fn update_host(&self, ctx: &RequestContext, host: &str, updates: &Object) -> Result<Value> {
        let fields = validate_updates::<HostField>(host, updates)?;
        let given = |field: HostField| {
            fields
                .get(&field)
                .map(|v| v.to_value())
                .filter(|v| !v.is_null())
        };
        let status = given(HostField::Status)
            .map(|v| read_enabled(&v, "Invalid status"))
            .transpose()?;
        let maintenance = given(HostField::MaintenanceMode)
            .map(|v| read_enabled(&v, "Invalid mode"))
            .transpose()?;
        if status.is_none() && maintenance.is_none() {
            return Err(Error::invalid_argument(
                "'status' or 'maintenance_mode' needed for host update",
            ));
        }

        let mut result = Object::new();
        result.insert("host".to_string(), Value::from(host));
        if let Some(enabled) = status {
            let answer = self.set_host_enabled(ctx, host, enabled)?;
            result.insert("status".to_string(), Value::from(answer));
        }
        if let Some(mode) = maintenance {
            let answer = self.set_host_maintenance(ctx, host, mode)?;
            result.insert("maintenance_mode".to_string(), Value::from(answer));
        }
        Ok(Value::Object(result))
    }
}

fn expect_answer(answer: String, expected: &[&str]) -> Result<String> {
    if expected.contains(&answer.as_str()) {
        Ok(answer)
    } else {
        Err(Error::invalid_argument(answer))
    }
}

/// `enable` → true, `disable` → false, surrounding whitespace and case
/// ignored.
fn read_enabled(value: &Value, message: &str) -> Result<bool> {
    let invalid = || {
        Error::invalid_argument(format!(
            "{}: '{}'",
            message,
            value.as_str().unwrap_or(value.type_name())
        ))
    };
    match value.as_str().map(|s| s.trim().to_lowercase()).as_deref() {
        Some("enable") => Ok(true),
        Some("disable") => Ok(false),
        _ => Err(invalid()),
    }
}
