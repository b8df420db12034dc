//! Update whitelist validation.
//!
//! Every mutating operation that takes a caller-supplied update set runs it
//! through [`validate_updates`] before touching the store. Each entity kind
//! owns a closed field set ([`UpdateWhitelist`]); caller keys are trimmed
//! and lower-cased, then matched exactly. One bad key rejects the whole set,
//! so nothing is ever partially applied.
//!
//! Fields in the kind's temporal subset that arrive as strings are parsed
//! with the canonical timestamp format.

use std::collections::BTreeMap;
use std::fmt::Debug;

use conductor_core::{InstanceField, Object, Timestamp, UpdateValue, Value};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A closed set of updatable fields for one entity kind.
pub trait UpdateWhitelist: Copy + Ord + Debug {
    /// Entity kind name used in log lines and error messages.
    const ENTITY: &'static str;

    /// Exact lookup of a normalized key.
    fn lookup(name: &str) -> Option<Self>;

    /// Whether string values for this field are parsed as timestamps.
    fn is_temporal(&self) -> bool {
        false
    }
}

impl UpdateWhitelist for InstanceField {
    const ENTITY: &'static str = "instance";

    fn lookup(name: &str) -> Option<Self> {
        InstanceField::from_name(name)
    }

    fn is_temporal(&self) -> bool {
        InstanceField::is_temporal(self)
    }
}

/// Updatable fields of a compute host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostField {
    /// Whether the host accepts new instances
    Status,
    /// Whether the host is in maintenance
    MaintenanceMode,
}

impl UpdateWhitelist for HostField {
    const ENTITY: &'static str = "host";

    fn lookup(name: &str) -> Option<Self> {
        match name {
            "status" => Some(HostField::Status),
            "maintenance_mode" => Some(HostField::MaintenanceMode),
            _ => None,
        }
    }
}

/// Validate and coerce an update set for entity kind `F`.
///
/// `target` names the entity being updated, for diagnostics only.
pub fn validate_updates<F: UpdateWhitelist>(
    target: &str,
    updates: &Object,
) -> Result<BTreeMap<F, UpdateValue>> {
    let mut resolved = BTreeMap::new();
    for (raw, value) in updates {
        let key = raw.trim().to_lowercase();
        let field = match F::lookup(&key) {
            Some(field) => field,
            None => {
                tracing::error!(
                    target: "conductor::validate",
                    entity = F::ENTITY,
                    %target,
                    key = %raw,
                    "Update attempted for a field outside the whitelist"
                );
                return Err(Error::invalid_argument(format!(
                    "unexpected update keyword '{}'",
                    raw
                )));
            }
        };
        let coerced = match value {
            Value::String(s) if field.is_temporal() => {
                let ts = Timestamp::parse_canonical(s).map_err(|e| {
                    Error::invalid_argument(format!("field '{}': {}", key, e))
                })?;
                UpdateValue::Time(ts)
            }
            other => UpdateValue::Plain(other.clone()),
        };
        if resolved.insert(field, coerced).is_some() {
            return Err(Error::invalid_argument(format!(
                "update keyword '{}' given more than once",
                key
            )));
        }
    }
    Ok(resolved)
}
