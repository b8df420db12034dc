//! Conductor configuration via `conductor.toml`
//!
//! A deployment pins the highest contract version it serves and, optionally,
//! the port of its debugging backdoor. Missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::version::RpcVersion;
use crate::{Error, Result};

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "conductor.toml";

/// Conductor configuration loaded from `conductor.toml`.
///
/// # Example
///
/// ```toml
/// # Highest contract version served (default: the build's version)
/// version_cap = "1.26"
///
/// # backdoor_port = 4444
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConductorConfig {
    /// Requests newer than this are refused with `NotImplemented`.
    #[serde(default)]
    pub version_cap: RpcVersion,
    /// Port reported by `get_backdoor_port`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdoor_port: Option<u16>,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            version_cap: RpcVersion::CURRENT,
            backdoor_port: None,
        }
    }
}

impl ConductorConfig {
    /// Check the cap against what this build implements.
    ///
    /// # Errors
    ///
    /// Returns an error if the cap is from another major line or newer than
    /// [`RpcVersion::CURRENT`].
    pub fn validate(&self) -> Result<()> {
        if !self.version_cap.is_compatible_with(&RpcVersion::CURRENT) {
            return Err(Error::invalid_argument(format!(
                "version_cap {} is not servable by contract {}",
                self.version_cap,
                RpcVersion::CURRENT
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Conductor configuration
#
# Highest contract version this deployment serves. Callers asking for a
# newer version are refused. Lower it to hold back newly added operations
# during a rolling upgrade.
version_cap = "1.26"

# Port of the debugging backdoor, reported to callers of get_backdoor_port.
# backdoor_port = 4444
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::internal(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: ConductorConfig = toml::from_str(&content).map_err(|e| {
            Error::invalid_argument(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        tracing::info!(target: "conductor::executor", version_cap = %config.version_cap, "Loaded configuration");
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::internal(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::internal(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::internal(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
