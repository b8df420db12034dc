//! Contract versions.
//!
//! The operation contract is versioned as a whole. Adding an operation or a
//! backward-compatible argument bumps the minor component; removing or
//! narrowing anything bumps the major component.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

/// A `major.minor` contract version.
///
/// Ordering compares the major component first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RpcVersion {
    /// Incompatible-change counter
    pub major: u32,
    /// Compatible-change counter
    pub minor: u32,
}

impl RpcVersion {
    /// The contract version this build implements.
    pub const CURRENT: RpcVersion = RpcVersion::new(1, 26);

    /// Create a version.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// True when a caller at `self` can be served by an implementation of
    /// `other`: same major, and `self` no newer than `other`.
    pub fn is_compatible_with(&self, other: &RpcVersion) -> bool {
        self.major == other.major && self <= other
    }
}

impl Default for RpcVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for RpcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for RpcVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::invalid_argument(format!("malformed version '{}'", s));
        let (major, minor) = s.trim().split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl Serialize for RpcVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RpcVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
