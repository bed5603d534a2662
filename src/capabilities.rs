//! Server capability flags.
//!
//! Which message shapes the serializers may emit depends on the server
//! version. The flags are gathered in one [`Capabilities`] value that every
//! serializer entry point takes by reference.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WeftError};

lazy_static! {
    static ref VERSION_PATTERN: Regex =
        Regex::new(r"^v?(\d+)\.(\d+)(?:\.(\d+))?(?:[-+].*)?$").unwrap();
}

/// First server version accepting the structured `targets` message.
pub const TARGETS_MIN_VERSION: ServerVersion = ServerVersion::new(1, 26, 0);

/// First server version accepting several weights for one target vector.
pub const WEIGHTS_FOR_TARGETS_MIN_VERSION: ServerVersion = ServerVersion::new(1, 27, 0);

/// First server version accepting per-target vector records.
pub const VECTORS_FOR_TARGETS_MIN_VERSION: ServerVersion = ServerVersion::new(1, 29, 0);

/// A parsed `major.minor.patch` server version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse versions such as `1.27.3`, `v1.26` or `1.28.0-rc.1`.
    pub fn parse(version: &str) -> Result<Self> {
        let captures = VERSION_PATTERN
            .captures(version.trim())
            .ok_or_else(|| WeftError::invalid_input(format!("malformed server version: {version:?}")))?;

        let component = |index: usize| -> Result<u32> {
            match captures.get(index) {
                Some(m) => m.as_str().parse::<u32>().map_err(|e| {
                    WeftError::invalid_input(format!("malformed server version {version:?}: {e}"))
                }),
                None => Ok(0),
            }
        };

        Ok(Self::new(component(1)?, component(2)?, component(3)?))
    }
}

impl std::fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Capability flags negotiated with the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Emit the structured `targets` message instead of a flat name list.
    pub supports_targets: bool,
    /// Emit named vectors as per-target records rather than one buffer per target.
    pub supports_vectors_for_targets: bool,
    /// Accept more than one weight for the same target vector.
    pub supports_weights_for_targets: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            supports_targets: true,
            supports_vectors_for_targets: true,
            supports_weights_for_targets: true,
        }
    }
}

impl Capabilities {
    /// Capabilities of a server that predates multi-target vector search.
    pub fn legacy() -> Self {
        Self {
            supports_targets: false,
            supports_vectors_for_targets: false,
            supports_weights_for_targets: false,
        }
    }

    /// Derive the capability flags from a server version.
    pub fn for_version(version: ServerVersion) -> Self {
        Self {
            supports_targets: version >= TARGETS_MIN_VERSION,
            supports_vectors_for_targets: version >= VECTORS_FOR_TARGETS_MIN_VERSION,
            supports_weights_for_targets: version >= WEIGHTS_FOR_TARGETS_MIN_VERSION,
        }
    }

    /// Parse a server version string and derive the capability flags.
    pub fn from_server_version(version: &str) -> Result<Self> {
        let parsed = ServerVersion::parse(version)?;
        let capabilities = Self::for_version(parsed);
        tracing::debug!(version = %parsed, ?capabilities, "negotiated server capabilities");
        Ok(capabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versions() {
        assert_eq!(ServerVersion::parse("1.27.3").unwrap(), ServerVersion::new(1, 27, 3));
        assert_eq!(ServerVersion::parse("v1.26").unwrap(), ServerVersion::new(1, 26, 0));
        assert_eq!(
            ServerVersion::parse("1.28.0-rc.1").unwrap(),
            ServerVersion::new(1, 28, 0)
        );
        assert!(ServerVersion::parse("latest").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_capabilities_by_version() {
        let caps = Capabilities::from_server_version("1.25.9").unwrap();
        assert_eq!(caps, Capabilities::legacy());

        let caps = Capabilities::from_server_version("1.26.0").unwrap();
        assert!(caps.supports_targets);
        assert!(!caps.supports_weights_for_targets);
        assert!(!caps.supports_vectors_for_targets);

        let caps = Capabilities::from_server_version("1.27.1").unwrap();
        assert!(caps.supports_weights_for_targets);
        assert!(!caps.supports_vectors_for_targets);

        let caps = Capabilities::from_server_version("1.30.0").unwrap();
        assert_eq!(caps, Capabilities::default());
    }

    #[test]
    fn test_capabilities_deserialize_with_defaults() {
        let caps: Capabilities =
            serde_json::from_str(r#"{"supports_weights_for_targets": false}"#).unwrap();
        assert!(caps.supports_targets);
        assert!(!caps.supports_weights_for_targets);
    }
}
