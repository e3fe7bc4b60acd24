//! Configuration schema for plugcache
//!
//! Configuration is stored at `~/.config/plugcache/config.toml`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Archive path of the plugin cache written by the annotation processor
pub const DEFAULT_RESOURCE_PATH: &str =
    "META-INF/org/apache/logging/log4j/core/config/plugins/Log4j2Plugins.dat";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which archive entry is merged
    pub resource: ResourceConfig,

    /// Where fragments wait until finalize
    pub staging: StagingConfig,
}

/// Resource matching settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Archive entry path, compared exactly
    pub path: String,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_RESOURCE_PATH.to_string(),
        }
    }
}

/// Storage used for staged fragments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagingBackend {
    /// One temporary file per fragment
    #[default]
    Disk,
    /// Keep fragment bytes in memory
    Memory,
}

impl fmt::Display for StagingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disk => "disk",
            Self::Memory => "memory",
        };
        write!(f, "{}", name)
    }
}

/// Staging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Storage backend
    pub backend: StagingBackend,

    /// Directory for staged files (default: system temp dir)
    pub dir: Option<PathBuf>,

    /// File name prefix for staged files
    pub prefix: String,

    /// File name suffix for staged files
    pub suffix: String,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            backend: StagingBackend::Disk,
            dir: None,
            prefix: "Log4j2Plugins".to_string(),
            suffix: ".dat".to_string(),
        }
    }
}
