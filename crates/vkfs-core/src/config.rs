use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{VkfsError, VkfsResult};

/// Top-level configuration (loaded from vkfs.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VkfsConfig {
    pub log: LogConfig,
    pub crypto: CryptoConfig,
}

impl VkfsConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file is not an error: the defaults are returned instead.
    pub fn load(path: &Path) -> VkfsResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| VkfsError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> VkfsResult<Self> {
        toml::from_str(content).map_err(|e| VkfsError::Config(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Which key-wrap / name-encoding scheme to use for a vault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemePreference {
    /// Pick the scheme from the key file's format version
    #[default]
    Auto,
    /// 128-bit KEK, padded base-32 names
    Legacy,
    /// 256-bit KEK, unpadded base-32 names
    Standard,
}

/// Vault unlock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Upper bound on scrypt working memory in MiB (default: 1024)
    pub max_kdf_memory_mib: u64,
    /// Scheme selection (default: auto)
    pub scheme: SchemePreference,
    /// Check the key file's version MAC after unlocking (default: true)
    pub verify_version_mac: bool,
    /// Path to the vault key file
    pub key_file: Option<PathBuf>,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            max_kdf_memory_mib: 1024,
            scheme: SchemePreference::Auto,
            verify_version_mac: true,
            key_file: None,
        }
    }
}

impl CryptoConfig {
    pub fn max_kdf_memory_bytes(&self) -> u64 {
        self.max_kdf_memory_mib.saturating_mul(1024 * 1024)
    }
}
