//! Service configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Path to store sealed papers and guardian assignments
    pub store_path: PathBuf,

    /// Whether to run in development mode (relaxed file permissions)
    pub dev_mode: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            store_path: Self::default_store_path(),
            dev_mode: false,
        }
    }
}

impl ServiceConfig {
    fn default_store_path() -> PathBuf {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share"))
            })
            .unwrap_or_else(|| PathBuf::from("/var/lib"))
            .join("paperseal")
            .join("papers")
    }

    /// Load configuration from file
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create directories if they don't exist
    pub fn ensure_directories(&self) -> crate::Result<()> {
        std::fs::create_dir_all(&self.store_path)?;
        Ok(())
    }
}
