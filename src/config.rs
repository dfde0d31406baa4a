use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = ".shadows_search.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// How often the completion wait checks the in-flight set.
    pub poll_interval_ms: u64,
    /// Scanned entries between two coarse progress events.
    pub progress_every: u64,
    /// Overrides the detected CPU count when partitioning roots.
    pub parallelism: Option<usize>,
    pub skip_hidden_dirs: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            progress_every: 100,
            parallelism: None,
            skip_hidden_dirs: true,
        }
    }
}

impl SearchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism.filter(|n| *n > 0).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| SearchError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SearchError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads the per-user config file; a missing file yields the defaults.
    pub fn load_default() -> Result<Self> {
        let Some(path) = default_config_path() else {
            return Ok(Self::default());
        };
        match Self::load(&path) {
            Err(SearchError::ConfigRead { source, .. })
                if source.kind() == io::ErrorKind::NotFound =>
            {
                Ok(Self::default())
            }
            other => other,
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        if let Some(base) = std::env::var_os("USERPROFILE") {
            return Some(PathBuf::from(base).join(CONFIG_FILE_NAME));
        }
    }
    #[cfg(not(windows))]
    {
        if let Some(base) = std::env::var_os("HOME") {
            return Some(PathBuf::from(base).join(CONFIG_FILE_NAME));
        }
    }
    None
}
