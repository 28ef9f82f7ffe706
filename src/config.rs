use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::task_store::DEFAULT_FILE;

pub const CONFIG_FILE: &str = "taskman.toml";

/// Settings read from `taskman.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Where tasks are stored.
    pub data_file: PathBuf,
    /// Colored output in the menu and one-shot commands.
    pub color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_FILE),
            color: true,
        }
    }
}

impl AppConfig {
    /// Load an explicitly requested file, or `taskman.toml` from `dir` if it
    /// exists. Only the explicit file is required to be present.
    pub fn load(explicit: Option<&Path>, dir: impl AsRef<Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let implicit = dir.as_ref().join(CONFIG_FILE);
                if !implicit.exists() {
                    return Ok(Self::default());
                }
                implicit
            }
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }
}
