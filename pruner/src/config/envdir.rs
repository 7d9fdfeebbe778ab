//! Loader for envdir-style directories: every regular file is one variable,
//! named after the file, whose value is the trimmed file content.

use crate::errors::ConfigError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

pub type EnvVars = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct EnvDir {
    path: PathBuf,
}

impl EnvDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the directory and materializes its variables into the
    /// process environment. Credentials can be rotated on disk, so this runs
    /// before every use rather than once.
    pub async fn refresh(&self) -> Result<EnvVars, ConfigError> {
        let vars = read_envdir(&self.path).await?;
        apply_env_vars(&vars);
        Ok(vars)
    }
}

/// A missing directory yields an empty set; any other I/O failure is an error.
pub async fn read_envdir(path: &Path) -> Result<EnvVars, ConfigError> {
    let unreadable = |e: std::io::Error| ConfigError::EnvDirUnreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let mut entries = match fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Envdir {} does not exist, no variables loaded", path.display());
            return Ok(EnvVars::new());
        }
        Err(e) => return Err(unreadable(e)),
    };

    let mut vars = EnvVars::new();
    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let file_type = entry.file_type().await.map_err(unreadable)?;
        if !file_type.is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!("Skipping envdir entry with non UTF-8 name: {:?}", entry.file_name());
            continue;
        };
        if !is_valid_name(&name) {
            warn!("Skipping envdir entry with invalid variable name: {}", name);
            continue;
        }

        let content = fs::read_to_string(entry.path()).await.map_err(unreadable)?;
        let value = content.trim();
        if value.contains('\0') {
            warn!("Skipping envdir variable {}: value contains a NUL byte", name);
            continue;
        }
        vars.insert(name, value.to_string());
    }

    Ok(vars)
}

/// Values are never logged; envdirs usually hold credentials.
pub fn apply_env_vars(vars: &EnvVars) {
    for (key, value) in vars {
        std::env::set_var(key, value);
        debug!("Set environment variable {}", key);
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !name.contains('=')
}
