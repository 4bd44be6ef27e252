use std::path::{Path, PathBuf};

use crate::error::{Result, ToolError};

pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Directory holding the clash binary and its config.yaml.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDir(PathBuf);

impl ToolDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ToolDir(path.into())
    }

    /// Uses `explicit` when given, otherwise the directory of the running
    /// executable. The result is always absolute.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        let dir = match explicit {
            Some(dir) => dir,
            None => {
                let executable = std::env::current_exe()
                    .map_err(|e| ToolError::Config(format!("cannot locate executable: {e}")))?;
                executable
                    .parent()
                    .map(Path::to_path_buf)
                    .ok_or_else(|| ToolError::Config("executable has no parent directory".into()))?
            }
        };

        let dir = if dir.is_absolute() {
            dir
        } else {
            std::env::current_dir()
                .map_err(|e| ToolError::io(&dir, e))?
                .join(dir)
        };

        log::debug!("tool directory: {}", dir.display());
        Ok(ToolDir(dir))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn config_file(&self) -> PathBuf {
        self.0.join(CONFIG_FILE_NAME)
    }
}
