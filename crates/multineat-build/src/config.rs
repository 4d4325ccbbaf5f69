//! Build configuration (multineat-build.toml)
//!
//! Optional per-project file overriding toolchain programs, the object
//! directory and pool size. Missing fields keep their defaults.

use crate::context::DEFAULT_PYTHON_MAJOR;
use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Conventional configuration file name in the project root
pub const CONFIG_FILE_NAME: &str = "multineat-build.toml";

/// Build configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// C++ compiler program
    pub compiler: String,
    /// Binding generator program
    pub generator: String,
    /// Directory receiving object files, relative to the project root
    pub target_dir: PathBuf,
    /// Worker count; physical cores when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    /// Python major version the module is built for
    pub python_major: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            compiler: "c++".to_string(),
            generator: "cython".to_string(),
            target_dir: PathBuf::from("build/temp"),
            jobs: None,
            python_major: DEFAULT_PYTHON_MAJOR,
        }
    }
}

impl BuildConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> BuildResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;

        let config: Self = toml::from_str(&content).map_err(|e| BuildError::Config {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.validate().map_err(|error| BuildError::Config {
            path: path.to_path_buf(),
            error,
        })?;
        Ok(config)
    }

    /// Load `multineat-build.toml` from the project root, or defaults if absent
    pub fn load_from_directory(root: &Path) -> BuildResult<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.compiler.trim().is_empty() {
            return Err("compiler cannot be empty".to_string());
        }
        if self.generator.trim().is_empty() {
            return Err("generator cannot be empty".to_string());
        }
        if self.jobs == Some(0) {
            return Err("jobs must be at least 1".to_string());
        }
        Ok(())
    }
}
