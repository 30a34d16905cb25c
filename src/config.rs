//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/chronotree/chronotree.toml`
//! 3. Explicit file passed via `--config`
//! 4. Environment variables: `CHRONOTREE_*` prefix

use std::fs;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::{TreeError, TreeResult};
use crate::estimator::TimingConfig;
use crate::style::StyleConfig;

/// Unified configuration for chronotree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Fallback constants for the time estimator
    pub timing: TimingConfig,
    /// Region palette and highlight set
    pub style: StyleConfig,
}

impl Settings {
    /// Global config path, if a home directory can be determined.
    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "chronotree")
            .map(|dirs| dirs.config_dir().join("chronotree.toml"))
    }

    /// Load settings with layered precedence.
    ///
    /// The global file is optional; an explicit `--config` file must
    /// exist. Partially specified sections inherit compiled defaults.
    #[instrument(level = "debug")]
    pub fn load(explicit: Option<&Path>) -> TreeResult<Self> {
        let mut builder = Config::builder();

        if let Some(global) = Self::global_config_path() {
            debug!("global config candidate: {}", global.display());
            builder = builder.add_source(File::from(global).required(false));
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(TreeError::FileNotFound(path.to_path_buf()));
            }
            builder = builder.add_source(File::from(path.to_path_buf()));
        }

        builder = builder.add_source(
            Environment::with_prefix("CHRONOTREE")
                .separator("__")
                .try_parsing(true),
        );

        let merged = builder
            .build()
            .map_err(|err| TreeError::Config(err.to_string()))?;
        merged
            .try_deserialize()
            .map_err(|err| TreeError::Config(err.to_string()))
    }

    /// Write the compiled defaults as a TOML template to `path`.
    pub fn write_template(path: &Path) -> TreeResult<()> {
        if path.exists() {
            return Err(TreeError::Config(format!(
                "config already exists: {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = toml::to_string_pretty(&Settings::default())
            .map_err(|err| TreeError::Config(err.to_string()))?;
        fs::write(path, body)?;
        Ok(())
    }

    /// Serialize the merged settings for display.
    pub fn to_toml(&self) -> TreeResult<String> {
        toml::to_string_pretty(self).map_err(|err| TreeError::Config(err.to_string()))
    }
}
