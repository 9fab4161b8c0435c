//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/bintree/bintree.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `BINTREE_*` prefix, `__` between nesting levels
//!    (e.g. `BINTREE_CODEC__MAX_NODES=1000`)

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::tree_traits::DEFAULT_RENDER_DEPTH;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("config error: {message}")]
    Config { message: String },
}

/// Limits applied when decoding tree files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CodecSettings {
    /// Largest number of nodes a single file may describe (unlimited if unset)
    pub max_nodes: Option<usize>,
}

/// Terminal output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderSettings {
    /// Colorize CLI output (NO_COLOR still wins)
    pub color: bool,
    /// Levels shown by `tree` before the rest collapses into one line
    pub max_depth: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            color: true,
            max_depth: DEFAULT_RENDER_DEPTH,
        }
    }
}

/// Unified configuration for bintree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    pub codec: CodecSettings,
    pub render: RenderSettings,
}

/// Get the XDG config directory for bintree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "bintree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("bintree.toml"))
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// `config_file` must exist when given; the global file is optional.
    #[instrument(level = "debug")]
    pub fn load(config_file: Option<&Path>) -> Result<Self, SettingsError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("render.color", defaults.render.color)
            .map_err(config_err)?
            .set_default("render.max_depth", defaults.render.max_depth as u64)
            .map_err(config_err)?;

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("Using global config {}", global_path.display());
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        if let Some(path) = config_file {
            debug!("Using config file {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("BINTREE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        config.try_deserialize().map_err(config_err)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        toml::to_string_pretty(self).map_err(|e| SettingsError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# bintree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/bintree/bintree.toml
#   File:   bintree --config <FILE>
#   Env:    BINTREE_* environment variables, e.g. BINTREE_CODEC__MAX_NODES=1000

[codec]
# Reject tree files describing more nodes than this
# max_nodes = 1000000

[render]
# Colorize output
# color = true
# Levels shown by `bintree tree`; deeper levels collapse into one line
# max_depth = 64
"#
        .to_string()
    }
}

fn config_err(e: config::ConfigError) -> SettingsError {
    SettingsError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_default_settings_when_created_then_codec_is_unlimited() {
        let settings = Settings::default();
        assert_eq!(settings.codec.max_nodes, None);
        assert!(settings.render.color);
        assert_eq!(settings.render.max_depth, DEFAULT_RENDER_DEPTH);
    }

    #[test]
    fn given_settings_when_serialized_then_toml_round_trips() {
        let settings = Settings {
            codec: CodecSettings {
                max_nodes: Some(42),
            },
            render: RenderSettings {
                color: false,
                max_depth: 8,
            },
        };
        let text = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn given_template_when_parsed_then_yields_defaults() {
        let parsed: Settings = toml::from_str(&Settings::template()).unwrap();
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn given_global_config_path_when_resolved_then_ends_with_file_name() {
        if let Some(path) = global_config_path() {
            assert!(path.ends_with("bintree.toml"));
        }
    }
}
