//! Configuration management for `svgtxt2path.toml`.
//!
//! # Sections
//!
//! | Section      | Purpose                                     |
//! |--------------|---------------------------------------------|
//! | `[inkscape]` | Executable to run (`bin`)                   |
//! | `[convert]`  | Conversion behaviour (`strict`)             |
//!
//! The file is optional. Command-line flags override its values.

mod error;
mod section;
mod util;

pub use error::ConfigError;
pub use section::{ConvertConfig, InkscapeConfig};
pub use util::{find_config_file, find_config_file_from, is_bare_command, resolve_bin};

use crate::{cli::Cli, log, svg::ConvertOptions};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file searched for when none is given explicitly.
pub const CONFIG_FILE: &str = "svgtxt2path.toml";

/// Root configuration structure representing svgtxt2path.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Absolute path to the loaded config file, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Inkscape settings
    #[serde(default)]
    pub inkscape: InkscapeConfig,

    /// Conversion settings
    #[serde(default)]
    pub convert: ConvertConfig,
}

impl Config {
    /// Load configuration for a command-line run.
    ///
    /// An explicit `--config` file must exist. Otherwise `svgtxt2path.toml` is
    /// searched upward from cwd and defaults are used when there is none.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_path(path)?,
            None => match find_config_file(Path::new(CONFIG_FILE)) {
                Some(path) => Self::from_path(&path)?,
                None => Self::default(),
            },
        };

        config.apply_cli(cli);

        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        config.resolve_bin(&cwd, None)?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path with unknown field detection.
    ///
    /// Relative executable paths are taken relative to the file's directory.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            log!("warning"; "ignoring unknown fields in {}: {}", path.display(), ignored.join(", "));
        }

        let root = path.parent().unwrap_or(Path::new(""));
        if let Some(bin) = &mut config.inkscape.bin
            && !is_bare_command(bin)
        {
            *bin = root.join(&*bin);
        }

        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Apply command-line overrides.
    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(bin) = &cli.inkscape_bin {
            self.inkscape.bin = Some(bin.clone());
        }
        if cli.strict {
            self.convert.strict = true;
        }
    }

    /// Turn the configured executable into a usable path.
    ///
    /// Bare command names must be found on `PATH` (or `path_var` if given).
    fn resolve_bin(&mut self, cwd: &Path, path_var: Option<&std::ffi::OsStr>) -> Result<(), ConfigError> {
        if let Some(bin) = &self.inkscape.bin {
            let resolved = resolve_bin(bin, cwd, path_var)?;
            self.inkscape.bin = Some(resolved);
        }
        Ok(())
    }

    /// Options for a conversion run.
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            inkscape: self.inkscape.bin.clone(),
            strict: self.convert.strict,
        }
    }
}

// ============================================================================
// tests
// ============================================================================
