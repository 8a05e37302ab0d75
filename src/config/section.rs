//! Configuration sections.
//!
//! ```toml
//! [inkscape]
//! bin = "inkscape"
//!
//! [convert]
//! strict = false
//! ```

use serde::Deserialize;
use std::path::PathBuf;

/// `[inkscape]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InkscapeConfig {
    /// Executable path or bare command name. Discovered on `PATH` when unset.
    pub bin: Option<PathBuf>,
}

/// `[convert]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Fail when a text element cannot be paired with a path.
    pub strict: bool,
}
