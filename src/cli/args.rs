//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Convert SVG text to paths with Inkscape, keeping the text as an invisible overlay
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Input SVG file (default: stdin)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub input: Option<PathBuf>,

    /// Output SVG file (default: stdout)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Inkscape executable, as a path or a command name on PATH
    #[arg(long, global = true, value_hint = clap::ValueHint::ExecutablePath)]
    pub inkscape_bin: Option<PathBuf>,

    /// Config file path (default: svgtxt2path.toml, searched upward)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Fail if any text element cannot be converted
    #[arg(long)]
    pub strict: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List Inkscape installations and check the selected one runs
    Doctor,
}

impl Cli {
    pub const fn is_doctor(&self) -> bool {
        matches!(self.command, Some(Commands::Doctor))
    }
}
