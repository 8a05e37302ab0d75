//! Inkscape subprocess driver.
//!
//! # Modules
//!
//! - [`resolve`]: Discovery of Inkscape installations on `PATH`
//!
//! Every call resolves the executable anew when none is given explicitly,
//! then runs it once through [`Cmd`] with the SVG bytes on stdin.
//!
//! ```text
//!  SVG bytes ──► stdin ┌──────────┐ stdout ──► SVG bytes
//!                      │ inkscape │
//!                      └──────────┘ stderr ──► error text (non-zero exit)
//! ```

pub mod resolve;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::{
    debug,
    utils::exec::{Cmd, ExecError, FilterRule},
};

pub use resolve::{TOOL_NAME, find_binaries, find_binaries_in};

/// Import from stdin and export the document unchanged to stdout.
pub const SANITIZE_ARGS: &[&str] = &["--pipe", "--export-filename", "-"];

/// Like [`SANITIZE_ARGS`], converting text objects to paths first.
pub const EXPORT_TEXT_TO_PATH_ARGS: &[&str] =
    &["--pipe", "--export-text-to-path", "--export-filename", "-"];

/// Version query, run without input.
pub const VERSION_ARGS: &[&str] = &["--version"];

/// GTK and GLib chatter Inkscape prints on stderr even when it succeeds.
static INKSCAPE_FILTER: FilterRule =
    FilterRule::new(&["(inkscape:", "(org.inkscape.Inkscape:", "Gtk-", "GLib-", "Fontconfig"]);

/// Inkscape invocation errors.
#[derive(Debug, Error)]
pub enum InkscapeError {
    /// No installation was found and no executable was given explicitly.
    #[error("no Inkscape installation found on PATH (pass --inkscape-bin to point at one)")]
    NotFound,

    /// The process could not be started, or exited with a non-zero status.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl InkscapeError {
    /// Exit code of a failed run, if the process ran and returned one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exec(ExecError::Failed { code, .. }) => *code,
            _ => None,
        }
    }

    /// Diagnostic output of a failed run.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Exec(ExecError::Failed { stderr, .. }) => Some(stderr),
            _ => None,
        }
    }
}

/// Pick the executable: the explicit one, else the first discovered one.
pub fn select_binary(explicit: Option<&Path>) -> Result<PathBuf, InkscapeError> {
    match explicit {
        Some(bin) => Ok(bin.to_path_buf()),
        None => first_candidate(find_binaries()),
    }
}

fn first_candidate(candidates: Vec<PathBuf>) -> Result<PathBuf, InkscapeError> {
    candidates.into_iter().next().ok_or(InkscapeError::NotFound)
}

/// Run Inkscape once with `args`, feeding `input` on stdin.
///
/// Returns everything Inkscape wrote to stdout.
pub async fn invoke<I, S>(
    args: I,
    input: &[u8],
    bin: Option<&Path>,
) -> Result<Vec<u8>, InkscapeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let bin = select_binary(bin)?;
    debug!("inkscape"; "running {} ({} bytes in)", bin.display(), input.len());

    let output = Cmd::new(&bin)
        .args(args)
        .stdin(input)
        .filter(&INKSCAPE_FILTER)
        .run()
        .await?;

    debug!("inkscape"; "{} bytes out", output.len());
    Ok(output)
}

/// Query the version string of an installation.
pub async fn version(bin: Option<&Path>) -> Result<String, InkscapeError> {
    let output = invoke(VERSION_ARGS, &[], bin).await?;
    Ok(String::from_utf8_lossy(&output).trim().to_string())
}
