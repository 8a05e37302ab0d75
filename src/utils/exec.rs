//! External command execution.
//!
//! Provides a Builder-based API for running a command with stdin piping and
//! full stdout/stderr capture.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! let svg = Cmd::new("inkscape")
//!     .args(["--pipe", "--export-filename", "-"])
//!     .stdin(svg_data)
//!     .filter(&INKSCAPE_FILTER)
//!     .run()
//!     .await?;
//! ```

use crate::debug;
use regex::Regex;
use std::{
    borrow::Cow,
    ffi::{OsStr, OsString},
    io,
    process::{ExitStatus, Stdio},
    sync::OnceLock,
};
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    process::Command,
};

// ============================================================================
// Errors
// ============================================================================

/// Failure of a single command execution.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The operating system refused to start the process.
    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Reading or writing one of the process pipes failed.
    #[error("I/O error while talking to `{program}`")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process ran and exited with a non-zero status.
    #[error("`{program}` exited with {}: {stderr}", describe_code(.code))]
    Failed {
        program: String,
        /// `None` when the process was terminated by a signal.
        code: Option<i32>,
        /// Everything the process wrote to stderr, lossily decoded.
        stderr: String,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    stdin_data: Vec<u8>,
    filter: Option<&'static FilterRule>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Add a single argument, passed through as is (empty strings included).
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Add multiple arguments, in order and unchanged.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_owned()));
        self
    }

    /// Set stdin data to pipe to the process.
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = data.as_ref().to_vec();
        self
    }

    /// Set output filter for logging stderr of successful runs.
    pub fn filter(mut self, filter: &'static FilterRule) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Get the program name for error messages.
    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Execute the command and return its stdout.
    ///
    /// stdin is written in one go and then closed, while stdout and stderr
    /// are drained concurrently. The returned future completes once the
    /// process has exited. Dropping it kills the process.
    pub async fn run(self) -> Result<Vec<u8>, ExecError> {
        let name = self.program_name();
        let filter = self.filter.unwrap_or(&EMPTY_FILTER);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: name.clone(),
                source,
            })?;

        let io_err = |source: io::Error| ExecError::Io {
            program: name.clone(),
            source,
        };
        let missing = |pipe: &str| io::Error::other(format!("{pipe} was not captured"));

        let mut stdin = child.stdin.take().ok_or_else(|| io_err(missing("stdin")))?;
        let stdout = child.stdout.take().ok_or_else(|| io_err(missing("stdout")))?;
        let stderr = child.stderr.take().ok_or_else(|| io_err(missing("stderr")))?;

        let input = self.stdin_data;
        let write = async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
            // stdin dropped here, the child sees EOF
        };

        let (written, out, err) = tokio::join!(write, read_all(stdout), read_all(stderr));
        let status = child.wait().await.map_err(io_err)?;
        let err = err.map_err(io_err)?;

        if !status.success() {
            return Err(failure(&name, status, &err));
        }

        match written {
            // The child may exit without reading all of its input
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                debug!(&name; "stdin closed early by the process");
            }
            other => other.map_err(io_err)?,
        }

        filter.log(&name, String::from_utf8_lossy(&err).trim());
        out.map_err(io_err)
    }
}

/// Drain a pipe until it closes.
async fn read_all<R: AsyncRead + Unpin>(mut pipe: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf).await?;
    Ok(buf)
}

fn failure(name: &str, status: ExitStatus, stderr: &[u8]) -> ExecError {
    ExecError::Failed {
        program: name.to_string(),
        code: status.code(),
        stderr: String::from_utf8_lossy(stderr).into_owned(),
    }
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Filter rule for command output logging.
///
/// Used to reduce noise by skipping known warnings or irrelevant messages.
pub struct FilterRule {
    /// Prefixes to skip when logging output.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    /// Create a new filter rule.
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    /// Check if a line should be skipped.
    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Lines of `output` that pass the filter, ANSI escapes removed.
    fn kept_lines(&self, output: &str) -> Vec<String> {
        output
            .lines()
            .map(strip_ansi)
            .filter(|line| !self.should_skip(line.trim()))
            .map(Cow::into_owned)
            .collect()
    }

    /// Log output lines that pass the filter (verbose mode only).
    pub fn log(&self, name: &str, output: &str) {
        let lines = self.kept_lines(output);
        if !lines.is_empty() {
            debug!(name; "{}", lines.join("\n"));
        }
    }
}

/// Empty filter (no skipping).
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

// ============================================================================
// Helpers
// ============================================================================

/// Strip ANSI escape codes from string.
fn strip_ansi(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    re.replace_all(s, "")
}

// ============================================================================
// Tests
// ============================================================================
