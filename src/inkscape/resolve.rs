//! Inkscape installation discovery.
//!
//! Walks the search path the same way a shell would, but returns every
//! installation instead of the first one so callers can report them all.
//! Nothing is cached: the environment may change between calls.

use rustc_hash::FxHashSet;
use std::{
    env,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};

/// Executable name looked up in every search-path directory.
pub const TOOL_NAME: &str = "inkscape";

/// Find Inkscape installations on the process `PATH`.
///
/// On Windows every extension listed in `PATHEXT` is tried.
pub fn find_binaries() -> Vec<PathBuf> {
    let path = env::var_os("PATH");
    let pathext = env::var_os("PATHEXT");
    find_binaries_in(path.as_deref(), pathext.as_deref())
}

/// Find Inkscape installations in an explicit search path.
///
/// `pathext` is only consulted on Windows.
pub fn find_binaries_in(path: Option<&OsStr>, pathext: Option<&OsStr>) -> Vec<PathBuf> {
    let dirs = split_unique(path);
    let exts = extensions(pathext);
    search(TOOL_NAME, &dirs, &exts)
}

#[cfg(windows)]
fn extensions(pathext: Option<&OsStr>) -> Vec<OsString> {
    pathext
        .map(|list| env::split_paths(list).map(PathBuf::into_os_string).collect())
        .unwrap_or_default()
}

#[cfg(not(windows))]
fn extensions(_pathext: Option<&OsStr>) -> Vec<OsString> {
    vec![OsString::new()]
}

/// Split a search path, dropping empty and repeated entries.
fn split_unique(path: Option<&OsStr>) -> Vec<PathBuf> {
    let Some(path) = path else {
        return Vec::new();
    };

    let mut seen = FxHashSet::default();
    env::split_paths(path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .filter(|dir| seen.insert(dir.clone()))
        .collect()
}

/// Check `<dir>/<name><ext>` for every directory and extension, in that order.
fn search(name: &str, dirs: &[PathBuf], exts: &[OsString]) -> Vec<PathBuf> {
    let mut seen = FxHashSet::default();
    let mut found = Vec::new();

    for dir in dirs {
        for ext in exts {
            let mut file_name = OsString::from(name);
            file_name.push(ext);
            let candidate = dir.join(file_name);

            if is_regular_file(&candidate) && seen.insert(candidate.clone()) {
                found.push(candidate);
            }
        }
    }

    found
}

/// Follows symlinks, so a dangling link is rejected.
fn is_regular_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}
