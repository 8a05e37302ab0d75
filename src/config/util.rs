//! Configuration utility functions.

use std::{
    ffi::OsStr,
    path::{Component, Path, PathBuf},
};

use super::ConfigError;

/// Find config file by searching upward from current directory
///
/// Returns the absolute path to the config file if found
///
/// # Example
/// ```text
/// /home/user/drawings/logos/      ← cwd
/// /home/user/svgtxt2path.toml     ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_file_from(&cwd, config_name)
}

/// Like [`find_config_file`], starting at `start` instead of the cwd.
pub fn find_config_file_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.is_file().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

/// Whether `bin` is a bare command name such as `inkscape`, to be looked up on `PATH`.
pub fn is_bare_command(bin: &Path) -> bool {
    let mut components = bin.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Resolve an executable setting to a path.
///
/// Bare names are searched in `path_var` (the process `PATH` when `None`),
/// relative paths are joined onto `base`, absolute paths are kept.
pub fn resolve_bin(bin: &Path, base: &Path, path_var: Option<&OsStr>) -> Result<PathBuf, ConfigError> {
    if !is_bare_command(bin) {
        return Ok(base.join(bin));
    }

    let found = match path_var {
        Some(paths) => which::which_in(bin, Some(paths), base),
        None => which::which(bin),
    };
    found.map_err(|_| {
        ConfigError::Validation(format!(
            "executable `{}` not found on PATH",
            bin.display()
        ))
    })
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_walks_upward() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("a/svgtxt2path.toml"), "").unwrap();

        let found = find_config_file_from(&nested, Path::new("svgtxt2path.toml")).unwrap();
        assert_eq!(found, dir.path().join("a/svgtxt2path.toml"));
    }

    #[test]
    fn test_find_config_prefers_nearest() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("svgtxt2path.toml"), "").unwrap();
        fs::write(nested.join("svgtxt2path.toml"), "").unwrap();

        let found = find_config_file_from(&nested, Path::new("svgtxt2path.toml")).unwrap();
        assert_eq!(found, nested.join("svgtxt2path.toml"));
    }

    #[test]
    fn test_find_config_ignores_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("svgtxt2path.toml")).unwrap();

        let found = find_config_file_from(dir.path(), Path::new("svgtxt2path.toml"));
        assert!(found.is_none_or(|path| !path.starts_with(dir.path())));
    }

    #[test]
    fn test_find_config_absolute() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("custom.toml");

        assert_eq!(find_config_file_from(Path::new("/"), &file), None);
        fs::write(&file, "").unwrap();
        assert_eq!(find_config_file_from(Path::new("/"), &file), Some(file));
    }

    #[test]
    fn test_is_bare_command() {
        assert!(is_bare_command(Path::new("inkscape")));
        assert!(is_bare_command(Path::new("inkscape.exe")));
        assert!(!is_bare_command(Path::new("./inkscape")));
        assert!(!is_bare_command(Path::new("bin/inkscape")));
        assert!(!is_bare_command(Path::new("/usr/bin/inkscape")));
        assert!(!is_bare_command(Path::new("")));
    }

    #[test]
    fn test_resolve_bin_paths() {
        let base = Path::new("/home/user");
        assert_eq!(
            resolve_bin(Path::new("/opt/inkscape"), base, None).unwrap(),
            PathBuf::from("/opt/inkscape")
        );
        assert_eq!(
            resolve_bin(Path::new("tools/inkscape"), base, None).unwrap(),
            PathBuf::from("/home/user/tools/inkscape")
        );
    }

    #[test]
    fn test_resolve_bin_bare_name_not_found() {
        let dir = TempDir::new().unwrap();
        let err = resolve_bin(
            Path::new("inkscape"),
            dir.path(),
            Some(dir.path().as_os_str()),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("`inkscape`")));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_bin_bare_name_found() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("inkscape");
        fs::write(&bin, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();

        let found = resolve_bin(
            Path::new("inkscape"),
            dir.path(),
            Some(dir.path().as_os_str()),
        )
        .unwrap();
        assert_eq!(found, bin);
    }
}
