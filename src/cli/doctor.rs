//! `doctor` command: report which Inkscape would be used.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;

use crate::{
    config::Config,
    inkscape,
    utils::plural_count,
};

/// List discovered installations and probe the selected one.
pub async fn run_doctor(config: &Config) -> Result<()> {
    if let Some(path) = &config.config_path {
        println!("config: {}", path.display());
    }

    let found = inkscape::find_binaries();
    println!("{} on PATH:", plural_count(found.len(), "Inkscape installation"));
    for bin in &found {
        println!("  {}", bin.display());
    }

    let selected = selected_binary(config.inkscape.bin.clone(), &found)
        .context("no Inkscape installation found on PATH (set --inkscape-bin or [inkscape] bin)")?;
    println!("selected: {}", selected.display().cyan());

    let version = inkscape::version(Some(selected.as_path()))
        .await
        .with_context(|| format!("version probe of `{}` failed", selected.display()))?;
    println!("version: {}", version.green());
    Ok(())
}

fn selected_binary(explicit: Option<PathBuf>, found: &[PathBuf]) -> Option<PathBuf> {
    explicit.or_else(|| found.first().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_binary_selected_first() {
        let found = vec![PathBuf::from("/usr/bin/inkscape")];
        assert_eq!(
            selected_binary(Some("/opt/inkscape".into()), &found),
            Some(PathBuf::from("/opt/inkscape"))
        );
        assert_eq!(
            selected_binary(None, &found),
            Some(PathBuf::from("/usr/bin/inkscape"))
        );
        assert_eq!(selected_binary(None, &[]), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_doctor_probes_explicit_binary() {
        use std::{fs, os::unix::fs::PermissionsExt};

        let dir = tempfile::TempDir::new().unwrap();
        let bin = dir.path().join("inkscape");
        fs::write(&bin, "#!/bin/sh\necho 'Inkscape 1.3'\n").unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = Config::default();
        config.inkscape.bin = Some(bin);
        run_doctor(&config).await.unwrap();

        config.inkscape.bin = Some(dir.path().join("missing"));
        assert!(run_doctor(&config).await.is_err());
    }
}
