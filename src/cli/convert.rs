//! Default command: convert one SVG document.

use anyhow::{Context, Result};
use std::{fs, path::Path};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::Cli;
use crate::{
    config::Config,
    log,
    svg::{Document, convert_with_report},
    utils::plural_count,
};

/// Read the input, convert it and write the result.
pub async fn convert_file(cli: &Cli, config: &Config) -> Result<()> {
    let input = read_input(cli.input.as_deref()).await?;
    let source = source_name(cli.input.as_deref());

    let svg = Document::from_bytes(&input).with_context(|| format!("Failed to parse {source}"))?;
    let (document, report) = convert_with_report(&svg, &config.convert_options())
        .await
        .with_context(|| format!("Failed to convert {source}"))?;

    if report.skipped.is_empty() {
        log!("convert"; "{} converted", plural_count(report.converted, "text element"));
    } else {
        log!(
            "convert";
            "{} converted, {} left as text",
            plural_count(report.converted, "text element"),
            report.skipped.len()
        );
    }

    write_output(cli.output.as_deref(), &document.to_bytes()).await
}

fn source_name(input: Option<&Path>) -> String {
    input.map_or_else(|| "stdin".to_string(), |path| format!("`{}`", path.display()))
}

async fn read_input(input: Option<&Path>) -> Result<Vec<u8>> {
    match input {
        Some(path) => {
            fs::read(path).with_context(|| format!("Failed to read `{}`", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

async fn write_output(output: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, bytes).with_context(|| format!("Failed to write `{}`", path.display()))
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(bytes).await.context("Failed to write stdout")?;
            stdout.flush().await.context("Failed to write stdout")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_source_name() {
        assert_eq!(source_name(None), "stdin");
        assert_eq!(source_name(Some(Path::new("a.svg"))), "`a.svg`");
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.svg");
        let output = dir.path().join("out.svg");
        fs::write(&input, "<svg/>").unwrap();

        let bytes = read_input(Some(input.as_path())).await.unwrap();
        write_output(Some(output.as_path()), &bytes).await.unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"<svg/>");
    }

    #[tokio::test]
    async fn test_missing_input_names_file() {
        let missing = PathBuf::from("/nonexistent/in.svg");
        let err = read_input(Some(missing.as_path())).await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/in.svg"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_convert_file_end_to_end() {
        use clap::Parser;
        use std::{ffi::OsStr, os::unix::fs::PermissionsExt};

        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("inkscape");
        fs::write(
            &bin,
            concat!(
                "#!/bin/sh\n",
                "case \" $* \" in\n",
                "  *\" --export-text-to-path \"*) cat >/dev/null; printf '<svg><path id=\"t\" d=\"M0 0\"/></svg>' ;;\n",
                "  *) cat ;;\n",
                "esac\n"
            ),
        )
        .unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();

        let input = dir.path().join("in.svg");
        let output = dir.path().join("out.svg");
        fs::write(&input, r#"<svg><text id="t">T</text></svg>"#).unwrap();

        let cli = Cli::parse_from([
            OsStr::new("svgtxt2path"),
            OsStr::new("-i"),
            input.as_os_str(),
            OsStr::new("-o"),
            output.as_os_str(),
        ]);
        let config = Config {
            inkscape: crate::config::InkscapeConfig { bin: Some(bin) },
            ..Config::default()
        };

        convert_file(&cli, &config).await.unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            r#"<svg><g><text id="t" style="fill-opacity: 0;">T</text><path id="t" d="M0 0"/></g></svg>"#
        );
    }
}
