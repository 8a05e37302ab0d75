//! svgtxt2path command-line entry point.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use svgtxt2path::{
    cli::{Cli, Commands, convert::convert_file, doctor::run_doctor},
    config::Config,
    logger,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = Config::load(&cli)?;

    match &cli.command {
        Some(Commands::Doctor) => run_doctor(&config).await,
        None => convert_file(&cli, &config).await,
    }
}
