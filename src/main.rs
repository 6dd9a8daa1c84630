//! Folio - live preview for markdown, LaTeX, Typst and diagram pages.

#![allow(dead_code)]

mod actor;
mod artifact;
mod cli;
mod compile;
mod config;
mod editor;
mod lint;
mod logger;
mod page;
mod render;
mod store;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::FolioConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = FolioConfig::load(&cli)?;

    match &cli.command {
        Commands::Lint { page } => cli::lint::lint_page(page),
        Commands::Render { page, output } => cli::render::render_page(page, output.as_deref(), &config),
        Commands::Watch { page, .. } => cli::watch::watch_page(page, &config),
    }
}
