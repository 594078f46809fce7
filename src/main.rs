//! quire - a static site generator rendering template-driven content.

#![allow(dead_code)]

mod cli;
mod config;
mod content;
mod context;
mod hooks;
mod logger;
mod output;
mod site;
mod template;
mod theme;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands, build::build_site};
use hooks::HookRegistry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    match &cli.command {
        Commands::Build { build_args } => {
            logger::set_verbose(build_args.verbose);
            build_site(&cli.root, build_args, HookRegistry::default()).map(|_| ())
        }
    }
}
