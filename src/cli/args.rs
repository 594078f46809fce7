//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// quire static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Site root, the directory holding quire.toml
    #[arg(short = 'C', long, default_value = ".", value_hint = clap::ValueHint::DirPath)]
    pub root: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the site into the output directory
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}

/// Build command arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Output directory (overrides build.output)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Metadata default for every content item, e.g. `-D lang=fr`
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE", value_parser = parse_prop)]
    pub props: Vec<(String, String)>,

    /// Remove the output directory before building
    #[arg(short, long)]
    pub clean: bool,

    /// Render threads (overrides build.jobs, 0 = one per core)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Write the reverse dependency map as JSON
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub deps: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Hide progress and summary output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Parse `KEY=VALUE`; the value may be empty, the key may not.
fn parse_prop(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{s}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_args(argv: &[&str]) -> BuildArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Build { build_args } => build_args,
        }
    }

    #[test]
    fn test_build_flags() {
        let args = build_args(&[
            "quire", "build", "-o", "public", "-D", "lang=fr", "--define", "n=3", "--clean", "-j", "2",
            "--deps", "deps.json",
        ]);

        assert_eq!(args.output, Some(PathBuf::from("public")));
        assert_eq!(
            args.props,
            [("lang".to_string(), "fr".to_string()), ("n".to_string(), "3".to_string())]
        );
        assert!(args.clean);
        assert_eq!(args.jobs, Some(2));
        assert_eq!(args.deps, Some(PathBuf::from("deps.json")));
    }

    #[test]
    fn test_root_and_color() {
        let cli = Cli::try_parse_from(["quire", "-C", "site", "b", "--color", "never"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("site"));
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn test_prop_parsing() {
        assert_eq!(parse_prop("a=b=c"), Ok(("a".into(), "b=c".into())));
        assert_eq!(parse_prop("empty="), Ok(("empty".into(), String::new())));
        assert!(parse_prop("novalue").is_err());
        assert!(parse_prop("=x").is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["quire", "build", "-v", "-q"]).is_err());
    }
}
