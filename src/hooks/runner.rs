//! Command hook execution.
//!
//! Provides environment variable building and command execution for
//! `[[build.hooks.pre]]` / `[[build.hooks.post]]`.

use crate::config::{HookConfig, SiteConfig};
use anyhow::{Context, Result, bail};
use rustc_hash::FxHashMap;
use std::process::Command;

// ============================================================================
// Environment Variables
// ============================================================================

/// Build `$QUIRE_*` environment variables for hook execution
fn build_quire_vars(config: &SiteConfig) -> FxHashMap<String, String> {
    let mut vars = FxHashMap::default();
    vars.insert(
        "QUIRE_OUTPUT_DIR".into(),
        config.build.output.display().to_string(),
    );
    vars.insert("QUIRE_ROOT".into(), config.root.display().to_string());
    vars
}

// ============================================================================
// Command Argument Resolution
// ============================================================================

/// Replace `$QUIRE_XXX` in each argument with its value from `vars`
fn resolve_args(args: &[String], vars: &FxHashMap<String, String>) -> Vec<String> {
    args.iter()
        .map(|arg| {
            let mut result = arg.clone();
            for (key, value) in vars {
                result = result.replace(&format!("${key}"), value);
            }
            result
        })
        .collect()
}

// ============================================================================
// Hook Execution
// ============================================================================

/// Execute a single hook in the site root.
///
/// The `phase` parameter is used for logging (e.g., "pre" or "post")
fn run_hook(hook: &HookConfig, config: &SiteConfig, phase: &str) -> Result<()> {
    if !hook.enable || hook.command.is_empty() {
        return Ok(());
    }

    let vars = build_quire_vars(config);
    let resolved = resolve_args(&hook.command, &vars);

    if !hook.quiet {
        crate::log!(phase; "`{}` running", hook.display_name());
    }

    let output = Command::new(&resolved[0])
        .args(&resolved[1..])
        .current_dir(&config.root)
        .envs(&vars)
        .output()
        .with_context(|| format!("failed to run {} hook `{}`", phase, hook.display_name()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "{} hook `{}` failed ({}): {}",
            phase,
            hook.display_name(),
            output.status,
            stderr.trim()
        );
    }

    if !hook.quiet {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if !stdout.is_empty() {
            println!("{stdout}");
        }
    }

    Ok(())
}

/// Execute all pre hooks
pub fn run_pre_hooks(config: &SiteConfig) -> Result<()> {
    for hook in &config.build.hooks.pre {
        run_hook(hook, config, "pre")?;
    }
    Ok(())
}

/// Execute all post hooks
pub fn run_post_hooks(config: &SiteConfig) -> Result<()> {
    for hook in &config.build.hooks.post {
        run_hook(hook, config, "post")?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_args_simple() {
        let mut vars = FxHashMap::default();
        vars.insert("QUIRE_OUTPUT_DIR".into(), "/path/to/output".into());
        vars.insert("QUIRE_ROOT".into(), "/path/to/root".into());

        let args = vec![
            "pagefind".into(),
            "--site".into(),
            "$QUIRE_OUTPUT_DIR".into(),
            "$QUIRE_ROOT/index".into(),
        ];

        let resolved = resolve_args(&args, &vars);
        assert_eq!(resolved[0], "pagefind");
        assert_eq!(resolved[2], "/path/to/output");
        assert_eq!(resolved[3], "/path/to/root/index");
    }

    #[test]
    fn test_resolve_args_no_vars() {
        let vars = FxHashMap::default();
        let args = vec!["echo".into(), "hello".into()];
        assert_eq!(resolve_args(&args, &vars), args);
    }

    #[test]
    fn test_build_quire_vars() {
        let mut config = SiteConfig::default();
        config.root = PathBuf::from("/site");
        config.build.output = PathBuf::from("/site/output");

        let vars = build_quire_vars(&config);
        assert_eq!(vars["QUIRE_ROOT"], "/site");
        assert_eq!(vars["QUIRE_OUTPUT_DIR"], "/site/output");
    }

    #[test]
    fn test_disabled_and_empty_hooks_skip() {
        let config = SiteConfig::default();
        let empty = HookConfig::default();
        assert!(run_hook(&empty, &config, "pre").is_ok());

        let disabled = HookConfig {
            enable: false,
            command: vec!["definitely-not-a-command".into()],
            ..HookConfig::default()
        };
        assert!(run_hook(&disabled, &config, "pre").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_hook_with_env() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.root = dir.path().to_path_buf();
        config.build.output = dir.path().join("out");

        let hook = HookConfig {
            command: vec![
                "sh".into(),
                "-c".into(),
                "echo \"$QUIRE_OUTPUT_DIR\" > marker.txt".into(),
            ],
            ..HookConfig::default()
        };
        run_hook(&hook, &config, "pre").unwrap();

        let marker = std::fs::read_to_string(dir.path().join("marker.txt")).unwrap();
        assert_eq!(marker.trim(), dir.path().join("out").display().to_string());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_hook_is_error() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.root = dir.path().to_path_buf();

        let hook = HookConfig {
            command: vec!["sh".into(), "-c".into(), "exit 3".into()],
            ..HookConfig::default()
        };
        assert!(run_hook(&hook, &config, "post").is_err());
    }
}
