//! Site building orchestration.
//!
//! Build pipeline phases:
//! - **Load** - `started` hooks, config, themes, templates, content
//! - **Pre Hooks** - User-defined pre-build commands
//! - **Collect** - Output contexts for every content item, through `pre_build` hooks
//! - **Render** - Parallel rendering into one output collection
//! - **Write** - Sequential writes, reverse dependency map, `post_build` hooks
//! - **Post Hooks** - User-defined post-build commands
//! - **Finalize** - `finished` hooks, dependency export, logging

use crate::{
    cli::BuildArgs,
    content::ContentPath,
    context::OutputContext,
    hooks::{self, HookRegistry},
    log,
    logger::ProgressLine,
    output::{DependencyMap, OutputCollection},
    site::{Site, SiteOptions},
};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Build the site at `root`.
///
/// Pipeline: load -> pre-hooks -> collect -> render -> write -> post-hooks -> finalize
pub fn build_site(root: &Path, args: &BuildArgs, hooks: HookRegistry) -> Result<DependencyMap> {
    hooks.run_started();

    let site = Site::load(
        root,
        SiteOptions {
            props: args.props.clone(),
            output: args.output.clone(),
            hooks,
            themes: Vec::new(),
        },
    )?;

    if args.clean {
        clean_output(&site.outputdir)?;
    }

    hooks::run_pre_hooks(&site.config)?;

    let contexts = collect_contexts(&site)?;
    let progress = create_progress(&contexts, args.quiet);
    let collection = render_all(&site, contexts, args.jobs, progress.as_ref())?;
    if let Some(p) = progress {
        p.finish();
    }

    let deps = write_outputs(&site, &collection)?;

    hooks::run_post_hooks(&site.config)?;
    site.hooks.run_finished(&site);

    if let Some(path) = &args.deps {
        let json = deps.to_json().context("failed to serialize dependency map")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    }

    if !args.quiet {
        log_build_result(&site, collection.len());
    }

    Ok(deps)
}

fn clean_output(output: &Path) -> Result<()> {
    if output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("failed to clear output directory: {}", output.display()))?;
    }
    Ok(())
}

/// Every content item's contexts, filtered through `pre_build` hooks.
fn collect_contexts(site: &Arc<Site>) -> Result<Vec<OutputContext>> {
    let mut contexts = Vec::new();
    for content in site.files.iter() {
        let built = content
            .output_contexts(site)
            .with_context(|| format!("failed to prepare `{}`", content.src.contentpath()))?;
        contexts.extend(built.into_iter().filter_map(|ctx| site.hooks.run_pre_build(ctx)));
    }
    crate::debug!("build"; "{} output contexts", contexts.len());
    Ok(contexts)
}

/// Create progress display if not quiet
fn create_progress(contexts: &[OutputContext], quiet: bool) -> Option<ProgressLine> {
    if quiet {
        return None;
    }
    let count = |tag: &str| contexts.iter().filter(|ctx| ctx.kind().tag() == tag).count();
    Some(ProgressLine::new(&[
        ("article", count("article")),
        ("index", count("index")),
        ("binary", count("binary")),
    ]))
}

/// Render contexts in parallel. The first failure stops the build.
fn render_all(
    site: &Site,
    contexts: Vec<OutputContext>,
    jobs: Option<usize>,
    progress: Option<&ProgressLine>,
) -> Result<OutputCollection> {
    let jobs = jobs.unwrap_or(site.config.build.jobs);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("failed to start render threads")?;

    let collection = Mutex::new(OutputCollection::new());
    pool.install(|| {
        contexts.into_par_iter().try_for_each(|ctx| -> Result<()> {
            let tag = ctx.kind().tag();
            let path = ctx.contentpath().clone();
            let outputs = ctx
                .render()
                .with_context(|| format!("failed to build `{path}`"))?;
            collection.lock().extend(outputs);
            if let Some(p) = progress {
                p.inc(tag);
            }
            Ok(())
        })
    })?;

    Ok(collection.into_inner())
}

/// Write the collection, then run `post_build` hooks once per content item
/// with the files its contexts produced.
fn write_outputs(site: &Site, collection: &OutputCollection) -> Result<DependencyMap> {
    let mut written: BTreeMap<ContentPath, Vec<PathBuf>> = BTreeMap::new();
    let deps = collection.write_with(&site.outputdir, |output, path| {
        written
            .entry(output.context().contentpath().clone())
            .or_default()
            .push(path.to_path_buf());
    })?;

    for (contentpath, files) in &written {
        site.hooks.run_post_build(contentpath, files);
    }
    Ok(deps)
}

fn log_build_result(site: &Site, count: usize) {
    if count == 0 {
        log!("warn"; "output is empty, check {}", site.config.root_relative(&site.config.build.contents).display());
    } else {
        log!("build"; "{} files written to {}", count, site.outputdir.display());
    }
}

// ============================================================================
// Tests
// ============================================================================
