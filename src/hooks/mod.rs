//! Hook system for build automation.
//!
//! This module provides:
//! - [`HookRegistry`]: in-process callbacks owned by the site, run at fixed
//!   points of loading and building
//! - `runner`: external commands declared in `[[build.hooks.pre/post]]`
//!
//! | Hook            | Runs                                  | Can                       |
//! |-----------------|---------------------------------------|---------------------------|
//! | `started`       | before the site is loaded             |                           |
//! | `initialized`   | config, themes, templates ready       |                           |
//! | `pre_load`      | per source, before reading            | replace or drop the source |
//! | `post_load`     | per source, after reading             | replace the body          |
//! | `load_finished` | content set complete                  |                           |
//! | `pre_build`     | per output context                    | replace or skip it        |
//! | `post_build`    | per context, after its files are written |                        |
//! | `finished`      | after the build                       |                           |

mod runner;

pub use runner::{run_post_hooks, run_pre_hooks};

use std::fmt;
use std::path::PathBuf;

use crate::config::SiteConfig;
use crate::content::{ContentPath, ContentSrc};
use crate::context::OutputContext;
use crate::site::Site;

pub type StartedHook = Box<dyn Fn() + Send + Sync>;
pub type SiteHook = Box<dyn Fn(&Site) + Send + Sync>;
pub type PreLoadHook = Box<dyn Fn(&SiteConfig, ContentSrc, bool) -> Option<ContentSrc> + Send + Sync>;
pub type PostLoadHook =
    Box<dyn Fn(&SiteConfig, &ContentSrc, bool, Option<String>) -> Option<String> + Send + Sync>;
pub type PreBuildHook = Box<dyn Fn(OutputContext) -> Option<OutputContext> + Send + Sync>;
pub type PostBuildHook = Box<dyn Fn(&ContentPath, &[PathBuf]) + Send + Sync>;

/// A callback for one hook point.
pub enum Hook {
    Started(StartedHook),
    Initialized(SiteHook),
    PreLoad(PreLoadHook),
    PostLoad(PostLoadHook),
    LoadFinished(SiteHook),
    PreBuild(PreBuildHook),
    PostBuild(PostBuildHook),
    Finished(SiteHook),
}

/// Registered hooks, run in registration order.
#[derive(Default)]
pub struct HookRegistry {
    started: Vec<StartedHook>,
    initialized: Vec<SiteHook>,
    pre_load: Vec<PreLoadHook>,
    post_load: Vec<PostLoadHook>,
    load_finished: Vec<SiteHook>,
    pre_build: Vec<PreBuildHook>,
    post_build: Vec<PostBuildHook>,
    finished: Vec<SiteHook>,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("started", &self.started.len())
            .field("initialized", &self.initialized.len())
            .field("pre_load", &self.pre_load.len())
            .field("post_load", &self.post_load.len())
            .field("load_finished", &self.load_finished.len())
            .field("pre_build", &self.pre_build.len())
            .field("post_build", &self.post_build.len())
            .field("finished", &self.finished.len())
            .finish()
    }
}

impl HookRegistry {
    pub fn register(&mut self, hook: Hook) {
        match hook {
            Hook::Started(f) => self.started.push(f),
            Hook::Initialized(f) => self.initialized.push(f),
            Hook::PreLoad(f) => self.pre_load.push(f),
            Hook::PostLoad(f) => self.post_load.push(f),
            Hook::LoadFinished(f) => self.load_finished.push(f),
            Hook::PreBuild(f) => self.pre_build.push(f),
            Hook::PostBuild(f) => self.post_build.push(f),
            Hook::Finished(f) => self.finished.push(f),
        }
    }

    /// Drop every registered hook.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // ========================================================================
    // typed registration
    // ========================================================================

    pub fn on_started(&mut self, f: impl Fn() + Send + Sync + 'static) {
        self.register(Hook::Started(Box::new(f)));
    }

    pub fn on_initialized(&mut self, f: impl Fn(&Site) + Send + Sync + 'static) {
        self.register(Hook::Initialized(Box::new(f)));
    }

    pub fn on_pre_load(
        &mut self,
        f: impl Fn(&SiteConfig, ContentSrc, bool) -> Option<ContentSrc> + Send + Sync + 'static,
    ) {
        self.register(Hook::PreLoad(Box::new(f)));
    }

    pub fn on_post_load(
        &mut self,
        f: impl Fn(&SiteConfig, &ContentSrc, bool, Option<String>) -> Option<String> + Send + Sync + 'static,
    ) {
        self.register(Hook::PostLoad(Box::new(f)));
    }

    pub fn on_load_finished(&mut self, f: impl Fn(&Site) + Send + Sync + 'static) {
        self.register(Hook::LoadFinished(Box::new(f)));
    }

    pub fn on_pre_build(&mut self, f: impl Fn(OutputContext) -> Option<OutputContext> + Send + Sync + 'static) {
        self.register(Hook::PreBuild(Box::new(f)));
    }

    pub fn on_post_build(&mut self, f: impl Fn(&ContentPath, &[PathBuf]) + Send + Sync + 'static) {
        self.register(Hook::PostBuild(Box::new(f)));
    }

    pub fn on_finished(&mut self, f: impl Fn(&Site) + Send + Sync + 'static) {
        self.register(Hook::Finished(Box::new(f)));
    }

    // ========================================================================
    // execution
    // ========================================================================

    pub fn run_started(&self) {
        for hook in &self.started {
            hook();
        }
    }

    pub fn run_initialized(&self, site: &Site) {
        for hook in &self.initialized {
            hook(site);
        }
    }

    /// Thread `src` through the pre-load hooks; `None` once any hook drops it.
    pub fn run_pre_load(&self, config: &SiteConfig, src: ContentSrc, binary: bool) -> Option<ContentSrc> {
        self.pre_load
            .iter()
            .try_fold(src, |src, hook| hook(config, src, binary))
    }

    /// Thread the loaded body through the post-load hooks.
    pub fn run_post_load(
        &self,
        config: &SiteConfig,
        src: &ContentSrc,
        binary: bool,
        body: Option<String>,
    ) -> Option<String> {
        self.post_load
            .iter()
            .fold(body, |body, hook| hook(config, src, binary, body))
    }

    pub fn run_load_finished(&self, site: &Site) {
        for hook in &self.load_finished {
            hook(site);
        }
    }

    /// Thread a context through the pre-build hooks; `None` skips it.
    pub fn run_pre_build(&self, ctx: OutputContext) -> Option<OutputContext> {
        self.pre_build.iter().try_fold(ctx, |ctx, hook| hook(ctx))
    }

    pub fn run_post_build(&self, contentpath: &ContentPath, files: &[PathBuf]) {
        for hook in &self.post_build {
            hook(contentpath, files);
        }
    }

    pub fn run_finished(&self, site: &Site) {
        for hook in &self.finished {
            hook(site);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn src(path: &str) -> ContentSrc {
        ContentSrc::embedded(ContentPath::parse(path).unwrap(), "test", Arc::from(&b""[..]))
    }

    #[test]
    fn test_run_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut hooks = HookRegistry::default();
        for expected in 0..3 {
            let calls = calls.clone();
            hooks.on_started(move || {
                assert_eq!(calls.fetch_add(1, Ordering::SeqCst), expected);
            });
        }
        hooks.run_started();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_pre_load_can_drop() {
        let config = SiteConfig::default();
        let seen = Arc::new(AtomicUsize::new(0));
        let mut hooks = HookRegistry::default();

        hooks.on_pre_load(|_, src, _| (src.contentpath().filename() != "drop.txt").then_some(src));
        let counter = seen.clone();
        hooks.on_pre_load(move |_, src, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(src)
        });

        assert!(hooks.run_pre_load(&config, src("keep.txt"), true).is_some());
        assert!(hooks.run_pre_load(&config, src("drop.txt"), true).is_none());
        // the second hook never sees a dropped source
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_post_load_threads_body() {
        let config = SiteConfig::default();
        let mut hooks = HookRegistry::default();
        hooks.on_post_load(|_, _, _, body| body.map(|b| b + "1"));
        hooks.on_post_load(|_, _, _, body| body.map(|b| b + "2"));

        let body = hooks.run_post_load(&config, &src("a.html"), false, Some("x".into()));
        assert_eq!(body.as_deref(), Some("x12"));
        assert_eq!(hooks.run_post_load(&config, &src("b.bin"), true, None), None);
    }

    #[test]
    fn test_clear() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut hooks = HookRegistry::default();
        let counter = calls.clone();
        hooks.on_post_build(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        hooks.clear();

        hooks.run_post_build(&ContentPath::parse("a").unwrap(), &[]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
