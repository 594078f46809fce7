//! Write-time aggregation of outputs.
//!
//! Outputs are deduplicated by destination; the last one added wins. Writing
//! inverts each producing context's `depends` set into a [`DependencyMap`]:
//! "if this content changes, these files are stale".

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use super::{Output, OutputError, output_root};
use crate::content::ContentPath;
use crate::utils::path::to_slash;

/// A written file, as an absolute path and relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct OutputLocation {
    pub absolute: PathBuf,
    pub relative: String,
}

/// Reverse dependency map: content -> output files built from it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DependencyMap(BTreeMap<ContentPath, BTreeSet<OutputLocation>>);

impl DependencyMap {
    pub fn insert(&mut self, source: ContentPath, location: OutputLocation) {
        self.0.entry(source).or_default().insert(location);
    }

    /// Outputs that must be rebuilt when `source` changes.
    pub fn used_by(&self, source: &ContentPath) -> impl Iterator<Item = &OutputLocation> + '_ {
        self.0.get(source).into_iter().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ContentPath, &BTreeSet<OutputLocation>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// JSON object keys must be strings, so content paths are keyed by display form.
impl Serialize for DependencyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k.to_string(), v)))
    }
}

/// All outputs of one build, keyed by `(directory, filename)`.
#[derive(Debug, Default)]
pub struct OutputCollection {
    outputs: BTreeMap<(Vec<String>, String), Output>,
}

impl OutputCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an output, returning the one it replaced.
    pub fn add(&mut self, output: Output) -> Option<Output> {
        self.outputs.insert(output.key(), output)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Output> {
        self.outputs.values()
    }

    pub fn write(&self, root: &Path) -> Result<DependencyMap, OutputError> {
        self.write_with(root, |_, _| {})
    }

    /// Write every output in destination order, calling `on_write` after
    /// each file lands. Stops at the first failure.
    pub fn write_with<F>(&self, root: &Path, mut on_write: F) -> Result<DependencyMap, OutputError>
    where
        F: FnMut(&Output, &Path),
    {
        let root = output_root(root);
        let mut deps = DependencyMap::default();

        for output in self.outputs.values() {
            let absolute = output.write(&root)?;
            on_write(output, &absolute);

            let relative = absolute
                .strip_prefix(&root)
                .map(to_slash)
                .unwrap_or_else(|_| to_slash(&absolute));
            let location = OutputLocation { absolute, relative };

            for source in output.context().depends() {
                deps.insert(source, location.clone());
            }
        }

        Ok(deps)
    }
}

impl Extend<Output> for OutputCollection {
    fn extend<I: IntoIterator<Item = Output>>(&mut self, iter: I) {
        for output in iter {
            self.add(output);
        }
    }
}
