//! Import fixup: relocate references to units inside the processed root.
//!
//! When a source root is generated into a different output root, imports that
//! point at packages inside the source root must point at the matching
//! package inside the output root instead.
//!
//! # Relocation Rule
//!
//! A package's logical path is its module path joined with its directory
//! relative to the source root (`demo/models` for `<root>/models` when the
//! root's module path is `demo`). Relocating it replaces the last segment of
//! the module path with the output root's directory name and keeps the
//! relative part:
//!
//! ```text
//! source root  /work/demo        module path  example.com/demo
//! output root  /work/demo_gen
//! import       example.com/demo/models/user
//! relocated    example.com/demo_gen/models/user
//! ```
//!
//! Imports of packages outside the source root, and imports the index does
//! not know, are left alone. Paths that already are relocation targets are
//! skipped, so applying the fixup twice changes nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use remacro_core::{NodeKind, Unit};
use tracing::debug;

use crate::error::RewriteError;

// ============================================================================
// Package Index
// ============================================================================

/// Logical package path to package directory, for one source root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageIndex {
    packages: BTreeMap<String, PathBuf>,
}

impl PackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, logical: impl Into<String>, dir: impl Into<PathBuf>) {
        self.packages.insert(logical.into(), dir.into());
    }

    pub fn get(&self, logical: &str) -> Option<&Path> {
        self.packages.get(logical).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.packages
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_path()))
    }
}

// ============================================================================
// Fixup Pass
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Relocation {
    Moved(String),
    Invalid(String),
}

/// Rewrites import paths from a source root to an output root.
#[derive(Debug, Clone)]
pub struct ImportFixup {
    relocations: BTreeMap<String, Relocation>,
    targets: BTreeSet<String>,
}

impl ImportFixup {
    /// Precompute relocations for every package of `index`.
    ///
    /// Both roots should be absolute, like the directories in the index.
    pub fn new(index: &PackageIndex, source_root: &Path, output_root: &Path) -> Self {
        let out_name = output_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());

        let mut relocations = BTreeMap::new();
        for (logical, dir) in index.iter() {
            let Ok(rel) = dir.strip_prefix(source_root) else {
                continue;
            };
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let relocation = match &out_name {
                Some(name) => relocate(logical, &rel, name),
                None => Relocation::Invalid(format!(
                    "output root {} has no directory name",
                    output_root.display()
                )),
            };
            relocations.insert(logical.to_string(), relocation);
        }

        let targets = relocations
            .values()
            .filter_map(|r| match r {
                Relocation::Moved(target) => Some(target.clone()),
                Relocation::Invalid(_) => None,
            })
            .collect();

        ImportFixup {
            relocations,
            targets,
        }
    }

    /// Rewrite the imports of `unit`. Returns the number of changed imports.
    pub fn apply(&self, unit: &mut Unit) -> Result<usize, RewriteError> {
        let path = unit.path().to_path_buf();
        let mut changed = 0;

        for item in unit.root.children.iter_mut() {
            if item.kind != NodeKind::Import {
                continue;
            }
            let Some(reference) = item.children.first_mut() else {
                continue;
            };
            if self.targets.contains(&reference.value) {
                continue;
            }
            match self.relocations.get(&reference.value) {
                Some(Relocation::Moved(target)) => {
                    debug!(from = %reference.value, to = %target, "relocating import");
                    reference.value = target.clone();
                    changed += 1;
                }
                Some(Relocation::Invalid(reason)) => {
                    return Err(RewriteError::Fixup {
                        path,
                        import: reference.value.clone(),
                        reason: reason.clone(),
                    });
                }
                None => {}
            }
        }
        Ok(changed)
    }
}

fn relocate(logical: &str, rel: &str, out_name: &str) -> Relocation {
    if rel.is_empty() {
        return Relocation::Moved(replace_last_segment(logical, out_name));
    }
    match logical
        .strip_suffix(rel)
        .and_then(|base| base.strip_suffix('/'))
    {
        Some(base) => Relocation::Moved(format!("{}/{}", replace_last_segment(base, out_name), rel)),
        None => Relocation::Invalid(format!("path does not end with {rel}")),
    }
}

fn replace_last_segment(path: &str, name: &str) -> String {
    match path.rfind('/') {
        Some(i) => format!("{}/{}", &path[..i], name),
        None => name.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
