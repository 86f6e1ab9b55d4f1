//! Unit discovery and loading.
//!
//! [`UnitWalker`] finds the units under a source root, in a deterministic
//! (path-sorted) order, and hands each loaded unit to a callback together
//! with its path relative to the root. It also builds the [`PackageIndex`]
//! used by import fixup.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use remacro_core::Unit;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::RewriteError;
use crate::fixup::PackageIndex;
use crate::frontend::Frontend;

/// Read and parse one unit.
pub fn load_unit(frontend: &dyn Frontend, path: &Path) -> Result<Unit, RewriteError> {
    let source = fs::read_to_string(path).map_err(|e| RewriteError::io(path, e))?;
    frontend.parse_unit(path, &source)
}

/// A unit discovered under the walker's root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitEntry {
    pub path: PathBuf,
    /// Path relative to the root; the output location hint.
    pub relative: PathBuf,
}

/// Walks a directory of units.
pub struct UnitWalker<'f> {
    frontend: &'f dyn Frontend,
    root: PathBuf,
    exclude: GlobSet,
    skip_paths: Vec<PathBuf>,
    generated_suffix: Option<String>,
    module_path: Option<String>,
}

impl<'f> UnitWalker<'f> {
    pub fn new(frontend: &'f dyn Frontend, root: impl Into<PathBuf>) -> Self {
        UnitWalker {
            frontend,
            root: root.into(),
            exclude: GlobSet::empty(),
            skip_paths: Vec::new(),
            generated_suffix: None,
            module_path: None,
        }
    }

    /// Skip units whose root-relative path matches `patterns`.
    pub fn exclude(mut self, patterns: GlobSet) -> Self {
        self.exclude = patterns;
        self
    }

    /// Ignore `path` and, for a directory, everything below it. Used for an
    /// output location nested in the source root.
    pub fn skip_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.skip_paths.push(path.into());
        self
    }

    /// Skip files whose stem ends with `suffix` (generated by append mode).
    pub fn skip_generated(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.generated_suffix = (!suffix.is_empty()).then_some(suffix);
        self
    }

    /// Logical path of the root; defaults to the root's directory name.
    pub fn module_path(mut self, module_path: Option<String>) -> Self {
        self.module_path = module_path;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All units under the root, sorted by path.
    pub fn discover(&self) -> Result<Vec<UnitEntry>, RewriteError> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_skipped(e.path()))
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.root).to_path_buf();
                RewriteError::io(path, io::Error::from(e))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !self.frontend.can_handle(path) || self.is_generated(path) {
                continue;
            }
            let relative = path
                .strip_prefix(&self.root)
                .map_err(|e| RewriteError::io(path, io::Error::other(e)))?
                .to_path_buf();
            if self.exclude.is_match(&relative) {
                debug!(path = %relative.display(), "excluded");
                continue;
            }

            entries.push(UnitEntry {
                path: path.to_path_buf(),
                relative,
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Logical path to directory for every directory holding a unit.
    pub fn package_index(&self, entries: &[UnitEntry]) -> PackageIndex {
        let module = self.module_path.clone().unwrap_or_else(|| {
            self.root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let dirs: BTreeSet<&Path> = entries
            .iter()
            .filter_map(|e| e.relative.parent())
            .collect();

        let mut index = PackageIndex::new();
        for rel in dirs {
            let segments: Vec<_> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect();
            if segments.is_empty() {
                index.insert(module.clone(), self.root.clone());
            } else {
                index.insert(format!("{}/{}", module, segments.join("/")), self.root.join(rel));
            }
        }
        index
    }

    /// Load every unit and pass it to `f` until `f` breaks.
    ///
    /// Load failures are passed to `f` too; only discovery failures end the
    /// walk with an error.
    pub fn walk<F>(&self, f: F) -> Result<(), RewriteError>
    where
        F: FnMut(&UnitEntry, Result<Unit, RewriteError>) -> ControlFlow<()>,
    {
        let entries = self.discover()?;
        self.walk_entries(&entries, f);
        Ok(())
    }

    /// Like [`UnitWalker::walk`], over entries already discovered.
    pub fn walk_entries<F>(&self, entries: &[UnitEntry], mut f: F)
    where
        F: FnMut(&UnitEntry, Result<Unit, RewriteError>) -> ControlFlow<()>,
    {
        for entry in entries {
            let unit = load_unit(self.frontend, &entry.path);
            if f(entry, unit).is_break() {
                debug!(path = %entry.path.display(), "walk stopped");
                break;
            }
        }
    }

    fn is_skipped(&self, path: &Path) -> bool {
        self.skip_paths.iter().any(|d| d == path)
    }

    fn is_generated(&self, path: &Path) -> bool {
        let Some(suffix) = &self.generated_suffix else {
            return false;
        };
        path.file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem.ends_with(suffix.as_str()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewriteConfig;
    use crate::sexpr::SexprFrontend;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path();
        fs::create_dir_all(root.join("models/user")).expect("mkdir");
        fs::create_dir_all(root.join("out")).expect("mkdir");
        fs::create_dir_all(root.join("vendor")).expect("mkdir");
        fs::write(root.join("b.rmc"), "(fn B)\n").expect("write");
        fs::write(root.join("a.rmc"), "(fn A)\n").expect("write");
        fs::write(root.join("a_gen.rmc"), "(fn AString)\n").expect("write");
        fs::write(root.join("notes.txt"), "not a unit\n").expect("write");
        fs::write(root.join("models/m.rmc"), "(fn M)\n").expect("write");
        fs::write(root.join("models/user/u.rmc"), "(fn U)\n").expect("write");
        fs::write(root.join("out/o.rmc"), "(fn O)\n").expect("write");
        fs::write(root.join("vendor/v.rmc"), "(fn V)\n").expect("write");
        dir
    }

    fn relatives(entries: &[UnitEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| e.relative.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    mod discovery {
        use super::*;

        #[test]
        fn discovers_sorted_units_only() {
            let dir = tree();
            let walker = UnitWalker::new(&SexprFrontend, dir.path());
            let entries = walker.discover().expect("discover");
            assert_eq!(
                relatives(&entries),
                vec![
                    "a.rmc",
                    "a_gen.rmc",
                    "b.rmc",
                    "models/m.rmc",
                    "models/user/u.rmc",
                    "out/o.rmc",
                    "vendor/v.rmc"
                ]
            );
        }

        #[test]
        fn applies_filters() {
            let dir = tree();
            let config = RewriteConfig {
                exclude: vec!["vendor/**".to_string()],
                ..RewriteConfig::default()
            };
            let walker = UnitWalker::new(&SexprFrontend, dir.path())
                .exclude(config.exclude_set().expect("globs"))
                .skip_path(dir.path().join("out"))
                .skip_generated("_gen");
            let entries = walker.discover().expect("discover");
            assert_eq!(
                relatives(&entries),
                vec!["a.rmc", "b.rmc", "models/m.rmc", "models/user/u.rmc"]
            );
        }
    }

    mod index {
        use super::*;

        #[test]
        fn package_index_uses_module_path() {
            let dir = tree();
            let walker = UnitWalker::new(&SexprFrontend, dir.path())
                .module_path(Some("example.com/demo".to_string()))
                .skip_path(dir.path().join("out"))
                .skip_path(dir.path().join("vendor"));
            let entries = walker.discover().expect("discover");
            let index = walker.package_index(&entries);

            assert_eq!(index.len(), 3);
            assert_eq!(index.get("example.com/demo"), Some(dir.path()));
            assert_eq!(
                index.get("example.com/demo/models/user"),
                Some(dir.path().join("models/user").as_path())
            );
        }

        #[test]
        fn package_index_defaults_to_root_name() {
            let dir = tree();
            let walker = UnitWalker::new(&SexprFrontend, dir.path());
            let entries = walker.discover().expect("discover");
            let index = walker.package_index(&entries);

            let name = dir
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .expect("name");
            assert!(index.get(&format!("{name}/models")).is_some());
        }
    }

    mod walking {
        use super::*;

        #[test]
        fn walk_passes_load_errors_and_stops_on_break() {
            let dir = tree();
            fs::write(dir.path().join("b.rmc"), "(fn B").expect("write");
            let walker = UnitWalker::new(&SexprFrontend, dir.path());

            let mut seen = Vec::new();
            walker
                .walk(|entry, unit| {
                    seen.push((entry.relative.clone(), unit.is_ok()));
                    if entry.relative == Path::new("b.rmc") {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                })
                .expect("walk");

            assert_eq!(
                seen,
                vec![
                    (PathBuf::from("a.rmc"), true),
                    (PathBuf::from("a_gen.rmc"), true),
                    (PathBuf::from("b.rmc"), false)
                ]
            );
        }

        #[test]
        fn missing_root_is_io_error() {
            let dir = TempDir::new().expect("tempdir");
            let walker = UnitWalker::new(&SexprFrontend, dir.path().join("missing"));
            let err = walker.discover().expect_err("missing root");
            assert!(matches!(err, RewriteError::Io { .. }));
        }
    }
}
