//! Configuration handling for remacro
//!
//! Settings live in `remacro.toml` at the source root:
//!
//! ```toml
//! module_path = "example.com/demo"
//! append = false
//! gen_suffix = "_gen"
//! fail_fast = false
//! skip_unchanged = false
//! exclude = ["vendor/**", "**/*_test.rmc"]
//! ```

use std::fs;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::RewriteError;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "remacro.toml";

/// Rewrite settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Logical import path of the source root (defaults to its directory name)
    #[serde(default)]
    pub module_path: Option<String>,

    /// Keep sources untouched and emit only what the macros added
    #[serde(default)]
    pub append: bool,

    /// Stem suffix of generated files in append mode without an output
    #[serde(default = "default_gen_suffix")]
    pub gen_suffix: String,

    /// Stop a directory run at the first failed unit
    #[serde(default)]
    pub fail_fast: bool,

    /// Emit nothing for units no macro ran on.
    ///
    /// With mirrored output the untouched units are then missing from the
    /// output tree, while imports in the written units are still relocated
    /// into it. Leave this off when the mirror must be complete.
    #[serde(default)]
    pub skip_unchanged: bool,

    /// Glob patterns, relative to the source root, of units to skip
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_gen_suffix() -> String {
    "_gen".to_string()
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            module_path: None,
            append: false,
            gen_suffix: default_gen_suffix(),
            fail_fast: false,
            skip_unchanged: false,
            exclude: Vec::new(),
        }
    }
}

impl RewriteConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, RewriteError> {
        let content = fs::read_to_string(path).map_err(|e| RewriteError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        toml::from_str(&content).map_err(|e| RewriteError::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
        })
    }

    /// Load `remacro.toml` from the given source root, or the defaults
    pub fn load_from_project(root: &Path) -> Result<Self, RewriteError> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.is_file() {
            Self::load(&config_path)
        } else {
            Ok(RewriteConfig::default())
        }
    }

    /// Compile the exclude patterns.
    pub fn exclude_set(&self) -> Result<GlobSet, RewriteError> {
        build_glob_set(&self.exclude)
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, RewriteError> {
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| RewriteError::Config {
            message: format!("invalid exclude pattern {pattern:?}: {e}"),
        })?;
        builder.add(glob);
    }

    builder.build().map_err(|e| RewriteError::Config {
        message: format!("invalid exclude patterns: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_file_missing() {
        let dir = TempDir::new().expect("tempdir");
        let config = RewriteConfig::load_from_project(dir.path()).expect("load");
        assert_eq!(config, RewriteConfig::default());
        assert_eq!(config.gen_suffix, "_gen");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(
            dir.path().join(CONFIG_FILE),
            "module_path = \"example.com/demo\"\nappend = true\nexclude = [\"vendor/**\"]\n",
        )
        .expect("write");

        let config = RewriteConfig::load_from_project(dir.path()).expect("load");
        assert_eq!(config.module_path.as_deref(), Some("example.com/demo"));
        assert!(config.append);
        assert!(!config.fail_fast);
        assert_eq!(config.gen_suffix, "_gen");

        let excludes = config.exclude_set().expect("globs");
        assert!(excludes.is_match("vendor/x/a.rmc"));
        assert!(!excludes.is_match("models/a.rmc"));
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILE), "append = \"yes\"\n").expect("write");

        let err = RewriteConfig::load_from_project(dir.path()).expect_err("bad type");
        assert!(matches!(err, RewriteError::Config { .. }));
    }

    #[test]
    fn invalid_glob_is_config_error() {
        let config = RewriteConfig {
            exclude: vec!["a/[".to_string()],
            ..RewriteConfig::default()
        };
        assert!(config.exclude_set().is_err());
    }
}
