//! Frontend trait: the parse/print pair for a host language.
//!
//! The rewrite pipeline never looks at concrete syntax. A frontend turns
//! source text into a [`Unit`] (tree, positions, declarations, imports and
//! attached documentation) and prints a unit back to text.
//!
//! # Contract
//!
//! - `parse_unit` failures are fatal for that unit and never retried
//! - `print_unit` must be deterministic: the same tree prints the same bytes
//! - top-level imports must be [`NodeKind::Import`](remacro_core::NodeKind)
//!   nodes whose first child is a literal holding the reference path

use std::path::Path;

use remacro_core::Unit;

use crate::error::RewriteError;

pub trait Frontend {
    /// File extensions (without the dot) of units this frontend handles.
    fn extensions(&self) -> &[&str];

    fn parse_unit(&self, path: &Path, source: &str) -> Result<Unit, RewriteError>;

    fn print_unit(&self, unit: &Unit) -> String;

    /// Check if `path` has one of this frontend's extensions.
    fn can_handle(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions().contains(&ext))
    }
}

impl<F: Frontend + ?Sized> Frontend for &F {
    fn extensions(&self) -> &[&str] {
        (**self).extensions()
    }

    fn parse_unit(&self, path: &Path, source: &str) -> Result<Unit, RewriteError> {
        (**self).parse_unit(path, source)
    }

    fn print_unit(&self, unit: &Unit) -> String {
        (**self).print_unit(unit)
    }
}
