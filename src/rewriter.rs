//! Rewrite orchestrator: applies the selected macros to one unit.
//!
//! For each top-level declaration, in source order:
//!
//! 1. macros named by the declaration's own directives run first, in the
//!    order the directive names them
//! 2. macros named by the unit's directives run next, in registration order,
//!    skipping any name that already ran at declaration level
//!
//! Every macro is one [`Traversal`] over the declaration. The first failed
//! pass aborts the unit. A [`VisitResult::Stop`](remacro_core::VisitResult)
//! ends all remaining passes of the unit successfully.
//!
//! Declarations inserted by handlers at top level are kept but not
//! processed themselves. A declaration deleted by a pass receives no further
//! passes.

use remacro_core::{
    DirectiveSet, Macros, ParentRef, PassFailure, PassOutcome, Reporter, RewriteContext,
    Traversal, Unit,
};
use tracing::debug;

use crate::error::RewriteError;

/// How a successful rewrite ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStatus {
    Completed,
    /// A handler asked to stop; later declarations and passes were skipped.
    Stopped,
}

/// Result of [`Rewriter::rewrite`].
#[derive(Debug)]
pub struct Rewritten {
    pub status: RewriteStatus,
    /// Number of traversal passes run.
    pub applied: usize,
    /// In append mode, the items the passes added or changed.
    pub additions: Option<Unit>,
}

impl Rewritten {
    pub fn is_stopped(&self) -> bool {
        self.status == RewriteStatus::Stopped
    }
}

/// Applies macros from a registry to units.
#[derive(Debug, Clone, Copy)]
pub struct Rewriter<'m> {
    macros: &'m Macros,
    append: bool,
}

impl<'m> Rewriter<'m> {
    pub fn new(macros: &'m Macros) -> Self {
        Rewriter {
            macros,
            append: false,
        }
    }

    /// In append mode the passes run on a deep copy and the caller's unit is
    /// left untouched; the difference is returned as [`Rewritten::additions`].
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub fn rewrite(
        &self,
        unit: &mut Unit,
        reporter: &dyn Reporter,
    ) -> Result<Rewritten, RewriteError> {
        if !self.append {
            let (status, applied) = self.apply(unit, reporter)?;
            return Ok(Rewritten {
                status,
                applied,
                additions: None,
            });
        }

        let mut copy = unit.clone();
        let (status, applied) = self.apply(&mut copy, reporter)?;
        Ok(Rewritten {
            status,
            applied,
            additions: copy.additions(unit),
        })
    }

    fn apply(
        &self,
        unit: &mut Unit,
        reporter: &dyn Reporter,
    ) -> Result<(RewriteStatus, usize), RewriteError> {
        let path = unit.path().to_path_buf();
        self.apply_passes(unit, reporter)
            .map_err(|failure| RewriteError::HandlerFailed { path, failure })
    }

    fn apply_passes(
        &self,
        unit: &mut Unit,
        reporter: &dyn Reporter,
    ) -> Result<(RewriteStatus, usize), PassFailure> {
        let unit_directives = DirectiveSet::parse(unit.doc.as_deref());
        let unit_macros = self.macros.get(unit_directives.uses());

        let Unit {
            root, source_map, ..
        } = unit;
        let parent = ParentRef::of(root);
        let mut remaining = root.children.len();
        let mut applied = 0;

        while remaining > 0 {
            let mut index = root.children.len() - remaining;
            remaining -= 1;

            let decl = &root.children[index];
            let decl_directives = DirectiveSet::parse(decl.doc.as_deref());
            let decl_macros = self.macros.get_as_named(decl_directives.uses());
            if decl_macros.is_empty() && unit_macros.is_empty() {
                continue;
            }
            let decl_name = decl.name().unwrap_or(&decl.value).to_string();

            let passes = decl_macros.iter().chain(
                unit_macros
                    .iter()
                    .filter(|(name, _)| !decl_macros.contains(name)),
            );

            for (name, handler) in passes {
                debug!(macro_name = name, declaration = %decl_name, "running pass");
                let ctx = RewriteContext::new(source_map, &decl_directives, name, reporter)
                    .with_unit_directives(&unit_directives);
                let result =
                    Traversal::new(handler, &ctx).run_slot(&mut root.children, index, &parent)?;
                applied += 1;

                if result.outcome == PassOutcome::Stopped {
                    debug!(macro_name = name, declaration = %decl_name, "stopped");
                    return Ok((RewriteStatus::Stopped, applied));
                }
                match result.position {
                    Some(position) => index = position,
                    None => break,
                }
            }
        }

        Ok((RewriteStatus::Completed, applied))
    }
}

// ============================================================================
// Tests
// ============================================================================
