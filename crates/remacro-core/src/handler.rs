//! The handler capability implemented by macros.
//!
//! A handler is invoked twice for every node the traversal reaches: once on
//! descent ([`Phase::Pre`]) and once on ascent ([`Phase::Post`]). It sees the
//! node and may mutate the tree only through the [`Cursor`] it is handed.
//!
//! # Control Flow
//!
//! - `Ok(VisitResult::Continue)` - keep walking
//! - `Ok(VisitResult::SkipChildren)` - in `Pre`, skip the node's children but
//!   still deliver its `Post` visit; in `Post`, same as `Continue`
//! - `Ok(VisitResult::Stop)` - end the traversal successfully, right away
//! - `Err(_)` - fail the pass

use crate::context::RewriteContext;
use crate::cursor::Cursor;
use crate::error::MacroError;

/// Which side of a node the traversal is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before the node's children are visited.
    Pre,
    /// After the node's children are visited.
    Post,
}

/// Result of a successful visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitResult {
    #[default]
    Continue,
    SkipChildren,
    Stop,
}

/// A macro: inspects and rewrites nodes during traversal.
pub trait Handler {
    fn handle(
        &self,
        ctx: &RewriteContext<'_>,
        phase: Phase,
        cursor: &mut Cursor<'_>,
    ) -> Result<VisitResult, MacroError>;
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn handle(
        &self,
        ctx: &RewriteContext<'_>,
        phase: Phase,
        cursor: &mut Cursor<'_>,
    ) -> Result<VisitResult, MacroError> {
        (**self).handle(ctx, phase, cursor)
    }
}

/// Handler backed by a closure, created with [`from_fn`].
pub struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: Fn(&RewriteContext<'_>, Phase, &mut Cursor<'_>) -> Result<VisitResult, MacroError>,
{
    fn handle(
        &self,
        ctx: &RewriteContext<'_>,
        phase: Phase,
        cursor: &mut Cursor<'_>,
    ) -> Result<VisitResult, MacroError> {
        (self.0)(ctx, phase, cursor)
    }
}

/// Wrap a closure as a [`Handler`].
pub fn from_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&RewriteContext<'_>, Phase, &mut Cursor<'_>) -> Result<VisitResult, MacroError>,
{
    FnHandler(f)
}
