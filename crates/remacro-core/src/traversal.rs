//! Two-phase traversal engine.
//!
//! One [`Traversal`] run walks one handler over one subtree, depth first,
//! children in order. Every reached node is visited in [`Phase::Pre`] on the
//! way down and in [`Phase::Post`] on the way up, each time with a fresh
//! [`Cursor`] bound to the node's slot.
//!
//! # Mutation During the Walk
//!
//! Edits made through a cursor apply immediately. The walk keeps an index
//! into each child list and advances it past the bound node once that node's
//! `Post` visit returns, so:
//!
//! - nodes inserted before the bound node are never visited
//! - nodes inserted after it are visited (both phases) in order
//! - a node replaced in `Pre` has the replacement's children walked and the
//!   replacement receives the `Post` visit
//! - a deleted node and its subtree receive no further visits
//!
//! Sibling edits on the walk root itself land outside the walked region and
//! are not visited in the same run.
//!
//! # Termination
//!
//! - `SkipChildren` in `Pre` skips the children; the `Post` visit still runs
//! - `Stop` in either phase ends the run successfully without further visits
//! - an error in either phase ends the run, is reported through the
//!   context's report channel, and is returned as a [`PassFailure`]

use tracing::debug;

use crate::context::RewriteContext;
use crate::cursor::{Cursor, ParentRef, SlotState};
use crate::error::{MacroError, PassFailure};
use crate::handler::{Handler, Phase, VisitResult};
use crate::tree::{Node, Span};

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Every reachable node was visited.
    Completed,
    /// A handler returned [`VisitResult::Stop`].
    Stopped,
}

/// Result of running over one slot of a child list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotOutcome {
    pub outcome: PassOutcome,
    /// Index of the walked node after the run, `None` if it was deleted.
    pub position: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

struct Visited {
    flow: Flow,
    position: Option<usize>,
    next: usize,
}

/// Runs one handler over one subtree.
pub struct Traversal<'h, 'c> {
    handler: &'h dyn Handler,
    ctx: &'c RewriteContext<'c>,
    visits: usize,
}

impl<'h, 'c> Traversal<'h, 'c> {
    pub fn new(handler: &'h dyn Handler, ctx: &'c RewriteContext<'c>) -> Self {
        Traversal {
            handler,
            ctx,
            visits: 0,
        }
    }

    /// Number of handler invocations made so far.
    pub fn visits(&self) -> usize {
        self.visits
    }

    /// Walk `root` and its subtree.
    ///
    /// The root has no containing list: the handler may replace it but not
    /// delete it or insert siblings.
    pub fn run(&mut self, root: &mut Node) -> Result<PassOutcome, PassFailure> {
        let mut holder = vec![std::mem::replace(root, Node::placeholder())];
        let visited = self.visit_slot(&mut holder, 0, None, Span::DETACHED);
        if let Some(node) = holder.pop() {
            *root = node;
        }
        Ok(outcome(visited?.flow))
    }

    /// Walk the node at `slots[index]`, a child of `parent`.
    ///
    /// The handler may also delete the node or insert siblings around it.
    pub fn run_slot(
        &mut self,
        slots: &mut Vec<Node>,
        index: usize,
        parent: &ParentRef,
    ) -> Result<SlotOutcome, PassFailure> {
        let visited = self.visit_slot(slots, index, Some(parent), parent.span)?;
        Ok(SlotOutcome {
            outcome: outcome(visited.flow),
            position: visited.position,
        })
    }

    fn visit_slot(
        &mut self,
        slots: &mut Vec<Node>,
        index: usize,
        parent: Option<&ParentRef>,
        fallback: Span,
    ) -> Result<Visited, PassFailure> {
        let span = anchor(slots[index].span, fallback);

        let (result, state) = self.invoke(slots, index, parent, Phase::Pre, span)?;
        if state.removed {
            return Ok(Visited {
                flow: flow(result),
                position: None,
                next: state.index,
            });
        }

        let at = state.index;
        match result {
            VisitResult::Stop => {
                return Ok(Visited {
                    flow: Flow::Stop,
                    position: Some(at),
                    next: at + 1,
                })
            }
            VisitResult::SkipChildren => {}
            VisitResult::Continue => {
                let node = &mut slots[at];
                let this = ParentRef::of(node);
                let span = anchor(node.span, span);
                if self.walk_children(&mut node.children, &this, span)? == Flow::Stop {
                    return Ok(Visited {
                        flow: Flow::Stop,
                        position: Some(at),
                        next: at + 1,
                    });
                }
            }
        }

        let (result, state) = self.invoke(slots, at, parent, Phase::Post, span)?;
        Ok(Visited {
            flow: flow(result),
            position: (!state.removed).then_some(state.index),
            next: if state.removed {
                state.index
            } else {
                state.index + 1
            },
        })
    }

    fn walk_children(
        &mut self,
        children: &mut Vec<Node>,
        parent: &ParentRef,
        fallback: Span,
    ) -> Result<Flow, PassFailure> {
        let mut i = 0;
        while i < children.len() {
            let visited = self.visit_slot(children, i, Some(parent), fallback)?;
            if visited.flow == Flow::Stop {
                return Ok(Flow::Stop);
            }
            i = visited.next;
        }
        Ok(Flow::Continue)
    }

    fn invoke(
        &mut self,
        slots: &mut Vec<Node>,
        index: usize,
        parent: Option<&ParentRef>,
        phase: Phase,
        span: Span,
    ) -> Result<(VisitResult, SlotState), PassFailure> {
        self.visits += 1;
        let mut cursor = Cursor::new(slots, index, parent);
        let result = self.handler.handle(self.ctx, phase, &mut cursor);
        let state = cursor.state();
        match result {
            Ok(result) => Ok((result, state)),
            Err(err) => Err(self.fail(err, span, phase)),
        }
    }

    fn fail(&self, err: MacroError, span: Span, phase: Phase) -> PassFailure {
        let span = err.span().unwrap_or(span);
        let position = self.ctx.position(span);
        debug!(
            macro_name = self.ctx.macro_name(),
            ?phase,
            %position,
            "handler failed"
        );
        self.ctx.error(span, format!("{}: {}", self.ctx.macro_name(), err));
        PassFailure {
            macro_name: self.ctx.macro_name().to_string(),
            span,
            position,
            source: err,
        }
    }
}

fn anchor(span: Span, fallback: Span) -> Span {
    if span.is_empty() {
        fallback
    } else {
        span
    }
}

fn flow(result: VisitResult) -> Flow {
    match result {
        VisitResult::Stop => Flow::Stop,
        VisitResult::Continue | VisitResult::SkipChildren => Flow::Continue,
    }
}

fn outcome(flow: Flow) -> PassOutcome {
    match flow {
        Flow::Stop => PassOutcome::Stopped,
        Flow::Continue => PassOutcome::Completed,
    }
}

// ============================================================================
// Tests
// ============================================================================
