//! Core infrastructure for remacro.
//!
//! This crate provides the language-agnostic rewrite machinery:
//! - Owned syntax tree and source positions
//! - Directive resolution from documentation text
//! - The handler capability and its macro registry
//! - Slot-based cursor and the two-phase traversal engine
//! - Error types shared by handlers and the engine

pub mod context;
pub mod cursor;
pub mod directive;
pub mod error;
pub mod handler;
pub mod registry;
pub mod text;
pub mod traversal;
pub mod tree;

pub use context::{Diagnostics, Report, Reporter, RewriteContext, Severity};
pub use cursor::{Cursor, ParentRef};
pub use directive::{Directive, DirectiveSet};
pub use error::{CursorError, MacroError, PassFailure};
pub use handler::{from_fn, FnHandler, Handler, Phase, VisitResult};
pub use registry::{Macros, Selection};
pub use traversal::{PassOutcome, SlotOutcome, Traversal};
pub use tree::{Node, NodeKind, Position, SourceMap, Span, Unit};
