//! remacro: source-to-source rewriting driven by pluggable macro handlers
//!
//! Units are parsed by a [`Frontend`], each top-level declaration is walked by
//! the macros its documentation (or the unit's) names, imports are relocated
//! when output moves, and the printed result is written to a file, a
//! mirrored tree, a shared appended file or a stream.
//!
//! ```no_run
//! use remacro::{from_fn, Macros, Runner, SexprFrontend, VisitResult};
//!
//! let macros = Macros::new().with(
//!     "noop",
//!     from_fn(|_ctx, _phase, _cursor| Ok(VisitResult::Continue)),
//! );
//! let summary = Runner::new(&SexprFrontend, "models")
//!     .output("models_gen")
//!     .run(&macros)?;
//! std::process::exit(i32::from(summary.exit_code()));
//! # Ok::<(), remacro::RewriteError>(())
//! ```

// Core infrastructure - re-exported from remacro-core
pub use remacro_core::{context, cursor, directive, handler, registry, text, traversal, tree};
pub use remacro_core::{
    from_fn, Cursor, CursorError, Diagnostics, Directive, DirectiveSet, FnHandler, Handler,
    MacroError, Macros, Node, NodeKind, ParentRef, PassFailure, PassOutcome, Phase, Position,
    Report, Reporter, RewriteContext, Selection, Severity, SlotOutcome, SourceMap, Span,
    Traversal, Unit, VisitResult,
};

// Pipeline
pub mod config;
pub mod error;
pub mod fixup;
pub mod frontend;
pub mod loader;
pub mod logging;
pub mod output;
pub mod rewriter;
pub mod runner;
pub mod summary;

// Reference frontend
pub mod sexpr;

pub use config::RewriteConfig;
pub use error::{ErrorCode, RewriteError};
pub use fixup::{ImportFixup, PackageIndex};
pub use frontend::Frontend;
pub use loader::{load_unit, UnitEntry, UnitWalker};
pub use output::{Destination, OutputSink};
pub use rewriter::{RewriteStatus, Rewriter, Rewritten};
pub use runner::Runner;
pub use sexpr::SexprFrontend;
pub use summary::{emit_summary, ContentHash, FileReport, FileStatus, RunSummary};
