//! Per-pass rewrite context and the report channel.

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, warn};

use crate::directive::DirectiveSet;
use crate::tree::{Position, SourceMap, Span};

/// Severity of a [`Report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A positioned message emitted while rewriting a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub severity: Severity,
    pub file: PathBuf,
    pub position: Position,
    pub message: String,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.file.display(),
            self.position,
            self.message
        )
    }
}

/// Sink for reports produced during traversal.
pub trait Reporter {
    fn report(&self, report: Report);
}

/// Collecting [`Reporter`] that also logs every report.
#[derive(Debug, Default)]
pub struct Diagnostics {
    reports: RefCell<Vec<Report>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.reports
            .borrow()
            .iter()
            .any(|r| r.severity == Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.reports.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }

    pub fn into_reports(self) -> Vec<Report> {
        self.reports.into_inner()
    }
}

impl Reporter for Diagnostics {
    fn report(&self, report: Report) {
        match report.severity {
            Severity::Warning => warn!("{report}"),
            Severity::Error => error!("{report}"),
        }
        self.reports.borrow_mut().push(report);
    }
}

/// State handed to a handler for one traversal pass.
///
/// The context is immutable during the pass; the visit phase is passed to
/// handlers separately on every call.
#[derive(Clone, Copy)]
pub struct RewriteContext<'a> {
    source_map: &'a SourceMap,
    directives: &'a DirectiveSet,
    unit_directives: &'a DirectiveSet,
    macro_name: &'a str,
    reporter: &'a dyn Reporter,
}

impl<'a> RewriteContext<'a> {
    pub fn new(
        source_map: &'a SourceMap,
        directives: &'a DirectiveSet,
        macro_name: &'a str,
        reporter: &'a dyn Reporter,
    ) -> Self {
        RewriteContext {
            source_map,
            directives,
            unit_directives: directives,
            macro_name,
            reporter,
        }
    }

    /// Set the unit-wide directives; they default to [`directives`](Self::directives).
    pub fn with_unit_directives(mut self, unit_directives: &'a DirectiveSet) -> Self {
        self.unit_directives = unit_directives;
        self
    }

    pub fn source_map(&self) -> &'a SourceMap {
        self.source_map
    }

    pub fn path(&self) -> &'a Path {
        self.source_map.path()
    }

    /// Directives of the declaration being rewritten.
    pub fn directives(&self) -> &'a DirectiveSet {
        self.directives
    }

    /// Directives attached to the unit itself.
    pub fn unit_directives(&self) -> &'a DirectiveSet {
        self.unit_directives
    }

    /// Registered name of the handler running this pass.
    pub fn macro_name(&self) -> &'a str {
        self.macro_name
    }

    pub fn position(&self, span: Span) -> Position {
        self.source_map.position(span)
    }

    pub fn report(&self, severity: Severity, span: Span, message: impl Into<String>) {
        self.reporter.report(Report {
            severity,
            file: self.source_map.path().to_path_buf(),
            position: self.position(span),
            message: message.into(),
        });
    }

    pub fn warn(&self, span: Span, message: impl Into<String>) {
        self.report(Severity::Warning, span, message);
    }

    pub fn error(&self, span: Span, message: impl Into<String>) {
        self.report(Severity::Error, span, message);
    }
}

impl fmt::Debug for RewriteContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteContext")
            .field("path", &self.source_map.path())
            .field("directives", self.directives)
            .field("unit_directives", self.unit_directives)
            .field("macro_name", &self.macro_name)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
