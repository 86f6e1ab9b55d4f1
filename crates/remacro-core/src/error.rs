//! Error types raised by handlers, cursors and the traversal engine.

use thiserror::Error;

use crate::tree::{Position, Span};

/// A cursor operation that is not valid for the slot it is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    /// Sibling insertion or deletion on a node that is not in a child list.
    #[error("{operation} requires a node inside a child list")]
    NotInList { operation: &'static str },

    /// The bound node was already deleted during this visit.
    #[error("cannot {operation}: the current node was deleted")]
    Deleted { operation: &'static str },
}

/// Failure returned by a handler.
#[derive(Debug, Error)]
pub enum MacroError {
    /// Handler-specific failure.
    #[error("{message}")]
    Failed {
        message: String,
        /// More precise location than the visited node, if the handler knows one.
        span: Option<Span>,
    },

    /// A cursor operation was rejected.
    #[error(transparent)]
    Cursor(#[from] CursorError),
}

impl MacroError {
    pub fn msg(message: impl Into<String>) -> Self {
        MacroError::Failed {
            message: message.into(),
            span: None,
        }
    }

    pub fn at(span: Span, message: impl Into<String>) -> Self {
        MacroError::Failed {
            message: message.into(),
            span: Some(span),
        }
    }

    pub(crate) fn span(&self) -> Option<Span> {
        match self {
            MacroError::Failed { span, .. } => *span,
            MacroError::Cursor(_) => None,
        }
    }
}

/// A traversal pass that failed because its handler returned an error.
#[derive(Debug, Error)]
#[error("{macro_name}: {position}: {source}")]
pub struct PassFailure {
    pub macro_name: String,
    pub span: Span,
    pub position: Position,
    #[source]
    pub source: MacroError,
}

// ============================================================================
// Tests
// ============================================================================
