//! Error types and error code constants for remacro.
//!
//! `RewriteError` is the single error type of the pipeline. Each variant maps
//! to a stable numeric [`ErrorCode`] used in run summaries and as a process
//! exit status by embedding tools:
//!
//! - `2`: Invalid arguments (bad source/output combination)
//! - `3`: Load errors (unit missing or unparsable)
//! - `4`: Generation errors (handler failure, import fixup failure)
//! - `5`: Output errors (destination cannot be created or written)
//! - `10`: Internal/configuration errors
//!
//! Load, generation and fixup errors are scoped to one unit: a directory run
//! records them and moves on. Output, configuration and argument errors end
//! the run.

use std::fmt;
use std::io;
use std::path::PathBuf;

use remacro_core::{PassFailure, Position};
use thiserror::Error;

// ============================================================================
// Error Codes
// ============================================================================

/// Stable numeric codes for [`RewriteError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ErrorCode {
    InvalidArguments = 2,
    LoadError = 3,
    GenerationFailed = 4,
    OutputError = 5,
    InternalError = 10,
}

impl ErrorCode {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// The unit could not be parsed.
    #[error("{}:{position}: {message}", path.display())]
    Load {
        path: PathBuf,
        position: Position,
        message: String,
    },

    /// Reading a unit or its metadata failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A handler failed; the unit's output was abandoned.
    #[error("{}:{}: failed to generate: {failure}", path.display(), failure.position)]
    HandlerFailed {
        path: PathBuf,
        #[source]
        failure: PassFailure,
    },

    /// An import could not be relocated to the output root.
    #[error("{}: cannot relocate import \"{import}\": {reason}", path.display())]
    Fixup {
        path: PathBuf,
        import: String,
        reason: String,
    },

    /// The destination could not be created or written.
    #[error("cannot write {destination}: {source}")]
    Sink {
        destination: String,
        #[source]
        source: io::Error,
    },

    #[error("config error: {message}")]
    Config { message: String },
}

impl RewriteError {
    pub fn invalid_args(message: impl Into<String>) -> Self {
        RewriteError::InvalidArguments {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RewriteError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from(self)
    }

    /// Errors that abandon one unit but not the run.
    pub fn is_file_scoped(&self) -> bool {
        matches!(
            self,
            RewriteError::Load { .. }
                | RewriteError::Io { .. }
                | RewriteError::HandlerFailed { .. }
                | RewriteError::Fixup { .. }
        )
    }

    /// Source position of the failure, when known.
    pub fn position(&self) -> Option<Position> {
        match self {
            RewriteError::Load { position, .. } => Some(*position),
            RewriteError::HandlerFailed { failure, .. } => Some(failure.position),
            _ => None,
        }
    }
}

impl From<&RewriteError> for ErrorCode {
    fn from(err: &RewriteError) -> Self {
        match err {
            RewriteError::InvalidArguments { .. } => ErrorCode::InvalidArguments,
            RewriteError::Load { .. } => ErrorCode::LoadError,
            RewriteError::Io { .. } => ErrorCode::LoadError,
            RewriteError::HandlerFailed { .. } => ErrorCode::GenerationFailed,
            RewriteError::Fixup { .. } => ErrorCode::GenerationFailed,
            RewriteError::Sink { .. } => ErrorCode::OutputError,
            RewriteError::Config { .. } => ErrorCode::InternalError,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use remacro_core::{MacroError, Span};

    fn handler_failure() -> RewriteError {
        RewriteError::HandlerFailed {
            path: PathBuf::from("pkg/b.rmc"),
            failure: PassFailure {
                macro_name: "trace".to_string(),
                span: Span::new(10, 20),
                position: Position { line: 3, col: 1 },
                source: MacroError::msg("no body"),
            },
        }
    }

    mod error_code_mapping {
        use super::*;

        #[test]
        fn handler_failure_maps_to_generation_failed() {
            let err = handler_failure();
            assert_eq!(err.error_code(), ErrorCode::GenerationFailed);
            assert_eq!(err.error_code().code(), 4);
            assert!(err.is_file_scoped());
        }

        #[test]
        fn sink_maps_to_output_error_and_ends_run() {
            let err = RewriteError::Sink {
                destination: "out/a.rmc".to_string(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            };
            assert_eq!(err.error_code().code(), 5);
            assert!(!err.is_file_scoped());
        }

        #[test]
        fn load_maps_to_load_error() {
            let err = RewriteError::Load {
                path: PathBuf::from("a.rmc"),
                position: Position { line: 1, col: 4 },
                message: "unexpected ')'".to_string(),
            };
            assert_eq!(err.error_code(), ErrorCode::LoadError);
            assert_eq!(err.position(), Some(Position { line: 1, col: 4 }));
        }

        #[test]
        fn codes_are_ordered_by_severity() {
            assert!(ErrorCode::InvalidArguments < ErrorCode::GenerationFailed);
            assert!(ErrorCode::OutputError < ErrorCode::InternalError);
        }
    }

    mod error_display {
        use super::*;

        #[test]
        fn handler_failure_display() {
            assert_eq!(
                handler_failure().to_string(),
                "pkg/b.rmc:3:1: failed to generate: trace: 3:1: no body"
            );
        }

        #[test]
        fn fixup_display() {
            let err = RewriteError::Fixup {
                path: PathBuf::from("a.rmc"),
                import: "demo/models/sub".to_string(),
                reason: "path does not end with sub".to_string(),
            };
            assert_eq!(
                err.to_string(),
                "a.rmc: cannot relocate import \"demo/models/sub\": path does not end with sub"
            );
        }

        #[test]
        fn invalid_arguments_display() {
            let err = RewriteError::invalid_args("output must be a directory");
            assert_eq!(err.to_string(), "invalid arguments: output must be a directory");
        }
    }
}
