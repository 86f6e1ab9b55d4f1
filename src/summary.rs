//! Run summaries: one [`FileReport`] per processed unit.
//!
//! Summaries serialize to JSON for tools that drive remacro. The output is
//! deterministic: the same run produces identical bytes.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use remacro_core::{Position, Report};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::RewriteError;
use crate::output::Destination;

/// Current schema version of the summary JSON.
pub const SCHEMA_VERSION: &str = "1";

/// SHA-256 of written content, hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened to one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Printed text was written.
    Written,
    /// Nothing to emit.
    Unchanged,
    /// A handler stopped the run; the unit was still written.
    Stopped,
    /// The unit was abandoned; nothing was written for it.
    Failed,
}

/// Error details of a failed unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    /// Numeric error code (see [`ErrorCode`](crate::error::ErrorCode)).
    pub code: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl ErrorInfo {
    pub fn from_error(err: &RewriteError) -> Self {
        ErrorInfo {
            code: err.error_code().code(),
            message: err.to_string(),
            position: err.position(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Destination>,
    pub bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<ContentHash>,
    /// Traversal passes run on the unit.
    pub applied: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl FileReport {
    pub fn failed(path: impl Into<PathBuf>, err: &RewriteError, diagnostics: Vec<Report>) -> Self {
        FileReport {
            path: path.into(),
            status: FileStatus::Failed,
            destination: None,
            bytes: 0,
            hash: None,
            applied: 0,
            diagnostics,
            error: Some(ErrorInfo::from_error(err)),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == FileStatus::Failed
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub schema_version: String,
    pub files: Vec<FileReport>,
    /// A handler ended the run early.
    pub stopped: bool,
}

impl Default for RunSummary {
    fn default() -> Self {
        RunSummary {
            schema_version: SCHEMA_VERSION.to_string(),
            files: Vec::new(),
            stopped: false,
        }
    }
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, report: FileReport) {
        self.files.push(report);
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.is_failed())
    }

    pub fn written(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Written | FileStatus::Stopped))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// `0` on success, otherwise the highest error code among failed units.
    pub fn exit_code(&self) -> u8 {
        self.failures()
            .filter_map(|f| f.error.as_ref().map(|e| e.code))
            .max()
            .unwrap_or(0)
    }
}

/// Emit a summary as pretty-printed JSON to a writer.
pub fn emit_summary(summary: &RunSummary, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

// ============================================================================
// Tests
// ============================================================================
