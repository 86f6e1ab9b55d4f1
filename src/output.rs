//! Output sink: materializes printed units at their destinations.
//!
//! Empty text is never written: no file and no directory is created for a
//! unit that produced nothing.

use std::collections::HashSet;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::RewriteError;

/// Where the printed text of one unit goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum Destination {
    /// The sink's stream (stdout unless the caller supplied a writer).
    Stream,
    /// A file, overwritten.
    File(PathBuf),
    /// A file shared by several units: the first write of a run truncates it,
    /// later writes append.
    Append(PathBuf),
}

impl Destination {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Destination::Stream => None,
            Destination::File(path) | Destination::Append(path) => Some(path),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Stream => f.write_str("<stream>"),
            Destination::File(path) | Destination::Append(path) => {
                write!(f, "{}", path.display())
            }
        }
    }
}

/// Writes printed units to their destinations for one run.
pub struct OutputSink<'w> {
    stream: Box<dyn Write + 'w>,
    appended: HashSet<PathBuf>,
}

impl OutputSink<'static> {
    /// Sink whose stream is the process's standard output.
    pub fn stdout() -> Self {
        OutputSink::new(io::stdout())
    }
}

impl<'w> OutputSink<'w> {
    pub fn new(stream: impl Write + 'w) -> Self {
        OutputSink {
            stream: Box::new(stream),
            appended: HashSet::new(),
        }
    }

    /// Write `text` to `destination`, returning the number of bytes written.
    pub fn write(&mut self, destination: &Destination, text: &str) -> Result<usize, RewriteError> {
        if text.is_empty() {
            return Ok(0);
        }
        let sink_err = |source: io::Error| RewriteError::Sink {
            destination: destination.to_string(),
            source,
        };

        match destination {
            Destination::Stream => {
                self.stream.write_all(text.as_bytes()).map_err(sink_err)?;
                self.stream.flush().map_err(sink_err)?;
            }
            Destination::File(path) => {
                create_parent(path).map_err(sink_err)?;
                fs::write(path, text).map_err(sink_err)?;
            }
            Destination::Append(path) => {
                create_parent(path).map_err(sink_err)?;
                let first = self.appended.insert(path.clone());
                let mut file = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(first)
                    .append(!first)
                    .open(path)
                    .map_err(sink_err)?;
                if !first {
                    file.write_all(b"\n").map_err(sink_err)?;
                }
                file.write_all(text.as_bytes()).map_err(sink_err)?;
            }
        }

        info!(destination = %destination, bytes = text.len(), "wrote unit");
        Ok(text.len())
    }
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

// ============================================================================
// Tests
// ============================================================================
