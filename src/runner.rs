//! Top-level entry point: rewrite a file or a directory of units.
//!
//! # Layout
//!
//! | source    | output      | mode    | destination of each unit                    |
//! |-----------|-------------|---------|---------------------------------------------|
//! | file      | none        | rewrite | stream                                      |
//! | file      | file or dir | rewrite | the file, or `<dir>/<name>`                 |
//! | directory | none        | rewrite | the unit itself (in place)                  |
//! | directory | directory   | rewrite | mirrored path under the output directory    |
//! | any       | none        | append  | sibling `<stem><gen_suffix>.<ext>`          |
//! | any       | file        | append  | the output file, shared by all units        |
//!
//! Mirrored output also relocates imports of packages inside the source root
//! (see [`crate::fixup`]).
//!
//! # Failures
//!
//! Load, handler and fixup failures abandon the unit: nothing is written for
//! it, the failure is recorded in the [`RunSummary`] and the walk moves on
//! (unless `fail_fast` is set). Output, configuration and argument errors end
//! the run with `Err`.
//!
//! An append output that is the source unit itself is rejected: appending
//! truncates the target on its first write.
//!
//! A handler stop ends the run successfully once the current unit is written.

use std::fs;
use std::io::Write;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use remacro_core::{Diagnostics, Macros, Unit};
use tracing::{info, warn};

use crate::config::RewriteConfig;
use crate::error::RewriteError;
use crate::fixup::ImportFixup;
use crate::frontend::Frontend;
use crate::loader::{load_unit, UnitWalker};
use crate::output::{Destination, OutputSink};
use crate::rewriter::{RewriteStatus, Rewriter};
use crate::summary::{ContentHash, FileReport, FileStatus, RunSummary};

/// Rewrites a source file or directory.
pub struct Runner<'f> {
    frontend: &'f dyn Frontend,
    source: PathBuf,
    output: Option<PathBuf>,
    config: RewriteConfig,
}

/// Per-unit collaborators shared across a run.
struct Pipeline<'a> {
    rewriter: Rewriter<'a>,
    fixup: Option<&'a ImportFixup>,
}

impl<'f> Runner<'f> {
    /// An empty `source` means the current directory.
    pub fn new(frontend: &'f dyn Frontend, source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let source = if source.as_os_str().is_empty() {
            PathBuf::from("./")
        } else {
            source
        };
        Runner {
            frontend,
            source,
            output: None,
            config: RewriteConfig::default(),
        }
    }

    /// Output file or directory; none means stream or in place.
    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        let output = output.into();
        self.output = (!output.as_os_str().is_empty()).then_some(output);
        self
    }

    pub fn config(mut self, config: RewriteConfig) -> Self {
        self.config = config;
        self
    }

    /// Load `remacro.toml` from the source directory (or the directory of a
    /// source file).
    pub fn with_project_config(self) -> Result<Self, RewriteError> {
        let root = if self.source.is_dir() {
            self.source.clone()
        } else {
            self.source
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("./"))
        };
        let config = RewriteConfig::load_from_project(&root)?;
        Ok(self.config(config))
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Rewrite and write every unit; stream destinations go to stdout.
    pub fn run(&self, macros: &Macros) -> Result<RunSummary, RewriteError> {
        self.run_into(&mut OutputSink::stdout(), macros)
    }

    /// Rewrite and write every unit through `sink`.
    pub fn run_into(
        &self,
        sink: &mut OutputSink<'_>,
        macros: &Macros,
    ) -> Result<RunSummary, RewriteError> {
        let meta = fs::metadata(&self.source).map_err(|e| RewriteError::io(&self.source, e))?;
        if meta.is_dir() {
            self.run_dir(sink, macros)
        } else {
            let destination = self.file_destination()?;
            let mut summary = RunSummary::new();
            let pipeline = self.pipeline(macros, None);
            let unit = load_unit(self.frontend, &self.source);
            let report = self.process(&pipeline, sink, &self.source, unit, destination)?;
            summary.stopped = report.status == FileStatus::Stopped;
            summary.push(report);
            Ok(summary)
        }
    }

    /// Rewrite the single source unit and print it to `writer`.
    pub fn print(&self, writer: impl Write, macros: &Macros) -> Result<RunSummary, RewriteError> {
        if self.source.is_dir() {
            return Err(RewriteError::invalid_args(format!(
                "cannot print directory {}; give a single unit",
                self.source.display()
            )));
        }
        let mut sink = OutputSink::new(writer);
        let pipeline = self.pipeline(macros, None);
        let unit = load_unit(self.frontend, &self.source);
        let report = self.process(&pipeline, &mut sink, &self.source, unit, Destination::Stream)?;

        let mut summary = RunSummary::new();
        summary.stopped = report.status == FileStatus::Stopped;
        summary.push(report);
        Ok(summary)
    }

    fn run_dir(
        &self,
        sink: &mut OutputSink<'_>,
        macros: &Macros,
    ) -> Result<RunSummary, RewriteError> {
        let source_root =
            std::path::absolute(&self.source).map_err(|e| RewriteError::io(&self.source, e))?;
        let output_root = match &self.output {
            Some(output) => {
                Some(std::path::absolute(output).map_err(|e| RewriteError::io(output, e))?)
            }
            None => None,
        };

        if let Some(output_root) = &output_root {
            if !self.config.append && output_root.is_file() {
                return Err(RewriteError::invalid_args(format!(
                    "output {} must be a directory when the source is a directory",
                    output_root.display()
                )));
            }
        }

        let mut walker = UnitWalker::new(self.frontend, &source_root)
            .exclude(self.config.exclude_set()?)
            .module_path(self.config.module_path.clone());
        if let Some(output_root) = &output_root {
            if output_root != &source_root && output_root.starts_with(&source_root) {
                walker = walker.skip_path(output_root.clone());
            }
        }
        if self.config.append {
            walker = walker.skip_generated(self.config.gen_suffix.clone());
        }

        let entries = walker.discover()?;
        let mirror = output_root
            .as_ref()
            .filter(|o| !self.config.append && **o != source_root);
        let fixup = mirror.map(|output_root| {
            ImportFixup::new(&walker.package_index(&entries), &source_root, output_root)
        });
        let pipeline = self.pipeline(macros, fixup.as_ref());

        info!(
            root = %source_root.display(),
            units = entries.len(),
            "rewriting directory"
        );

        let mut summary = RunSummary::new();
        let mut fatal = None;
        walker.walk_entries(&entries, |entry, unit| {
            let destination = match (&output_root, self.config.append) {
                (Some(output), true) => Destination::Append(output.clone()),
                (None, true) => Destination::File(self.generated_path(&entry.path)),
                (Some(output), false) => Destination::File(output.join(&entry.relative)),
                (None, false) => Destination::File(entry.path.clone()),
            };
            match self.process(&pipeline, sink, &entry.path, unit, destination) {
                Ok(report) => {
                    let status = report.status;
                    summary.push(report);
                    match status {
                        FileStatus::Stopped => {
                            summary.stopped = true;
                            ControlFlow::Break(())
                        }
                        FileStatus::Failed if self.config.fail_fast => ControlFlow::Break(()),
                        _ => ControlFlow::Continue(()),
                    }
                }
                Err(err) => {
                    fatal = Some(err);
                    ControlFlow::Break(())
                }
            }
        });

        match fatal {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }

    fn pipeline<'a>(&self, macros: &'a Macros, fixup: Option<&'a ImportFixup>) -> Pipeline<'a> {
        Pipeline {
            rewriter: Rewriter::new(macros).append(self.config.append),
            fixup,
        }
    }

    fn file_destination(&self) -> Result<Destination, RewriteError> {
        let destination = match (&self.output, self.config.append) {
            (Some(output), true) if output.is_dir() => {
                return Err(RewriteError::invalid_args(format!(
                    "append output {} must be a file",
                    output.display()
                )))
            }
            (Some(output), true) if is_same_file(output, &self.source) => {
                return Err(RewriteError::invalid_args(format!(
                    "append output {} is the source unit",
                    output.display()
                )))
            }
            (Some(output), true) => Destination::Append(output.clone()),
            (None, true) => Destination::File(self.generated_path(&self.source)),
            (Some(output), false) if output.is_dir() => match self.source.file_name() {
                Some(name) => Destination::File(output.join(name)),
                None => {
                    return Err(RewriteError::invalid_args(format!(
                        "source {} has no file name",
                        self.source.display()
                    )))
                }
            },
            (Some(output), false) => Destination::File(output.clone()),
            (None, false) => Destination::Stream,
        };
        Ok(destination)
    }

    /// `dir/name.ext` becomes `dir/name<gen_suffix>.ext`.
    fn generated_path(&self, path: &Path) -> PathBuf {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match path.extension() {
            Some(ext) => format!("{}{}.{}", stem, self.config.gen_suffix, ext.to_string_lossy()),
            None => format!("{}{}", stem, self.config.gen_suffix),
        };
        path.with_file_name(name)
    }

    /// Generate and write one unit.
    ///
    /// File-scoped failures become a failed report; anything else is
    /// returned as `Err` and ends the run.
    fn process(
        &self,
        pipeline: &Pipeline<'_>,
        sink: &mut OutputSink<'_>,
        path: &Path,
        unit: Result<Unit, RewriteError>,
        destination: Destination,
    ) -> Result<FileReport, RewriteError> {
        let diagnostics = Diagnostics::new();
        let generated = unit.and_then(|unit| self.generate(pipeline, unit, &diagnostics));

        let generated = match generated {
            Ok(generated) => generated,
            Err(err) if err.is_file_scoped() => {
                warn!(path = %path.display(), error = %err, "unit failed");
                return Ok(FileReport::failed(path, &err, diagnostics.into_reports()));
            }
            Err(err) => return Err(err),
        };

        let bytes = match &generated.text {
            Some(text) => sink.write(&destination, text)?,
            None => 0,
        };
        let status = match generated.status {
            RewriteStatus::Stopped => FileStatus::Stopped,
            RewriteStatus::Completed if bytes == 0 => FileStatus::Unchanged,
            RewriteStatus::Completed => FileStatus::Written,
        };

        Ok(FileReport {
            path: path.to_path_buf(),
            status,
            destination: (bytes > 0).then_some(destination),
            bytes,
            hash: generated
                .text
                .as_deref()
                .filter(|_| bytes > 0)
                .map(|t| ContentHash::compute(t.as_bytes())),
            applied: generated.applied,
            diagnostics: diagnostics.into_reports(),
            error: None,
        })
    }

    /// Run the macros, fix imports and print. `text` is `None` when there
    /// is nothing to emit.
    fn generate(
        &self,
        pipeline: &Pipeline<'_>,
        mut unit: Unit,
        diagnostics: &Diagnostics,
    ) -> Result<GeneratedUnit, RewriteError> {
        let rewritten = pipeline.rewriter.rewrite(&mut unit, diagnostics)?;

        let target = if self.config.append {
            rewritten.additions
        } else if rewritten.applied == 0 && self.config.skip_unchanged {
            None
        } else {
            Some(unit)
        };

        let text = match target {
            Some(mut target) => {
                if let Some(fixup) = pipeline.fixup {
                    if target.has_imports() {
                        fixup.apply(&mut target)?;
                    }
                }
                Some(self.frontend.print_unit(&target))
            }
            None => None,
        };

        Ok(GeneratedUnit {
            text,
            status: rewritten.status,
            applied: rewritten.applied,
        })
    }
}

/// Printed result of a successful rewrite.
struct GeneratedUnit {
    text: Option<String>,
    status: RewriteStatus,
    applied: usize,
}

/// Both paths exist and name the same file.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
