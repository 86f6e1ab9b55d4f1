//! End-to-end properties of a single-unit rewrite through the reference
//! frontend.

mod support;

use std::fs;
use std::path::Path;

use remacro::{
    Diagnostics, FileStatus, Frontend, Macros, RewriteConfig, RewriteError, Rewriter, Runner,
    SexprFrontend,
};
use tempfile::TempDir;

use support::{macros, write_tree};

fn print_file(path: &Path, macros: &Macros) -> (String, remacro::RunSummary) {
    let mut out = Vec::new();
    let summary = Runner::new(&SexprFrontend, path)
        .print(&mut out, macros)
        .expect("print");
    (String::from_utf8(out).expect("utf8"), summary)
}

const PRECEDENCE: &str = "\
;; macro:use log

;; macro:use trace
(fn X (body))

(fn Y (body))
";

// ============================================================================
// Directive Precedence
// ============================================================================

#[test]
fn declaration_directive_runs_first_and_file_default_still_applies() {
    let dir = TempDir::new().expect("tempdir");
    write_tree(dir.path(), &[("f.rmc", PRECEDENCE)]);

    let (text, summary) = print_file(&dir.path().join("f.rmc"), &macros());
    assert_eq!(
        text,
        "\
;; macro:use log

;; macro:use trace
(fn X (body) (trace \"X\") (log \"X\"))

(fn Y (body) (log \"Y\"))
"
    );
    assert_eq!(summary.files[0].applied, 3);
}

#[test]
fn declaration_directive_suppresses_same_named_file_default() {
    let dir = TempDir::new().expect("tempdir");
    write_tree(
        dir.path(),
        &[(
            "f.rmc",
            ";; macro:use trace, log\n\n;; macro:use trace\n(fn X)\n\n(fn Y)\n",
        )],
    );

    let (text, summary) = print_file(&dir.path().join("f.rmc"), &macros());
    // Unit-level macros run in registration order: log before trace.
    assert_eq!(
        text,
        "\
;; macro:use trace, log

;; macro:use trace
(fn X (trace \"X\") (log \"X\"))

(fn Y (log \"Y\") (trace \"Y\"))
"
    );
    assert_eq!(summary.files[0].applied, 4);
}

#[test]
fn inserted_declarations_keep_their_place() {
    let dir = TempDir::new().expect("tempdir");
    write_tree(
        dir.path(),
        &[(
            "f.rmc",
            ";; macro:use log\n\n;; macro:use stringer\n(fn X)\n\n(fn Y)\n",
        )],
    );

    let (text, _) = print_file(&dir.path().join("f.rmc"), &macros());
    assert_eq!(
        text,
        "\
;; macro:use log

;; macro:use stringer
(fn X (log \"X\"))

(fn XString (return \"X\"))

(fn Y (log \"Y\"))
"
    );
}

// ============================================================================
// No Directive, No Mutation
// ============================================================================

#[test]
fn unit_without_directives_is_only_reformatted() {
    let dir = TempDir::new().expect("tempdir");
    let source = ";; just a comment\n\n(import \"fmt\")\n\n;; plain doc\n(fn X (body \"x\"))\n";
    write_tree(dir.path(), &[("f.rmc", source)]);

    let (text, summary) = print_file(&dir.path().join("f.rmc"), &macros());
    assert_eq!(text, source);
    assert_eq!(summary.files[0].applied, 0);
    assert_eq!(summary.files[0].status, FileStatus::Written);
}

#[test]
fn unknown_macros_are_ignored() {
    let dir = TempDir::new().expect("tempdir");
    let source = ";; macro:use mystery\n\n(fn X)\n";
    write_tree(dir.path(), &[("f.rmc", source)]);

    let (text, summary) = print_file(&dir.path().join("f.rmc"), &macros());
    assert_eq!(text, source);
    assert!(summary.is_success());
}

#[test]
fn skip_unchanged_emits_nothing() {
    let dir = TempDir::new().expect("tempdir");
    write_tree(dir.path(), &[("f.rmc", "(fn X)\n")]);

    let mut out = Vec::new();
    let summary = Runner::new(&SexprFrontend, dir.path().join("f.rmc"))
        .config(RewriteConfig {
            skip_unchanged: true,
            ..RewriteConfig::default()
        })
        .print(&mut out, &macros())
        .expect("print");
    assert!(out.is_empty());
    assert_eq!(summary.files[0].status, FileStatus::Unchanged);
    assert!(summary.files[0].destination.is_none());
}

// ============================================================================
// Stop Is Not Failure
// ============================================================================

#[test]
fn stop_on_first_node_keeps_everything_and_succeeds() {
    let dir = TempDir::new().expect("tempdir");
    let source = ";; macro:use log\n\n;; macro:use stop\n(fn X (body))\n\n(fn Y (body))\n";
    write_tree(dir.path(), &[("f.rmc", source)]);

    let (text, summary) = print_file(&dir.path().join("f.rmc"), &macros());
    assert_eq!(text, source);
    assert!(summary.is_success());
    assert!(summary.stopped);
    assert_eq!(summary.files[0].status, FileStatus::Stopped);
    assert_eq!(summary.exit_code(), 0);
}

// ============================================================================
// Atomic Failure
// ============================================================================

#[test]
fn failing_handler_writes_nothing() {
    let dir = TempDir::new().expect("tempdir");
    write_tree(
        dir.path(),
        &[("f.rmc", ";; macro:use log, fail\n\n(fn X)\n\n(fn Y)\n")],
    );
    let output = dir.path().join("out.rmc");

    let summary = Runner::new(&SexprFrontend, dir.path().join("f.rmc"))
        .output(&output)
        .run(&macros())
        .expect("run");

    assert!(!output.exists());
    assert!(!summary.is_success());
    let failure = summary.failures().next().expect("one failure");
    let error = failure.error.as_ref().expect("error info");
    assert_eq!(error.code, 4);
    let position = error.position.expect("position");
    assert_eq!((position.line, position.col), (3, 1));
    assert!(error.message.contains("cannot expand X"));
    assert_eq!(failure.diagnostics.len(), 1);
    assert_eq!(summary.exit_code(), 4);
}

#[test]
fn failing_handler_prints_nothing_to_stream() {
    let dir = TempDir::new().expect("tempdir");
    write_tree(dir.path(), &[("f.rmc", ";; macro:use fail\n\n(fn X)\n")]);

    let (text, summary) = print_file(&dir.path().join("f.rmc"), &macros());
    assert!(text.is_empty());
    assert_eq!(summary.failures().count(), 1);
}

#[test]
fn rewriter_leaves_no_partial_unit_behind_in_append_mode() {
    let dir = TempDir::new().expect("tempdir");
    write_tree(
        dir.path(),
        &[("f.rmc", ";; macro:use stringer, fail\n\n(fn X)\n")],
    );
    let mut unit =
        remacro::load_unit(&SexprFrontend, &dir.path().join("f.rmc")).expect("load");
    let before = unit.clone();

    let err = Rewriter::new(&macros())
        .append(true)
        .rewrite(&mut unit, &Diagnostics::new())
        .expect_err("fails");
    assert!(matches!(err, RewriteError::HandlerFailed { .. }));
    assert_eq!(unit, before);
}

#[test]
fn append_into_the_source_unit_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let source = ";; macro:use stringer\n\n(fn X)\n";
    write_tree(dir.path(), &[("f.rmc", source)]);
    let path = dir.path().join("f.rmc");

    let err = Runner::new(&SexprFrontend, &path)
        .output(&path)
        .config(RewriteConfig {
            append: true,
            ..RewriteConfig::default()
        })
        .run(&macros())
        .expect_err("append onto the source unit");
    assert!(matches!(err, RewriteError::InvalidArguments { .. }));
    assert_eq!(fs::read_to_string(&path).expect("read"), source);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn same_input_same_bytes() {
    let dir = TempDir::new().expect("tempdir");
    write_tree(
        dir.path(),
        &[("f.rmc", ";; macro:use stringer, log\n\n(fn X (a \"b\\nc\"))\n(fn Y)\n")],
    );

    let (first, _) = print_file(&dir.path().join("f.rmc"), &macros());
    let (second, _) = print_file(&dir.path().join("f.rmc"), &macros());
    assert_eq!(first, second);

    let frontend = SexprFrontend;
    let reparsed = frontend
        .parse_unit(Path::new("again.rmc"), &first)
        .expect("output parses");
    assert_eq!(frontend.print_unit(&reparsed), first);
}

#[test]
fn load_failure_reports_position() {
    let dir = TempDir::new().expect("tempdir");
    write_tree(dir.path(), &[("f.rmc", "(fn X)\n(fn Y\n")]);
    let output = dir.path().join("out.rmc");

    let summary = Runner::new(&SexprFrontend, dir.path().join("f.rmc"))
        .output(&output)
        .run(&macros())
        .expect("run");
    let error = summary.files[0].error.as_ref().expect("error");
    assert_eq!(error.code, 3);
    assert_eq!(error.position.map(|p| p.line), Some(3));
    assert!(!output.exists());
    assert!(fs::read_dir(dir.path()).expect("dir").count() == 1);
}
