//! Sample macros and fixture helpers shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use remacro::{from_fn, Handler, MacroError, Macros, Node, NodeKind, Phase, VisitResult};

/// Appends `(<head> "<decl name>")` to every declaration it runs on.
pub fn append_stmt(head: &'static str) -> impl Handler + 'static {
    from_fn(move |_ctx, phase, cursor| {
        if phase == Phase::Post {
            if let Some(node) = cursor.node_mut() {
                if node.kind == NodeKind::Decl {
                    let name = node.name().unwrap_or_default().to_string();
                    node.children.push(Node::list(
                        NodeKind::Stmt,
                        head,
                        vec![Node::literal(name)],
                    ));
                }
            }
        }
        Ok(VisitResult::SkipChildren)
    })
}

/// Adds `(fn <Name>String (return "<Name>"))` after every declaration.
pub fn stringer() -> impl Handler + 'static {
    from_fn(|_ctx, phase, cursor| {
        let is_decl = cursor.node().map(|n| n.kind) == Some(NodeKind::Decl);
        if phase == Phase::Post && is_decl {
            let name = cursor
                .node()
                .and_then(|n| n.name())
                .unwrap_or_default()
                .to_string();
            cursor.insert_after(Node::list(
                NodeKind::Decl,
                "fn",
                vec![
                    Node::ident(format!("{name}String")),
                    Node::list(NodeKind::Stmt, "return", vec![Node::literal(name)]),
                ],
            ))?;
        }
        Ok(VisitResult::SkipChildren)
    })
}

/// Fails on every declaration it runs on.
pub fn failing() -> impl Handler + 'static {
    from_fn(|_ctx, phase, cursor| {
        if phase == Phase::Post {
            if let Some(node) = cursor.node() {
                if node.kind == NodeKind::Decl {
                    return Err(MacroError::at(
                        node.span,
                        format!("cannot expand {}", node.name().unwrap_or("?")),
                    ));
                }
            }
        }
        Ok(VisitResult::SkipChildren)
    })
}

/// Stops on the first node it sees.
pub fn stopper() -> impl Handler + 'static {
    from_fn(|_ctx, _phase, _cursor| Ok(VisitResult::Stop))
}

pub fn macros() -> Macros {
    Macros::new()
        .with("log", append_stmt("log"))
        .with("trace", append_stmt("trace"))
        .with("stringer", stringer())
        .with("fail", failing())
        .with("stop", stopper())
}

/// Write `files` (relative path, contents) under `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(&path, contents).expect("write fixture");
    }
}

pub fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path.as_ref())
        .unwrap_or_else(|e| panic!("read {}: {e}", path.as_ref().display()))
}

/// All files under `root`, relative and sorted, with their contents.
pub fn snapshot(root: &Path) -> Vec<(PathBuf, String)> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).expect("read dir") {
            let path = entry.expect("entry").path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path.strip_prefix(root).expect("relative").to_path_buf();
                files.push((rel, read(&path)));
            }
        }
    }
    files.sort();
    files
}
