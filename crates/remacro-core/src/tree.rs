//! Owned syntax tree for one compilation unit.
//!
//! A [`Unit`] owns exactly one root [`Node`]; every descendant is owned by its
//! parent through `children`, so a unit can be mutated in place without any
//! shared state. Cloning a unit or a node produces a fully independent tree.
//!
//! Nodes are deliberately generic: a structural [`NodeKind`], a `value`
//! (the head symbol of a list node, or the text of a leaf), optional attached
//! documentation and the source [`Span`] they were parsed from. Frontends map
//! their concrete grammar onto this shape.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::text;

// ============================================================================
// Spans and Positions
// ============================================================================

/// Byte offsets into the unit's source text.
///
/// Spans are half-open intervals: `[start, end)`. Nodes synthesized by
/// handlers carry [`Span::DETACHED`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: u64,
    /// End byte offset (exclusive).
    pub end: u64,
}

impl Span {
    /// Span of a node that has no source location.
    pub const DETACHED: Span = Span { start: 0, end: 0 };

    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: u64, end: u64) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// 1-indexed line and column in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Source text of a unit, used to turn spans into positions for reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMap {
    path: PathBuf,
    text: Arc<str>,
}

impl SourceMap {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<Arc<str>>) -> Self {
        SourceMap {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Resolve the start of `span` to a line and column.
    pub fn position(&self, span: Span) -> Position {
        let (line, col) = text::offset_to_position(&self.text, span.start as usize);
        Position { line, col }
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// Structural type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Root of a compilation unit.
    Unit,
    /// Top-level reference to another compilation unit.
    Import,
    /// Top-level declaration.
    Decl,
    /// Statement inside a declaration.
    Stmt,
    /// Nested expression.
    Expr,
    /// Bare identifier leaf.
    Ident,
    /// Literal leaf.
    Literal,
}

impl NodeKind {
    /// Leaves never have children.
    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeKind::Ident | NodeKind::Literal)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Unit => "unit",
            NodeKind::Import => "import",
            NodeKind::Decl => "decl",
            NodeKind::Stmt => "stmt",
            NodeKind::Expr => "expr",
            NodeKind::Ident => "ident",
            NodeKind::Literal => "literal",
        };
        f.write_str(name)
    }
}

/// A syntax node and the subtree it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Head symbol for list nodes, text for leaves.
    pub value: String,
    pub span: Span,
    /// Documentation attached to this node, without comment markers.
    pub doc: Option<String>,
    pub children: Vec<Node>,
}

impl Node {
    /// Create a list node with the given head symbol.
    pub fn list(kind: NodeKind, head: impl Into<String>, children: Vec<Node>) -> Self {
        Node {
            kind,
            value: head.into(),
            span: Span::DETACHED,
            doc: None,
            children,
        }
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Node::leaf(NodeKind::Ident, name)
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Node::leaf(NodeKind::Literal, text)
    }

    fn leaf(kind: NodeKind, value: impl Into<String>) -> Self {
        Node {
            kind,
            value: value.into(),
            span: Span::DETACHED,
            doc: None,
            children: Vec::new(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Name of a declaration: its first identifier child, if any.
    pub fn name(&self) -> Option<&str> {
        self.children
            .iter()
            .find(|c| c.kind == NodeKind::Ident)
            .map(|c| c.value.as_str())
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Node::size).sum::<usize>()
    }

    /// Pre-order iterator over this subtree.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    pub(crate) fn placeholder() -> Self {
        Node::leaf(NodeKind::Ident, "")
    }
}

/// Pre-order iterator returned by [`Node::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

// ============================================================================
// Compilation Unit
// ============================================================================

/// One parsed compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// File-level documentation (the unit's directive carrier).
    pub doc: Option<String>,
    /// Root node; its children are the top-level declarations in source order.
    pub root: Node,
    pub source_map: SourceMap,
}

impl Unit {
    pub fn new(source_map: SourceMap, doc: Option<String>, declarations: Vec<Node>) -> Self {
        Unit {
            doc,
            root: Node::list(NodeKind::Unit, "", declarations),
            source_map,
        }
    }

    pub fn path(&self) -> &Path {
        self.source_map.path()
    }

    pub fn declarations(&self) -> &[Node] {
        &self.root.children
    }

    pub fn imports(&self) -> impl Iterator<Item = &Node> {
        self.root
            .children
            .iter()
            .filter(|n| n.kind == NodeKind::Import)
    }

    pub fn has_imports(&self) -> bool {
        self.imports().next().is_some()
    }

    /// Reference paths of all imports, in source order.
    pub fn import_paths(&self) -> Vec<&str> {
        self.imports()
            .filter_map(|n| n.children.first())
            .map(|c| c.value.as_str())
            .collect()
    }

    /// Extract what a rewrite of a clone added relative to `original`.
    ///
    /// Top-level items of `self` that are structurally equal to an original
    /// item are dropped (each original item cancels at most one), imports
    /// are kept so the additions stay resolvable. Returns `None` when no
    /// non-import item was added or changed.
    pub fn additions(&self, original: &Unit) -> Option<Unit> {
        let mut unmatched: Vec<&Node> = original.root.children.iter().collect();
        let mut added = Vec::new();

        for item in &self.root.children {
            if item.kind == NodeKind::Import {
                added.push(item.clone());
                continue;
            }
            match unmatched.iter().position(|o| *o == item) {
                Some(i) => {
                    unmatched.remove(i);
                }
                None => added.push(item.clone()),
            }
        }

        if added.iter().all(|n| n.kind == NodeKind::Import) {
            return None;
        }
        Some(Unit::new(self.source_map.clone(), None, added))
    }
}

// ============================================================================
// Tests
// ============================================================================
