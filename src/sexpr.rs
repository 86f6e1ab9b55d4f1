//! Reference frontend for a small parenthesised notation (`.rmc` files).
//!
//! ## Grammar
//!
//! ```text
//! <unit>    := (<comment> | <item>)*
//! <comment> := ";" text-to-end-of-line
//! <item>    := <list>
//! <list>    := "(" <symbol> <element>* ")"
//! <element> := <list> | <string> | <symbol>
//! <string>  := '"' (char | '\"' | '\\' | '\n' | '\t')* '"'
//! <symbol>  := one or more chars other than whitespace, parens, '"' and ';'
//! ```
//!
//! ## Example
//!
//! ```text
//! ;; macro:use log
//!
//! (import "demo/models")
//!
//! ;; macro:use trace
//! (fn Handle (call print "handled"))
//! ```
//!
//! The first comment block, when a blank line (or the end of the file)
//! separates it from the first item, documents the whole unit. A comment
//! block directly above an item documents that item. Other detached comment
//! blocks are dropped.
//!
//! Top-level `(import "path")` lists become [`NodeKind::Import`] nodes, other
//! top-level lists are declarations, lists inside declarations are statements
//! and anything deeper is an expression. The list head becomes the node's
//! `value`.
//!
//! Printing normalises layout: unit documentation, a blank line, then items
//! separated by blank lines (consecutive undocumented imports stay together).

use std::path::Path;

use remacro_core::{Node, NodeKind, SourceMap, Span, Unit};
use winnow::ascii::multispace0;
use winnow::combinator::preceded;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{any, take_till, take_while};

use crate::error::RewriteError;
use crate::frontend::Frontend;

/// Lists nested deeper than this are rejected instead of overflowing the stack.
const MAX_DEPTH: usize = 256;

/// Frontend for `.rmc` units.
#[derive(Debug, Clone, Copy, Default)]
pub struct SexprFrontend;

impl SexprFrontend {
    pub fn new() -> Self {
        SexprFrontend
    }
}

impl Frontend for SexprFrontend {
    fn extensions(&self) -> &[&str] {
        &["rmc"]
    }

    fn parse_unit(&self, path: &Path, source: &str) -> Result<Unit, RewriteError> {
        let source_map = SourceMap::new(path, source);
        let (doc, items) = Reader { source }.unit().map_err(|e| RewriteError::Load {
            path: path.to_path_buf(),
            position: source_map.position(Span::new(e.offset as u64, e.offset as u64)),
            message: e.message,
        })?;
        Ok(Unit::new(source_map, doc, items))
    }

    fn print_unit(&self, unit: &Unit) -> String {
        let mut out = String::new();
        if let Some(doc) = &unit.doc {
            write_doc(&mut out, doc);
            out.push('\n');
        }

        let mut prev: Option<&Node> = None;
        for item in unit.declarations() {
            if let Some(prev) = prev {
                let grouped = prev.kind == NodeKind::Import
                    && item.kind == NodeKind::Import
                    && item.doc.is_none();
                if !grouped {
                    out.push('\n');
                }
            }
            if let Some(doc) = &item.doc {
                write_doc(&mut out, doc);
            }
            write_node(&mut out, item);
            out.push('\n');
            prev = Some(item);
        }
        out
    }
}

// ============================================================================
// Parser implementation using winnow
// ============================================================================

#[derive(Debug)]
struct SyntaxError {
    offset: usize,
    message: String,
}

struct Reader<'s> {
    source: &'s str,
}

impl<'s> Reader<'s> {
    fn offset(&self, input: &&'s str) -> usize {
        self.source.len() - input.len()
    }

    fn error(&self, input: &&'s str, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            offset: self.offset(input),
            message: message.into(),
        }
    }

    fn expect<O>(
        &self,
        input: &mut &'s str,
        mut parser: impl Parser<&'s str, O, ErrMode<ContextError>>,
        what: &str,
    ) -> Result<O, SyntaxError> {
        match parser.parse_next(input) {
            Ok(output) => Ok(output),
            Err(_) => Err(self.error(input, format!("expected {what}"))),
        }
    }

    /// Parse a whole unit into its documentation and top-level items.
    fn unit(&self) -> Result<(Option<String>, Vec<Node>), SyntaxError> {
        let mut rest = self.source;
        let input = &mut rest;
        let mut unit_doc: Option<String> = None;
        let mut items = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        loop {
            let ws: &str = self.expect(input, multispace0, "whitespace")?;
            let detached = ws.matches('\n').count() >= 2 || input.is_empty();
            if detached && !pending.is_empty() {
                if items.is_empty() && unit_doc.is_none() {
                    unit_doc = Some(pending.join("\n"));
                }
                pending.clear();
            }

            if input.is_empty() {
                break;
            }
            if input.starts_with(';') {
                let line: &str =
                    self.expect(input, preceded(';', take_till(0.., '\n')), "comment")?;
                pending.push(comment_text(line));
                continue;
            }
            if input.starts_with('(') {
                let mut item = self.list(input, None, 0)?;
                if !pending.is_empty() {
                    item.doc = Some(pending.join("\n"));
                    pending.clear();
                }
                items.push(item);
                continue;
            }
            return Err(self.error(input, "expected '(' or a comment at top level"));
        }

        Ok((unit_doc, items))
    }

    fn list(
        &self,
        input: &mut &'s str,
        parent: Option<NodeKind>,
        depth: usize,
    ) -> Result<Node, SyntaxError> {
        if depth > MAX_DEPTH {
            return Err(self.error(input, "lists nested too deeply"));
        }
        let start = self.offset(input);
        self.expect(input, '(', "'('")?;
        self.expect(input, multispace0, "whitespace")?;
        let head: &str = self.expect(input, take_while(1.., is_symbol_char), "list head symbol")?;

        let kind = match parent {
            None if head == "import" => NodeKind::Import,
            None => NodeKind::Decl,
            Some(NodeKind::Decl) => NodeKind::Stmt,
            Some(_) => NodeKind::Expr,
        };

        let mut children = Vec::new();
        loop {
            self.expect(input, multispace0, "whitespace")?;
            match input.chars().next() {
                Some(')') => break,
                None => return Err(self.error(input, "unclosed list")),
                Some('(') => children.push(self.list(input, Some(kind), depth + 1)?),
                Some('"') => children.push(self.string(input)?),
                Some(c) if is_symbol_char(c) => children.push(self.symbol(input)?),
                Some(c) => return Err(self.error(input, format!("unexpected '{c}'"))),
            }
        }
        self.expect(input, ')', "')'")?;

        let end = self.offset(input);
        Ok(Node::list(kind, head, children).with_span(Span::new(start as u64, end as u64)))
    }

    fn symbol(&self, input: &mut &'s str) -> Result<Node, SyntaxError> {
        let start = self.offset(input);
        let text: &str = self.expect(input, take_while(1.., is_symbol_char), "symbol")?;
        let end = self.offset(input);
        Ok(Node::ident(text).with_span(Span::new(start as u64, end as u64)))
    }

    fn string(&self, input: &mut &'s str) -> Result<Node, SyntaxError> {
        let start = self.offset(input);
        self.expect(input, '"', "'\"'")?;

        let mut value = String::new();
        loop {
            let chunk: &str = self.expect(input, take_till(0.., ['"', '\\']), "string text")?;
            value.push_str(chunk);
            let c: char = self
                .expect(input, any, "closing '\"'")
                .map_err(|e| SyntaxError {
                    message: "unterminated string".to_string(),
                    ..e
                })?;
            if c == '"' {
                break;
            }
            let escaped: char = self.expect(input, any, "escape character")?;
            value.push(match escaped {
                'n' => '\n',
                't' => '\t',
                other => other,
            });
        }

        let end = self.offset(input);
        Ok(Node::literal(value).with_span(Span::new(start as u64, end as u64)))
    }
}

fn is_symbol_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '"' | ';')
}

fn comment_text(line: &str) -> String {
    let line = line.trim_end_matches('\r').trim_start_matches(';');
    line.strip_prefix(' ').unwrap_or(line).to_string()
}

// ============================================================================
// Printer
// ============================================================================

fn write_doc(out: &mut String, doc: &str) {
    for line in doc.lines() {
        if line.is_empty() {
            out.push_str(";;\n");
        } else {
            out.push_str(";; ");
            out.push_str(line);
            out.push('\n');
        }
    }
}

fn write_node(out: &mut String, node: &Node) {
    match node.kind {
        NodeKind::Ident => out.push_str(&node.value),
        NodeKind::Literal => {
            out.push('"');
            for c in node.value.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    c => out.push(c),
                }
            }
            out.push('"');
        }
        _ => {
            out.push('(');
            out.push_str(&node.value);
            for child in &node.children {
                out.push(' ');
                write_node(out, child);
            }
            out.push(')');
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
