//! Directive resolution from documentation text.
//!
//! Directives are lines of the form
//!
//! ```text
//! macro:use log, trace
//! macro:<name> arg1 arg2
//! ```
//!
//! anywhere in a node's documentation. Arguments are separated by whitespace
//! and/or commas. Resolution is defensive: lines that are not directives, or
//! that are malformed, are ignored so ordinary comments never break a rewrite.

use std::sync::OnceLock;

use regex::Regex;

/// The directive naming macros to apply.
pub const USE: &str = "use";

fn directive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*macro:([A-Za-z_][A-Za-z0-9_-]*)(?:\s+(.*))?$")
            .expect("directive pattern is valid")
    })
}

/// One directive and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub args: Vec<String>,
}

/// Ordered mapping from directive name to accumulated arguments.
///
/// Directives keep the order of their first appearance; a repeated
/// directive appends its arguments to the existing entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveSet {
    entries: Vec<Directive>,
}

impl DirectiveSet {
    /// Resolve the directives in `doc`. `None` yields an empty set.
    pub fn parse(doc: Option<&str>) -> Self {
        let mut set = DirectiveSet::default();
        let Some(doc) = doc else {
            return set;
        };

        for line in doc.lines() {
            let Some(caps) = directive_pattern().captures(line) else {
                continue;
            };
            let name = &caps[1];
            let args = caps
                .get(2)
                .map(|m| split_args(m.as_str()))
                .unwrap_or_default();
            set.push(name, args);
        }
        set
    }

    fn push(&mut self, name: &str, args: Vec<String>) {
        match self.entries.iter_mut().find(|d| d.name == name) {
            Some(existing) => existing.args.extend(args),
            None => self.entries.push(Directive {
                name: name.to_string(),
                args,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.args.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.entries.iter()
    }

    /// Macro names requested by `use` directives, deduplicated, in first-mention order.
    pub fn uses(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.get(USE).unwrap_or_default() {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }
}

fn split_args(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_doc_is_empty_set() {
        assert!(DirectiveSet::parse(None).is_empty());
        assert!(DirectiveSet::parse(Some("")).is_empty());
    }

    #[test]
    fn parses_use_with_commas_and_spaces() {
        let set = DirectiveSet::parse(Some("macro:use log, trace  derive"));
        assert_eq!(set.uses(), vec!["log", "trace", "derive"]);
    }

    #[test]
    fn ignores_ordinary_comments() {
        let doc = "Computes things.\nSee macro:use in the docs.\n  macro:use log";
        let set = DirectiveSet::parse(Some(doc));
        assert_eq!(set.len(), 1);
        assert_eq!(set.uses(), vec!["log"]);
    }

    #[test]
    fn ignores_malformed_directives() {
        let set = DirectiveSet::parse(Some("macro:\nmacro:9bad x\nmacro: use log"));
        assert!(set.is_empty());
    }

    #[test]
    fn repeated_directives_accumulate() {
        let set = DirectiveSet::parse(Some("macro:use a b\nmacro:tag x\nmacro:use b c"));
        assert_eq!(set.uses(), vec!["a", "b", "c"]);
        assert_eq!(set.get(USE).map(|a| a.len()), Some(4));
        let names: Vec<_> = set.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["use", "tag"]);
    }

    #[test]
    fn directive_without_args() {
        let set = DirectiveSet::parse(Some("macro:skip"));
        assert_eq!(set.get("skip"), Some(&[][..]));
        assert!(set.uses().is_empty());
    }
}
