//! Macro registry: handlers by name.
//!
//! The registry is an explicit value built by the caller and passed to the
//! rewriter; there is no process-wide registry. Lookups silently drop names
//! that are not registered, so directives written for other tools never
//! fail a rewrite.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::handler::Handler;

/// Handlers keyed by name, remembering registration order.
#[derive(Default)]
pub struct Macros {
    entries: Vec<(String, Box<dyn Handler>)>,
    index: HashMap<String, usize>,
}

impl Macros {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`.
    ///
    /// Registering an existing name replaces its handler and keeps the
    /// original registration position.
    pub fn register(&mut self, name: impl Into<String>, handler: impl Handler + 'static) -> &mut Self {
        let name = name.into();
        let handler: Box<dyn Handler> = Box::new(handler);
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1 = handler,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, handler));
            }
        }
        self
    }

    /// Builder form of [`Macros::register`].
    pub fn with(mut self, name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.register(name, handler);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Handlers for the registered subset of `names`, in registration order.
    ///
    /// No names selects nothing.
    pub fn get<'n>(&self, names: impl IntoIterator<Item = &'n str>) -> Selection<'_> {
        let mut positions: Vec<usize> = self.lookup(names);
        positions.sort_unstable();
        self.select(positions)
    }

    /// Handlers for the registered subset of `names`, in the order given.
    pub fn get_as_named<'n>(&self, names: impl IntoIterator<Item = &'n str>) -> Selection<'_> {
        let positions = self.lookup(names);
        self.select(positions)
    }

    /// Every registered handler, in registration order.
    pub fn all(&self) -> Selection<'_> {
        self.select((0..self.entries.len()).collect())
    }

    fn lookup<'n>(&self, names: impl IntoIterator<Item = &'n str>) -> Vec<usize> {
        let mut positions = Vec::new();
        for name in names {
            match self.index.get(name) {
                Some(&i) if !positions.contains(&i) => positions.push(i),
                Some(_) => {}
                None => debug!(macro_name = name, "ignoring unknown macro"),
            }
        }
        positions
    }

    fn select(&self, positions: Vec<usize>) -> Selection<'_> {
        Selection {
            entries: positions
                .into_iter()
                .map(|i| (self.entries[i].0.as_str(), self.entries[i].1.as_ref()))
                .collect(),
        }
    }
}

impl fmt::Debug for Macros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Ordered name→handler mapping returned by registry lookups.
#[derive(Default)]
pub struct Selection<'m> {
    entries: Vec<(&'m str, &'m dyn Handler)>,
}

impl<'m> Selection<'m> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| *n == name)
    }

    pub fn names(&self) -> Vec<&'m str> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'m str, &'m dyn Handler)> + '_ {
        self.entries.iter().copied()
    }
}

impl fmt::Debug for Selection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
