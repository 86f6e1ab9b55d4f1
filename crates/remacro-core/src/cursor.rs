//! Slot-based mutation cursor.
//!
//! A [`Cursor`] is bound to one slot of a parent's child list for the
//! duration of a single handler call. All edits go through the slot index,
//! so their effect on the rest of the walk is fixed:
//!
//! | Operation       | Effect on the remaining walk                                   |
//! |-----------------|----------------------------------------------------------------|
//! | `replace`       | in `Pre`, the replacement's children are walked and it gets the `Post` visit; in `Post`, the replacement is not visited |
//! | `delete`        | the node and its subtree get no further visits                 |
//! | `insert_before` | the inserted node lands in the visited region and is not visited |
//! | `insert_after`  | the inserted node lands in the unvisited region and is visited |
//!
//! Cursors on a traversal root have no containing list; sibling operations
//! and deletion fail with [`CursorError::NotInList`].

use crate::error::CursorError;
use crate::tree::{Node, NodeKind, Span};

/// Read-only snapshot of the node whose child list holds the cursor's slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub kind: NodeKind,
    pub value: String,
    pub span: Span,
}

impl ParentRef {
    pub fn of(node: &Node) -> Self {
        ParentRef {
            kind: node.kind,
            value: node.value.clone(),
            span: node.span,
        }
    }
}

/// Where the bound node ended up after a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotState {
    /// Current index of the bound node, or of the slot it vacated.
    pub index: usize,
    pub removed: bool,
}

/// Mutation handle bound to one node for one visit.
pub struct Cursor<'a> {
    slots: &'a mut Vec<Node>,
    parent: Option<&'a ParentRef>,
    index: usize,
    removed: bool,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(slots: &'a mut Vec<Node>, index: usize, parent: Option<&'a ParentRef>) -> Self {
        debug_assert!(index < slots.len());
        Cursor {
            slots,
            parent,
            index,
            removed: false,
        }
    }

    pub(crate) fn state(&self) -> SlotState {
        SlotState {
            index: self.index,
            removed: self.removed,
        }
    }

    /// The bound node, or `None` once it was deleted.
    pub fn node(&self) -> Option<&Node> {
        if self.removed {
            None
        } else {
            self.slots.get(self.index)
        }
    }

    /// Mutable access to the bound node for in-place edits.
    pub fn node_mut(&mut self) -> Option<&mut Node> {
        if self.removed {
            None
        } else {
            self.slots.get_mut(self.index)
        }
    }

    /// The node owning the containing list; `None` at a traversal root.
    pub fn parent(&self) -> Option<&ParentRef> {
        self.parent
    }

    /// Index of the bound node in its parent's child list.
    pub fn index(&self) -> Option<usize> {
        self.parent.map(|_| self.index)
    }

    /// Siblings of the bound node, including the node itself unless deleted.
    pub fn siblings(&self) -> &[Node] {
        if self.parent.is_some() {
            self.slots.as_slice()
        } else {
            &[]
        }
    }

    /// Replace the bound node with `node`; returns the node that was replaced.
    pub fn replace(&mut self, node: Node) -> Result<Node, CursorError> {
        if self.removed {
            return Err(CursorError::Deleted {
                operation: "replace",
            });
        }
        Ok(std::mem::replace(&mut self.slots[self.index], node))
    }

    /// Remove the bound node from its parent; returns the removed node.
    pub fn delete(&mut self) -> Result<Node, CursorError> {
        self.require_list("delete")?;
        if self.removed {
            return Err(CursorError::Deleted {
                operation: "delete",
            });
        }
        self.removed = true;
        Ok(self.slots.remove(self.index))
    }

    /// Insert `node` immediately before the bound node.
    pub fn insert_before(&mut self, node: Node) -> Result<(), CursorError> {
        self.require_list("insert before")?;
        self.slots.insert(self.index, node);
        self.index += 1;
        Ok(())
    }

    /// Insert `node` immediately after the bound node.
    ///
    /// Successive calls insert in reverse order: each new node lands right
    /// after the bound node. After a delete, the node lands in the vacated slot.
    pub fn insert_after(&mut self, node: Node) -> Result<(), CursorError> {
        self.require_list("insert after")?;
        let at = if self.removed {
            self.index
        } else {
            self.index + 1
        };
        self.slots.insert(at, node);
        Ok(())
    }

    fn require_list(&self, operation: &'static str) -> Result<(), CursorError> {
        if self.parent.is_none() {
            return Err(CursorError::NotInList { operation });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
