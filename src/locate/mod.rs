//! Bounded pre-order traversal and element search.
//!
//! [`Document::walk_next`] is the primitive behind both the saver's walk and
//! the locator: it steps to the next node in document pre-order without ever
//! leaving the subtree rooted at a caller-chosen `top`.
//! [`Document::find_element`] repeats that step until an element matches.
//!
//! # Examples
//!
//! ```
//! use minixml::locate::Descend;
//! use minixml::parser::load_str;
//!
//! let doc = load_str("<menu><choice/><group><choice/></group><choice/></menu>").unwrap();
//! let root = doc.root().unwrap();
//!
//! let first = doc.find_element(root, root, Some("choice"), None, None, Descend::Yes).unwrap();
//! let second = doc.find_element(first, root, Some("choice"), None, None, Descend::No).unwrap();
//! assert_eq!(doc.parent(second), Some(root));
//! assert_eq!(doc.next_sibling(second), None);
//! ```

use tracing::instrument;

use crate::tree::{Document, NodeId, NodeKind};

/// How a walk treats child subtrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Descend {
    /// Stay at sibling level: never enter a node's children.
    No,
    /// Enter child subtrees (full pre-order).
    #[default]
    Yes,
    /// Enter the starting node's children on the first step, then continue
    /// at sibling level.
    First,
}

impl From<bool> for Descend {
    fn from(descend: bool) -> Self {
        if descend {
            Self::Yes
        } else {
            Self::No
        }
    }
}

impl Document {
    /// Returns the next node in pre-order within the subtree rooted at `top`.
    ///
    /// With [`Descend::No`] the walk moves to `node`'s next sibling, or climbs
    /// to the nearest ancestor (below `top`) that has one. Returns `None` once
    /// the walk would leave `top`'s subtree. `node` must lie inside that
    /// subtree.
    #[must_use]
    #[instrument(level = "trace", skip(self))]
    pub fn walk_next(&self, node: NodeId, top: NodeId, descend: Descend) -> Option<NodeId> {
        if descend != Descend::No {
            if let Some(child) = self.first_child(node) {
                return Some(child);
            }
        }
        if node == top {
            return None;
        }
        if let Some(next) = self.next_sibling(node) {
            return Some(next);
        }

        let mut ancestor = self.parent(node);
        while let Some(current) = ancestor {
            if current == top {
                return None;
            }
            if let Some(next) = self.next_sibling(current) {
                return Some(next);
            }
            ancestor = self.parent(current);
        }
        None
    }

    /// Returns the previous node in pre-order within the subtree rooted at
    /// `top`: the mirror image of [`walk_next`](Document::walk_next).
    ///
    /// When descending, the previous sibling's deepest last descendant comes
    /// before the sibling itself. The walk stops (returns `None`) at `top`.
    #[must_use]
    #[instrument(level = "trace", skip(self))]
    pub fn walk_prev(&self, node: NodeId, top: NodeId, descend: Descend) -> Option<NodeId> {
        if node == top {
            return None;
        }
        if let Some(prev) = self.prev_sibling(node) {
            if descend == Descend::No {
                return Some(prev);
            }
            let mut deepest = prev;
            while let Some(last) = self.last_child(deepest) {
                deepest = last;
            }
            return Some(deepest);
        }
        match self.parent(node) {
            Some(parent) if parent != top => Some(parent),
            _ => None,
        }
    }

    /// Finds the next element after `start` within `top`'s subtree.
    ///
    /// An element matches when its tag equals `name` (any tag if `None`) and,
    /// if `attr` is given, it carries that attribute with value `value` (any
    /// value if `None`). The scan starts just after `start`, so passing a
    /// previous match continues the search. `start` itself is never returned.
    ///
    /// With [`Descend::No`] the scan never enters any element's children,
    /// which turns a previous match into a "next sibling-level match" query.
    /// Returns `None` when the bound is exhausted; not finding anything is
    /// not an error.
    #[must_use]
    pub fn find_element(
        &self,
        start: NodeId,
        top: NodeId,
        name: Option<&str>,
        attr: Option<&str>,
        value: Option<&str>,
        descend: Descend,
    ) -> Option<NodeId> {
        let mut node = self.walk_next(start, top, descend);
        let descend = if descend == Descend::First {
            Descend::No
        } else {
            descend
        };

        while let Some(current) = node {
            if self.element_matches(current, name, attr, value) {
                return Some(current);
            }
            node = self.walk_next(current, top, descend);
        }
        None
    }

    fn element_matches(
        &self,
        id: NodeId,
        name: Option<&str>,
        attr: Option<&str>,
        value: Option<&str>,
    ) -> bool {
        let NodeKind::Element { name: tag, .. } = self.kind(id) else {
            return false;
        };
        if name.is_some_and(|n| n != tag) {
            return false;
        }
        match attr {
            None => true,
            Some(attr) => self
                .attribute(id, attr)
                .is_some_and(|v| value.map_or(true, |want| want == v)),
        }
    }
}
