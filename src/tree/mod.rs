//! Arena-based node tree.
//!
//! All nodes live in a generational arena owned by the `Document` and are
//! referenced by `NodeId`. Navigation links (parent, `first_child`,
//! `last_child`, `next_sibling`, `prev_sibling`) are stored as ids in each
//! node's `NodeData`, so the tree is an ordinary owned value with no
//! reference counting.
//!
//! Deleting a node first unlinks it from its parent's child sequence and
//! then releases every slot in its subtree. Because the arena is
//! generational, a `NodeId` that outlived its node never aliases a node
//! created later: using it panics instead of reading the wrong node.

mod node;

pub use node::{NodeKind, NodeType};

use generational_arena::{Arena, Index};
use tracing::{instrument, trace};

use crate::error::ConstructionError;

/// A handle to a node in a `Document`.
///
/// Handles are cheap to copy and stay valid until the node is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(Index);

/// Storage for a single node in the document arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Parent node, if any. Detached roots have no parent.
    pub parent: Option<NodeId>,
    /// First child node. Always `None` for leaves.
    pub first_child: Option<NodeId>,
    /// Last child node (for O(1) append). Always `None` for leaves.
    pub last_child: Option<NodeId>,
    /// Next sibling in document order.
    pub next_sibling: Option<NodeId>,
    /// Previous sibling in document order.
    pub prev_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

/// An element attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name.
    pub name: String,
    /// The attribute value (escapes already decoded).
    pub value: String,
}

/// A tree of nodes.
///
/// The `Document` owns every node in its arena. A document may hold several
/// detached trees at once; [`root`](Document::root) names the primary one
/// (the tree a loader produced, or the first detached node created).
///
/// # Examples
///
/// ```
/// use minixml::Document;
///
/// let mut doc = Document::new();
/// let group = doc.new_element(None, "group").unwrap();
/// doc.new_integer(Some(group), 123).unwrap();
/// doc.new_text(Some(group), true, "items").unwrap();
///
/// assert_eq!(doc.root(), Some(group));
/// assert_eq!(doc.children(group).count(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Document {
    nodes: Arena<NodeData>,
    root: Option<NodeId>,
}

impl Document {
    /// Creates a new empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Arena::with_capacity(64),
            root: None,
        }
    }

    /// Returns the primary root node, if any.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Designates a detached node as the primary root.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::AlreadyAttached`] if `id` has a parent.
    pub fn set_root(&mut self, id: NodeId) -> Result<(), ConstructionError> {
        if self.node(id).parent.is_some() {
            return Err(ConstructionError::AlreadyAttached);
        }
        self.root = Some(id);
        Ok(())
    }

    /// Returns `true` if `id` refers to a live node in this document.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id.0)
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns a reference to the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` refers to a deleted node.
    #[must_use]
    #[track_caller]
    pub fn node(&self, id: NodeId) -> &NodeData {
        match self.nodes.get(id.0) {
            Some(data) => data,
            None => panic!("stale NodeId {id:?}: node was deleted"),
        }
    }

    #[track_caller]
    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        match self.nodes.get_mut(id.0) {
            Some(data) => data,
            None => panic!("stale NodeId {id:?}: node was deleted"),
        }
    }

    /// Returns the kind (and payload) of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// Returns the variant tag of a node.
    #[must_use]
    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.kind(id).node_type()
    }

    /// Returns `true` if the node is an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element { .. })
    }

    // --- Typed accessors ---

    /// Returns the tag name of an element node, or `None` for leaves.
    #[must_use]
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the value of an integer node.
    #[must_use]
    pub fn integer(&self, id: NodeId) -> Option<i64> {
        match self.kind(id) {
            NodeKind::Integer { value } => Some(*value),
            _ => None,
        }
    }

    /// Returns the value of a real node.
    #[must_use]
    pub fn real(&self, id: NodeId) -> Option<f64> {
        match self.kind(id) {
            NodeKind::Real { value } => Some(*value),
            _ => None,
        }
    }

    /// Returns the string of an opaque node.
    #[must_use]
    pub fn opaque(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Opaque { content } => Some(content),
            _ => None,
        }
    }

    /// Returns the token of a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Text { content, .. } => Some(content),
            _ => None,
        }
    }

    /// Returns the whitespace-before flag of a text node.
    #[must_use]
    pub fn text_whitespace(&self, id: NodeId) -> Option<bool> {
        match self.kind(id) {
            NodeKind::Text { whitespace, .. } => Some(*whitespace),
            _ => None,
        }
    }

    /// Returns the concatenated leaf content of a node and its descendants.
    ///
    /// Text tokens are joined with a single space wherever their
    /// whitespace-before flag is set; numbers use their saved form.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let push = |out: &mut String, node: NodeId| match self.kind(node) {
            NodeKind::Element { .. } => {}
            NodeKind::Integer { value } => push_separated(out, &value.to_string()),
            NodeKind::Real { value } => push_separated(out, &value.to_string()),
            NodeKind::Opaque { content } => out.push_str(content),
            NodeKind::Text {
                whitespace,
                content,
            } => {
                if *whitespace && !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(content);
            }
        };
        push(&mut out, id);
        for node in self.descendants(id) {
            push(&mut out, node);
        }
        out
    }

    // --- Attributes ---

    /// Returns the attributes of an element node.
    ///
    /// Returns an empty slice for leaves.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.kind(id) {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Returns the value of an attribute by name on an element node.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Sets an attribute on an element, overwriting any previous value.
    ///
    /// An overwritten attribute keeps its original position.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::NotAnElement`] for leaves, and a name
    /// error if `name` is not a valid attribute name.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), ConstructionError> {
        validate_name(name)?;
        let NodeKind::Element { attributes, .. } = &mut self.node_mut(id).kind else {
            return Err(ConstructionError::NotAnElement);
        };
        if let Some(attr) = attributes.iter_mut().find(|a| a.name == name) {
            attr.value = value.to_string();
        } else {
            attributes.push(Attribute {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    /// Removes an attribute from an element, returning its previous value.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::NotAnElement`] for leaves.
    pub fn remove_attribute(
        &mut self,
        id: NodeId,
        name: &str,
    ) -> Result<Option<String>, ConstructionError> {
        let NodeKind::Element { attributes, .. } = &mut self.node_mut(id).kind else {
            return Err(ConstructionError::NotAnElement);
        };
        Ok(attributes
            .iter()
            .position(|a| a.name == name)
            .map(|pos| attributes.remove(pos).value))
    }

    // --- Constructors ---

    /// Creates an element node, appended to `parent` or detached when `parent`
    /// is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::EmptyName`] or
    /// [`ConstructionError::InvalidName`] for a bad tag name, and
    /// [`ConstructionError::ParentNotElement`] if `parent` is a leaf.
    pub fn new_element(
        &mut self,
        parent: Option<NodeId>,
        name: &str,
    ) -> Result<NodeId, ConstructionError> {
        validate_name(name)?;
        self.new_node(
            parent,
            NodeKind::Element {
                name: name.to_string(),
                attributes: Vec::new(),
            },
        )
    }

    /// Creates an integer leaf.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::ParentNotElement`] if `parent` is a leaf.
    pub fn new_integer(
        &mut self,
        parent: Option<NodeId>,
        value: i64,
    ) -> Result<NodeId, ConstructionError> {
        self.new_node(parent, NodeKind::Integer { value })
    }

    /// Creates a real leaf.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::ParentNotElement`] if `parent` is a leaf.
    pub fn new_real(
        &mut self,
        parent: Option<NodeId>,
        value: f64,
    ) -> Result<NodeId, ConstructionError> {
        self.new_node(parent, NodeKind::Real { value })
    }

    /// Creates an opaque leaf holding `content` verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::ParentNotElement`] if `parent` is a leaf.
    pub fn new_opaque(
        &mut self,
        parent: Option<NodeId>,
        content: &str,
    ) -> Result<NodeId, ConstructionError> {
        self.new_node(
            parent,
            NodeKind::Opaque {
                content: content.to_string(),
            },
        )
    }

    /// Creates a text token leaf.
    ///
    /// `whitespace` records whether whitespace precedes the token; the saver
    /// turns it back into a separator.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::EmptyText`] for an empty token and
    /// [`ConstructionError::ParentNotElement`] if `parent` is a leaf.
    pub fn new_text(
        &mut self,
        parent: Option<NodeId>,
        whitespace: bool,
        content: &str,
    ) -> Result<NodeId, ConstructionError> {
        if content.is_empty() {
            return Err(ConstructionError::EmptyText);
        }
        self.new_node(
            parent,
            NodeKind::Text {
                whitespace,
                content: content.to_string(),
            },
        )
    }

    fn new_node(
        &mut self,
        parent: Option<NodeId>,
        kind: NodeKind,
    ) -> Result<NodeId, ConstructionError> {
        if let Some(parent) = parent {
            if !self.is_element(parent) {
                return Err(ConstructionError::ParentNotElement);
            }
        }
        let id = NodeId(self.nodes.insert(NodeData::new(kind)));
        match parent {
            Some(parent) => self.link_last(parent, id),
            None => {
                if self.root.is_none() {
                    self.root = Some(id);
                }
            }
        }
        Ok(id)
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns an iterator over a node and its ancestors (walking up to the root).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns an iterator over all descendants of a node in document pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            top: id,
            next: self.first_child(id),
        }
    }

    // --- Structural mutation ---

    /// Appends a detached node to the end of a parent's child list.
    ///
    /// # Errors
    ///
    /// Fails if `parent` is a leaf, `child` is already attached, or `child`
    /// is an ancestor of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), ConstructionError> {
        self.check_attach(parent, child)?;
        self.link_last(parent, child);
        Ok(())
    }

    /// Prepends a detached node as the first child of a parent.
    ///
    /// # Errors
    ///
    /// Same conditions as [`append_child`](Document::append_child).
    pub fn prepend_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> Result<(), ConstructionError> {
        match self.first_child(parent) {
            Some(first) => self.insert_before(first, child),
            None => self.append_child(parent, child),
        }
    }

    /// Inserts a detached node immediately before `reference`.
    ///
    /// # Errors
    ///
    /// Fails if `reference` has no parent, or under the same conditions as
    /// [`append_child`](Document::append_child).
    pub fn insert_before(
        &mut self,
        reference: NodeId,
        new_child: NodeId,
    ) -> Result<(), ConstructionError> {
        let parent = self
            .parent(reference)
            .ok_or(ConstructionError::ParentNotElement)?;
        self.check_attach(parent, new_child)?;

        self.node_mut(new_child).parent = Some(parent);
        if let Some(prev) = self.node(reference).prev_sibling {
            self.node_mut(prev).next_sibling = Some(new_child);
            self.node_mut(new_child).prev_sibling = Some(prev);
        } else {
            self.node_mut(parent).first_child = Some(new_child);
        }
        self.node_mut(new_child).next_sibling = Some(reference);
        self.node_mut(reference).prev_sibling = Some(new_child);
        Ok(())
    }

    /// Inserts a detached node immediately after `reference`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`insert_before`](Document::insert_before).
    pub fn insert_after(
        &mut self,
        reference: NodeId,
        new_child: NodeId,
    ) -> Result<(), ConstructionError> {
        match self.next_sibling(reference) {
            Some(next) => self.insert_before(next, new_child),
            None => {
                let parent = self
                    .parent(reference)
                    .ok_or(ConstructionError::ParentNotElement)?;
                self.append_child(parent, new_child)
            }
        }
    }

    /// Detaches a node from its parent without freeing it.
    ///
    /// The node and its subtree stay in the document as a detached tree.
    /// Detaching a node that has no parent does nothing.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };

        let prev = self.node(id).prev_sibling;
        let next = self.node(id).next_sibling;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }

        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        let data = self.node_mut(id);
        data.parent = None;
        data.prev_sibling = None;
        data.next_sibling = None;
    }

    /// Deletes a node and its entire subtree.
    ///
    /// The node is first unlinked from its parent, so the parent's child
    /// sequence (including its first/last child links) is consistent before
    /// any slot is released. Every id in the subtree becomes stale.
    #[instrument(level = "trace", skip(self))]
    pub fn delete(&mut self, id: NodeId) {
        self.detach(id);

        let mut pending = vec![id];
        let mut freed = 0usize;
        while let Some(current) = pending.pop() {
            if let Some(data) = self.nodes.remove(current.0) {
                let mut child = data.first_child;
                while let Some(c) = child {
                    child = self.node(c).next_sibling;
                    pending.push(c);
                }
                freed += 1;
            }
        }
        if self.root.is_some_and(|root| !self.contains(root)) {
            self.root = None;
        }
        trace!(freed, "deleted subtree");
    }

    fn check_attach(&self, parent: NodeId, child: NodeId) -> Result<(), ConstructionError> {
        if !self.is_element(parent) {
            return Err(ConstructionError::ParentNotElement);
        }
        if self.node(child).parent.is_some() {
            return Err(ConstructionError::AlreadyAttached);
        }
        if self.ancestors(parent).any(|a| a == child) {
            return Err(ConstructionError::WouldCycle);
        }
        Ok(())
    }

    /// Links a detached node as the new last child of `parent`.
    fn link_last(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);

        if let Some(last) = self.node(parent).last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
            self.node_mut(parent).last_child = Some(child);
        } else {
            self.node_mut(parent).first_child = Some(child);
            self.node_mut(parent).last_child = Some(child);
        }
    }
}

/// Appends `s` to `out`, separated by a space when `out` is non-empty.
fn push_separated(out: &mut String, s: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(s);
}

/// Checks that `name` can be written as a tag or attribute name and read back.
pub(crate) fn validate_name(name: &str) -> Result<(), ConstructionError> {
    if name.is_empty() {
        return Err(ConstructionError::EmptyName);
    }
    let bad_start = name.starts_with(['!', '?']);
    let bad_char = name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '/' | '=' | '"' | '\'' | '&'));
    if bad_start || bad_char {
        return Err(ConstructionError::InvalidName(name.to_string()));
    }
    Ok(())
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}

/// Pre-order iterator over the descendants of a node, driven by
/// [`Document::walk_next`].
pub struct Descendants<'a> {
    doc: &'a Document,
    top: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self
            .doc
            .walk_next(current, self.top, crate::locate::Descend::Yes);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element(doc: &mut Document, parent: Option<NodeId>, name: &str) -> NodeId {
        doc.new_element(parent, name).unwrap()
    }

    #[test]
    fn test_new_document_is_empty() {
        let doc = Document::new();
        assert_eq!(doc.root(), None);
        assert_eq!(doc.node_count(), 0);
    }

    #[test]
    fn test_first_detached_node_becomes_root() {
        let mut doc = Document::new();
        let a = element(&mut doc, None, "a");
        let b = element(&mut doc, None, "b");
        assert_eq!(doc.root(), Some(a));
        doc.set_root(b).unwrap();
        assert_eq!(doc.root(), Some(b));
    }

    #[test]
    fn test_construct_each_variant() {
        let mut doc = Document::new();
        let tree = element(&mut doc, None, "element");
        let i = doc.new_integer(Some(tree), 123).unwrap();
        let o = doc.new_opaque(Some(tree), "opaque").unwrap();
        let r = doc.new_real(Some(tree), 123.4).unwrap();
        let t = doc.new_text(Some(tree), true, "text").unwrap();

        assert_eq!(doc.node_type(tree), NodeType::Element);
        assert_eq!(doc.element_name(tree), Some("element"));
        assert_eq!(doc.integer(i), Some(123));
        assert_eq!(doc.opaque(o), Some("opaque"));
        assert_eq!(doc.real(r), Some(123.4));
        assert_eq!(doc.text(t), Some("text"));
        assert_eq!(doc.text_whitespace(t), Some(true));
        assert_eq!(doc.children(tree).collect::<Vec<_>>(), vec![i, o, r, t]);
    }

    #[test]
    fn test_typed_accessors_reject_other_variants() {
        let mut doc = Document::new();
        let tree = element(&mut doc, None, "e");
        let i = doc.new_integer(Some(tree), 7).unwrap();
        assert_eq!(doc.real(i), None);
        assert_eq!(doc.text(i), None);
        assert_eq!(doc.element_name(i), None);
        assert_eq!(doc.integer(tree), None);
    }

    #[test]
    fn test_empty_element_name_rejected() {
        let mut doc = Document::new();
        assert_eq!(
            doc.new_element(None, ""),
            Err(ConstructionError::EmptyName)
        );
        assert_eq!(doc.node_count(), 0);
    }

    #[test]
    fn test_invalid_element_names_rejected() {
        let mut doc = Document::new();
        for name in ["a b", "a<b", "a/b", "!--", "?xml", "a=b"] {
            assert_eq!(
                doc.new_element(None, name),
                Err(ConstructionError::InvalidName(name.to_string())),
                "{name}"
            );
        }
    }

    #[test]
    fn test_empty_text_rejected() {
        let mut doc = Document::new();
        let e = element(&mut doc, None, "e");
        assert_eq!(
            doc.new_text(Some(e), false, ""),
            Err(ConstructionError::EmptyText)
        );
    }

    #[test]
    fn test_leaf_cannot_be_parent() {
        let mut doc = Document::new();
        let e = element(&mut doc, None, "e");
        let leaf = doc.new_integer(Some(e), 1).unwrap();
        assert_eq!(
            doc.new_text(Some(leaf), false, "x"),
            Err(ConstructionError::ParentNotElement)
        );
        assert_eq!(doc.first_child(leaf), None);
    }

    #[test]
    fn test_append_multiple_children() {
        let mut doc = Document::new();
        let root = element(&mut doc, None, "root");
        let a = doc.new_text(Some(root), false, "A").unwrap();
        let b = doc.new_text(Some(root), true, "B").unwrap();
        let c = doc.new_text(Some(root), true, "C").unwrap();

        assert_eq!(doc.first_child(root), Some(a));
        assert_eq!(doc.last_child(root), Some(c));
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.next_sibling(b), Some(c));
        assert_eq!(doc.next_sibling(c), None);
        assert_eq!(doc.prev_sibling(c), Some(b));
        assert_eq!(doc.prev_sibling(b), Some(a));
        assert_eq!(doc.prev_sibling(a), None);
    }

    #[test]
    fn test_attributes_overwrite_in_place() {
        let mut doc = Document::new();
        let e = element(&mut doc, None, "e");
        doc.set_attribute(e, "a", "1").unwrap();
        doc.set_attribute(e, "b", "2").unwrap();
        doc.set_attribute(e, "a", "3").unwrap();

        let names: Vec<_> = doc.attributes(e).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(doc.attribute(e, "a"), Some("3"));
        assert_eq!(doc.attribute(e, "missing"), None);
    }

    #[test]
    fn test_remove_attribute() {
        let mut doc = Document::new();
        let e = element(&mut doc, None, "e");
        doc.set_attribute(e, "a", "1").unwrap();
        assert_eq!(doc.remove_attribute(e, "a"), Ok(Some("1".to_string())));
        assert_eq!(doc.remove_attribute(e, "a"), Ok(None));
        assert!(doc.attributes(e).is_empty());
    }

    #[test]
    fn test_attribute_on_leaf_is_error() {
        let mut doc = Document::new();
        let e = element(&mut doc, None, "e");
        let leaf = doc.new_real(Some(e), 1.5).unwrap();
        assert_eq!(
            doc.set_attribute(leaf, "a", "1"),
            Err(ConstructionError::NotAnElement)
        );
        assert_eq!(
            doc.remove_attribute(leaf, "a"),
            Err(ConstructionError::NotAnElement)
        );
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut doc = Document::new();
        let root = element(&mut doc, None, "root");
        let a = doc.new_integer(Some(root), 1).unwrap();
        let c = doc.new_integer(Some(root), 3).unwrap();

        let b = doc.new_integer(None, 2).unwrap();
        doc.insert_before(c, b).unwrap();
        let d = doc.new_integer(None, 4).unwrap();
        doc.insert_after(c, d).unwrap();
        let z = doc.new_integer(None, 0).unwrap();
        doc.prepend_child(root, z).unwrap();

        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![z, a, b, c, d]);
        assert_eq!(doc.last_child(root), Some(d));
        assert_eq!(doc.parent(b), Some(root));
    }

    #[test]
    fn test_attach_rejects_attached_and_cycles() {
        let mut doc = Document::new();
        let root = element(&mut doc, None, "root");
        let child = element(&mut doc, Some(root), "child");
        let other = element(&mut doc, None, "other");

        assert_eq!(
            doc.append_child(other, child),
            Err(ConstructionError::AlreadyAttached)
        );
        assert_eq!(
            doc.append_child(child, root),
            Err(ConstructionError::WouldCycle)
        );
        assert_eq!(
            doc.append_child(root, root),
            Err(ConstructionError::WouldCycle)
        );
    }

    #[test]
    fn test_detach_middle_child() {
        let mut doc = Document::new();
        let root = element(&mut doc, None, "root");
        let a = doc.new_integer(Some(root), 1).unwrap();
        let b = doc.new_integer(Some(root), 2).unwrap();
        let c = doc.new_integer(Some(root), 3).unwrap();

        doc.detach(b);

        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(doc.parent(b), None);
        assert_eq!(doc.next_sibling(a), Some(c));
        assert_eq!(doc.prev_sibling(c), Some(a));
        assert!(doc.contains(b));
    }

    #[test]
    fn test_delete_frees_subtree() {
        let mut doc = Document::new();
        let root = element(&mut doc, None, "root");
        let group = element(&mut doc, Some(root), "group");
        let inner = doc.new_text(Some(group), false, "x").unwrap();
        let keep = doc.new_integer(Some(root), 1).unwrap();

        doc.delete(group);

        assert!(!doc.contains(group));
        assert!(!doc.contains(inner));
        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![keep]);
        assert_eq!(doc.first_child(root), Some(keep));
        assert_eq!(doc.prev_sibling(keep), None);
        assert_eq!(doc.node_count(), 2);
    }

    #[test]
    fn test_sequential_drain_of_first_child() {
        let mut doc = Document::new();
        let tree = element(&mut doc, None, "element");
        doc.new_integer(Some(tree), 123).unwrap();
        doc.new_opaque(Some(tree), "opaque").unwrap();
        doc.new_real(Some(tree), 123.4).unwrap();
        doc.new_text(Some(tree), true, "text").unwrap();

        let mut seen = Vec::new();
        while let Some(first) = doc.first_child(tree) {
            assert!(!seen.contains(&first), "node visited twice");
            seen.push(first);
            doc.delete(first);
        }

        assert_eq!(seen.len(), 4);
        assert_eq!(doc.first_child(tree), None);
        assert_eq!(doc.last_child(tree), None);
        assert_eq!(doc.node_count(), 1);
    }

    #[test]
    fn test_delete_root_clears_root() {
        let mut doc = Document::new();
        let root = element(&mut doc, None, "root");
        element(&mut doc, Some(root), "child");
        doc.delete(root);
        assert_eq!(doc.root(), None);
        assert_eq!(doc.node_count(), 0);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn test_stale_id_panics() {
        let mut doc = Document::new();
        let root = element(&mut doc, None, "root");
        doc.delete(root);
        let _ = doc.kind(root);
    }

    #[test]
    fn test_stale_id_never_aliases_new_node() {
        let mut doc = Document::new();
        let old = element(&mut doc, None, "old");
        doc.delete(old);
        let new = element(&mut doc, None, "new");
        assert_ne!(old, new);
        assert!(!doc.contains(old));
    }

    #[test]
    fn test_ancestors_iterator() {
        let mut doc = Document::new();
        let root = element(&mut doc, None, "root");
        let parent = element(&mut doc, Some(root), "parent");
        let child = element(&mut doc, Some(parent), "child");

        let ancestors: Vec<NodeId> = doc.ancestors(child).collect();
        assert_eq!(ancestors, vec![child, parent, root]);
    }

    #[test]
    fn test_descendants_iterator() {
        let mut doc = Document::new();
        let root = element(&mut doc, None, "root");
        let p = element(&mut doc, Some(root), "p");
        let a = doc.new_text(Some(p), false, "hello").unwrap();
        let b = element(&mut doc, Some(p), "b");
        let b_text = doc.new_text(Some(b), false, "world").unwrap();
        let tail = doc.new_integer(Some(root), 5).unwrap();

        let desc: Vec<NodeId> = doc.descendants(root).collect();
        assert_eq!(desc, vec![p, a, b, b_text, tail]);
        let desc_p: Vec<NodeId> = doc.descendants(p).collect();
        assert_eq!(desc_p, vec![a, b, b_text]);
    }

    #[test]
    fn test_text_content() {
        let mut doc = Document::new();
        let p = element(&mut doc, None, "p");
        doc.new_text(Some(p), false, "hello").unwrap();
        let b = element(&mut doc, Some(p), "b");
        doc.new_text(Some(b), true, "world").unwrap();
        doc.new_text(Some(p), false, "!").unwrap();
        doc.new_integer(Some(p), 42).unwrap();

        assert_eq!(doc.text_content(p), "hello world! 42");
    }
}
