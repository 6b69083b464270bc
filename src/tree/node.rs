//! Node type definitions.
//!
//! The `NodeKind` enum carries the variant-specific payload of a node:
//! an element's name and attributes, or the value of one of the four leaf
//! variants. Navigation links (parent, children, siblings) are stored in
//! `NodeData`, not here.

use std::fmt;

use super::Attribute;

/// The kind of a node and its associated data.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// An element node, e.g., `<group type="integer">`. The only variant that
    /// may own children or attributes.
    Element {
        /// The tag name. Never empty.
        name: String,
        /// Attributes in the order they were set; names are unique.
        attributes: Vec<Attribute>,
    },

    /// A signed integer leaf.
    Integer {
        /// The integer value.
        value: i64,
    },

    /// A floating-point leaf.
    Real {
        /// The real value.
        value: f64,
    },

    /// A verbatim string leaf. Never whitespace-normalized or re-escaped.
    Opaque {
        /// The string exactly as loaded or constructed.
        content: String,
    },

    /// A single whitespace-delimited text token.
    Text {
        /// Whether whitespace preceded this token in the source.
        whitespace: bool,
        /// The token text (reserved-character escapes already decoded).
        content: String,
    },
}

impl NodeKind {
    /// Returns the variant tag of this kind.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Element { .. } => NodeType::Element,
            Self::Integer { .. } => NodeType::Integer,
            Self::Real { .. } => NodeType::Real,
            Self::Opaque { .. } => NodeType::Opaque,
            Self::Text { .. } => NodeType::Text,
        }
    }
}

/// The variant tag of a node, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Element,
    Integer,
    Real,
    Opaque,
    Text,
}

impl NodeType {
    /// Returns `true` for the four leaf variants.
    #[must_use]
    pub fn is_leaf(self) -> bool {
        !matches!(self, Self::Element)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Element => "element",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Opaque => "opaque",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}
