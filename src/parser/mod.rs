//! Markup loader.
//!
//! A hand-rolled, single-pass loader that reads characters from any
//! [`Read`] source and builds a [`Document`]. Loading either produces a
//! complete tree or fails with a [`ParseError`]; a partially built tree never
//! escapes.
//!
//! Before an element's content is read, the configured [`TypeClassifier`]
//! decides which [`LeafType`] that content becomes:
//!
//! - [`LeafType::Text`] (the default) splits content into whitespace-delimited
//!   tokens, one text leaf per token, each remembering whether whitespace
//!   preceded it. Entity references are decoded.
//! - [`LeafType::Integer`] / [`LeafType::Real`] parse the trimmed content as a
//!   single number.
//! - [`LeafType::Opaque`] keeps the content verbatim as one leaf.
//!
//! # Examples
//!
//! ```
//! use minixml::parser::{load_str_with_options, LeafType, ParseOptions};
//! use minixml::{Document, NodeId};
//!
//! let opts = ParseOptions::default().classifier(|doc: &Document, id: NodeId| {
//!     match doc.element_name(id) {
//!         Some("count") => LeafType::Integer,
//!         _ => LeafType::Text,
//!     }
//! });
//! let doc = load_str_with_options("<count> 42 </count>", &opts).unwrap();
//! let root = doc.root().unwrap();
//! assert_eq!(doc.integer(doc.first_child(root).unwrap()), Some(42));
//! ```

pub(crate) mod input;
mod loader;

use std::fmt;
use std::io::{BufReader, Read};
use std::sync::Arc;

use tracing::debug;

use crate::encoding::decode_to_utf8;
use crate::error::{ParseError, SourceLocation};
use crate::tree::{Document, NodeId};
use crate::util::entity::EntityTable;

use input::{
    DEFAULT_MAX_ATTRIBUTES, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NAME_LENGTH, DEFAULT_MAX_TEXT_LENGTH,
};

/// How an element's character content is turned into leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LeafType {
    /// One integer leaf from the trimmed content.
    Integer,
    /// One real leaf from the trimmed content.
    Real,
    /// One verbatim leaf per content run.
    Opaque,
    /// One text leaf per whitespace-delimited token.
    #[default]
    Text,
}

/// Decides how the content of each loaded element is typed.
///
/// Called once per element, after its name and attributes are known and
/// before any of its content is read. The document is borrowed immutably, so
/// a classifier can inspect the element with its attributes and ancestors
/// but cannot change the tree being built.
///
/// Any `Fn(&Document, NodeId) -> LeafType` closure is a classifier.
pub trait TypeClassifier {
    /// Returns the leaf type for the content of `element`.
    fn classify(&self, doc: &Document, element: NodeId) -> LeafType;
}

impl<F> TypeClassifier for F
where
    F: Fn(&Document, NodeId) -> LeafType,
{
    fn classify(&self, doc: &Document, element: NodeId) -> LeafType {
        self(doc, element)
    }
}

/// Classifies every element as [`LeafType::Text`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TextClassifier;

impl TypeClassifier for TextClassifier {
    fn classify(&self, _doc: &Document, _element: NodeId) -> LeafType {
        LeafType::Text
    }
}

/// Classifies by the element's `type` attribute, falling back to its name.
///
/// `integer` → Integer, `real` → Real, `opaque` or `pre` → Opaque, anything
/// else → Text. So both `<integer>1</integer>` and
/// `<value type="integer">1</value>` hold an integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeAttributeClassifier;

impl TypeClassifier for TypeAttributeClassifier {
    fn classify(&self, doc: &Document, element: NodeId) -> LeafType {
        let key = doc
            .attribute(element, "type")
            .or_else(|| doc.element_name(element))
            .unwrap_or_default();
        match key {
            "integer" => LeafType::Integer,
            "real" => LeafType::Real,
            "opaque" | "pre" => LeafType::Opaque,
            _ => LeafType::Text,
        }
    }
}

/// Load options: the type classifier, the entity table, and resource limits.
///
/// ```
/// use minixml::parser::{ParseOptions, TypeAttributeClassifier};
///
/// let opts = ParseOptions::default()
///     .classifier(TypeAttributeClassifier)
///     .entity("copy", "\u{A9}")
///     .max_depth(64);
/// ```
#[derive(Clone)]
pub struct ParseOptions {
    /// Classifier consulted for every element. `None` means all Text.
    pub classifier: Option<Arc<dyn TypeClassifier + Send + Sync>>,
    /// Entity names resolved in text and attribute values.
    pub entities: EntityTable,
    /// Maximum element nesting depth (default: 256).
    pub max_depth: u32,
    /// Maximum number of attributes on a single element (default: 256).
    pub max_attributes: u32,
    /// Maximum length in bytes of an element or attribute name (default: 50,000).
    pub max_name_length: usize,
    /// Maximum length in bytes of one content run, token, or attribute value
    /// (default: 10 MB).
    pub max_text_length: usize,
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("classifier", &self.classifier.as_ref().map(|_| "..."))
            .field("entities", &self.entities)
            .field("max_depth", &self.max_depth)
            .field("max_attributes", &self.max_attributes)
            .field("max_name_length", &self.max_name_length)
            .field("max_text_length", &self.max_text_length)
            .finish()
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            classifier: None,
            entities: EntityTable::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_attributes: DEFAULT_MAX_ATTRIBUTES,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }
}

impl ParseOptions {
    /// Sets the type classifier.
    #[must_use]
    pub fn classifier(mut self, classifier: impl TypeClassifier + Send + Sync + 'static) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    /// Registers a custom entity, resolved as `&name;`.
    #[must_use]
    pub fn entity(mut self, name: &str, value: &str) -> Self {
        self.entities.insert(name, value);
        self
    }

    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    /// Sets the maximum number of attributes per element.
    #[must_use]
    pub fn max_attributes(mut self, max: u32) -> Self {
        self.max_attributes = max;
        self
    }

    /// Sets the maximum element/attribute name length in bytes.
    #[must_use]
    pub fn max_name_length(mut self, max: usize) -> Self {
        self.max_name_length = max;
        self
    }

    /// Sets the maximum content run / attribute value length in bytes.
    #[must_use]
    pub fn max_text_length(mut self, max: usize) -> Self {
        self.max_text_length = max;
        self
    }

    fn classify(&self, doc: &Document, element: NodeId) -> LeafType {
        self.classifier
            .as_ref()
            .map_or(LeafType::Text, |c| c.classify(doc, element))
    }
}

/// Loads a tree from a reader with default options.
///
/// # Errors
///
/// Returns `ParseError` if the input is malformed or cannot be read.
pub fn load<R: Read>(reader: R) -> Result<Document, ParseError> {
    load_with_options(reader, &ParseOptions::default())
}

/// Loads a tree from a reader with the given options.
///
/// The input must hold exactly one top-level element; comments, processing
/// instructions, declarations, and whitespace may surround it.
///
/// # Errors
///
/// Returns `ParseError` if the input is malformed or cannot be read.
pub fn load_with_options<R: Read>(reader: R, options: &ParseOptions) -> Result<Document, ParseError> {
    debug!(classifier = options.classifier.is_some(), "loading document");
    let mut doc = Document::new();
    loader::Loader::new(BufReader::new(reader), &mut doc, None, options).run()?;
    debug!(nodes = doc.node_count(), "loaded document");
    Ok(doc)
}

/// Loads a tree from a string with default options.
///
/// # Errors
///
/// Returns `ParseError` if the input is malformed.
pub fn load_str(input: &str) -> Result<Document, ParseError> {
    load_str_with_options(input, &ParseOptions::default())
}

/// Loads a tree from a string with the given options.
///
/// # Errors
///
/// Returns `ParseError` if the input is malformed.
pub fn load_str_with_options(input: &str, options: &ParseOptions) -> Result<Document, ParseError> {
    load_with_options(input.as_bytes(), options)
}

/// Loads a tree from raw bytes, detecting the encoding from a byte order
/// mark or an XML-style `encoding` declaration.
///
/// # Errors
///
/// Returns `ParseError` if the bytes cannot be decoded or the decoded text is
/// malformed.
pub fn load_bytes(input: &[u8], options: &ParseOptions) -> Result<Document, ParseError> {
    let text = decode_to_utf8(input)
        .map_err(|e| ParseError::new(e.to_string(), SourceLocation::default()))?;
    load_str_with_options(&text, options)
}

/// Loads content from a reader and appends it under an existing element.
///
/// Any number of top-level elements and leaves may appear; top-level content
/// is typed by classifying `parent`. Returns the newly attached top-level
/// nodes in document order. On error every node attached by this call is
/// deleted again, leaving `doc` as it was.
///
/// # Errors
///
/// Returns `ParseError` if `parent` is not an element, or if the input is
/// malformed or cannot be read.
pub fn load_into<R: Read>(
    doc: &mut Document,
    parent: NodeId,
    reader: R,
    options: &ParseOptions,
) -> Result<Vec<NodeId>, ParseError> {
    if !doc.is_element(parent) {
        return Err(ParseError::new(
            "load target is not an element",
            SourceLocation::default(),
        ));
    }
    let added = loader::Loader::new(BufReader::new(reader), doc, Some(parent), options).run()?;
    debug!(added = added.len(), "loaded content into element");
    Ok(added)
}
