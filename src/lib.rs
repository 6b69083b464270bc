//! # minixml
//!
//! A small markup-tree library: load tagged markup into an arena-backed
//! tree of elements and typed leaves, edit it, search it, and save it back.
//!
//! - [`tree`]: the node arena. Elements carry a name, ordered attributes and
//!   children; leaves hold an integer, a real, an opaque string, or one text
//!   token.
//! - [`parser`]: the loader. A caller-supplied [`parser::TypeClassifier`]
//!   decides per element whether its content becomes integers, reals,
//!   opaque text, or whitespace-delimited text tokens.
//! - [`serial`]: the saver. A caller-supplied [`serial::WhitespacePolicy`]
//!   decides the formatting around every tag.
//! - [`locate`]: pre-order walking and element search.
//!
//! ## Quick Start
//!
//! ```
//! use minixml::locate::Descend;
//! use minixml::parser::{load_str_with_options, ParseOptions, TypeAttributeClassifier};
//! use minixml::serial::{save_to_string, SaveOptions};
//!
//! let opts = ParseOptions::default().classifier(TypeAttributeClassifier);
//! let doc = load_str_with_options(
//!     "<group><integer>12</integer><item>hello world</item></group>",
//!     &opts,
//! )
//! .unwrap();
//!
//! let root = doc.root().unwrap();
//! let item = doc.find_element(root, root, Some("item"), None, None, Descend::Yes).unwrap();
//! assert_eq!(doc.text_content(item), "hello world");
//!
//! let out = save_to_string(&doc, root, &SaveOptions::default()).unwrap();
//! assert_eq!(out, "<group><integer>12</integer><item>hello world</item></group>\n");
//! ```

pub mod encoding;
pub mod error;
pub mod locate;
pub mod parser;
pub mod serial;
pub mod tree;
pub mod util;

// Re-export primary types at the crate root for convenience.
pub use error::{ConstructionError, ParseError, SaveError, SourceLocation};
pub use tree::{Attribute, Document, NodeId, NodeKind, NodeType};
