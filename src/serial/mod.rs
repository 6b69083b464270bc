//! Serialization.
//!
//! The saver writes a subtree back out as markup. Inter-tag formatting is
//! decided entirely by the configured [`WhitespacePolicy`]; text leaves are
//! re-spaced from their whitespace-before flags and escaped so that a
//! default loader reads back the same tokens.

pub mod policy;
pub mod writer;

pub use policy::{HtmlWhitespace, NoWhitespace, Whitespace, WhitespacePolicy, WsPoint};
pub use writer::{save, save_to_string, SaveOptions};
