//! Error types for tree construction, loading, and saving.
//!
//! Each public operation family has its own error type so callers can tell
//! a rejected constructor apart from malformed input or a failing sink:
//!
//! - [`ConstructionError`]: invalid arguments to node constructors, attribute
//!   mutation, or structural attach operations.
//! - [`ParseError`]: malformed input (or an unreadable stream) during load.
//!   Carries the source location of the failure.
//! - [`SaveError`]: the output sink rejected a write.
//!
//! "Not found" from the locator is not an error; it is an empty `Option`.

use std::fmt;
use std::io;

use thiserror::Error;

/// Source location within the loaded text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error type returned when a node cannot be built or attached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// An element was created (or renamed) with an empty tag name.
    #[error("element name must not be empty")]
    EmptyName,
    /// An element name contains whitespace or markup characters.
    #[error("invalid element name '{0}'")]
    InvalidName(String),
    /// A text token was created with an empty string.
    #[error("text node must not be empty")]
    EmptyText,
    /// The requested parent is a leaf; only elements own children.
    #[error("parent node is not an element")]
    ParentNotElement,
    /// An element-only operation was applied to a leaf node.
    #[error("node is not an element")]
    NotAnElement,
    /// The node to attach already has a parent; detach it first.
    #[error("node is already attached to a parent")]
    AlreadyAttached,
    /// Attaching the node would make it its own ancestor.
    #[error("attaching node would create a cycle")]
    WouldCycle,
}

/// The error type returned when loading fails.
///
/// The loader never hands back a partial tree alongside this error: anything
/// built before the failure has already been released.
#[derive(Debug, Error)]
#[error("parse error at {location}: {message}")]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the error occurred.
    pub location: SourceLocation,
    /// The underlying stream error, when reading the input failed.
    #[source]
    pub source: Option<io::Error>,
}

impl ParseError {
    /// Creates a `ParseError` for malformed input at `location`.
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
            source: None,
        }
    }

    /// Creates a `ParseError` for a failed read from the input stream.
    pub fn io(err: io::Error, location: SourceLocation) -> Self {
        Self {
            message: format!("read error: {err}"),
            location,
            source: Some(err),
        }
    }
}

/// The error type returned when the output sink rejects a write.
///
/// Output already written is left in place; there is no rollback.
#[derive(Debug, Error)]
#[error("save error: {0}")]
pub struct SaveError(#[from] pub io::Error);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation {
            line: 10,
            column: 5,
            byte_offset: 42,
        };
        assert_eq!(loc.to_string(), "10:5");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new(
            "unexpected end of input",
            SourceLocation {
                line: 1,
                column: 15,
                byte_offset: 14,
            },
        );
        assert_eq!(
            err.to_string(),
            "parse error at 1:15: unexpected end of input"
        );
        assert!(err.source.is_none());
    }

    #[test]
    fn test_parse_error_io_keeps_source() {
        let err = ParseError::io(
            io::Error::new(io::ErrorKind::UnexpectedEof, "gone"),
            SourceLocation::default(),
        );
        assert!(err.message.starts_with("read error"));
        let source = std::error::Error::source(&err);
        assert!(source.is_some());
    }

    #[test]
    fn test_construction_error_display() {
        assert_eq!(
            ConstructionError::EmptyName.to_string(),
            "element name must not be empty"
        );
        assert_eq!(
            ConstructionError::InvalidName("a b".to_string()).to_string(),
            "invalid element name 'a b'"
        );
    }

    #[test]
    fn test_save_error_from_io() {
        let err: SaveError = io::Error::new(io::ErrorKind::BrokenPipe, "closed").into();
        assert_eq!(err.to_string(), "save error: closed");
    }
}
