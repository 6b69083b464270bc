//! Whitespace policies.
//!
//! A [`WhitespacePolicy`] is asked, for every element the saver writes, what
//! formatting to insert at each of the four [`WsPoint`]s. It is the only
//! source of whitespace between tags; the spacing of text leaves comes from
//! their own whitespace-before flag.

use std::fmt;

use crate::tree::{Document, NodeId};

/// Formatting the saver can insert around a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Whitespace {
    /// Insert nothing.
    #[default]
    None,
    Space,
    Newline,
    Tab,
}

impl Whitespace {
    /// The character written for this choice, if any.
    #[must_use]
    pub fn as_char(self) -> Option<char> {
        match self {
            Self::None => None,
            Self::Space => Some(' '),
            Self::Newline => Some('\n'),
            Self::Tab => Some('\t'),
        }
    }
}

/// Where around an element the policy is being consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WsPoint {
    /// Before `<name ...>`.
    BeforeOpen,
    /// After `<name ...>`.
    AfterOpen,
    /// Before `</name>`.
    BeforeClose,
    /// After `</name>`.
    AfterClose,
}

impl WsPoint {
    /// All four points, in the order the saver visits them.
    pub const ALL: [WsPoint; 4] = [
        WsPoint::BeforeOpen,
        WsPoint::AfterOpen,
        WsPoint::BeforeClose,
        WsPoint::AfterClose,
    ];
}

impl fmt::Display for WsPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BeforeOpen => "before-open",
            Self::AfterOpen => "after-open",
            Self::BeforeClose => "before-close",
            Self::AfterClose => "after-close",
        };
        f.write_str(s)
    }
}

/// Decides inter-tag formatting during a save.
///
/// Called exactly once per element at each [`WsPoint`], childless elements
/// included. Implementations must not rely on being called in any order
/// other than document order.
///
/// Any `Fn(&Document, NodeId, WsPoint) -> Whitespace` closure is a policy:
///
/// ```
/// use minixml::serial::{save_to_string, SaveOptions, Whitespace, WsPoint};
/// use minixml::{Document, NodeId};
///
/// let mut doc = Document::new();
/// let root = doc.new_element(None, "list").unwrap();
/// doc.new_element(Some(root), "item").unwrap();
///
/// let opts = SaveOptions::default().whitespace(|_: &Document, _: NodeId, point: WsPoint| {
///     if point == WsPoint::AfterClose { Whitespace::Newline } else { Whitespace::None }
/// });
/// assert_eq!(save_to_string(&doc, root, &opts).unwrap(), "<list><item/>\n</list>\n");
/// ```
pub trait WhitespacePolicy {
    fn whitespace(&self, doc: &Document, element: NodeId, point: WsPoint) -> Whitespace;
}

impl<F> WhitespacePolicy for F
where
    F: Fn(&Document, NodeId, WsPoint) -> Whitespace,
{
    fn whitespace(&self, doc: &Document, element: NodeId, point: WsPoint) -> Whitespace {
        self(doc, element, point)
    }
}

/// Adds no formatting. Used when no policy is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWhitespace;

impl WhitespacePolicy for NoWhitespace {
    fn whitespace(&self, _doc: &Document, _element: NodeId, _point: WsPoint) -> Whitespace {
        Whitespace::None
    }
}

/// Line breaks and tabs for common HTML block elements.
///
/// - `html`, `head`, `body`, `pre`, `p`, `h1`..`h6`: newline before the open
///   tag and after the close tag.
/// - `dl`, `ol`, `ul`: newline at all four points.
/// - `dd`, `dt`, `li`: tab before the open tag, newline after the close tag.
/// - anything else: nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlWhitespace;

impl WhitespacePolicy for HtmlWhitespace {
    fn whitespace(&self, doc: &Document, element: NodeId, point: WsPoint) -> Whitespace {
        let Some(name) = doc.element_name(element) else {
            return Whitespace::None;
        };
        match (name, point) {
            (
                "html" | "head" | "body" | "pre" | "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6",
                WsPoint::BeforeOpen | WsPoint::AfterClose,
            )
            | ("dl" | "ol" | "ul", _)
            | ("dd" | "dt" | "li", WsPoint::AfterClose) => Whitespace::Newline,
            ("dd" | "dt" | "li", WsPoint::BeforeOpen) => Whitespace::Tab,
            _ => Whitespace::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn answers(policy: &dyn WhitespacePolicy, name: &str) -> [Whitespace; 4] {
        let mut doc = Document::new();
        let id = doc.new_element(None, name).unwrap();
        WsPoint::ALL.map(|point| policy.whitespace(&doc, id, point))
    }

    #[test]
    fn test_no_whitespace() {
        assert_eq!(answers(&NoWhitespace, "p"), [Whitespace::None; 4]);
    }

    #[test]
    fn test_html_block_elements() {
        use Whitespace::{Newline, None};
        for name in ["html", "body", "p", "h3", "pre"] {
            assert_eq!(answers(&HtmlWhitespace, name), [Newline, None, None, Newline]);
        }
    }

    #[test]
    fn test_html_lists() {
        use Whitespace::{Newline, None, Tab};
        assert_eq!(answers(&HtmlWhitespace, "ul"), [Newline; 4]);
        assert_eq!(answers(&HtmlWhitespace, "li"), [Tab, None, None, Newline]);
        assert_eq!(answers(&HtmlWhitespace, "b"), [None; 4]);
    }

    #[test]
    fn test_as_char() {
        assert_eq!(Whitespace::None.as_char(), None);
        assert_eq!(Whitespace::Tab.as_char(), Some('\t'));
        assert_eq!(WsPoint::BeforeClose.to_string(), "before-close");
    }
}
