//! Saver.
//!
//! Writes a subtree to any [`Write`] sink in document order. The walk follows
//! parent and sibling links, so deep trees do not grow the call stack, and
//! output goes to the sink piece by piece without buffering the whole
//! document.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use tracing::debug;

use crate::error::SaveError;
use crate::tree::{Document, NodeId, NodeKind, NodeType};
use crate::util::entity::{escape_attr, escape_text};

use super::policy::{NoWhitespace, Whitespace, WhitespacePolicy, WsPoint};

/// Default column after which a text token's separator becomes a newline.
const DEFAULT_WRAP: usize = 72;

/// Save options.
///
/// ```
/// use minixml::serial::{HtmlWhitespace, SaveOptions};
///
/// let opts = SaveOptions::default()
///     .whitespace(HtmlWhitespace)
///     .self_close(false)
///     .wrap(None);
/// ```
#[derive(Clone)]
pub struct SaveOptions {
    /// Policy consulted at the four points of every element. `None` adds
    /// no formatting. Whitespace added right before a text token sets that
    /// token's whitespace flag when the output is loaded again.
    pub whitespace: Option<Arc<dyn WhitespacePolicy + Send + Sync>>,
    /// Write childless elements as `<name/>` (default: `true`).
    pub self_close: bool,
    /// Column after which a text token's separating space is written as a
    /// newline (default: `Some(72)`).
    pub wrap: Option<usize>,
}

impl fmt::Debug for SaveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveOptions")
            .field("whitespace", &self.whitespace.as_ref().map(|_| "..."))
            .field("self_close", &self.self_close)
            .field("wrap", &self.wrap)
            .finish()
    }
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            whitespace: None,
            self_close: true,
            wrap: Some(DEFAULT_WRAP),
        }
    }
}

impl SaveOptions {
    /// Sets the whitespace policy.
    #[must_use]
    pub fn whitespace(mut self, policy: impl WhitespacePolicy + Send + Sync + 'static) -> Self {
        self.whitespace = Some(Arc::new(policy));
        self
    }

    /// Enables or disables the `<name/>` form for childless elements.
    #[must_use]
    pub fn self_close(mut self, self_close: bool) -> Self {
        self.self_close = self_close;
        self
    }

    /// Sets the wrap column, or disables wrapping with `None`.
    #[must_use]
    pub fn wrap(mut self, wrap: Option<usize>) -> Self {
        self.wrap = wrap;
        self
    }
}

/// Writes the subtree rooted at `node` to `sink`.
///
/// The output always ends at the start of a line.
///
/// Adjacent text or opaque runs with no whitespace between them are kept
/// apart with an empty comment (`<!---->`), which the loader treats as a
/// token boundary. Several integer or real leaves under one element are
/// written space-separated; the loader reads one number per content run, so
/// such an element does not load back.
///
/// Bytes already handed to the sink stay written if a later write fails.
///
/// # Errors
///
/// Returns `SaveError` if the sink rejects a write.
///
/// # Panics
///
/// Panics if `node` does not belong to `doc`.
pub fn save<W: Write>(
    doc: &Document,
    node: NodeId,
    sink: W,
    options: &SaveOptions,
) -> Result<(), SaveError> {
    debug!(?node, self_close = options.self_close, "saving subtree");
    let policy: &dyn WhitespacePolicy = match &options.whitespace {
        Some(policy) => policy.as_ref(),
        None => &NoWhitespace,
    };
    let mut saver = Saver {
        doc,
        policy,
        options,
        out: Sink::new(sink),
    };
    saver.run(node)?;
    if saver.out.column > 0 {
        saver.out.write_str("\n")?;
    }
    saver.out.flush()?;
    debug!(bytes = saver.out.written, "saved subtree");
    Ok(())
}

/// Saves the subtree rooted at `node` into a `String`.
///
/// # Errors
///
/// Returns `SaveError` if the output is not valid UTF-8, which cannot
/// happen for a tree built through the public API.
pub fn save_to_string(
    doc: &Document,
    node: NodeId,
    options: &SaveOptions,
) -> Result<String, SaveError> {
    let mut buf = Vec::new();
    save(doc, node, &mut buf, options)?;
    String::from_utf8(buf)
        .map_err(|e| SaveError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Sink wrapper that tracks the output column.
struct Sink<W> {
    inner: W,
    column: usize,
    written: usize,
}

impl<W: Write> Sink<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            column: 0,
            written: 0,
        }
    }

    fn write_str(&mut self, s: &str) -> Result<(), SaveError> {
        self.inner.write_all(s.as_bytes())?;
        self.written += s.len();
        match s.rfind('\n') {
            Some(pos) => self.column = s[pos + 1..].chars().count(),
            None => self.column += s.chars().count(),
        }
        Ok(())
    }

    fn write_char(&mut self, c: char) -> Result<(), SaveError> {
        let mut buf = [0u8; 4];
        self.write_str(c.encode_utf8(&mut buf))
    }

    fn flush(&mut self) -> Result<(), SaveError> {
        self.inner.flush()?;
        Ok(())
    }
}

struct Saver<'a, W> {
    doc: &'a Document,
    policy: &'a dyn WhitespacePolicy,
    options: &'a SaveOptions,
    out: Sink<W>,
}

impl<W: Write> Saver<'_, W> {
    // Same pre-order as `Document::walk_next`, climbing by hand so each
    // element's close tag is written on the way back up.
    fn run(&mut self, top: NodeId) -> Result<(), SaveError> {
        let mut node = top;
        loop {
            if self.open(node)? {
                if let Some(child) = self.doc.first_child(node) {
                    node = child;
                    continue;
                }
            }

            // Close finished elements on the way back up, then move to the
            // next sibling. Never climbs above `top`.
            let mut current = node;
            loop {
                if current == top {
                    return Ok(());
                }
                if let Some(next) = self.doc.next_sibling(current) {
                    node = next;
                    break;
                }
                let Some(parent) = self.doc.parent(current) else {
                    return Ok(());
                };
                self.close(parent)?;
                current = parent;
            }
        }
    }

    fn ws(&mut self, element: NodeId, point: WsPoint) -> Result<(), SaveError> {
        match self.policy.whitespace(self.doc, element, point).as_char() {
            Some(c) => self.out.write_char(c),
            None => Ok(()),
        }
    }

    /// Writes a node's opening form. Returns `true` if it is an element with
    /// children still to write; its close tag is then written by `close`.
    fn open(&mut self, id: NodeId) -> Result<bool, SaveError> {
        let doc = self.doc;
        match doc.kind(id) {
            NodeKind::Element { name, attributes } => {
                self.ws(id, WsPoint::BeforeOpen)?;
                let mut tag = String::with_capacity(name.len() + 2);
                tag.push('<');
                tag.push_str(name);
                for attr in attributes {
                    tag.push(' ');
                    tag.push_str(&attr.name);
                    tag.push_str("=\"");
                    escape_attr(&mut tag, &attr.value);
                    tag.push('"');
                }

                if self.doc.first_child(id).is_some() {
                    tag.push('>');
                    self.out.write_str(&tag)?;
                    self.ws(id, WsPoint::AfterOpen)?;
                    return Ok(true);
                }

                if self.options.self_close {
                    tag.push_str("/>");
                    self.out.write_str(&tag)?;
                    self.ws(id, WsPoint::AfterOpen)?;
                    self.ws(id, WsPoint::BeforeClose)?;
                    self.ws(id, WsPoint::AfterClose)?;
                } else {
                    tag.push('>');
                    self.out.write_str(&tag)?;
                    self.ws(id, WsPoint::AfterOpen)?;
                    self.close(id)?;
                }
                Ok(false)
            }
            NodeKind::Integer { value } => {
                self.number_separator(id)?;
                self.out.write_str(&value.to_string())?;
                Ok(false)
            }
            NodeKind::Real { value } => {
                self.number_separator(id)?;
                self.out.write_str(&value.to_string())?;
                Ok(false)
            }
            NodeKind::Opaque { content } => {
                self.token_boundary(id)?;
                self.out.write_str(content)?;
                Ok(false)
            }
            NodeKind::Text {
                whitespace,
                content,
            } => {
                if *whitespace {
                    let wrapped = self.options.wrap.is_some_and(|w| self.out.column > w);
                    self.out.write_char(if wrapped { '\n' } else { ' ' })?;
                } else {
                    self.token_boundary(id)?;
                }
                let mut escaped = String::with_capacity(content.len());
                escape_text(&mut escaped, content);
                self.out.write_str(&escaped)?;
                Ok(false)
            }
        }
    }

    fn close(&mut self, id: NodeId) -> Result<(), SaveError> {
        let doc = self.doc;
        let name = doc.element_name(id).unwrap_or_default();
        self.ws(id, WsPoint::BeforeClose)?;
        self.out.write_str("</")?;
        self.out.write_str(name)?;
        self.out.write_str(">")?;
        self.ws(id, WsPoint::AfterClose)
    }

    /// Text and opaque runs written back to back would merge on reload; an
    /// empty comment keeps them apart without adding whitespace.
    fn token_boundary(&mut self, id: NodeId) -> Result<(), SaveError> {
        let after_run = self.doc.prev_sibling(id).is_some_and(|prev| {
            matches!(
                self.doc.node_type(prev),
                NodeType::Text | NodeType::Opaque
            )
        });
        if after_run {
            self.out.write_str("<!---->")?;
        }
        Ok(())
    }

    /// Numbers written right after another leaf need a space to stay apart.
    fn number_separator(&mut self, id: NodeId) -> Result<(), SaveError> {
        let after_leaf = self
            .doc
            .prev_sibling(id)
            .is_some_and(|prev| self.doc.node_type(prev).is_leaf());
        if after_leaf {
            self.out.write_char(' ')?;
        }
        Ok(())
    }
}
