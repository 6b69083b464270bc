//! Core loader state machine.
//!
//! Reads the input once, front to back. Open elements are kept on an
//! explicit stack (no recursion), each paired with the leaf type its
//! classifier chose. Character content is buffered until the next `<` or
//! end of input and then turned into leaves according to that type.

use std::collections::HashSet;
use std::io::BufRead;
use std::mem;

use crate::error::ParseError;
use crate::tree::{validate_name, Attribute, Document, NodeId};
use crate::util::entity::is_markup_space;

use super::input::ParserInput;
use super::{LeafType, ParseOptions};

/// An element whose close tag has not been seen yet.
struct OpenElement {
    id: NodeId,
    leaf_type: LeafType,
}

/// Content read since the last tag.
#[derive(Default)]
struct Pending {
    /// Raw run for Integer, Real, and Opaque content.
    run: String,
    /// Current token for Text content.
    token: String,
    /// Whether whitespace preceded `token`.
    token_ws: bool,
    /// Whether whitespace has been seen since the last token or tag.
    saw_ws: bool,
}

pub(crate) struct Loader<'a, R> {
    input: ParserInput<R>,
    doc: &'a mut Document,
    options: &'a ParseOptions,
    /// Existing element that top-level content is attached to, if any.
    top: Option<(NodeId, LeafType)>,
    stack: Vec<OpenElement>,
    /// Top-level nodes created by this load, in document order.
    added: Vec<NodeId>,
    pending: Pending,
}

impl<'a, R: BufRead> Loader<'a, R> {
    pub fn new(
        reader: R,
        doc: &'a mut Document,
        top: Option<NodeId>,
        options: &'a ParseOptions,
    ) -> Self {
        let top = top.map(|id| (id, options.classify(doc, id)));
        Self {
            input: ParserInput::new(reader),
            doc,
            options,
            top,
            stack: Vec::new(),
            added: Vec::new(),
            pending: Pending::default(),
        }
    }

    /// Runs the loader to completion.
    ///
    /// On success returns the top-level nodes that were created. On failure
    /// deletes them again before returning the error.
    pub fn run(mut self) -> Result<Vec<NodeId>, ParseError> {
        match self.parse() {
            Ok(()) => Ok(mem::take(&mut self.added)),
            Err(err) => {
                for id in mem::take(&mut self.added) {
                    self.doc.delete(id);
                }
                Err(err)
            }
        }
    }

    fn parse(&mut self) -> Result<(), ParseError> {
        if self.input.peek()? == Some('\u{FEFF}') {
            self.input.next_char()?;
        }

        while let Some(ch) = self.input.next_char()? {
            if ch == '<' {
                self.flush_content()?;
                self.parse_markup()?;
            } else {
                self.content_char(ch)?;
            }
        }
        self.flush_content()?;

        if let Some(open) = self.stack.last() {
            let name = self.doc.element_name(open.id).unwrap_or_default();
            return Err(self.input.fatal(format!("unterminated element <{name}>")));
        }
        if self.top.is_none() && self.added.is_empty() {
            return Err(self.input.fatal("no root element"));
        }
        Ok(())
    }

    /// The element receiving content right now, with its leaf type.
    fn current(&self) -> Option<(NodeId, LeafType)> {
        self.stack
            .last()
            .map(|open| (open.id, open.leaf_type))
            .or(self.top)
    }

    // --- Content ---

    fn content_char(&mut self, ch: char) -> Result<(), ParseError> {
        let Some((parent, leaf_type)) = self.current() else {
            if is_markup_space(ch) {
                return Ok(());
            }
            return Err(self.input.fatal("content outside of the root element"));
        };

        if leaf_type != LeafType::Text {
            self.pending.run.push(ch);
            return self.check_text_length(self.pending.run.len());
        }

        if is_markup_space(ch) {
            self.emit_token(parent)?;
            self.pending.saw_ws = true;
            return Ok(());
        }
        if self.pending.token.is_empty() {
            self.pending.token_ws = self.pending.saw_ws;
        }
        if ch == '&' {
            let decoded = self.parse_entity()?;
            self.pending.token.push_str(&decoded);
        } else {
            self.pending.token.push(ch);
        }
        self.check_text_length(self.pending.token.len())
    }

    fn emit_token(&mut self, parent: NodeId) -> Result<(), ParseError> {
        if self.pending.token.is_empty() {
            return Ok(());
        }
        let token = mem::take(&mut self.pending.token);
        let id = self
            .doc
            .new_text(Some(parent), self.pending.token_ws, &token)
            .map_err(|e| self.input.fatal(e.to_string()))?;
        self.track(parent, id);
        Ok(())
    }

    /// Turns buffered content into leaves of the current element.
    fn flush_content(&mut self) -> Result<(), ParseError> {
        let Some((parent, leaf_type)) = self.current() else {
            self.pending = Pending::default();
            return Ok(());
        };

        if leaf_type == LeafType::Text {
            self.emit_token(parent)?;
            self.pending.saw_ws = false;
            return Ok(());
        }

        let run = mem::take(&mut self.pending.run);
        let created = match leaf_type {
            LeafType::Opaque if run.is_empty() => return Ok(()),
            LeafType::Opaque => self.doc.new_opaque(Some(parent), &run),
            numeric => {
                let trimmed = run.trim_matches(is_markup_space);
                if trimmed.is_empty() {
                    return Ok(());
                }
                if numeric == LeafType::Integer {
                    let value = trimmed.parse::<i64>().map_err(|_| {
                        self.input
                            .fatal(format!("invalid integer value '{trimmed}'"))
                    })?;
                    self.doc.new_integer(Some(parent), value)
                } else {
                    let value = trimmed.parse::<f64>().map_err(|_| {
                        self.input.fatal(format!("invalid real value '{trimmed}'"))
                    })?;
                    self.doc.new_real(Some(parent), value)
                }
            }
        };
        let id = created.map_err(|e| self.input.fatal(e.to_string()))?;
        self.track(parent, id);
        Ok(())
    }

    /// Records nodes attached directly under the load target.
    fn track(&mut self, parent: NodeId, id: NodeId) {
        if self.stack.is_empty() && self.top.is_some_and(|(top, _)| top == parent) {
            self.added.push(id);
        }
    }

    fn check_text_length(&self, len: usize) -> Result<(), ParseError> {
        if len > self.options.max_text_length {
            return Err(self.input.fatal(format!(
                "content exceeds maximum length of {} bytes",
                self.options.max_text_length
            )));
        }
        Ok(())
    }

    fn parse_entity(&mut self) -> Result<String, ParseError> {
        let name = self.input.take_entity_name()?;
        match self.options.entities.resolve(&name) {
            Some(value) => Ok(value.into_owned()),
            None => Err(self.input.fatal(format!("unknown entity '&{name};'"))),
        }
    }

    // --- Markup ---

    /// Parses whatever follows a `<`.
    fn parse_markup(&mut self) -> Result<(), ParseError> {
        match self.input.require("after '<'")? {
            '!' => self.parse_bang(),
            '?' => self.skip_processing_instruction(),
            '/' => self.parse_close_tag(),
            c if is_markup_space(c) => Err(self.input.fatal("whitespace after '<'")),
            c => self.parse_open_tag(c),
        }
    }

    /// Skips a comment (`<!-- ... -->`) or a declaration such as `<!DOCTYPE ...>`.
    ///
    /// `<![CDATA[...]]>` sections are rejected rather than skipped, since
    /// skipping would drop their content.
    fn parse_bang(&mut self) -> Result<(), ParseError> {
        match self.input.peek()? {
            Some('-') => {}
            Some('[') => return Err(self.input.fatal("CDATA sections are not supported")),
            _ => return self.skip_declaration(),
        }
        self.input.next_char()?;
        self.input.expect_char('-', "in comment opener")?;

        // Comments do not nest: the first `-->` ends the comment.
        let mut dashes = 0u32;
        loop {
            match self.input.require("in comment")? {
                '-' => dashes += 1,
                '>' if dashes >= 2 => return Ok(()),
                _ => dashes = 0,
            }
        }
    }

    fn skip_declaration(&mut self) -> Result<(), ParseError> {
        let mut quote: Option<char> = None;
        let mut brackets = 0u32;
        loop {
            let c = self.input.require("in declaration")?;
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '[') => brackets += 1,
                (None, ']') => brackets = brackets.saturating_sub(1),
                (None, '>') if brackets == 0 => return Ok(()),
                _ => {}
            }
        }
    }

    fn skip_processing_instruction(&mut self) -> Result<(), ParseError> {
        let mut prev = '\0';
        loop {
            let c = self.input.require("in processing instruction")?;
            if prev == '?' && c == '>' {
                return Ok(());
            }
            prev = c;
        }
    }

    fn parse_tag_name(&mut self, first: char) -> Result<String, ParseError> {
        let name = self.input.take_name(first, self.options.max_name_length)?;
        validate_name(&name).map_err(|e| self.input.fatal(e.to_string()))?;
        Ok(name)
    }

    fn parse_open_tag(&mut self, first: char) -> Result<(), ParseError> {
        let name = self.parse_tag_name(first)?;
        let context = format!("in tag <{name}>");

        let mut attributes: Vec<Attribute> = Vec::new();
        let mut seen = HashSet::new();
        let self_closing = loop {
            let had_ws = self.input.skip_whitespace()?;
            match self.input.peek()? {
                None => return Err(self.input.fatal(format!("unexpected end of input {context}"))),
                Some('>') => {
                    self.input.next_char()?;
                    break false;
                }
                Some('/') => {
                    self.input.next_char()?;
                    self.input.expect_char('>', &context)?;
                    break true;
                }
                Some(_) if !had_ws => {
                    return Err(self
                        .input
                        .fatal(format!("whitespace required between attributes {context}")));
                }
                Some(c) => {
                    self.input.next_char()?;
                    let attr = self.parse_attribute(c, &context)?;
                    if !seen.insert(attr.name.clone()) {
                        return Err(self
                            .input
                            .fatal(format!("duplicate attribute '{}' {context}", attr.name)));
                    }
                    if attributes.len() >= self.options.max_attributes as usize {
                        return Err(self.input.fatal(format!(
                            "too many attributes {context} (maximum {})",
                            self.options.max_attributes
                        )));
                    }
                    attributes.push(attr);
                }
            }
        };

        if self.stack.len() >= self.options.max_depth as usize {
            return Err(self.input.fatal(format!(
                "maximum nesting depth of {} exceeded",
                self.options.max_depth
            )));
        }

        let parent = self.current().map(|(id, _)| id);
        if parent.is_none() && !self.added.is_empty() {
            return Err(self
                .input
                .fatal(format!("multiple root elements: unexpected <{name}>")));
        }

        let id = self
            .doc
            .new_element(parent, &name)
            .map_err(|e| self.input.fatal(e.to_string()))?;
        match parent {
            Some(parent) => self.track(parent, id),
            None => self.added.push(id),
        }
        for attr in &attributes {
            self.doc
                .set_attribute(id, &attr.name, &attr.value)
                .map_err(|e| self.input.fatal(e.to_string()))?;
        }

        let leaf_type = self.options.classify(self.doc, id);
        if !self_closing {
            self.stack.push(OpenElement { id, leaf_type });
        }
        Ok(())
    }

    fn parse_attribute(&mut self, first: char, context: &str) -> Result<Attribute, ParseError> {
        let name = self.parse_tag_name(first)?;
        self.input.skip_whitespace()?;
        if self.input.peek()? != Some('=') {
            return Err(self
                .input
                .fatal(format!("attribute '{name}' has no value {context}")));
        }
        self.input.next_char()?;
        self.input.skip_whitespace()?;

        let quote = self.input.require(context)?;
        if quote != '"' && quote != '\'' {
            return Err(self
                .input
                .fatal(format!("value of attribute '{name}' must be quoted {context}")));
        }

        let mut value = String::new();
        loop {
            match self.input.require("in attribute value")? {
                c if c == quote => break,
                '<' => {
                    return Err(self
                        .input
                        .fatal(format!("'<' in value of attribute '{name}'")));
                }
                '&' => {
                    let decoded = self.parse_entity()?;
                    value.push_str(&decoded);
                }
                c => value.push(c),
            }
            self.check_text_length(value.len())?;
        }
        Ok(Attribute { name, value })
    }

    fn parse_close_tag(&mut self) -> Result<(), ParseError> {
        let first = self.input.require("in close tag")?;
        let name = self.parse_tag_name(first)?;
        self.input.skip_whitespace()?;
        self.input.expect_char('>', &format!("in close tag </{name}>"))?;

        let Some(open) = self.stack.pop() else {
            return Err(self
                .input
                .fatal(format!("unexpected close tag </{name}>")));
        };
        let open_name = self.doc.element_name(open.id).unwrap_or_default();
        if open_name != name {
            return Err(self.input.fatal(format!(
                "mismatched close tag </{name}>, expected </{open_name}>"
            )));
        }
        Ok(())
    }
}
