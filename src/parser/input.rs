//! Sequential character input for the loader.
//!
//! [`ParserInput`] decodes UTF-8 from any [`BufRead`] one character at a
//! time, keeps a single character of lookahead, and tracks the position
//! (line, column, byte offset) used in error messages. It never seeks or
//! rewinds, so the loader works on pipes and sockets as well as files.

use std::io::{BufRead, ErrorKind};

use crate::error::{ParseError, SourceLocation};
use crate::util::entity::is_markup_space;

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 256;

/// Default maximum number of attributes on a single element.
pub(crate) const DEFAULT_MAX_ATTRIBUTES: u32 = 256;

/// Default maximum length (in bytes) of an element or attribute name.
pub(crate) const DEFAULT_MAX_NAME_LENGTH: usize = 50_000;

/// Default maximum length (in bytes) of a content run or attribute value.
pub(crate) const DEFAULT_MAX_TEXT_LENGTH: usize = 10 * 1024 * 1024; // 10 MB

/// Longest entity name accepted between `&` and `;`.
const MAX_ENTITY_NAME: usize = 32;

pub(crate) struct ParserInput<R> {
    reader: R,
    peeked: Option<char>,
    line: u32,
    column: u32,
    byte_offset: usize,
}

impl<R: BufRead> ParserInput<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            peeked: None,
            line: 1,
            column: 1,
            byte_offset: 0,
        }
    }

    /// Returns the location of the next unconsumed character.
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.byte_offset,
        }
    }

    /// Creates a `ParseError` at the current position.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.location())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, ParseError> {
        loop {
            let buf = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ParseError::io(e, self.location())),
            };
            let Some(&byte) = buf.first() else {
                return Ok(None);
            };
            self.reader.consume(1);
            return Ok(Some(byte));
        }
    }

    fn read_char(&mut self) -> Result<Option<char>, ParseError> {
        let Some(lead) = self.read_byte()? else {
            return Ok(None);
        };
        let width = match lead {
            0x00..=0x7F => return Ok(Some(char::from(lead))),
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return Err(self.fatal("invalid UTF-8 in input")),
        };
        let mut bytes = [lead, 0, 0, 0];
        for slot in bytes.iter_mut().take(width).skip(1) {
            *slot = self
                .read_byte()?
                .ok_or_else(|| self.fatal("input truncated inside a UTF-8 sequence"))?;
        }
        std::str::from_utf8(&bytes[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .map(Some)
            .ok_or_else(|| self.fatal("invalid UTF-8 in input"))
    }

    /// Returns the next character without consuming it.
    pub fn peek(&mut self) -> Result<Option<char>, ParseError> {
        if self.peeked.is_none() {
            self.peeked = self.read_char()?;
        }
        Ok(self.peeked)
    }

    /// Consumes and returns the next character, or `None` at end of input.
    pub fn next_char(&mut self) -> Result<Option<char>, ParseError> {
        let ch = match self.peeked.take() {
            Some(c) => Some(c),
            None => self.read_char()?,
        };
        if let Some(c) = ch {
            self.byte_offset += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        Ok(ch)
    }

    /// Consumes the next character, treating end of input as an error.
    pub fn require(&mut self, context: &str) -> Result<char, ParseError> {
        self.next_char()?
            .ok_or_else(|| self.fatal(format!("unexpected end of input {context}")))
    }

    /// Consumes the next character and checks that it is `expected`.
    pub fn expect_char(&mut self, expected: char, context: &str) -> Result<(), ParseError> {
        let ch = self.require(context)?;
        if ch == expected {
            Ok(())
        } else {
            Err(self.fatal(format!("expected '{expected}' {context}, found '{ch}'")))
        }
    }

    /// Skips whitespace. Returns `true` if any was skipped.
    pub fn skip_whitespace(&mut self) -> Result<bool, ParseError> {
        let mut skipped = false;
        while self.peek()?.is_some_and(is_markup_space) {
            self.next_char()?;
            skipped = true;
        }
        Ok(skipped)
    }

    /// Reads the rest of a name whose first character was already consumed.
    ///
    /// Stops before whitespace, `/`, `>`, or `=`.
    pub fn take_name(&mut self, first: char, max_len: usize) -> Result<String, ParseError> {
        let mut name = String::new();
        name.push(first);
        while let Some(c) = self.peek()? {
            if is_markup_space(c) || matches!(c, '/' | '>' | '=') {
                break;
            }
            name.push(c);
            self.next_char()?;
            if name.len() > max_len {
                return Err(self.fatal(format!(
                    "name exceeds maximum length of {max_len} bytes"
                )));
            }
        }
        Ok(name)
    }

    /// Reads an entity name after `&`, consuming the terminating `;`.
    pub fn take_entity_name(&mut self) -> Result<String, ParseError> {
        let mut name = String::new();
        loop {
            match self.require("in entity reference")? {
                ';' => return Ok(name),
                c if is_markup_space(c) || matches!(c, '<' | '&') => {
                    return Err(self.fatal(format!("unterminated entity reference '&{name}'")));
                }
                c => name.push(c),
            }
            if name.len() > MAX_ENTITY_NAME {
                return Err(self.fatal("entity reference name too long"));
            }
        }
    }
}
