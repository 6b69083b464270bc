//! Reserved-character escapes.
//!
//! The loader resolves `&name;` references through an [`EntityTable`]: the
//! built-in names, decimal/hex character references, and any entities the
//! caller registered. The saver escapes with a fixed set so that anything it
//! writes is readable by a loader using the default table.

use std::borrow::Cow;
use std::collections::HashMap;

/// Named entities every loader understands.
const BUILTIN_ENTITIES: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", "\u{A0}"),
];

/// Returns `true` for the characters that separate text tokens.
pub(crate) fn is_markup_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// The set of entity names a loader resolves.
///
/// Custom entries shadow built-ins of the same name.
///
/// # Examples
///
/// ```
/// use minixml::util::entity::EntityTable;
///
/// let mut table = EntityTable::new();
/// table.insert("copy", "\u{A9}");
/// assert_eq!(table.resolve("copy").as_deref(), Some("\u{A9}"));
/// assert_eq!(table.resolve("amp").as_deref(), Some("&"));
/// assert_eq!(table.resolve("#x41").as_deref(), Some("A"));
/// assert_eq!(table.resolve("bogus"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EntityTable {
    custom: HashMap<String, String>,
}

impl EntityTable {
    /// Creates a table holding only the built-in entities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a custom entity.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.custom.insert(name.into(), value.into());
    }

    /// Resolves the text between `&` and `;` to its replacement.
    ///
    /// Handles `#N` and `#xH` character references. Returns `None` for unknown
    /// names and for references to invalid code points.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Cow<'_, str>> {
        if let Some(num) = name.strip_prefix('#') {
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            return char::from_u32(code)
                .filter(|&c| c != '\0')
                .map(|c| Cow::Owned(c.to_string()));
        }
        if let Some(value) = self.custom.get(name) {
            return Some(Cow::Borrowed(value.as_str()));
        }
        BUILTIN_ENTITIES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| Cow::Borrowed(*v))
    }
}

/// Escapes one text token for output.
///
/// `&`, `<` and `>` use named references. Token-separating whitespace inside
/// the token is written as a character reference so the token is not split
/// when read back.
pub(crate) fn escape_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c if is_markup_space(c) => push_char_ref(out, c),
            c => out.push(c),
        }
    }
}

/// Escapes an attribute value for output inside double quotes.
pub(crate) fn escape_attr(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' | '\n' | '\r' => push_char_ref(out, ch),
            c => out.push(c),
        }
    }
}

fn push_char_ref(out: &mut String, ch: char) {
    out.push_str("&#");
    out.push_str(&(ch as u32).to_string());
    out.push(';');
}
