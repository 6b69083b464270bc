//! Byte input decoding.
//!
//! The loader itself reads UTF-8. [`decode_to_utf8`] turns raw bytes in any
//! encoding `encoding_rs` knows into UTF-8 first:
//!
//! 1. A byte order mark selects UTF-8, UTF-16BE or UTF-16LE and is dropped.
//! 2. Without one the input is taken as UTF-8.
//! 3. An `encoding="..."` in a leading `<?xml ...?>` declaration overrides
//!    the guess when it names a different encoding.

use encoding_rs::Encoding;
use thiserror::Error;

/// Byte input that could not be turned into UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("unsupported encoding '{0}'")]
    Unsupported(String),
    #[error("malformed byte sequence for encoding {0}")]
    Malformed(&'static str),
}

/// Sniffs a byte order mark.
///
/// Returns the encoding it selects and the number of bytes it occupies. No
/// BOM means UTF-8 and zero bytes.
///
/// ```
/// use minixml::encoding::detect_encoding;
///
/// assert_eq!(detect_encoding(b"\xEF\xBB\xBF<a/>"), (encoding_rs::UTF_8, 3));
/// assert_eq!(detect_encoding(b"\xFF\xFE<\x00"), (encoding_rs::UTF_16LE, 2));
/// assert_eq!(detect_encoding(b"<a/>"), (encoding_rs::UTF_8, 0));
/// ```
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> (&'static Encoding, usize) {
    match Encoding::for_bom(bytes) {
        Some((encoding, len)) => (encoding, len),
        None => (encoding_rs::UTF_8, 0),
    }
}

/// Decodes `bytes` from the encoding named by `label` (case-insensitive).
///
/// # Errors
///
/// Returns `EncodingError` if the label is unknown or the bytes are not
/// valid in that encoding.
pub fn transcode(bytes: &[u8], label: &str) -> Result<String, EncodingError> {
    decode_with(bytes, lookup(label.to_string())?)
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> Result<String, EncodingError> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(EncodingError::Malformed(encoding.name()));
    }
    Ok(text.into_owned())
}

/// Decodes raw markup bytes into UTF-8, detecting the encoding.
///
/// # Errors
///
/// Returns `EncodingError` if a declared encoding is unsupported or the
/// bytes are malformed for the encoding in effect.
///
/// ```
/// use minixml::encoding::decode_to_utf8;
///
/// let latin1 = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><p>caf\xE9</p>";
/// assert!(decode_to_utf8(latin1).unwrap().ends_with("<p>caf\u{e9}</p>"));
/// ```
pub fn decode_to_utf8(bytes: &[u8]) -> Result<String, EncodingError> {
    let (bom_encoding, bom_len) = detect_encoding(bytes);
    let content = &bytes[bom_len..];

    // The declaration is ASCII in every ASCII-compatible encoding, so it can
    // be read before decoding. UTF-16 input is decoded first.
    if bom_encoding == encoding_rs::UTF_8 {
        let encoding = match declared_encoding(content) {
            // UTF-16 cannot be declared from inside ASCII-compatible bytes.
            Some(declared) => Some(lookup(declared)?).filter(|e| !is_utf16(e)),
            None => None,
        };
        return decode_with(content, encoding.unwrap_or(encoding_rs::UTF_8));
    }

    let text = decode_with(content, bom_encoding)?;
    if let Some(declared) = declared_encoding(text.as_bytes()) {
        // "UTF-16" names the family; the BOM picks the byte order.
        let encoding = lookup(declared)?;
        if !is_utf16(encoding) {
            return decode_with(content, encoding);
        }
    }
    Ok(text)
}

fn lookup(label: String) -> Result<&'static Encoding, EncodingError> {
    Encoding::for_label(label.as_bytes()).ok_or(EncodingError::Unsupported(label))
}

fn is_utf16(encoding: &Encoding) -> bool {
    encoding == encoding_rs::UTF_16LE || encoding == encoding_rs::UTF_16BE
}

/// Reads the `encoding` pseudo-attribute of a leading `<?xml ...?>`.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let scan = &bytes[..bytes.len().min(200)];
    if !scan.starts_with(b"<?xml") {
        return None;
    }
    let end = scan.windows(2).position(|w| w == b"?>")?;
    let decl = &scan[..end];

    let needle = b"encoding";
    let pos = decl.windows(needle.len()).position(|w| w == needle)?;
    let rest = skip_space(&decl[pos + needle.len()..]);
    let rest = skip_space(rest.strip_prefix(b"=")?);

    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let len = rest.iter().position(|&b| b == quote)?;
    let label = &rest[..len];
    label
        .is_ascii()
        .then(|| String::from_utf8_lossy(label).into_owned())
}

fn skip_space(bytes: &[u8]) -> &[u8] {
    let n = bytes
        .iter()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .count();
    &bytes[n..]
}
