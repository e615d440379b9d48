//! Value escaping for the locator wire format.
//!
//! A value is written verbatim unless it contains one of the locator's
//! special characters (`,` `:` `(` `)`). Values with balanced parentheses are
//! wrapped in `(...)`; anything else is written as `$base64:` followed by the
//! URL-safe base64 encoding of its UTF-8 bytes.

use std::borrow::Cow;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::error::{LocatorError, Result};

/// Prefix marking a base64-encoded value.
pub const BASE64_PREFIX: &str = "$base64:";

const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Renders a dimension value so that it parses back to exactly `value`.
///
/// ```
/// use waypoint_locator::escape_value;
///
/// assert_eq!(escape_value("plain"), "plain");
/// assert_eq!(escape_value("a,b"), "(a,b)");
/// assert_eq!(escape_value("a)b"), "$base64:YSli");
/// ```
pub fn escape_value(value: &str) -> Cow<'_, str> {
    if !value.contains([',', ':', '(', ')']) {
        return Cow::Borrowed(value);
    }
    if parens_balanced(value) {
        Cow::Owned(format!("({value})"))
    } else {
        Cow::Owned(format!("{BASE64_PREFIX}{}", ENGINE.encode(value)))
    }
}

/// Decodes a raw value token found at byte `offset` of `locator`.
pub(crate) fn unescape_value(raw: &str, locator: &str, offset: usize) -> Result<String> {
    if raw.starts_with('(') && matching_close(raw, 0) == Some(raw.len() - 1) {
        return Ok(raw[1..raw.len() - 1].to_string());
    }
    if let Some(encoded) = raw.strip_prefix(BASE64_PREFIX) {
        let bytes = ENGINE.decode(encoded).map_err(|e| {
            LocatorError::syntax(locator, offset + BASE64_PREFIX.len(), format!("invalid base64 value: {e}"))
        })?;
        return String::from_utf8(bytes).map_err(|_| {
            LocatorError::syntax(locator, offset, "base64 value is not valid UTF-8")
        });
    }
    Ok(raw.to_string())
}

/// Returns the byte index of the `)` closing the `(` at `open`.
pub(crate) fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parens_balanced(text: &str) -> bool {
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}
