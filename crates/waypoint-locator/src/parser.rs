//! Tokenizer for locator text.
//!
//! The parser works on the top level of the text only: parentheses open a
//! nested region whose content is kept verbatim, so nested locators are
//! parsed lazily when a dimension asks for them.

use crate::error::{LocatorError, Result};
use crate::escape::{unescape_value, BASE64_PREFIX};

/// Outcome of parsing locator text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Parsed {
    /// The whole text is one unnamed value.
    SingleValue(String),
    /// `name:value` pairs in text order; names may repeat.
    Dimensions(Vec<(String, String)>),
}

/// Checks if a string is a valid dimension name.
///
/// Pattern: `[A-Za-z0-9_.$-]+`
pub fn is_valid_dimension_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$' | '-'))
}

pub(crate) fn parse(input: &str) -> Result<Parsed> {
    if input.is_empty() {
        return Err(LocatorError::Empty);
    }

    let parts = split_top_level(input)?;

    if let [(offset, part)] = parts.as_slice() {
        let is_base64 = part.starts_with(BASE64_PREFIX);
        if is_base64 || find_top_level_colon(part).is_none() {
            return Ok(Parsed::SingleValue(unescape_value(part, input, *offset)?));
        }
    }

    let mut dimensions = Vec::with_capacity(parts.len());
    for (offset, part) in parts {
        if part.is_empty() {
            return Err(LocatorError::syntax(input, offset, "empty dimension"));
        }
        let Some(colon) = find_top_level_colon(part) else {
            return Err(LocatorError::syntax(
                input,
                offset,
                format!("dimension '{part}' has no value; expected 'name:value'"),
            ));
        };
        let name = &part[..colon];
        if !is_valid_dimension_name(name) {
            return Err(LocatorError::syntax(
                input,
                offset,
                format!("invalid dimension name '{name}'"),
            ));
        }
        let value_offset = offset + colon + 1;
        let value = unescape_value(&part[colon + 1..], input, value_offset)?;
        dimensions.push((name.to_string(), value));
    }

    Ok(Parsed::Dimensions(dimensions))
}

/// Splits on top-level commas, validating parenthesis balance.
fn split_top_level(input: &str) -> Result<Vec<(usize, &str)>> {
    let mut parts = Vec::new();
    let mut open_positions: Vec<usize> = Vec::new();
    let mut part_start = 0;

    for (i, c) in input.char_indices() {
        match c {
            '(' => open_positions.push(i),
            ')' => {
                if open_positions.pop().is_none() {
                    return Err(LocatorError::syntax(input, i, "unmatched ')'"));
                }
            }
            ',' if open_positions.is_empty() => {
                parts.push((part_start, &input[part_start..i]));
                part_start = i + 1;
            }
            _ => {}
        }
    }

    if let Some(&open) = open_positions.last() {
        return Err(LocatorError::syntax(input, open, "unclosed '('"));
    }

    parts.push((part_start, &input[part_start..]));
    Ok(parts)
}

fn find_top_level_colon(part: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in part.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}
