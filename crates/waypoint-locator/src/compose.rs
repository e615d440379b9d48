//! Helpers for building locator text.

use crate::error::Result;
use crate::locator::Locator;

/// Builds canonical locator text from `(name, value)` pairs.
///
/// Pairs with the same name collapse to the last one. Names are rendered in
/// sorted order and values are escaped, so equivalent pairs always produce
/// the same text.
///
/// ```
/// use waypoint_locator::string_locator;
///
/// assert_eq!(string_locator([("name", "web"), ("id", "7")]), "id:7,name:web");
/// assert_eq!(string_locator([("name", "a,b")]), "name:(a,b)");
/// ```
pub fn string_locator<I, K, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut locator = Locator::empty();
    for (name, value) in pairs {
        locator.set_dimension(name, value);
    }
    locator.to_string()
}

/// Adds `name:value` to a base locator unless it is already there.
///
/// A missing base yields just the new dimension. A base that is a single
/// value, or already has the dimension, is returned unchanged.
///
/// ```
/// use waypoint_locator::set_dimension_if_not_present;
///
/// assert_eq!(set_dimension_if_not_present(None, "count", "10").unwrap(), "count:10");
/// assert_eq!(set_dimension_if_not_present(Some("name:x"), "count", "10").unwrap(), "count:10,name:x");
/// assert_eq!(set_dimension_if_not_present(Some("count:5"), "count", "10").unwrap(), "count:5");
/// assert_eq!(set_dimension_if_not_present(Some("web"), "count", "10").unwrap(), "web");
/// ```
pub fn set_dimension_if_not_present(base: Option<&str>, name: &str, value: &str) -> Result<String> {
    let Some(base) = base else {
        return Ok(string_locator([(name, value)]));
    };
    let mut locator = Locator::parse(base)?;
    if locator.set_dimension_if_absent(name, value) {
        Ok(locator.to_string())
    } else {
        Ok(base.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_locator_escapes_values() {
        assert_eq!(
            string_locator([("branch", "refs/heads/main"), ("property", "name:env")]),
            "branch:refs/heads/main,property:(name:env)"
        );
    }

    #[test]
    fn string_locator_is_order_independent() {
        assert_eq!(
            string_locator([("b", "2"), ("a", "1")]),
            string_locator([("a", "1"), ("b", "2")])
        );
    }

    #[test]
    fn string_locator_empty() {
        assert_eq!(string_locator(Vec::<(&str, &str)>::new()), "");
    }

    #[test]
    fn set_dimension_if_not_present_rejects_bad_base() {
        assert!(set_dimension_if_not_present(Some("a:(1"), "count", "1").is_err());
    }
}
