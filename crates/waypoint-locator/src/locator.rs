//! The [`Locator`] type: a parsed, consumable query.
//!
//! Reading a dimension through one of the accessor methods marks it as
//! consumed. Once a consumer is done it calls
//! [`check_fully_processed`](Locator::check_fully_processed) so that typos and
//! unsupported dimensions surface as errors instead of being silently ignored.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{LocatorError, Result};
use crate::escape::escape_value;
use crate::parser::{self, Parsed};

/// Value accepted by boolean dimensions to mean "either".
pub const ANY_VALUE: &str = "$any";

/// A parsed locator.
///
/// A locator is either a single unnamed value (`MyProject`) or a list of
/// `name:value` dimensions (`project:MyProject,count:10`).
///
/// # Example
///
/// ```
/// use waypoint_locator::Locator;
///
/// let mut locator = Locator::parse("name:web,count:5").unwrap();
/// assert_eq!(locator.single_dimension_value("name").as_deref(), Some("web"));
/// assert_eq!(locator.single_dimension_value_as_long("count").unwrap(), Some(5));
/// assert!(locator.check_fully_processed().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    raw: String,
    single_value: Option<String>,
    dimensions: BTreeMap<String, Vec<String>>,
    used: BTreeSet<String>,
    single_value_used: bool,
    supported: BTreeSet<String>,
    ignored: BTreeSet<String>,
    hidden: BTreeSet<String>,
}

impl Locator {
    /// Parses locator text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut locator = Self::empty();
        locator.raw = text.to_string();
        match parser::parse(text)? {
            Parsed::SingleValue(value) => locator.single_value = Some(value),
            Parsed::Dimensions(pairs) => {
                for (name, value) in pairs {
                    locator.dimensions.entry(name).or_default().push(value);
                }
            }
        }
        Ok(locator)
    }

    /// Creates a locator with no dimensions, to be filled with
    /// [`set_dimension`](Self::set_dimension).
    pub fn empty() -> Self {
        Self {
            raw: String::new(),
            single_value: None,
            dimensions: BTreeMap::new(),
            used: BTreeSet::new(),
            single_value_used: false,
            supported: BTreeSet::new(),
            ignored: BTreeSet::new(),
            hidden: BTreeSet::new(),
        }
    }

    /// Returns the text this locator was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns `true` if the locator is a single unnamed value.
    pub fn is_single_value(&self) -> bool {
        self.single_value.is_some()
    }

    /// Returns `true` if the locator has neither a single value nor dimensions.
    pub fn is_empty(&self) -> bool {
        self.single_value.is_none() && self.dimensions.is_empty()
    }

    /// Returns the single value and marks it consumed.
    pub fn single_value(&mut self) -> Option<String> {
        let value = self.single_value.clone()?;
        self.single_value_used = true;
        Some(value)
    }

    /// Number of distinct dimension names present.
    pub fn dimensions_count(&self) -> usize {
        self.dimensions.len()
    }

    /// Names of the dimensions present, sorted.
    pub fn dimension_names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.keys().map(String::as_str)
    }

    /// Returns `true` if the dimension is present. Does not consume it.
    pub fn is_dimension_present(&self, name: &str) -> bool {
        self.dimensions.contains_key(name)
    }

    /// Number of values given for a dimension. Does not consume it.
    pub fn dimension_value_count(&self, name: &str) -> usize {
        self.dimensions.get(name).map_or(0, Vec::len)
    }

    // ========================================================================
    // Consuming accessors
    // ========================================================================

    /// Returns the value of a dimension, the last one if it was repeated.
    pub fn single_dimension_value(&mut self, name: &str) -> Option<String> {
        let value = self.dimensions.get(name)?.last()?.clone();
        self.used.insert(name.to_string());
        Some(value)
    }

    /// Returns every value given for a dimension, in text order.
    pub fn dimension_values(&mut self, name: &str) -> Vec<String> {
        match self.dimensions.get(name) {
            Some(values) => {
                self.used.insert(name.to_string());
                values.clone()
            }
            None => Vec::new(),
        }
    }

    /// Returns a dimension value parsed as a whole number.
    pub fn single_dimension_value_as_long(&mut self, name: &str) -> Result<Option<i64>> {
        self.single_dimension_value(name)
            .map(|value| parse_long(name, &value))
            .transpose()
    }

    /// Like [`single_dimension_value_as_long`](Self::single_dimension_value_as_long)
    /// with a fallback for an absent dimension.
    pub fn single_dimension_value_as_long_or(&mut self, name: &str, default: i64) -> Result<i64> {
        Ok(self.single_dimension_value_as_long(name)?.unwrap_or(default))
    }

    /// Returns a dimension value parsed as a boolean.
    ///
    /// `Ok(None)` means the dimension is absent or was given as `any`.
    pub fn single_dimension_value_as_bool(&mut self, name: &str) -> Result<Option<bool>> {
        match self.single_dimension_value(name) {
            Some(value) => parse_boolean(name, &value),
            None => Ok(None),
        }
    }

    /// Like [`single_dimension_value_as_bool`](Self::single_dimension_value_as_bool)
    /// with a fallback for an absent dimension. `any` still yields `None`.
    pub fn single_dimension_value_as_bool_or(
        &mut self,
        name: &str,
        default: bool,
    ) -> Result<Option<bool>> {
        if self.is_dimension_present(name) {
            self.single_dimension_value_as_bool(name)
        } else {
            Ok(Some(default))
        }
    }

    /// Parses a dimension value as a nested locator.
    pub fn dimension_locator(&mut self, name: &str) -> Result<Option<Locator>> {
        self.single_dimension_value(name)
            .map(|value| Locator::parse(&value))
            .transpose()
    }

    /// Marks dimensions as consumed without reading them.
    pub fn mark_used<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.used.extend(names.into_iter().map(Into::into));
    }

    /// Reverts consumption, e.g. after a fast path attempt that did not match.
    pub fn mark_unused<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.used.remove(name.as_ref());
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Declares dimensions the consumer understands (used in error messages).
    pub fn add_supported_dimensions<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported.extend(names.into_iter().map(Into::into));
    }

    /// Declares dimensions that are never reported as unused.
    pub fn add_ignore_unused_dimensions<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.extend(names.into_iter().map(Into::into));
    }

    /// Declares internally injected dimensions: never reported as unused and
    /// omitted from the rendered text.
    pub fn add_hidden_dimensions<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden.extend(names.into_iter().map(Into::into));
    }

    /// Replaces all values of a dimension.
    ///
    /// Setting a dimension on a single value locator turns it into a
    /// dimension locator; the single value is dropped.
    pub fn set_dimension(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.single_value = None;
        self.dimensions.insert(name.into(), vec![value.into()]);
    }

    /// Sets a dimension only if it is absent and this is not a single value
    /// locator. Returns `true` if the dimension was set.
    pub fn set_dimension_if_absent(&mut self, name: &str, value: impl Into<String>) -> bool {
        if self.is_single_value() || self.is_dimension_present(name) {
            return false;
        }
        self.dimensions.insert(name.to_string(), vec![value.into()]);
        true
    }

    /// Removes a dimension, returning its values.
    pub fn remove_dimension(&mut self, name: &str) -> Option<Vec<String>> {
        self.used.remove(name);
        self.dimensions.remove(name)
    }

    /// Turns a single value locator into `name:<value>`.
    ///
    /// Returns `false` (and changes nothing) if this is not a single value
    /// locator.
    pub fn single_value_to_dimension(&mut self, name: &str) -> bool {
        match self.single_value.take() {
            Some(value) => {
                self.single_value_used = false;
                self.dimensions.insert(name.to_string(), vec![value]);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Dimensions present but neither consumed, ignorable nor hidden.
    pub fn unused_dimensions(&self) -> Vec<String> {
        self.dimensions
            .keys()
            .filter(|name| {
                !self.used.contains(*name)
                    && !self.ignored.contains(*name)
                    && !self.hidden.contains(*name)
            })
            .cloned()
            .collect()
    }

    /// Fails if any part of the locator was not consumed.
    pub fn check_fully_processed(&self) -> Result<()> {
        if self.is_single_value() && !self.single_value_used {
            return Err(LocatorError::UnsupportedSingleValue {
                locator: self.to_string(),
                supported: self.supported_list(),
            });
        }
        let unused = self.unused_dimensions();
        if unused.is_empty() {
            Ok(())
        } else {
            Err(LocatorError::UnusedDimensions {
                locator: self.to_string(),
                names: unused,
                supported: self.supported_list(),
            })
        }
    }

    fn supported_list(&self) -> Vec<String> {
        self.supported
            .iter()
            .filter(|name| !self.hidden.contains(*name))
            .cloned()
            .collect()
    }
}

impl fmt::Display for Locator {
    /// Writes the canonical text: names sorted, values escaped, hidden
    /// dimensions omitted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(value) = &self.single_value {
            return if value.is_empty() {
                f.write_str("()")
            } else {
                f.write_str(&escape_value(value))
            };
        }
        let mut first = true;
        for (name, values) in &self.dimensions {
            if self.hidden.contains(name) {
                continue;
            }
            for value in values {
                if !first {
                    f.write_str(",")?;
                }
                first = false;
                write!(f, "{name}:{}", escape_value(value))?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Locator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self> {
        Locator::parse(s)
    }
}

/// Parses a whole number the way long-valued dimensions do.
pub fn parse_long(dimension: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| LocatorError::invalid_value(dimension, value, "a whole number"))
}

/// Parses a boolean the way boolean dimensions do.
///
/// Accepts `true/yes/on`, `false/no/off` and `any`/`$any` (returned as
/// `None`), case-insensitively.
pub fn parse_boolean(dimension: &str, value: &str) -> Result<Option<bool>> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(Some(true)),
        "false" | "no" | "off" => Ok(Some(false)),
        "any" | ANY_VALUE => Ok(None),
        _ => Err(LocatorError::invalid_value(
            dimension,
            value,
            "one of true, false, any",
        )),
    }
}
