//! Typed dimension descriptors and the reserved dimension names.
//!
//! A [`Dimension`] names a locator dimension and knows how to parse its raw
//! value. Descriptors are plain values: define them once and register the
//! same descriptor with as many finders as need it.
//!
//! ```
//! use waypoint_finder::Dimension;
//!
//! let number = Dimension::long("number").description("build number");
//! assert_eq!(number.parse("42").unwrap(), 42);
//! assert!(number.parse("forty-two").is_err());
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use waypoint_locator::{parse_boolean, parse_long, Locator, LocatorError};

use crate::condition::{ParameterCondition, ValueCondition};

// ============================================================================
// Reserved names
// ============================================================================

/// Unique identifier dimension, conventionally a key dimension.
pub const ID: &str = "id";
/// Number of matching items to skip.
pub const START: &str = "start";
/// Page size.
pub const COUNT: &str = "count";
/// Scan budget: the maximum number of candidates examined.
pub const LOOKUP_LIMIT: &str = "lookupLimit";
/// Paging dimensions, read by every finder.
pub const PAGING: [&str; 3] = [START, COUNT, LOOKUP_LIMIT];

/// Every nested locator must match.
pub const AND: &str = "and";
/// At least one dimension of the nested locator must match.
pub const OR: &str = "or";
/// The nested locator must not match.
pub const NOT: &str = "not";
/// Logic dimensions, read by finders that enable them.
pub const LOGIC: [&str; 3] = [AND, OR, NOT];

/// Parser from raw dimension text to a typed value.
pub type ParseFn<V> = Arc<dyn Fn(&str) -> Result<V, LocatorError> + Send + Sync>;

/// A named, typed locator dimension.
pub struct Dimension<V> {
    name: String,
    parser: ParseFn<V>,
    description: Option<String>,
    hidden: bool,
}

impl<V> Dimension<V> {
    /// Creates a dimension with a custom parser.
    pub fn new(
        name: impl Into<String>,
        parser: impl Fn(&str) -> Result<V, LocatorError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            parser: Arc::new(parser),
            description: None,
            hidden: false,
        }
    }

    /// Sets a human readable description.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Leaves the dimension out of the supported dimensions listed in
    /// error messages.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// The dimension name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The description, if set.
    pub fn describe(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the dimension is hidden.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Parses a raw value.
    pub fn parse(&self, value: &str) -> Result<V, LocatorError> {
        (self.parser)(value)
    }

    pub(crate) fn parser(&self) -> ParseFn<V> {
        Arc::clone(&self.parser)
    }
}

impl Dimension<String> {
    /// A dimension taking its raw value as is.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, |value| Ok(value.to_string()))
    }
}

impl Dimension<i64> {
    /// A whole number dimension.
    pub fn long(name: impl Into<String>) -> Self {
        let name = name.into();
        let dimension = name.clone();
        Self::new(name, move |value| parse_long(&dimension, value))
    }
}

impl Dimension<Option<bool>> {
    /// A boolean dimension; `any` parses to `None`.
    pub fn boolean(name: impl Into<String>) -> Self {
        let name = name.into();
        let dimension = name.clone();
        Self::new(name, move |value| parse_boolean(&dimension, value))
    }
}

impl Dimension<Locator> {
    /// A dimension whose value is a nested locator, typically resolved by
    /// another finder.
    pub fn locator(name: impl Into<String>) -> Self {
        Self::new(name, Locator::parse)
    }
}

impl Dimension<ValueCondition> {
    /// A dimension whose value is a [`ValueCondition`].
    pub fn value_condition(name: impl Into<String>) -> Self {
        Self::new(name, ValueCondition::parse)
    }
}

impl Dimension<ParameterCondition> {
    /// A dimension whose value is a [`ParameterCondition`].
    pub fn parameter_condition(name: impl Into<String>) -> Self {
        Self::new(name, ParameterCondition::parse)
    }
}

impl<V: FromStr> Dimension<V> {
    /// A dimension parsed with [`FromStr`]; `expected` describes valid
    /// values in error messages.
    pub fn parsed(name: impl Into<String>, expected: impl Into<String>) -> Self {
        let name = name.into();
        let dimension = name.clone();
        let expected = expected.into();
        Self::new(name, move |value| {
            value
                .parse::<V>()
                .map_err(|_| LocatorError::invalid_value(&dimension, value, &expected))
        })
    }
}

impl<V> Clone for Dimension<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            parser: Arc::clone(&self.parser),
            description: self.description.clone(),
            hidden: self.hidden,
        }
    }
}

impl<V> fmt::Debug for Dimension<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dimension")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_type::MatchType;

    #[derive(Debug, PartialEq)]
    enum State {
        Queued,
        Running,
    }

    impl FromStr for State {
        type Err = ();

        fn from_str(s: &str) -> Result<Self, ()> {
            match s {
                "queued" => Ok(State::Queued),
                "running" => Ok(State::Running),
                _ => Err(()),
            }
        }
    }

    #[test]
    fn typed_parsers() {
        assert_eq!(Dimension::string("name").parse("a:b").unwrap(), "a:b");
        assert_eq!(Dimension::long("n").parse(" 7 ").unwrap(), 7);
        assert_eq!(Dimension::boolean("b").parse("yes").unwrap(), Some(true));
        assert_eq!(Dimension::boolean("b").parse("any").unwrap(), None);
        assert!(Dimension::locator("project")
            .parse("id:p1")
            .unwrap()
            .is_dimension_present("id"));
        assert_eq!(
            Dimension::value_condition("v")
                .parse("value:1,matchType:more-than")
                .unwrap()
                .match_type(),
            MatchType::MoreThan
        );
        assert_eq!(
            Dimension::parameter_condition("p").parse("env").unwrap().name(),
            "env"
        );
    }

    #[test]
    fn parse_errors_name_the_dimension() {
        let err = Dimension::long("number").parse("x").unwrap_err();
        assert_eq!(
            err,
            LocatorError::invalid_value("number", "x", "a whole number")
        );

        let state = Dimension::<State>::parsed("state", "one of queued, running");
        assert_eq!(state.parse("running").unwrap(), State::Running);
        assert_eq!(
            state.parse("done").unwrap_err(),
            LocatorError::invalid_value("state", "done", "one of queued, running")
        );
    }

    #[test]
    fn clones_share_the_parser() {
        let original = Dimension::long("n").description("a number").hidden();
        let copy = original.clone();
        assert_eq!(copy.name(), "n");
        assert_eq!(copy.describe(), Some("a number"));
        assert!(copy.is_hidden());
        assert_eq!(copy.parse("3").unwrap(), 3);
    }
}
