//! Value and parameter conditions.
//!
//! A [`ValueCondition`] is a single predicate over an optional string value:
//! an operator, an optional operand and a case-sensitivity flag. A
//! [`ParameterCondition`] applies one to a named entry of a
//! [`ParameterSource`], such as a build's parameters.
//!
//! Both have a locator text form, so they can be used as dimension values:
//!
//! ```text
//! release                                   equals "release"
//! (value:rel,matchType:starts-with)         starts with "rel"
//! (value:REL,matchType:contains,ignoreCase:true)
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use regex::{Regex, RegexBuilder};
use waypoint_locator::{escape_value, Locator, LocatorError, ANY_VALUE};

use crate::match_type::MatchType;
use crate::number::Number;

const VALUE: &str = "value";
const MATCH_TYPE: &str = "matchType";
const IGNORE_CASE: &str = "ignoreCase";
const NAME: &str = "name";

// ============================================================================
// ValueCondition
// ============================================================================

/// A predicate over an optional string value.
///
/// # Example
///
/// ```
/// use waypoint_finder::{MatchType, ValueCondition};
///
/// let condition = ValueCondition::new(MatchType::MoreThan, Some("10"));
/// assert!(condition.matches(Some("11")));
/// assert!(!condition.matches(Some("abc")));
/// assert!(!condition.matches(None));
/// ```
#[derive(Debug, Clone)]
pub struct ValueCondition {
    match_type: MatchType,
    operand: Option<String>,
    ignore_case: bool,
    regex: Option<Regex>,
}

impl ValueCondition {
    /// Creates a case-sensitive condition.
    pub fn new(match_type: MatchType, operand: Option<impl Into<String>>) -> Self {
        let operand = operand.map(Into::into);
        let regex = compile(match_type, operand.as_deref(), false);
        Self {
            match_type,
            operand,
            ignore_case: false,
            regex,
        }
    }

    /// Shorthand for an `equals` condition.
    pub fn equals(operand: impl Into<String>) -> Self {
        Self::new(MatchType::Equals, Some(operand))
    }

    /// Makes string and regex comparisons case-insensitive.
    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self.regex = compile(self.match_type, self.operand.as_deref(), true);
        self
    }

    /// Parses the locator text form.
    ///
    /// A single value `X` means `equals X` and `$any` means `any`. Otherwise
    /// the dimensions `value`, `matchType` and `ignoreCase` are read; all
    /// other dimensions are rejected.
    pub fn parse(text: &str) -> Result<Self, LocatorError> {
        let mut locator = Locator::parse(text)?;
        if let Some(value) = locator.single_value() {
            return Ok(if value == ANY_VALUE {
                Self::new(MatchType::Any, None::<String>)
            } else {
                Self::equals(value)
            });
        }
        locator.add_supported_dimensions([VALUE, MATCH_TYPE, IGNORE_CASE]);
        let condition = Self::from_locator(&mut locator)?;
        locator.check_fully_processed()?;
        Ok(condition)
    }

    /// Reads `value`, `matchType` and `ignoreCase` from a locator, leaving any
    /// other dimensions for the caller.
    fn from_locator(locator: &mut Locator) -> Result<Self, LocatorError> {
        let operand = locator.single_dimension_value(VALUE);
        let match_type = match locator.single_dimension_value(MATCH_TYPE) {
            Some(text) => text.parse::<MatchType>().map_err(|_| {
                LocatorError::invalid_value(
                    MATCH_TYPE,
                    text.as_str(),
                    format!("one of {}", MatchType::names()),
                )
            })?,
            None if operand.is_some() => MatchType::Equals,
            None => MatchType::Exists,
        };
        let ignore_case = locator
            .single_dimension_value_as_bool_or(IGNORE_CASE, false)?
            .unwrap_or(false);
        let condition = Self::new(match_type, operand);
        Ok(if ignore_case {
            condition.ignore_case()
        } else {
            condition
        })
    }

    /// The operator.
    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    /// The operand, if any.
    pub fn operand(&self) -> Option<&str> {
        self.operand.as_deref()
    }

    /// Whether comparisons ignore case.
    pub fn is_ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Evaluates the condition against an actual value.
    ///
    /// Comparison failures (non-numeric text for an ordering operator, an
    /// invalid regular expression) count as no match.
    pub fn matches(&self, actual: Option<&str>) -> bool {
        if self.match_type.requires_operand() && self.operand.is_none() {
            return false;
        }
        let actual = match actual {
            Some(actual) => actual,
            None => return !self.match_type.requires_actual(),
        };
        if actual.is_empty() && self.match_type.forbids_empty_actual() {
            return false;
        }
        let operand = self.operand.as_deref().unwrap_or_default();
        match self.match_type {
            MatchType::Exists | MatchType::Any => true,
            MatchType::NotExists => false,
            MatchType::Matches => self.regex_matches(actual),
            MatchType::DoesNotMatch => self.regex.is_some() && !self.regex_matches(actual),
            m if m.is_numeric() => compare_numbers(m, actual, operand),
            m => self.compare_strings(m, actual, operand),
        }
    }

    fn compare_strings(&self, match_type: MatchType, actual: &str, operand: &str) -> bool {
        let (actual, operand) = if self.ignore_case {
            (actual.to_lowercase(), operand.to_lowercase())
        } else {
            (actual.to_string(), operand.to_string())
        };
        match match_type {
            MatchType::Equals => actual == operand,
            MatchType::DoesNotEqual => actual != operand,
            MatchType::StartsWith => actual.starts_with(&operand),
            MatchType::EndsWith => actual.ends_with(&operand),
            MatchType::Contains => actual.contains(&operand),
            MatchType::DoesNotContain => !actual.contains(&operand),
            _ => false,
        }
    }

    fn regex_matches(&self, actual: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(actual),
            None => {
                tracing::debug!(
                    pattern = self.operand.as_deref().unwrap_or_default(),
                    "invalid regular expression in condition, treating as no match"
                );
                false
            }
        }
    }
}

fn compile(match_type: MatchType, operand: Option<&str>, ignore_case: bool) -> Option<Regex> {
    if !match_type.is_regex() {
        return None;
    }
    // Whole-value match, not a search.
    let pattern = format!("^(?:{})$", operand?);
    RegexBuilder::new(&pattern)
        .case_insensitive(ignore_case)
        .build()
        .ok()
}

fn compare_numbers(match_type: MatchType, actual: &str, operand: &str) -> bool {
    match (Number::parse(actual), Number::parse(operand)) {
        (Some(a), Some(b)) => a
            .compare(b)
            .is_some_and(|ordering| match_type.eval_ordering(ordering)),
        _ => {
            tracing::debug!(
                actual,
                operand,
                match_type = %match_type,
                "cannot compare non-numeric values, treating as no match"
            );
            false
        }
    }
}

impl PartialEq for ValueCondition {
    fn eq(&self, other: &Self) -> bool {
        self.match_type == other.match_type
            && self.operand == other.operand
            && self.ignore_case == other.ignore_case
    }
}

impl fmt::Display for ValueCondition {
    /// Writes the dimension form, which [`ValueCondition::parse`] accepts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{MATCH_TYPE}:{}", self.match_type)?;
        if let Some(operand) = &self.operand {
            write!(f, ",{VALUE}:{}", escape_value(operand))?;
        }
        if self.ignore_case {
            write!(f, ",{IGNORE_CASE}:true")?;
        }
        Ok(())
    }
}

// ============================================================================
// ParameterCondition
// ============================================================================

/// Named string values a [`ParameterCondition`] can look up.
pub trait ParameterSource {
    /// Returns the value of a parameter, if set.
    fn parameter(&self, name: &str) -> Option<&str>;
}

impl ParameterSource for HashMap<String, String> {
    fn parameter(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl ParameterSource for BTreeMap<String, String> {
    fn parameter(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// A [`ValueCondition`] applied to one named parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterCondition {
    name: String,
    condition: ValueCondition,
}

impl ParameterCondition {
    /// Creates a condition on the named parameter.
    pub fn new(name: impl Into<String>, condition: ValueCondition) -> Self {
        Self {
            name: name.into(),
            condition,
        }
    }

    /// Parses the locator text form.
    ///
    /// A single value `N` means "parameter `N` exists". Otherwise `name` is
    /// required and `value`, `matchType` and `ignoreCase` are optional.
    pub fn parse(text: &str) -> Result<Self, LocatorError> {
        let mut locator = Locator::parse(text)?;
        if let Some(name) = locator.single_value() {
            return Ok(Self::new(
                name,
                ValueCondition::new(MatchType::Exists, None::<String>),
            ));
        }
        locator.add_supported_dimensions([NAME, VALUE, MATCH_TYPE, IGNORE_CASE]);
        let name = locator
            .single_dimension_value(NAME)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| LocatorError::invalid_value(NAME, "", "a parameter name"))?;
        let condition = ValueCondition::from_locator(&mut locator)?;
        locator.check_fully_processed()?;
        Ok(Self::new(name, condition))
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The condition applied to the parameter value.
    pub fn condition(&self) -> &ValueCondition {
        &self.condition
    }

    /// Evaluates the condition against a parameter source.
    ///
    /// An absent parameter matches an empty operand; otherwise the condition
    /// decides what absence means.
    pub fn matches<P: ParameterSource + ?Sized>(&self, source: &P) -> bool {
        match source.parameter(&self.name) {
            Some(value) => self.condition.matches(Some(value)),
            None if self.condition.operand() == Some("") => true,
            None => self.condition.matches(None),
        }
    }
}

impl fmt::Display for ParameterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{NAME}:{},{}", escape_value(&self.name), self.condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(match_type: MatchType, operand: &str) -> ValueCondition {
        ValueCondition::new(match_type, Some(operand))
    }

    #[test]
    fn string_operators() {
        assert!(cond(MatchType::Equals, "abc").matches(Some("abc")));
        assert!(!cond(MatchType::Equals, "abc").matches(Some("ABC")));
        assert!(cond(MatchType::DoesNotEqual, "abc").matches(Some("abd")));
        assert!(cond(MatchType::StartsWith, "ab").matches(Some("abc")));
        assert!(cond(MatchType::EndsWith, "bc").matches(Some("abc")));
        assert!(cond(MatchType::Contains, "b").matches(Some("abc")));
        assert!(cond(MatchType::DoesNotContain, "x").matches(Some("abc")));
        assert!(!cond(MatchType::DoesNotContain, "b").matches(Some("abc")));
    }

    #[test]
    fn ignore_case_lowercases_both_sides() {
        let c = cond(MatchType::Contains, "REL").ignore_case();
        assert!(c.matches(Some("pre-release")));
        let r = cond(MatchType::Matches, "v[0-9]+").ignore_case();
        assert!(r.matches(Some("V12")));
    }

    #[test]
    fn regex_is_whole_value() {
        let c = cond(MatchType::Matches, "[a-z]+");
        assert!(c.matches(Some("abc")));
        assert!(!c.matches(Some("abc1")));
        assert!(cond(MatchType::DoesNotMatch, "[a-z]+").matches(Some("abc1")));
    }

    #[test]
    fn invalid_regex_never_matches() {
        assert!(!cond(MatchType::Matches, "(").matches(Some("(")));
        assert!(!cond(MatchType::DoesNotMatch, "(").matches(Some("x")));
    }

    #[test]
    fn numeric_operators() {
        assert!(cond(MatchType::MoreThan, "10").matches(Some("10.5")));
        assert!(!cond(MatchType::MoreThan, "10").matches(Some("10")));
        assert!(cond(MatchType::NoMoreThan, "10").matches(Some("10")));
        assert!(cond(MatchType::LessThan, "10").matches(Some("-1")));
        assert!(cond(MatchType::NoLessThan, "10").matches(Some("10")));
    }

    #[test]
    fn numeric_failures_are_no_match() {
        assert!(!cond(MatchType::MoreThan, "10").matches(Some("")));
        assert!(!cond(MatchType::MoreThan, "10").matches(Some("big")));
        assert!(!cond(MatchType::LessThan, "ten").matches(Some("1")));
    }

    #[test]
    fn presence_operators() {
        let exists = ValueCondition::new(MatchType::Exists, None::<String>);
        assert!(exists.matches(Some("")));
        assert!(!exists.matches(None));

        let not_exists = ValueCondition::new(MatchType::NotExists, None::<String>);
        assert!(not_exists.matches(None));
        assert!(!not_exists.matches(Some("x")));

        let any = ValueCondition::new(MatchType::Any, None::<String>);
        assert!(any.matches(None));
        assert!(any.matches(Some("x")));
    }

    #[test]
    fn missing_operand_never_matches() {
        let c = ValueCondition::new(MatchType::Equals, None::<String>);
        assert!(!c.matches(Some("")));
        assert!(!c.matches(None));
    }

    #[test]
    fn missing_actual_fails_operators_that_need_it() {
        assert!(!cond(MatchType::DoesNotEqual, "x").matches(None));
        assert!(!cond(MatchType::DoesNotContain, "x").matches(None));
    }

    #[test]
    fn parse_single_value() {
        assert_eq!(
            ValueCondition::parse("release").unwrap(),
            ValueCondition::equals("release")
        );
        assert_eq!(
            ValueCondition::parse("$any").unwrap().match_type(),
            MatchType::Any
        );
    }

    #[test]
    fn parse_dimensions() {
        let c = ValueCondition::parse("value:REL,matchType:contains,ignoreCase:true").unwrap();
        assert_eq!(c.match_type(), MatchType::Contains);
        assert_eq!(c.operand(), Some("REL"));
        assert!(c.is_ignore_case());
        assert!(c.matches(Some("prerelease")));

        let exists = ValueCondition::parse("matchType:exists").unwrap();
        assert_eq!(exists.operand(), None);
    }

    #[test]
    fn parse_rejects_unknown_parts() {
        assert!(matches!(
            ValueCondition::parse("value:x,matchType:like"),
            Err(LocatorError::InvalidValue { .. })
        ));
        assert!(matches!(
            ValueCondition::parse("value:x,mode:fast"),
            Err(LocatorError::UnusedDimensions { .. })
        ));
    }

    #[test]
    fn display_parses_back() {
        let c = cond(MatchType::StartsWith, "a:b").ignore_case();
        assert_eq!(ValueCondition::parse(&c.to_string()).unwrap(), c);
    }

    #[test]
    fn parameter_condition_matching() {
        let mut params = HashMap::new();
        params.insert("env".to_string(), "prod".to_string());

        assert!(ParameterCondition::parse("env").unwrap().matches(&params));
        assert!(!ParameterCondition::parse("region").unwrap().matches(&params));

        let c = ParameterCondition::parse("name:env,value:PR,matchType:starts-with,ignoreCase:true")
            .unwrap();
        assert!(c.matches(&params));

        let empty = ParameterCondition::new("region", ValueCondition::equals(""));
        assert!(empty.matches(&params));

        let absent = ParameterCondition::new(
            "region",
            ValueCondition::new(MatchType::NotExists, None::<String>),
        );
        assert!(absent.matches(&params));
    }

    #[test]
    fn parameter_condition_requires_name() {
        assert!(matches!(
            ParameterCondition::parse("value:x"),
            Err(LocatorError::InvalidValue { .. })
        ));
    }

    #[test]
    fn parameter_condition_display_parses_back() {
        let c = ParameterCondition::new("env", cond(MatchType::Contains, "o"));
        assert_eq!(ParameterCondition::parse(&c.to_string()).unwrap(), c);
    }
}
