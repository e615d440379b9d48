//! Comparison operators for value conditions.
//!
//! The [`MatchType`] enum defines every operator a condition can apply to an
//! actual string value. Operators differ in what they need: most require an
//! operand, most require the actual value to be present, and ordering
//! operators additionally reject an empty actual value.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a [`ValueCondition`](crate::ValueCondition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchType {
    // Presence
    /// The value is present.
    Exists,
    /// The value is absent.
    NotExists,
    /// Always matches, present or not.
    Any,

    // String operators
    /// Exact match.
    #[default]
    Equals,
    /// Anything but an exact match.
    DoesNotEqual,
    /// String starts with the operand.
    StartsWith,
    /// String ends with the operand.
    EndsWith,
    /// String contains the operand.
    Contains,
    /// String does not contain the operand.
    DoesNotContain,
    /// String matches the operand as a regular expression.
    Matches,
    /// String does not match the operand as a regular expression.
    DoesNotMatch,

    // Numeric operators
    /// Greater than.
    MoreThan,
    /// Less than or equal.
    NoMoreThan,
    /// Less than.
    LessThan,
    /// Greater than or equal.
    NoLessThan,
}

impl MatchType {
    /// All operators, in the order they are listed in error messages.
    pub const ALL: [MatchType; 15] = [
        MatchType::Exists,
        MatchType::NotExists,
        MatchType::Any,
        MatchType::Equals,
        MatchType::DoesNotEqual,
        MatchType::StartsWith,
        MatchType::EndsWith,
        MatchType::Contains,
        MatchType::DoesNotContain,
        MatchType::Matches,
        MatchType::DoesNotMatch,
        MatchType::MoreThan,
        MatchType::NoMoreThan,
        MatchType::LessThan,
        MatchType::NoLessThan,
    ];

    /// Returns `true` if the operator needs an operand to compare against.
    pub fn requires_operand(self) -> bool {
        !matches!(self, MatchType::Exists | MatchType::NotExists | MatchType::Any)
    }

    /// Returns `true` if the operator can only match a present value.
    pub fn requires_actual(self) -> bool {
        !matches!(self, MatchType::NotExists | MatchType::Any)
    }

    /// Returns `true` if an empty actual value never matches.
    pub fn forbids_empty_actual(self) -> bool {
        self.is_numeric()
    }

    /// Returns `true` for ordering operators that compare numbers.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            MatchType::MoreThan | MatchType::NoMoreThan | MatchType::LessThan | MatchType::NoLessThan
        )
    }

    /// Returns `true` for regular expression operators.
    pub fn is_regex(self) -> bool {
        matches!(self, MatchType::Matches | MatchType::DoesNotMatch)
    }

    /// Evaluates a numeric operator given the ordering of actual vs operand.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            MatchType::Equals => ordering == Ordering::Equal,
            MatchType::DoesNotEqual => ordering != Ordering::Equal,
            MatchType::MoreThan => ordering == Ordering::Greater,
            MatchType::NoLessThan => ordering != Ordering::Less,
            MatchType::LessThan => ordering == Ordering::Less,
            MatchType::NoMoreThan => ordering != Ordering::Greater,
            _ => false,
        }
    }

    /// Returns the locator name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Exists => "exists",
            MatchType::NotExists => "not-exists",
            MatchType::Any => "any",
            MatchType::Equals => "equals",
            MatchType::DoesNotEqual => "does-not-equal",
            MatchType::StartsWith => "starts-with",
            MatchType::EndsWith => "ends-with",
            MatchType::Contains => "contains",
            MatchType::DoesNotContain => "does-not-contain",
            MatchType::Matches => "matches",
            MatchType::DoesNotMatch => "does-not-match",
            MatchType::MoreThan => "more-than",
            MatchType::NoMoreThan => "no-more-than",
            MatchType::LessThan => "less-than",
            MatchType::NoLessThan => "no-less-than",
        }
    }

    /// Comma separated list of every operator name.
    pub fn names() -> String {
        Self::ALL.map(MatchType::as_str).join(", ")
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when text is not a known operator name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMatchType(pub String);

impl fmt::Display for UnknownMatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown match type '{}'", self.0)
    }
}

impl std::error::Error for UnknownMatchType {}

impl FromStr for MatchType {
    type Err = UnknownMatchType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownMatchType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_and_actual_requirements() {
        assert!(MatchType::Equals.requires_operand());
        assert!(MatchType::MoreThan.requires_operand());
        assert!(!MatchType::Exists.requires_operand());
        assert!(!MatchType::Any.requires_operand());

        assert!(MatchType::Exists.requires_actual());
        assert!(MatchType::DoesNotEqual.requires_actual());
        assert!(!MatchType::NotExists.requires_actual());
        assert!(!MatchType::Any.requires_actual());
    }

    #[test]
    fn only_numeric_operators_forbid_empty() {
        assert!(MatchType::LessThan.forbids_empty_actual());
        assert!(!MatchType::Equals.forbids_empty_actual());
        assert!(!MatchType::Contains.forbids_empty_actual());
    }

    #[test]
    fn eval_ordering() {
        assert!(MatchType::MoreThan.eval_ordering(Ordering::Greater));
        assert!(!MatchType::MoreThan.eval_ordering(Ordering::Equal));
        assert!(MatchType::NoLessThan.eval_ordering(Ordering::Equal));
        assert!(!MatchType::NoLessThan.eval_ordering(Ordering::Less));
        assert!(MatchType::LessThan.eval_ordering(Ordering::Less));
        assert!(MatchType::NoMoreThan.eval_ordering(Ordering::Equal));
        assert!(!MatchType::NoMoreThan.eval_ordering(Ordering::Greater));
        assert!(!MatchType::Contains.eval_ordering(Ordering::Equal));
    }

    #[test]
    fn parse_names() {
        for m in MatchType::ALL {
            assert_eq!(m.as_str().parse::<MatchType>().unwrap(), m);
        }
        assert_eq!("Starts-With".parse::<MatchType>().unwrap(), MatchType::StartsWith);
        assert_eq!(
            "like".parse::<MatchType>().unwrap_err().to_string(),
            "unknown match type 'like'"
        );
    }

    #[test]
    fn display() {
        assert_eq!(MatchType::DoesNotContain.to_string(), "does-not-contain");
    }
}
