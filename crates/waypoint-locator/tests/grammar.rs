//! Grammar-level tests for locator text, including property tests for the
//! escaping scheme.

use proptest::prelude::*;
use waypoint_locator::{escape_value, string_locator, Locator, LocatorError};

#[test]
fn single_value_versus_dimension_list() {
    assert!(Locator::parse("MyProject").unwrap().is_single_value());
    assert!(Locator::parse("(name:x)").unwrap().is_single_value());
    assert!(!Locator::parse("name:x").unwrap().is_single_value());
    assert!(!Locator::parse("name:x,id:1").unwrap().is_single_value());
}

#[test]
fn nested_locator_round_trip() {
    let mut outer = Locator::parse("build:(buildType:(id:bt1),number:12),count:1").unwrap();
    let mut build = outer.dimension_locator("build").unwrap().unwrap();
    let mut build_type = build.dimension_locator("buildType").unwrap().unwrap();
    assert_eq!(build_type.single_dimension_value("id").as_deref(), Some("bt1"));
    assert_eq!(build.single_dimension_value_as_long("number").unwrap(), Some(12));
    assert!(build.check_fully_processed().is_ok());
    assert!(build_type.check_fully_processed().is_ok());
    assert_eq!(outer.unused_dimensions(), vec!["count"]);
}

#[test]
fn canonical_text_reparses_to_same_canonical_text() {
    let text = "name:(a:b),tag:x,tag:(y,z),count:3";
    let first = Locator::parse(text).unwrap().to_string();
    let second = Locator::parse(&first).unwrap().to_string();
    assert_eq!(first, "count:3,name:(a:b),tag:x,tag:(y,z)");
    assert_eq!(first, second);
}

#[test]
fn syntax_errors_carry_locator_text() {
    match Locator::parse("name:(x").unwrap_err() {
        LocatorError::Syntax { locator, .. } => assert_eq!(locator, "name:(x"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn string_locator_output_parses() {
    let text = string_locator([("name", "a)b"), ("id", "1")]);
    let mut locator = Locator::parse(&text).unwrap();
    assert_eq!(locator.single_dimension_value("name").as_deref(), Some("a)b"));
}

fn any_value() -> impl Strategy<Value = String> {
    "[a-z0-9 ,:()$./_-]{0,24}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn escaped_dimension_values_parse_back(value in any_value()) {
        let text = format!("name:{}", escape_value(&value));
        let mut locator = Locator::parse(&text).unwrap();
        prop_assert_eq!(locator.single_dimension_value("name"), Some(value));
    }

    #[test]
    fn canonical_single_values_parse_back(value in any_value()) {
        let rendered = if value.is_empty() {
            "()".to_string()
        } else {
            escape_value(&value).into_owned()
        };
        let mut reparsed = Locator::parse(&rendered).unwrap();
        prop_assert!(reparsed.is_single_value());
        prop_assert_eq!(reparsed.to_string(), rendered);
        prop_assert_eq!(reparsed.single_value(), Some(value));
    }

    #[test]
    fn dimension_order_does_not_change_canonical_text(
        a in any_value(),
        b in any_value(),
    ) {
        prop_assert_eq!(
            string_locator([("a", a.clone()), ("b", b.clone())]),
            string_locator([("b", b), ("a", a)])
        );
    }
}
