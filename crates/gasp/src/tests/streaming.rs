//! Partial-value behavior across feeds: prefix monotonicity and in-progress
//! accumulator exposure.
use alloc::{vec, vec::Vec};

use rstest::rstest;

use crate::{
    tests::utils::{feed_in_parts, person_type, string},
    Parser, TypeDescriptor, Value,
};

#[test]
fn string_accumulator_is_exposed_in_progress() {
    let mut parser = Parser::new(person_type());
    parser.feed("<Person><name>Al").unwrap();
    assert_eq!(
        parser.get_partial().unwrap().lookup_field("name"),
        Some(&string("Al"))
    );
    parser.feed("ice").unwrap();
    assert_eq!(
        parser.get_partial().unwrap().lookup_field("name"),
        Some(&string("Alice"))
    );
}

#[test]
fn numeric_accumulator_surfaces_once_parseable() {
    let mut parser = Parser::new(person_type());
    parser.feed("<Person><age>").unwrap();
    // Nothing to show yet: an empty accumulator is not a number.
    assert_eq!(parser.get_partial().unwrap().lookup_field("age"), None);
    parser.feed("3").unwrap();
    assert_eq!(
        parser.get_partial().unwrap().lookup_field("age"),
        Some(&Value::Int(3))
    );
    parser.feed("0</age>").unwrap();
    assert_eq!(
        parser.get_partial().unwrap().lookup_field("age"),
        Some(&Value::Int(30))
    );
}

#[test]
fn container_partials_grow() {
    let mut parser = Parser::new(TypeDescriptor::list(TypeDescriptor::int()));
    parser.feed("<xs><item>1</item>").unwrap();
    assert_eq!(
        parser.get_partial().unwrap(),
        Value::List(vec![Value::Int(1)])
    );
    parser.feed("<item>2</item>").unwrap();
    assert_eq!(
        parser.get_partial().unwrap(),
        Value::List(vec![Value::Int(1), Value::Int(2)])
    );
}

/// Once a field's close has been consumed its value never changes again.
#[rstest]
#[case(2)]
#[case(3)]
#[case(7)]
#[case(13)]
fn closed_fields_are_never_reopened(#[case] parts: usize) {
    let payload = "<Person><name>Alice</name><age>30</age><hobbies><item>a</item><item>b</item></hobbies></Person>";
    let mut parser = Parser::new(person_type());

    let mut name_history: Vec<Value> = Vec::new();
    let mut age_history: Vec<Value> = Vec::new();
    for partial in feed_in_parts(&mut parser, payload, parts).into_iter().flatten() {
        if let Some(name) = partial.lookup_field("name") {
            name_history.push(name.clone());
        }
        if let Some(age) = partial.lookup_field("age") {
            age_history.push(age.clone());
        }
    }

    // Monotone refinement: every later name is an extension-or-equal of the
    // earlier one, and the final values match the full document.
    for pair in name_history.windows(2) {
        let (earlier, later) = (pair[0].as_str().unwrap(), pair[1].as_str().unwrap());
        assert!(
            later.starts_with(earlier) || earlier == later,
            "{earlier:?} -> {later:?} is not a refinement"
        );
    }
    assert_eq!(name_history.last(), Some(&string("Alice")));
    assert_eq!(age_history.last(), Some(&Value::Int(30)));
}

/// Multi-byte content survives being cut at every feasible chunk size.
#[test]
fn multibyte_content_splits_safely() {
    let payload = "<Person><name>Zo\u{eb} \u{1f60a}</name></Person>";
    for parts in 2..=8 {
        let mut parser = Parser::new(person_type());
        feed_in_parts(&mut parser, payload, parts);
        assert!(parser.is_complete());
        assert_eq!(
            parser.get_partial().unwrap().lookup_field("name"),
            Some(&string("Zo\u{eb} \u{1f60a}")),
            "diverged at {parts} parts"
        );
    }
}

#[test]
fn feed_returns_none_before_root_opens() {
    let mut parser = Parser::new(person_type());
    assert_eq!(parser.feed("nothing interesting yet").unwrap(), None);
    assert_eq!(parser.get_partial(), None);
    assert!(!parser.is_complete());
}

#[test]
fn get_partial_does_not_advance_state() {
    let mut parser = Parser::new(person_type());
    parser.feed("<Person><name>Bo").unwrap();
    let a = parser.get_partial();
    let b = parser.get_partial();
    assert_eq!(a, b);
}

#[test]
fn completed_value_is_stable_across_further_feeds() {
    let mut parser = Parser::new(person_type());
    parser.feed("<Person><name>Bob</name></Person>").unwrap();
    let done = parser.get_partial();
    parser.feed("trailing chatter").unwrap();
    assert_eq!(parser.get_partial(), done);
}
