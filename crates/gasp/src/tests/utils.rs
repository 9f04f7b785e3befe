use alloc::{string::ToString, vec, vec::Vec};

use crate::{Map, Parser, TypeDescriptor, Value};

/// The record used throughout the suite:
/// `Person { name: str, age: int, hobbies: list[str] }`.
pub fn person_type() -> TypeDescriptor {
    TypeDescriptor::class_of(
        "Person",
        vec![
            ("name".to_string(), TypeDescriptor::string()),
            ("age".to_string(), TypeDescriptor::int()),
            (
                "hobbies".to_string(),
                TypeDescriptor::list(TypeDescriptor::string()),
            ),
        ],
    )
    .unwrap()
}

/// Feeds `input` in one chunk and returns the completed root value.
pub fn parse_one(desc: TypeDescriptor, input: &str) -> Value {
    let mut parser = Parser::new(desc);
    let partial = parser.feed(input).unwrap();
    assert!(parser.is_complete(), "root did not close for {input:?}");
    partial.expect("root closed, value must exist")
}

/// Feeds `chunks` in sequence and returns the parser plus the last partial.
pub fn parse_chunked(desc: TypeDescriptor, chunks: &[&str]) -> (Parser, Option<Value>) {
    let mut parser = Parser::new(desc);
    let mut last = None;
    for chunk in chunks {
        last = parser.feed(chunk).unwrap();
    }
    (parser, last)
}

/// Feeds `payload` to `parser` in `parts` roughly equal chunks, cut on char
/// boundaries the way a completion API delivers a response in arbitrary
/// pieces. Returns the partial observed after each feed, so tests can check
/// how the value refines over time.
pub fn feed_in_parts(parser: &mut Parser, payload: &str, parts: usize) -> Vec<Option<Value>> {
    assert!(parts > 0);
    let step = payload.len().div_ceil(parts);
    let mut partials = Vec::new();
    let mut rest = payload;
    while !rest.is_empty() {
        let mut cut = step.min(rest.len());
        while !rest.is_char_boundary(cut) {
            cut += 1;
        }
        let (chunk, tail) = rest.split_at(cut);
        partials.push(parser.feed(chunk).unwrap());
        rest = tail;
    }
    partials
}

/// Builds an object literal for expectations.
pub fn object(class: &str, fields: Vec<(&str, Value)>) -> Value {
    let mut map = Map::new();
    for (k, v) in fields {
        map.insert(k.to_string(), v);
    }
    Value::Object {
        class: class.to_string(),
        fields: map,
    }
}

pub fn strings(items: &[&str]) -> Value {
    Value::List(items.iter().map(|s| Value::String((*s).to_string())).collect())
}

pub fn string(s: &str) -> Value {
    Value::String(s.to_string())
}

/// `type ResponseType = Success | Error`, the union-alias fixture.
pub fn response_union() -> TypeDescriptor {
    let success = TypeDescriptor::class_of(
        "Success",
        vec![("data".to_string(), TypeDescriptor::string())],
    )
    .unwrap();
    let error = TypeDescriptor::class_of(
        "Error",
        vec![("message".to_string(), TypeDescriptor::string())],
    )
    .unwrap();
    TypeDescriptor::union_alias("ResponseType", vec![success, error]).unwrap()
}

/// Documents exercised by the split-invariance properties. Root types are
/// recognizable from the outermost tag.
pub fn scenario_corpus() -> Vec<&'static str> {
    vec![
        "<Person><name>Alice</name><age>30</age><hobbies><item>coding</item><item>hiking</item></hobbies></Person>",
        "<think>planning first</think><Person><name>Bob</name><age>0x2A</age></Person>",
        "Sure, here you go: <Person><name>A &amp; B</name><hobbies><item>x</item></hobbies></Person> done!",
        "<Person>\n  <name>Ada</name>\n  <age>36</age>\n  <hobbies>\n    <item>math</item>\n  </hobbies>\n</Person>",
        "<Person><hobbies><item>x</item></Person>",
        "<Success><data>ok</data></Success>",
        "<Error><message>nope</message></Error>",
        "<ResponseType type=\"Success\"><data>fine</data></ResponseType>",
        "<t><item>1</item><item>2</item><item>3</item></t>",
    ]
}
