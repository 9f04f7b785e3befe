use alloc::{string::ToString, vec};

use alloc::sync::Arc;

use crate::{
    parse_type_expr, tests::utils::string, DescriptorError, IssueKind, Kind, Parser,
    ParserOptions, Registry, TypeDescriptor, Value,
};

#[test]
fn simple_types() {
    assert_eq!(parse_type_expr("int").unwrap().kind, Kind::Int);
    assert_eq!(parse_type_expr("str").unwrap().kind, Kind::String);
    assert_eq!(parse_type_expr("string").unwrap().kind, Kind::String);
    assert_eq!(parse_type_expr("float").unwrap().kind, Kind::Float);
    assert_eq!(parse_type_expr("bool").unwrap().kind, Kind::Bool);
    assert_eq!(parse_type_expr("None").unwrap().kind, Kind::None);
}

#[test]
fn list_type() {
    let t = parse_type_expr("list[str]").unwrap();
    assert_eq!(t.kind, Kind::List);
    assert_eq!(t.args.len(), 1);
    assert_eq!(t.args[0].kind, Kind::String);
}

#[test]
fn dict_type() {
    let t = parse_type_expr("dict[str, int]").unwrap();
    assert_eq!(t.kind, Kind::Dict);
    assert_eq!(t.args[0].kind, Kind::String);
    assert_eq!(t.args[1].kind, Kind::Int);
}

#[test]
fn nested_type() {
    let t = parse_type_expr("list[dict[str, int]]").unwrap();
    assert_eq!(t.kind, Kind::List);
    let inner = &t.args[0];
    assert_eq!(inner.kind, Kind::Dict);
    assert_eq!(inner.args.len(), 2);
}

#[test]
fn tuple_types() {
    let t = parse_type_expr("tuple[str, int, Optional[float]]").unwrap();
    assert_eq!(t.kind, Kind::Tuple);
    assert_eq!(t.args.len(), 3);
    assert_eq!(t.args[2].kind, Kind::Optional);

    let variadic = parse_type_expr("tuple[int, ...]").unwrap();
    assert!(variadic.tuple_is_variadic());
}

#[test]
fn optional_and_union_spellings() {
    let opt = parse_type_expr("Optional[str]").unwrap();
    assert_eq!(opt.kind, Kind::Optional);
    assert_eq!(opt.args[0].kind, Kind::String);

    // `T | None` normalizes to Optional.
    let pipe_opt = parse_type_expr("str | None").unwrap();
    assert_eq!(pipe_opt.kind, Kind::Optional);

    let union = parse_type_expr("Union[int, str]").unwrap();
    assert_eq!(union.kind, Kind::Union);

    let pipe_union = parse_type_expr("int | str | float").unwrap();
    assert_eq!(pipe_union.kind, Kind::Union);
    assert_eq!(pipe_union.args.len(), 3);

    // A null alternative among several makes the rest optional.
    let three = parse_type_expr("int | str | None").unwrap();
    assert_eq!(three.kind, Kind::Optional);
    assert_eq!(three.args[0].kind, Kind::Union);
    assert_eq!(three.args[0].args.len(), 2);
}

#[test]
fn bare_container_names_default_to_any() {
    let t = parse_type_expr("list").unwrap();
    assert_eq!(t.kind, Kind::List);
    assert_eq!(t.args[0].kind, Kind::Any);

    let d = parse_type_expr("dict").unwrap();
    assert_eq!(d.kind, Kind::Dict);
}

#[test]
fn unknown_names_become_references() {
    let t = parse_type_expr("Person").unwrap();
    assert_eq!(t.kind, Kind::Ref);
    assert_eq!(t.name, "Person");
}

#[test]
fn malformed_expressions_are_rejected() {
    assert!(matches!(
        parse_type_expr("list[str"),
        Err(DescriptorError::UnsupportedType(_))
    ));
    assert!(matches!(
        parse_type_expr("dict[str]"),
        Err(DescriptorError::UnsupportedType(_))
    ));
    assert!(matches!(
        parse_type_expr(""),
        Err(DescriptorError::UnsupportedType(_))
    ));
    assert!(matches!(
        parse_type_expr("not a name"),
        Err(DescriptorError::UnsupportedType(_))
    ));
}

#[test]
fn construction_invariants() {
    assert!(TypeDescriptor::tuple(vec![]).is_err());
    assert!(TypeDescriptor::union(vec![TypeDescriptor::int()]).is_err());
    assert!(TypeDescriptor::class_of("9lives", vec![]).is_err());
    assert!(TypeDescriptor::union_alias("bad name", vec![]).is_err());
}

#[test]
fn union_alternatives_must_be_class_like_or_primitive() {
    let list_alt = TypeDescriptor::list(TypeDescriptor::int());
    let dict_alt = TypeDescriptor::dict(TypeDescriptor::string(), TypeDescriptor::string());
    assert!(matches!(
        TypeDescriptor::union(vec![list_alt, dict_alt]),
        Err(DescriptorError::UnsupportedType(_))
    ));
    assert!(matches!(
        TypeDescriptor::union(vec![
            TypeDescriptor::list(TypeDescriptor::int()),
            TypeDescriptor::string(),
        ]),
        Err(DescriptorError::UnsupportedType(_))
    ));

    // Pending references are provisionally acceptable alongside primitives;
    // their referents are checked when the registry resolves them.
    assert!(
        TypeDescriptor::union(vec![TypeDescriptor::reference("A"), TypeDescriptor::int()])
            .is_ok()
    );
}

/// A reference may enter a union provisionally, but the referent is held to
/// the same invariant once the registry resolves it.
#[test]
fn union_alternative_reference_is_validated_at_resolution() {
    let mut registry = Registry::new();
    // A container descriptor registered under a class-like name.
    registry.register(TypeDescriptor {
        kind: Kind::List,
        name: "Weird".to_string(),
        args: vec![Arc::new(TypeDescriptor::int())],
        fields: vec![],
    });
    let ok = TypeDescriptor::class_of("Ok", vec![("x".to_string(), TypeDescriptor::int())])
        .unwrap();
    let root = TypeDescriptor::union(vec![TypeDescriptor::reference("Weird"), ok]).unwrap();

    let mut parser = Parser::with_registry(root, registry, ParserOptions::default());
    parser.feed("<Weird><item>1</item></Weird>").unwrap();
    assert!(parser.is_complete());
    // The union stays unresolved: the referent is not class-like.
    assert_eq!(parser.get_partial(), Some(Value::Null));
    assert!(parser
        .issues()
        .iter()
        .any(|i| i.kind == IssueKind::UnresolvedRef("Weird".to_string())));
}

#[test]
fn optional_shaped_union_collapses() {
    let t = TypeDescriptor::union(vec![TypeDescriptor::int(), TypeDescriptor::none()]).unwrap();
    assert_eq!(t.kind, Kind::Optional);
    assert_eq!(t.args[0].kind, Kind::Int);
}

#[test]
fn union_alias_keeps_name() {
    let a = TypeDescriptor::class_of("A", vec![]).unwrap();
    let b = TypeDescriptor::class_of("B", vec![]).unwrap();
    let alias = TypeDescriptor::union_alias("Either", vec![a, b]).unwrap();
    assert_eq!(alias.kind, Kind::Union);
    assert_eq!(alias.name, "Either");
}

#[test]
fn registry_resolves_references_at_parse_time() {
    let mut registry = Registry::new();
    registry.register(
        TypeDescriptor::class_of(
            "Company",
            vec![("name".to_string(), TypeDescriptor::string())],
        )
        .unwrap(),
    );

    let root = TypeDescriptor::class_of(
        "Employee",
        vec![("employer".to_string(), TypeDescriptor::reference("Company"))],
    )
    .unwrap();

    let mut parser = Parser::with_registry(root, registry, ParserOptions::default());
    parser
        .feed("<Employee><employer><name>Acme</name></employer></Employee>")
        .unwrap();
    assert!(parser.is_complete());
    let employer = parser.get_partial().unwrap();
    let employer = employer.lookup_field("employer").unwrap();
    assert_eq!(employer.class_name(), Some("Company"));
    assert_eq!(employer.lookup_field("name"), Some(&string("Acme")));
}

/// Mutually-recursive records parse through lazy registry indirection.
#[test]
fn cyclic_types_via_registry() {
    let mut registry = Registry::new();
    registry.register(
        TypeDescriptor::class_of(
            "Node",
            vec![
                ("label".to_string(), TypeDescriptor::string()),
                (
                    "next".to_string(),
                    TypeDescriptor::optional(TypeDescriptor::reference("Node")),
                ),
            ],
        )
        .unwrap(),
    );
    let root = registry.get("Node").unwrap().as_ref().clone();

    let mut parser = Parser::with_registry(root, registry, ParserOptions::default());
    parser
        .feed("<Node><label>a</label><next><label>b</label></next></Node>")
        .unwrap();
    assert!(parser.is_complete());

    let value = parser.get_partial().unwrap();
    assert_eq!(value.lookup_field("label"), Some(&string("a")));
    let next = value.lookup_field("next").unwrap();
    assert_eq!(next.lookup_field("label"), Some(&string("b")));
    assert_eq!(next.lookup_field("next"), Some(&Value::Null));
}

#[test]
fn deep_expression_nesting_is_capped() {
    let mut expr = "int".to_string();
    for _ in 0..80 {
        expr = alloc::format!("list[{expr}]");
    }
    assert!(matches!(
        parse_type_expr(&expr),
        Err(DescriptorError::CyclicType(_))
    ));
}
