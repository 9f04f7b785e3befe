//! The type descriptor model.
//!
//! A [`TypeDescriptor`] is the language-neutral description of the expected
//! shape that drives both the stack machine and schema serialization:
//! kind, display/tag name, child descriptors, and a field table for records.
//! Descriptors are immutable after construction and shared via [`Arc`], so
//! they are freely shareable across parsers.
//!
//! Cyclic shapes (mutually-recursive records) are expressed with
//! [`Kind::Ref`]: a by-name indirection resolved lazily against a
//! [`Registry`] when the frame for it is pushed.
use alloc::{
    format,
    string::{String, ToString},
    sync::Arc,
    vec,
    vec::Vec,
};

use crate::error::DescriptorError;

/// Depth cap shared by descriptor construction and lazy `Ref` resolution.
/// Recursion past this bound reports [`DescriptorError::CyclicType`].
pub const MAX_TYPE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
    Int,
    Float,
    Bool,
    Any,
    /// The null alternative of an optional-shaped union.
    None,
    List,
    Set,
    Tuple,
    Dict,
    Class,
    Union,
    Optional,
    /// Sentinel marking a homogeneous variadic tuple, `tuple[T, ...]`.
    Ellipsis,
    /// Lazy by-name indirection into a [`Registry`].
    Ref,
}

/// The structural type representation consumed by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub kind: Kind,
    /// Display/tag name. For `Class` the class name; for `Union` the alias
    /// name if one was provided, else `"Union"`.
    pub name: String,
    /// Ordered child descriptors: element type for List/Set, key and value
    /// for Dict, positional types for Tuple, alternatives for Union, inner
    /// type for Optional, referent-free for everything else.
    pub args: Vec<Arc<TypeDescriptor>>,
    /// For `Class` only: ordered field table.
    pub fields: Vec<(String, Arc<TypeDescriptor>)>,
}

fn leaf(kind: Kind, name: &str) -> TypeDescriptor {
    TypeDescriptor {
        kind,
        name: name.to_string(),
        args: Vec::new(),
        fields: Vec::new(),
    }
}

impl TypeDescriptor {
    #[must_use]
    pub fn string() -> Self {
        leaf(Kind::String, "str")
    }

    #[must_use]
    pub fn int() -> Self {
        leaf(Kind::Int, "int")
    }

    #[must_use]
    pub fn float() -> Self {
        leaf(Kind::Float, "float")
    }

    #[must_use]
    pub fn boolean() -> Self {
        leaf(Kind::Bool, "bool")
    }

    #[must_use]
    pub fn any() -> Self {
        leaf(Kind::Any, "Any")
    }

    #[must_use]
    pub fn none() -> Self {
        leaf(Kind::None, "None")
    }

    #[must_use]
    pub fn ellipsis() -> Self {
        leaf(Kind::Ellipsis, "...")
    }

    #[must_use]
    pub fn list(elem: TypeDescriptor) -> Self {
        TypeDescriptor {
            kind: Kind::List,
            name: "list".to_string(),
            args: vec![Arc::new(elem)],
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn set(elem: TypeDescriptor) -> Self {
        TypeDescriptor {
            kind: Kind::Set,
            name: "set".to_string(),
            args: vec![Arc::new(elem)],
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn dict(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor {
            kind: Kind::Dict,
            name: "dict".to_string(),
            args: vec![Arc::new(key), Arc::new(value)],
            fields: Vec::new(),
        }
    }

    /// A fixed-arity tuple. Args must be non-empty; append
    /// [`TypeDescriptor::ellipsis`] as the second of two args for the
    /// homogeneous variadic form.
    pub fn tuple(args: Vec<TypeDescriptor>) -> Result<Self, DescriptorError> {
        if args.is_empty() {
            return Err(DescriptorError::UnsupportedType(
                "tuple needs at least one positional type".to_string(),
            ));
        }
        Ok(TypeDescriptor {
            kind: Kind::Tuple,
            name: "tuple".to_string(),
            args: args.into_iter().map(Arc::new).collect(),
            fields: Vec::new(),
        })
    }

    /// Shorthand for `tuple[T, ...]`.
    #[must_use]
    pub fn variadic_tuple(elem: TypeDescriptor) -> Self {
        // Always two args, so the invariant holds by construction.
        Self::tuple(vec![elem, Self::ellipsis()]).expect("non-empty args")
    }

    /// A named record. The name must be a valid identifier.
    pub fn class_of(
        name: &str,
        fields: Vec<(String, TypeDescriptor)>,
    ) -> Result<Self, DescriptorError> {
        if !is_identifier(name) {
            return Err(DescriptorError::UnsupportedType(format_invalid_name(name)));
        }
        Ok(TypeDescriptor {
            kind: Kind::Class,
            name: name.to_string(),
            args: Vec::new(),
            fields: fields
                .into_iter()
                .map(|(n, d)| (n, Arc::new(d)))
                .collect(),
        })
    }

    /// An anonymous union of two or more alternatives.
    ///
    /// Alternatives must be class-like (records, or pending references that
    /// are checked when they resolve) or primitive. `None` alternatives are
    /// stripped and make the result optional, so `{T, None}` collapses to
    /// `Optional[T]`.
    pub fn union(alts: Vec<TypeDescriptor>) -> Result<Self, DescriptorError> {
        Self::union_named("Union", alts)
    }

    /// A union behind a named type alias. The alias name is preserved on the
    /// descriptor; dispatch still routes through the alternatives, and the
    /// alias never appears as a wire tag by itself.
    pub fn union_alias(name: &str, alts: Vec<TypeDescriptor>) -> Result<Self, DescriptorError> {
        if !is_identifier(name) {
            return Err(DescriptorError::UnsupportedType(format_invalid_name(name)));
        }
        Self::union_named(name, alts)
    }

    fn union_named(name: &str, alts: Vec<TypeDescriptor>) -> Result<Self, DescriptorError> {
        if alts.len() < 2 {
            return Err(DescriptorError::UnsupportedType(
                "union needs at least two alternatives".to_string(),
            ));
        }
        // Null alternatives are optionality, not dispatchable shapes.
        let had_null = alts.iter().any(|a| a.kind == Kind::None);
        let mut alts: Vec<TypeDescriptor> =
            alts.into_iter().filter(|a| a.kind != Kind::None).collect();
        let inner = match alts.len() {
            0 => {
                return Err(DescriptorError::UnsupportedType(
                    "union needs a non-null alternative".to_string(),
                ))
            }
            1 => alts.remove(0),
            _ => {
                // Alternatives must be class-like or primitive. A pending
                // reference passes here and is checked again once the
                // registry resolves it.
                if let Some(bad) = alts.iter().find(|a| !a.is_union_alternative()) {
                    return Err(DescriptorError::UnsupportedType(format!(
                        "union alternative `{}` must be a class or primitive",
                        bad.name
                    )));
                }
                TypeDescriptor {
                    kind: Kind::Union,
                    name: name.to_string(),
                    args: alts.into_iter().map(Arc::new).collect(),
                    fields: Vec::new(),
                }
            }
        };
        Ok(if had_null { Self::optional(inner) } else { inner })
    }

    #[must_use]
    pub fn optional(inner: TypeDescriptor) -> Self {
        TypeDescriptor {
            kind: Kind::Optional,
            name: "Optional".to_string(),
            args: vec![Arc::new(inner)],
            fields: Vec::new(),
        }
    }

    /// A lazy by-name reference, resolved against a [`Registry`] when the
    /// parser pushes a frame for it.
    #[must_use]
    pub fn reference(name: &str) -> Self {
        leaf(Kind::Ref, name)
    }

    // ─── structural predicates ─────────────────────────────────────────────

    /// `true` for `String`, `Int`, `Float` and `Bool`.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, Kind::String | Kind::Int | Kind::Float | Kind::Bool)
    }

    /// Element type of a List or Set.
    #[must_use]
    pub fn element_type(&self) -> Option<&Arc<TypeDescriptor>> {
        match self.kind {
            Kind::List | Kind::Set => self.args.first(),
            _ => None,
        }
    }

    #[must_use]
    pub fn dict_value_type(&self) -> Option<&Arc<TypeDescriptor>> {
        if self.kind == Kind::Dict {
            self.args.get(1)
        } else {
            None
        }
    }

    #[must_use]
    pub fn lookup_field(&self, name: &str) -> Option<&Arc<TypeDescriptor>> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    /// `true` when the tuple args are exactly `[T, ...]`.
    #[must_use]
    pub fn tuple_is_variadic(&self) -> bool {
        self.kind == Kind::Tuple
            && self.args.len() == 2
            && self.args[1].kind == Kind::Ellipsis
    }

    /// `true` for the kinds a union may carry as an alternative: records,
    /// references still pending resolution, and primitives.
    fn is_union_alternative(&self) -> bool {
        self.is_primitive() || matches!(self.kind, Kind::Class | Kind::Ref)
    }
}

fn format_invalid_name(name: &str) -> String {
    format!("`{name}` is not a valid identifier")
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ─── registry ──────────────────────────────────────────────────────────────

/// Shared class-name → descriptor table.
///
/// Backs two things: bare class names in type expressions, and lazy
/// resolution of [`Kind::Ref`] descriptors, which is how mutually-recursive
/// records are expressed without constructing an infinite descriptor tree.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    classes: alloc::collections::BTreeMap<String, Arc<TypeDescriptor>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor under its own name and returns the shared
    /// handle. Re-registering a name replaces the previous entry.
    pub fn register(&mut self, desc: TypeDescriptor) -> Arc<TypeDescriptor> {
        let shared = Arc::new(desc);
        self.classes.insert(shared.name.clone(), Arc::clone(&shared));
        shared
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<TypeDescriptor>> {
        self.classes.get(name)
    }

    /// Follows `Ref` indirections down to a concrete descriptor, bounded by
    /// [`MAX_TYPE_DEPTH`].
    pub(crate) fn resolve(
        &self,
        desc: &Arc<TypeDescriptor>,
    ) -> Result<Arc<TypeDescriptor>, DescriptorError> {
        let mut current = Arc::clone(desc);
        for _ in 0..MAX_TYPE_DEPTH {
            match current.kind {
                Kind::Ref => match self.get(&current.name) {
                    Some(found) => current = Arc::clone(found),
                    None => {
                        return Err(DescriptorError::UnsupportedType(format!(
                            "unregistered class `{}`",
                            current.name
                        )))
                    }
                },
                _ => return Ok(current),
            }
        }
        Err(DescriptorError::CyclicType(desc.name.clone()))
    }

    /// Resolves a union alternative and re-validates the alternative
    /// invariant on the result. Constructors accept a pending `Ref`
    /// provisionally; this is where its referent is actually checked, so a
    /// registered descriptor that turns out to be a container cannot slip
    /// into a union slot.
    pub(crate) fn resolve_alternative(
        &self,
        alt: &Arc<TypeDescriptor>,
    ) -> Result<Arc<TypeDescriptor>, DescriptorError> {
        let resolved = self.resolve(alt)?;
        if resolved.is_union_alternative() {
            Ok(resolved)
        } else {
            Err(DescriptorError::UnsupportedType(format!(
                "union alternative `{}` resolves to a non-class, non-primitive type",
                alt.name
            )))
        }
    }
}

// ─── type expressions ──────────────────────────────────────────────────────

/// Parses a compact type expression into a descriptor.
///
/// The grammar mirrors Python type hints rendered as text, which is also the
/// form the advisory wire attribute uses: `list[str]`, `dict[str, int]`,
/// `tuple[int, ...]`, `set[float]`, `Optional[str]`, `Union[A, B]`,
/// `A | B | None`, and bare names. Unknown bare names become [`Kind::Ref`]
/// descriptors; attach a [`Registry`] to the parser to resolve them to full
/// records.
///
/// # Examples
///
/// ```
/// use gasp::{parse_type_expr, Kind};
///
/// let t = parse_type_expr("dict[str, list[int]]").unwrap();
/// assert_eq!(t.kind, Kind::Dict);
/// assert_eq!(t.args[1].kind, Kind::List);
/// ```
///
/// # Errors
///
/// [`DescriptorError::UnsupportedType`] for malformed expressions,
/// [`DescriptorError::CyclicType`] past the nesting cap.
pub fn parse_type_expr(expr: &str) -> Result<TypeDescriptor, DescriptorError> {
    parse_expr(expr, 0)
}

fn parse_expr(expr: &str, depth: usize) -> Result<TypeDescriptor, DescriptorError> {
    if depth > MAX_TYPE_DEPTH {
        return Err(DescriptorError::CyclicType(expr.to_string()));
    }
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(DescriptorError::UnsupportedType(
            "empty type expression".to_string(),
        ));
    }

    // `A | B | None` — pipe binds loosest.
    let pipe_parts = split_top_level(trimmed, '|');
    if pipe_parts.len() > 1 {
        let mut alts = Vec::with_capacity(pipe_parts.len());
        for part in pipe_parts {
            alts.push(parse_expr(part, depth + 1)?);
        }
        return TypeDescriptor::union(alts);
    }

    if let Some(bracket) = trimmed.find('[') {
        let base = trimmed[..bracket].trim();
        let Some(args_end) = trimmed.rfind(']') else {
            return Err(DescriptorError::UnsupportedType(trimmed.to_string()));
        };
        let args_src = &trimmed[bracket + 1..args_end];
        let mut args = Vec::new();
        for part in split_top_level(args_src, ',') {
            args.push(parse_expr(part, depth + 1)?);
        }

        return match base {
            "list" | "List" => match args.len() {
                1 => Ok(TypeDescriptor::list(args.remove(0))),
                n => Err(arity_error(base, 1, n)),
            },
            "set" | "Set" => match args.len() {
                1 => Ok(TypeDescriptor::set(args.remove(0))),
                n => Err(arity_error(base, 1, n)),
            },
            "dict" | "Dict" => match args.len() {
                2 => {
                    let value = args.pop().expect("two args");
                    let key = args.pop().expect("two args");
                    Ok(TypeDescriptor::dict(key, value))
                }
                n => Err(arity_error(base, 2, n)),
            },
            "tuple" | "Tuple" => TypeDescriptor::tuple(args),
            "Optional" => match args.len() {
                1 => Ok(TypeDescriptor::optional(args.remove(0))),
                n => Err(arity_error(base, 1, n)),
            },
            "Union" => TypeDescriptor::union(args),
            _ => Err(DescriptorError::UnsupportedType(trimmed.to_string())),
        };
    }

    Ok(match trimmed {
        "str" | "string" => TypeDescriptor::string(),
        "int" => TypeDescriptor::int(),
        "float" => TypeDescriptor::float(),
        "bool" | "boolean" => TypeDescriptor::boolean(),
        "Any" => TypeDescriptor::any(),
        "None" => TypeDescriptor::none(),
        "..." | "Ellipsis" => TypeDescriptor::ellipsis(),
        // Un-parameterized container classes default to Any elements.
        "list" | "List" => TypeDescriptor::list(TypeDescriptor::any()),
        "set" | "Set" => TypeDescriptor::set(TypeDescriptor::any()),
        "tuple" | "Tuple" => TypeDescriptor::variadic_tuple(TypeDescriptor::any()),
        "dict" | "Dict" => TypeDescriptor::dict(TypeDescriptor::string(), TypeDescriptor::any()),
        name if is_identifier(name) => TypeDescriptor::reference(name),
        other => return Err(DescriptorError::UnsupportedType(other.to_string())),
    })
}

fn arity_error(base: &str, want: usize, got: usize) -> DescriptorError {
    DescriptorError::UnsupportedType(format!("{base} takes {want} argument(s), got {got}"))
}

/// Splits on `sep` at bracket depth zero.
fn split_top_level(src: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in src.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(&src[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&src[start..]);
    parts
}
