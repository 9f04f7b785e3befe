//! The typed value tree produced by the parser.
//!
//! [`Value`] represents any value the stack machine can materialize: the four
//! primitives, `Null`, the container shapes, and named records. Partial
//! snapshots returned during streaming and the final result share this
//! representation.
use alloc::{collections::BTreeMap, string::String, vec::Vec};

pub type Map = BTreeMap<String, Value>;
pub type Array = Vec<Value>;

/// A typed value extracted from a tagged region.
///
/// `Set` keeps insertion order; uniqueness is enforced structurally on
/// insert. `Object` carries the record's class name so union results stay
/// discriminated after parsing.
///
/// # Examples
///
/// ```
/// use gasp::{Map, Value};
///
/// let mut fields = Map::new();
/// fields.insert("name".to_string(), Value::String("Alice".into()));
/// let v = Value::Object {
///     class: "Person".to_string(),
///     fields,
/// };
/// assert_eq!(v.to_string(), r#"Person {"name": "Alice"}"#);
/// ```
// Serde support is enabled for tests and for downstream crates that opt into
// the `serde` feature; normal builds stay free of the dependency.
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Array),
    Set(Array),
    Tuple(Array),
    Dict(Map),
    Object { class: String, fields: Map },
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(String::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl Value {
    /// Returns `true` if the value is [`Null`].
    ///
    /// [`Null`]: Value::Null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` if the value is a primitive (`Bool`, `Int`, `Float` or
    /// `String`).
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Bool(..) | Self::Int(..) | Self::Float(..) | Self::String(..)
        )
    }

    /// Returns `true` if the value is an [`Object`].
    ///
    /// [`Object`]: Value::Object
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object { .. })
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if let Self::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let Self::Int(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Set(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_dict(&self) -> Option<&Map> {
        if let Self::Dict(map) = self {
            Some(map)
        } else {
            None
        }
    }

    /// Looks up a record field by name.
    ///
    /// # Examples
    ///
    /// ```
    /// use gasp::{Map, Value};
    ///
    /// let mut fields = Map::new();
    /// fields.insert("age".to_string(), Value::Int(30));
    /// let v = Value::Object {
    ///     class: "Person".to_string(),
    ///     fields,
    /// };
    /// assert_eq!(v.lookup_field("age"), Some(&Value::Int(30)));
    /// assert_eq!(v.lookup_field("name"), None);
    /// ```
    #[must_use]
    pub fn lookup_field(&self, name: &str) -> Option<&Value> {
        if let Self::Object { fields, .. } = self {
            fields.get(name)
        } else {
            None
        }
    }

    /// The record class name, if the value is an object.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        if let Self::Object { class, .. } = self {
            Some(class)
        } else {
            None
        }
    }
}

/// Escapes quotes, backslashes and control characters for inclusion in a
/// double-quoted diagnostic literal.
pub(crate) fn write_escaped_string<W: core::fmt::Write>(src: &str, f: &mut W) -> core::fmt::Result {
    for c in src.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            c if c.is_ascii_control() => write!(f, "\\u{:04X}", c as u32)?,
            _ => f.write_char(c)?,
        }
    }
    Ok(())
}

fn write_items(items: &[Value], open: &str, close: &str, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str(open)?;
    let mut first = true;
    for v in items {
        if !first {
            f.write_str(", ")?;
        }
        first = false;
        write!(f, "{v}")?;
    }
    f.write_str(close)
}

impl core::fmt::Display for Value {
    /// Renders a compact JSON-flavored diagnostic form. Sets print as
    /// `{...}`, tuples as `(...)`, objects as `Class {...}`.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::String(s) => {
                f.write_str("\"")?;
                write_escaped_string(s, f)?;
                f.write_str("\"")
            }
            Value::List(items) => write_items(items, "[", "]", f),
            Value::Set(items) => write_items(items, "{", "}", f),
            Value::Tuple(items) => write_items(items, "(", ")", f),
            Value::Dict(map) => {
                f.write_str("{")?;
                let mut first = true;
                for (k, v) in map {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    f.write_str("\"")?;
                    write_escaped_string(k, f)?;
                    write!(f, "\": {v}")?;
                }
                f.write_str("}")
            }
            Value::Object { class, fields } => {
                if !class.is_empty() {
                    write!(f, "{class} ")?;
                }
                f.write_str("{")?;
                let mut first = true;
                for (k, v) in fields {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    f.write_str("\"")?;
                    write_escaped_string(k, f)?;
                    write!(f, "\": {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}
