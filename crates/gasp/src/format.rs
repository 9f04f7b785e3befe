//! Schema-to-prompt formatting.
//!
//! Renders a type descriptor into the illustrative XML block pasted into an
//! LLM prompt, so the model knows which tags the parser will be looking for.
//! Consumes the descriptor model only; nothing here touches the parser.
use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt::Write;

use crate::descriptor::{Kind, TypeDescriptor};

/// Renders XML format instructions for a type.
///
/// # Examples
///
/// ```
/// use gasp::{format_instructions, TypeDescriptor};
///
/// let t = TypeDescriptor::list(TypeDescriptor::int());
/// assert_eq!(
///     format_instructions(&t),
///     "<list type=\"list[int]\">\n    <item>42</item>\n    <item>42</item>\n    ...\n</list>"
/// );
/// ```
#[must_use]
pub fn format_instructions(desc: &TypeDescriptor) -> String {
    let tag = &desc.name;
    match desc.kind {
        Kind::Union => {
            // Alternatives tag the wire; the alias never wraps them.
            let options: Vec<String> = desc
                .args
                .iter()
                .enumerate()
                .map(|(i, alt)| format!("// Option {}:\n{}", i + 1, format_instructions(alt)))
                .collect();
            options.join("\n\n- OR -\n\n")
        }
        Kind::Optional => {
            let inner = format_instructions(&desc.args[0]);
            format!("// Option 1: Value\n{inner}\n\n- OR -\n\n// Option 2: Null\nnull")
        }
        Kind::List | Kind::Set => {
            let item = desc.args.first().map_or("...".to_string(), |e| inline_example(e));
            format!(
                "<{tag} type=\"{attr}\">\n    <item>{item}</item>\n    <item>{item}</item>\n    ...\n</{tag}>",
                attr = type_attr(desc),
            )
        }
        Kind::Tuple => {
            let mut out = format!("<{tag} type=\"{}\">\n", type_attr(desc));
            if desc.tuple_is_variadic() {
                let item = inline_example(&desc.args[0]);
                let _ = write!(out, "    <item>{item}</item>\n    <item>{item}</item>\n    ...\n");
            } else {
                for arg in &desc.args {
                    let _ = writeln!(out, "    <item>{}</item>", inline_example(arg));
                }
            }
            let _ = write!(out, "</{tag}>");
            out
        }
        Kind::Dict => format!(
            "<{tag} type=\"{attr}\">\n    <item key=\"key1\">value1</item>\n    <item key=\"key2\">value2</item>\n    ...\n</{tag}>",
            attr = type_attr(desc),
        ),
        Kind::Class => {
            if desc.fields.is_empty() {
                return format!("<{tag}>\n</{tag}>");
            }
            let mut out = format!("<{tag}>\n");
            for (fname, fdesc) in &desc.fields {
                let _ = writeln!(out, "    {}", format_field(fname, fdesc));
            }
            let _ = write!(out, "</{tag}>");
            out
        }
        _ => format!(
            "<{tag} type=\"{attr}\">{example}</{tag}>",
            attr = type_attr(desc),
            example = inline_example(desc),
        ),
    }
}

/// One field line inside a record's instruction block.
fn format_field(name: &str, desc: &TypeDescriptor) -> String {
    match desc.kind {
        Kind::Optional => {
            let inner = &desc.args[0];
            format!(
                "<{name} type=\"{}\">{}</{name}> (optional)",
                type_attr(inner),
                inline_example(inner),
            )
        }
        Kind::List | Kind::Set => {
            let item = desc.args.first().map_or("...".to_string(), |e| inline_example(e));
            format!(
                "<{name} type=\"{attr}\">\n        <item>{item}</item>\n        ...\n    </{name}>",
                attr = type_attr(desc),
            )
        }
        _ => format!(
            "<{name} type=\"{}\">{}</{name}>",
            type_attr(desc),
            inline_example(desc),
        ),
    }
}

/// The compact expression used in `type="…"` attributes; round-trips through
/// [`parse_type_expr`](crate::parse_type_expr).
fn type_attr(desc: &TypeDescriptor) -> String {
    match desc.kind {
        Kind::List | Kind::Set => {
            let base = if desc.kind == Kind::Set { "set" } else { "list" };
            match desc.args.first() {
                Some(elem) => format!("{base}[{}]", type_attr(elem)),
                None => base.to_string(),
            }
        }
        Kind::Dict => match (desc.args.first(), desc.args.get(1)) {
            (Some(k), Some(v)) => format!("dict[{}, {}]", type_attr(k), type_attr(v)),
            _ => "dict".to_string(),
        },
        Kind::Tuple => {
            let args: Vec<String> = desc.args.iter().map(|a| type_attr(a)).collect();
            format!("tuple[{}]", args.join(", "))
        }
        Kind::Union => {
            let alts: Vec<String> = desc.args.iter().map(|a| type_attr(a)).collect();
            alts.join(" | ")
        }
        Kind::Optional => format!("Optional[{}]", type_attr(&desc.args[0])),
        _ => desc.name.clone(),
    }
}

/// A one-line example for a type, used inside item and field tags.
fn inline_example(desc: &TypeDescriptor) -> String {
    match desc.kind {
        Kind::String => "string value".to_string(),
        Kind::Int => "42".to_string(),
        Kind::Float => "3.14".to_string(),
        Kind::Bool => "true".to_string(),
        Kind::None => "null".to_string(),
        Kind::List | Kind::Set => match desc.args.first() {
            Some(elem) => format!("[{} items]", elem.name),
            None => "[items]".to_string(),
        },
        Kind::Dict => "{key: value pairs}".to_string(),
        Kind::Union => {
            let names: Vec<&str> = desc.args.iter().map(|a| a.name.as_str()).collect();
            names.join(" or ")
        }
        Kind::Optional => inline_example(&desc.args[0]),
        _ => desc.name.clone(),
    }
}

/// Replaces `{{placeholder}}` in `template` with the format instructions for
/// `desc`. The default placeholder is `return_type`.
///
/// # Examples
///
/// ```
/// use gasp::{interpolate_prompt, TypeDescriptor};
///
/// let prompt = interpolate_prompt(
///     "Reply with: {{return_type}}",
///     &TypeDescriptor::int(),
///     "return_type",
/// );
/// assert_eq!(prompt, "Reply with: <int type=\"int\">42</int>");
/// ```
#[must_use]
pub fn interpolate_prompt(template: &str, desc: &TypeDescriptor, placeholder: &str) -> String {
    let needle = format!("{{{{{placeholder}}}}}");
    if !template.contains(&needle) {
        return template.to_string();
    }
    template.replace(&needle, &format_instructions(desc))
}
