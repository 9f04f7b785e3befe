//! The type-directed stack machine.
//!
//! Consumes scanner events guided by the root type descriptor, maintaining a
//! frame stack whose top always represents the value currently being filled.
//! Frames below the top are addressed only through the stack — never by
//! name-matching against an outer descriptor — which is what keeps nested
//! fields from leaking into ancestor records when names collide.
use alloc::{
    boxed::Box,
    collections::BTreeSet,
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};
use core::fmt;

use log::{debug, trace};

use crate::{
    descriptor::{Kind, Registry, TypeDescriptor},
    entities,
    error::{Issue, IssueKind, ParseFatal, ValidateError},
    scanner::TagEvent,
    value::{Map, Value},
};

/// Conventional tag for container items and dict entries.
const ITEM_TAG: &str = "item";

/// Customizes how records materialize from partial field maps.
///
/// Absent a hook the engine returns the generic field-map form,
/// [`Value::Object`]. Returning `None` from the hook falls back to the same.
pub trait Materializer {
    fn from_partial(&self, class: &str, fields: &Map) -> Option<Value>;
}

// ─── frames ────────────────────────────────────────────────────────────────

/// Stack entry: one in-progress value and its governing descriptor.
#[derive(Debug)]
struct Frame {
    desc: Arc<TypeDescriptor>,
    /// The opening tag name, matched against closes.
    tag: String,
    /// For object fields: the field this frame's value is attached to. Not
    /// always the tag name — a union-typed field opened by alternative class
    /// name records the field here.
    target_field: Option<String>,
    body: FrameBody,
}

#[derive(Debug)]
enum FrameBody {
    /// Primitive content accumulator.
    Field { buf: String },
    List {
        items: Vec<Value>,
    },
    Set {
        items: Vec<Value>,
    },
    /// Positional index is the running item count.
    Tuple {
        items: Vec<Value>,
    },
    Dict {
        entries: Map,
        current_key: Option<String>,
    },
    Object {
        fields: Map,
        unassigned: BTreeSet<String>,
    },
    /// Placeholder waiting for the first child tag to pick the alternative.
    Union { value: Option<Value> },
    /// Foreign-tag transparency; content ignored until the matching close.
    Skip { depth: usize },
}

impl Frame {
    fn new(desc: Arc<TypeDescriptor>, tag: &str, target_field: Option<String>) -> Self {
        let body = match desc.kind {
            Kind::List => FrameBody::List { items: Vec::new() },
            Kind::Set => FrameBody::Set { items: Vec::new() },
            Kind::Tuple => FrameBody::Tuple { items: Vec::new() },
            Kind::Dict => FrameBody::Dict {
                entries: Map::new(),
                current_key: None,
            },
            Kind::Class => FrameBody::Object {
                fields: Map::new(),
                unassigned: desc.fields.iter().map(|(n, _)| n.clone()).collect(),
            },
            Kind::Union => FrameBody::Union { value: None },
            _ => FrameBody::Field { buf: String::new() },
        };
        Self {
            desc,
            tag: tag.to_string(),
            target_field,
            body,
        }
    }

    fn new_skip(tag: &str) -> Self {
        Self {
            desc: Arc::new(TypeDescriptor::any()),
            tag: tag.to_string(),
            target_field: None,
            body: FrameBody::Skip { depth: 1 },
        }
    }

    fn is_skip(&self) -> bool {
        matches!(self.body, FrameBody::Skip { .. })
    }
}

// ─── the machine ───────────────────────────────────────────────────────────

pub(crate) struct StackMachine {
    root_desc: Arc<TypeDescriptor>,
    registry: Registry,
    stack: Vec<Frame>,
    result: Option<Value>,
    opened: bool,
    complete: bool,
    issues: Vec<Issue>,
    text_len: usize,
    max_text_len: usize,
    materializer: Option<Box<dyn Materializer>>,
}

impl fmt::Debug for StackMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackMachine")
            .field("root_desc", &self.root_desc.name)
            .field("stack", &self.stack)
            .field("opened", &self.opened)
            .field("complete", &self.complete)
            .finish_non_exhaustive()
    }
}

impl StackMachine {
    pub(crate) fn new(
        root_desc: Arc<TypeDescriptor>,
        registry: Registry,
        max_text_len: usize,
    ) -> Self {
        Self {
            root_desc,
            registry,
            stack: Vec::with_capacity(8),
            result: None,
            opened: false,
            complete: false,
            issues: Vec::new(),
            text_len: 0,
            max_text_len,
            materializer: None,
        }
    }

    pub(crate) fn set_materializer(&mut self, hook: Box<dyn Materializer>) {
        self.materializer = Some(hook);
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.complete
    }

    pub(crate) fn issues(&self) -> &[Issue] {
        &self.issues
    }

    fn record(&mut self, tag: &str, kind: IssueKind) {
        debug!("recording issue in <{tag}>: {kind}");
        self.issues.push(Issue {
            tag: tag.to_string(),
            kind,
        });
    }

    /// Follows `Ref` and `Optional` indirections to the concrete descriptor
    /// a frame should be typed by. Unresolvable references degrade to `Any`
    /// with a recorded issue.
    fn effective(&mut self, desc: &Arc<TypeDescriptor>, at_tag: &str) -> Arc<TypeDescriptor> {
        let mut current = Arc::clone(desc);
        loop {
            match current.kind {
                Kind::Optional => current = Arc::clone(&current.args[0]),
                Kind::Ref => match self.registry.resolve(&current) {
                    Ok(found) => current = found,
                    Err(_) => {
                        self.record(at_tag, IssueKind::UnresolvedRef(current.name.clone()));
                        return Arc::new(TypeDescriptor::any());
                    }
                },
                _ => return current,
            }
        }
    }

    // ─── event consumption ─────────────────────────────────────────────────

    pub(crate) fn on_event(&mut self, event: TagEvent) -> Result<(), ParseFatal> {
        trace!("event: {event:?}");
        match event {
            TagEvent::Open { name, attrs } => {
                self.on_open(&name, &attrs);
                Ok(())
            }
            TagEvent::Text(text) => self.on_text(text),
            TagEvent::Close { name } => {
                self.on_close(&name);
                Ok(())
            }
        }
    }

    fn on_open(&mut self, name: &str, attrs: &[(String, String)]) {
        if self.complete {
            debug!("ignoring <{name}> after the root closed");
            return;
        }
        if !self.opened {
            self.open_root(name, attrs);
            return;
        }

        // Everything below addresses the stack top only.
        let top = self.stack.last_mut().expect("opened implies a frame");
        if let FrameBody::Skip { depth } = &mut top.body {
            *depth += 1;
            return;
        }
        match &self.stack.last().expect("opened implies a frame").body {
            FrameBody::Field { .. } => {
                // Foreign markup inside primitive content.
                self.stack.push(Frame::new_skip(name));
            }
            FrameBody::List { .. } | FrameBody::Set { .. } | FrameBody::Tuple { .. } => {
                self.open_container_item(name, attrs);
            }
            FrameBody::Dict { .. } => {
                self.open_dict_entry(name, attrs);
            }
            FrameBody::Object { .. } => {
                self.open_object_field(name, attrs);
            }
            FrameBody::Union { .. } => {
                let desc = Arc::clone(&self.stack.last().expect("top exists").desc);
                match self.pick_alternative(&desc, name, attrs) {
                    Some(alt) => self.stack.push(Frame::new(alt, name, None)),
                    None => self.stack.push(Frame::new_skip(name)),
                }
            }
            FrameBody::Skip { .. } => unreachable!("handled above"),
        }
    }

    fn open_root(&mut self, name: &str, attrs: &[(String, String)]) {
        self.opened = true;
        let desc = Arc::clone(&self.root_desc);
        let desc = self.effective(&desc, name);
        if desc.kind == Kind::Union {
            if let Some(alt) = self.pick_alternative(&desc, name, attrs) {
                self.stack.push(Frame::new(alt, name, None));
            } else {
                // The alias tag itself (or an unrecognized type attribute):
                // wait for the first child tag to pick the alternative.
                self.stack.push(Frame::new(desc, name, None));
            }
        } else {
            self.stack.push(Frame::new(desc, name, None));
        }
    }

    /// Union dispatch: a `type="X"` attribute authoritatively selects the
    /// alternative, else the tag name does.
    fn pick_alternative(
        &mut self,
        union: &Arc<TypeDescriptor>,
        name: &str,
        attrs: &[(String, String)],
    ) -> Option<Arc<TypeDescriptor>> {
        let by_name = |wanted: &str| {
            union
                .args
                .iter()
                .find(|alt| alt.name == wanted)
                .map(Arc::clone)
        };
        if let Some(explicit) = attr(attrs, "type") {
            if let Some(alt) = by_name(explicit) {
                return self.resolve_picked(&alt, name);
            }
        }
        let alt = by_name(name)?;
        self.resolve_picked(&alt, name)
    }

    /// A chosen alternative still has to resolve to a record or primitive;
    /// one that does not leaves the union unresolved.
    fn resolve_picked(
        &mut self,
        alt: &Arc<TypeDescriptor>,
        at_tag: &str,
    ) -> Option<Arc<TypeDescriptor>> {
        match self.registry.resolve_alternative(alt) {
            Ok(resolved) => Some(resolved),
            Err(_) => {
                self.record(at_tag, IssueKind::UnresolvedRef(alt.name.clone()));
                None
            }
        }
    }

    fn open_container_item(&mut self, name: &str, attrs: &[(String, String)]) {
        let top = self.stack.last().expect("container frame");
        let container_tag = top.tag.clone();
        let elem = match (&top.body, top.desc.kind) {
            (FrameBody::Tuple { items }, Kind::Tuple) => {
                if top.desc.tuple_is_variadic() {
                    Some(Arc::clone(&top.desc.args[0]))
                } else if items.len() < top.desc.args.len() {
                    Some(Arc::clone(&top.desc.args[items.len()]))
                } else {
                    None
                }
            }
            (_, _) => top.desc.args.first().map(Arc::clone),
        };

        let Some(elem) = elem else {
            let position = match &self.stack.last().expect("container frame").body {
                FrameBody::Tuple { items } => items.len(),
                _ => 0,
            };
            self.record(&container_tag, IssueKind::TupleOverflow(position));
            self.stack.push(Frame::new_skip(name));
            return;
        };
        let elem = self.effective(&elem, &container_tag);

        // Accept the conventional item tag, the element class name, or any
        // union alternative's class name.
        let accepted = name == ITEM_TAG
            || elem.name == name
            || (elem.kind == Kind::Union && elem.args.iter().any(|alt| alt.name == name));
        if !accepted {
            self.stack.push(Frame::new_skip(name));
            return;
        }

        let item_desc = if elem.kind == Kind::Union {
            // Unresolved stays a Union placeholder frame.
            self.pick_alternative(&elem, name, attrs).unwrap_or(elem)
        } else {
            elem
        };
        self.stack.push(Frame::new(item_desc, name, None));
    }

    fn open_dict_entry(&mut self, name: &str, attrs: &[(String, String)]) {
        if name != ITEM_TAG {
            self.stack.push(Frame::new_skip(name));
            return;
        }
        let top = self.stack.last().expect("dict frame");
        let dict_tag = top.tag.clone();
        let value_desc = top
            .desc
            .dict_value_type()
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::new(TypeDescriptor::any()));

        let Some(key) = attr(attrs, "key") else {
            self.record(&dict_tag, IssueKind::MissingDictKey);
            self.stack.push(Frame::new_skip(name));
            return;
        };
        let key = key.to_string();

        let value_desc = self.effective(&value_desc, &dict_tag);
        let value_desc = if value_desc.kind == Kind::Union {
            self.pick_alternative(&value_desc, name, attrs)
                .unwrap_or(value_desc)
        } else {
            value_desc
        };

        if let FrameBody::Dict { current_key, .. } =
            &mut self.stack.last_mut().expect("dict frame").body
        {
            *current_key = Some(key);
        }
        self.stack.push(Frame::new(value_desc, name, None));
    }

    fn open_object_field(&mut self, name: &str, attrs: &[(String, String)]) {
        let top = self.stack.last().expect("object frame");
        let object_tag = top.tag.clone();
        let object_desc = Arc::clone(&top.desc);

        // The name must belong to this object's OWN descriptor; descendant
        // and ancestor fields are out of reach from here.
        if let Some(field_desc) = object_desc.lookup_field(name).map(Arc::clone) {
            let field_desc = self.effective(&field_desc, name);
            let frame_desc = if field_desc.kind == Kind::Union {
                self.pick_alternative(&field_desc, name, attrs)
                    .unwrap_or(field_desc)
            } else {
                field_desc
            };
            self.stack
                .push(Frame::new(frame_desc, name, Some(name.to_string())));
            return;
        }

        // A union-typed field may be opened directly by alternative name.
        let union_field = object_desc.fields.iter().find_map(|(fname, fdesc)| {
            let concrete = unwrap_shallow(fdesc);
            if concrete.kind == Kind::Union {
                concrete
                    .args
                    .iter()
                    .find(|alt| alt.name == name)
                    .map(|alt| (fname.clone(), Arc::clone(alt)))
            } else {
                None
            }
        });
        if let Some((field_name, alt)) = union_field {
            let alt = self.effective(&alt, name);
            self.stack.push(Frame::new(alt, name, Some(field_name)));
            return;
        }

        self.record(&object_tag, IssueKind::UnknownField(name.to_string()));
        self.stack.push(Frame::new_skip(name));
    }

    fn on_text(&mut self, text: String) -> Result<(), ParseFatal> {
        let Some(top) = self.stack.last_mut() else {
            return Ok(());
        };
        match &mut top.body {
            FrameBody::Field { buf } => {
                self.text_len += text.len();
                if self.text_len > self.max_text_len {
                    return Err(ParseFatal::BudgetExceeded {
                        accumulated: self.text_len,
                        cap: self.max_text_len,
                    });
                }
                buf.push_str(&text);
            }
            FrameBody::Skip { .. } => {}
            _ => {
                // Whitespace between tags is structure, not content; anything
                // else is recovery input and maps to a no-op.
                if !text.trim().is_empty() {
                    trace!("dropping stray text in <{}>", top.tag);
                }
            }
        }
        Ok(())
    }

    fn on_close(&mut self, name: &str) {
        if self.stack.is_empty() {
            return;
        }

        let top = self.stack.last_mut().expect("non-empty");
        if let FrameBody::Skip { depth } = &mut top.body {
            *depth -= 1;
            let exhausted = *depth == 0;
            if exhausted {
                self.stack.pop();
            }
            return;
        }

        if top.tag == name {
            self.close_top();
            return;
        }

        // Tolerated mismatch: pop frames until a match, or drop the close if
        // nothing on the stack ever opened under that name.
        if self.stack.iter().any(|f| f.tag == name) {
            while self.stack.last().map(|f| f.tag != name) == Some(true) {
                self.close_top();
            }
            self.close_top();
        } else {
            debug!("dropping unmatched </{name}>");
        }
    }

    /// Pops the top frame, finalizes its value, and attaches it to the
    /// parent (or completes the root).
    fn close_top(&mut self) {
        let frame = self.stack.pop().expect("close_top on non-empty stack");
        if frame.is_skip() {
            return;
        }
        let at_root = self.stack.is_empty();
        let value = self.finalize(frame.desc, &frame.tag, frame.body, at_root);

        if at_root {
            self.result = Some(value);
            self.complete = true;
            return;
        }

        let target = frame.target_field;
        let parent = self.stack.last_mut().expect("parent exists");
        match &mut parent.body {
            FrameBody::List { items } | FrameBody::Tuple { items } => items.push(value),
            FrameBody::Set { items } => {
                // Structural dedup; insertion order is preserved.
                if !items.contains(&value) {
                    items.push(value);
                }
            }
            FrameBody::Dict {
                entries,
                current_key,
            } => {
                if let Some(key) = current_key.take() {
                    entries.insert(key, value);
                }
            }
            FrameBody::Object { fields, unassigned } => {
                if let Some(field) = target {
                    unassigned.remove(&field);
                    fields.insert(field, value);
                }
            }
            FrameBody::Union { value: slot } => *slot = Some(value),
            FrameBody::Field { .. } | FrameBody::Skip { .. } => {
                trace!("dropping value closed under <{}>", parent.tag);
            }
        }
    }

    fn finalize(
        &mut self,
        desc: Arc<TypeDescriptor>,
        tag: &str,
        body: FrameBody,
        at_root: bool,
    ) -> Value {
        match body {
            FrameBody::Field { buf } => self.finalize_primitive(desc.kind, tag, &buf, at_root),
            FrameBody::List { items } => Value::List(items),
            FrameBody::Set { items } => Value::Set(items),
            FrameBody::Tuple { items } => Value::Tuple(items),
            FrameBody::Dict { entries, .. } => Value::Dict(entries),
            FrameBody::Object {
                mut fields,
                unassigned,
            } => {
                // Unassigned optional fields resolve to null when their
                // record closes.
                for (fname, fdesc) in &desc.fields {
                    if unassigned.contains(fname) && fdesc.kind == Kind::Optional {
                        fields.insert(fname.clone(), Value::Null);
                    }
                }
                self.materialize(&desc.name, fields)
            }
            FrameBody::Union { value } => match value {
                Some(v) => v,
                None => {
                    self.record(tag, IssueKind::UnresolvedUnion(tag.to_string()));
                    Value::Null
                }
            },
            FrameBody::Skip { .. } => Value::Null,
        }
    }

    fn finalize_primitive(&mut self, kind: Kind, tag: &str, buf: &str, at_root: bool) -> Value {
        match kind {
            Kind::Int => match parse_int(buf.trim()) {
                Some(n) => Value::Int(n),
                None => {
                    self.record_parse_failure(tag, buf, "int");
                    Value::Int(0)
                }
            },
            Kind::Float => match buf.trim().parse::<f64>() {
                Ok(n) => Value::Float(n),
                Err(_) => {
                    self.record_parse_failure(tag, buf, "float");
                    Value::Float(0.0)
                }
            },
            Kind::Bool => match parse_bool(buf.trim()) {
                Some(b) => Value::Bool(b),
                None => {
                    self.record_parse_failure(tag, buf, "bool");
                    Value::Bool(false)
                }
            },
            Kind::None => Value::Null,
            // String and Any: entity-decoded; trimmed at object scope, kept
            // verbatim when the string is the whole wanted region.
            _ => {
                let decoded = entities::decode(buf);
                if at_root {
                    Value::String(decoded.into_owned())
                } else {
                    Value::String(decoded.trim().to_string())
                }
            }
        }
    }

    fn record_parse_failure(&mut self, tag: &str, text: &str, target: &'static str) {
        self.record(
            tag,
            IssueKind::PrimitiveParse {
                text: text.trim().to_string(),
                target,
            },
        );
    }

    fn materialize(&self, class: &str, fields: Map) -> Value {
        if let Some(hook) = &self.materializer {
            if let Some(custom) = hook.from_partial(class, &fields) {
                return custom;
            }
        }
        Value::Object {
            class: class.to_string(),
            fields,
        }
    }

    // ─── partial snapshots ─────────────────────────────────────────────────

    /// Best-effort materialization of the root value at this instant.
    pub(crate) fn snapshot(&self) -> Option<Value> {
        if let Some(result) = &self.result {
            return Some(result.clone());
        }
        if !self.opened {
            return None;
        }

        let mut child: Option<(Value, Option<String>)> = None;
        for (i, frame) in self.stack.iter().enumerate().rev() {
            let snap = self.frame_snapshot(frame, i == 0, child.take());
            child = snap.map(|v| (v, frame.target_field.clone()));
        }
        child.map(|(v, _)| v)
    }

    fn frame_snapshot(
        &self,
        frame: &Frame,
        at_root: bool,
        child: Option<(Value, Option<String>)>,
    ) -> Option<Value> {
        match &frame.body {
            FrameBody::Skip { .. } => None,
            FrameBody::Field { buf } => partial_primitive(frame.desc.kind, buf, at_root),
            FrameBody::List { items } | FrameBody::Tuple { items } => {
                let mut items = items.clone();
                if let Some((v, _)) = child {
                    items.push(v);
                }
                Some(if frame.desc.kind == Kind::Tuple {
                    Value::Tuple(items)
                } else {
                    Value::List(items)
                })
            }
            FrameBody::Set { items } => {
                let mut items = items.clone();
                if let Some((v, _)) = child {
                    if !items.contains(&v) {
                        items.push(v);
                    }
                }
                Some(Value::Set(items))
            }
            FrameBody::Dict {
                entries,
                current_key,
            } => {
                let mut entries = entries.clone();
                if let (Some(key), Some((v, _))) = (current_key, child) {
                    entries.insert(key.clone(), v);
                }
                Some(Value::Dict(entries))
            }
            FrameBody::Object { fields, .. } => {
                let mut fields = fields.clone();
                if let Some((v, Some(field))) = child {
                    fields.insert(field, v);
                }
                Some(self.materialize(&frame.desc.name, fields))
            }
            FrameBody::Union { value } => child.map(|(v, _)| v).or_else(|| value.clone()),
        }
    }

    // ─── validation ────────────────────────────────────────────────────────

    /// The final value, checked for missing required fields. Callable before
    /// completion, in which case the current partial is checked.
    pub(crate) fn validate(&self) -> Result<Value, ValidateError> {
        let Some(value) = self.result.clone().or_else(|| self.snapshot()) else {
            return Err(ValidateError::RootNeverOpened);
        };
        let mut missing = Vec::new();
        collect_missing(&self.registry, &self.root_desc, &value, "", &mut missing);
        if missing.is_empty() {
            Ok(value)
        } else {
            Err(ValidateError::MissingFields { missing })
        }
    }
}

// ─── helpers ───────────────────────────────────────────────────────────────

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Unwraps `Optional` layers without touching the registry; used where a
/// read-only peek at the concrete kind is enough.
fn unwrap_shallow(desc: &Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
    let mut current = Arc::clone(desc);
    while current.kind == Kind::Optional {
        let inner = Arc::clone(&current.args[0]);
        current = inner;
    }
    current
}

/// Base-10 first, then sign-aware base-0: `0x` / `0o` / `0b` prefixes with an
/// optional leading sign.
fn parse_int(src: &str) -> Option<i64> {
    if let Ok(n) = src.parse::<i64>() {
        return Some(n);
    }
    let (negative, digits) = match src.as_bytes().first() {
        Some(b'-') => (true, &src[1..]),
        Some(b'+') => (false, &src[1..]),
        _ => (false, src),
    };
    let (radix, digits) = match digits.get(..2) {
        Some("0x") | Some("0X") => (16, &digits[2..]),
        Some("0o") | Some("0O") => (8, &digits[2..]),
        Some("0b") | Some("0B") => (2, &digits[2..]),
        _ => return None,
    };
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_bool(src: &str) -> Option<bool> {
    if src.eq_ignore_ascii_case("true")
        || src.eq_ignore_ascii_case("yes")
        || src == "1"
    {
        Some(true)
    } else if src.eq_ignore_ascii_case("false")
        || src.eq_ignore_ascii_case("no")
        || src == "0"
    {
        Some(false)
    } else {
        None
    }
}

fn partial_primitive(kind: Kind, buf: &str, at_root: bool) -> Option<Value> {
    match kind {
        Kind::Int => parse_int(buf.trim()).map(Value::Int),
        Kind::Float => buf.trim().parse::<f64>().ok().map(Value::Float),
        Kind::Bool => parse_bool(buf.trim()).map(Value::Bool),
        Kind::None => Some(Value::Null),
        _ => {
            let decoded = entities::decode(buf);
            Some(if at_root {
                Value::String(decoded.into_owned())
            } else {
                Value::String(decoded.trim().to_string())
            })
        }
    }
}

/// Walks descriptor and value together, recording required (non-optional)
/// record fields with no value.
fn collect_missing(
    registry: &Registry,
    desc: &Arc<TypeDescriptor>,
    value: &Value,
    path: &str,
    missing: &mut Vec<String>,
) {
    let desc = match registry.resolve(desc) {
        Ok(d) => d,
        Err(_) => return,
    };
    match (desc.kind, value) {
        (Kind::Optional, _) => {
            if !value.is_null() {
                collect_missing(registry, &desc.args[0], value, path, missing);
            }
        }
        (Kind::Class, Value::Object { fields, .. }) => {
            for (fname, fdesc) in &desc.fields {
                let field_path = join_path(path, fname);
                match fields.get(fname) {
                    None => {
                        if fdesc.kind != Kind::Optional {
                            missing.push(field_path);
                        }
                    }
                    Some(v) => collect_missing(registry, fdesc, v, &field_path, missing),
                }
            }
        }
        (Kind::Union, Value::Object { class, .. }) => {
            if let Some(alt) = desc.args.iter().find(|alt| alt.name == *class) {
                collect_missing(registry, alt, value, path, missing);
            }
        }
        (Kind::List | Kind::Set, Value::List(items))
        | (Kind::List | Kind::Set, Value::Set(items)) => {
            if let Some(elem) = desc.args.first() {
                for (i, item) in items.iter().enumerate() {
                    let item_path = join_index(path, i);
                    collect_missing(registry, elem, item, &item_path, missing);
                }
            }
        }
        (Kind::Tuple, Value::Tuple(items)) => {
            if desc.tuple_is_variadic() {
                for (i, item) in items.iter().enumerate() {
                    let item_path = join_index(path, i);
                    collect_missing(registry, &desc.args[0], item, &item_path, missing);
                }
            } else {
                for (i, (item, ty)) in items.iter().zip(desc.args.iter()).enumerate() {
                    let item_path = join_index(path, i);
                    collect_missing(registry, ty, item, &item_path, missing);
                }
            }
        }
        (Kind::Dict, Value::Dict(entries)) => {
            if let Some(vty) = desc.dict_value_type() {
                for (key, v) in entries {
                    let entry_path = join_path(path, key);
                    collect_missing(registry, vty, v, &entry_path, missing);
                }
            }
        }
        _ => {}
    }
}

fn join_path(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        let mut joined = String::with_capacity(path.len() + 1 + segment.len());
        joined.push_str(path);
        joined.push('.');
        joined.push_str(segment);
        joined
    }
}

fn join_index(path: &str, index: usize) -> String {
    let mut joined = String::from(path);
    joined.push('[');
    joined.push_str(&index.to_string());
    joined.push(']');
    joined
}
