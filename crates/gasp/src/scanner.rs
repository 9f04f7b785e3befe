//! The incremental tag scanner.
//!
//! Transforms a chunked byte stream into a sequence of tag events that are
//! semantically meaningful to the stack machine, hiding lexical concerns:
//! token recognition, attribute parsing, ignored-tag elision, wanted-region
//! tracking, and recovery from the malformed markup LLMs routinely emit.
//!
//! The scanner is resumable: each [`TagScanner::consume`] call emits every
//! event producible from the carry buffer plus the new chunk and retains any
//! trailing bytes that form an incomplete token prefix, so `<Pers` now and
//! `on>` later still emit a single `Open`.
use alloc::{
    collections::BTreeSet,
    string::{String, ToString},
    vec::Vec,
};

use log::debug;

use crate::entities;

/// A stray `<` must resolve into a tag within this many bytes; past the
/// bound it is reinterpreted as text.
const MAX_TAG_LEN: usize = 256;

/// An event produced by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEvent {
    Open {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Close {
        name: String,
    },
}

impl TagEvent {
    pub(crate) fn open(name: &str, attrs: Vec<(String, String)>) -> Self {
        Self::Open {
            name: name.to_string(),
            attrs,
        }
    }

    pub(crate) fn close(name: &str) -> Self {
        Self::Close {
            name: name.to_string(),
        }
    }
}

// ─── tag lexing ────────────────────────────────────────────────────────────

/// Outcome of lexing at a `<`.
enum Lexed {
    /// Not enough bytes yet; keep the suffix and wait for the next chunk.
    Incomplete,
    /// The `<` does not start a tag; treat it as one byte of text.
    NotATag,
    Open {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
        consumed: usize,
    },
    Close {
        name: String,
        consumed: usize,
    },
}

fn name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Lexes one tag token at the start of `src` (which begins with `<`).
fn lex_tag(src: &str) -> Lexed {
    let bytes = src.as_bytes();
    debug_assert_eq!(bytes[0], b'<');

    let mut pos = 1;
    let is_close = bytes.get(pos) == Some(&b'/');
    if is_close {
        pos += 1;
    }

    // Tag name.
    match bytes.get(pos) {
        None => return Lexed::Incomplete,
        Some(&b) if name_start(b as char) => {}
        Some(_) => return Lexed::NotATag,
    }
    let name_from = pos;
    while pos < bytes.len() && name_char(bytes[pos] as char) {
        pos += 1;
    }
    if pos == bytes.len() {
        return Lexed::Incomplete;
    }
    let name = src[name_from..pos].to_string();

    if is_close {
        // Tolerant: skip anything up to the closing `>`.
        return match src[pos..].find('>') {
            Some(off) if src[pos..pos + off].contains('<') => Lexed::NotATag,
            Some(off) => Lexed::Close {
                name,
                consumed: pos + off + 1,
            },
            None => Lexed::Incomplete,
        };
    }

    let mut attrs = Vec::new();
    loop {
        while pos < bytes.len() && (bytes[pos] as char).is_ascii_whitespace() {
            pos += 1;
        }
        match bytes.get(pos) {
            None => return Lexed::Incomplete,
            // A second `<` before this tag closed: the first one was stray.
            Some(b'<') => return Lexed::NotATag,
            Some(b'>') => {
                return Lexed::Open {
                    name,
                    attrs,
                    self_closing: false,
                    consumed: pos + 1,
                };
            }
            Some(b'/') => {
                return match bytes.get(pos + 1) {
                    None => Lexed::Incomplete,
                    Some(b'>') => Lexed::Open {
                        name,
                        attrs,
                        self_closing: true,
                        consumed: pos + 2,
                    },
                    // `/` not followed by `>`: malformed, drop the byte and
                    // keep scanning the attribute list.
                    Some(_) => {
                        pos += 1;
                        continue;
                    }
                };
            }
            Some(_) => match lex_attribute(src, pos) {
                AttrResult::Incomplete => return Lexed::Incomplete,
                AttrResult::Ok { key, value, next } => {
                    attrs.push((key, value));
                    pos = next;
                }
                // A malformed attribute aborts only itself, not the tag.
                AttrResult::Malformed { next } => pos = next,
            },
        }
    }
}

enum AttrResult {
    Incomplete,
    Ok {
        key: String,
        value: String,
        next: usize,
    },
    Malformed {
        next: usize,
    },
}

/// Lexes one `key="value"` / `key='value'` attribute starting at `pos`.
fn lex_attribute(src: &str, pos: usize) -> AttrResult {
    let bytes = src.as_bytes();

    let malformed_skip = |from: usize| {
        // Resynchronize at the next whitespace or tag delimiter. A `<` also
        // stops the skip so the caller can reject the whole tag.
        let mut p = from;
        while p < bytes.len() {
            let c = bytes[p] as char;
            if c.is_ascii_whitespace() || c == '>' || c == '/' || c == '<' {
                break;
            }
            p += 1;
        }
        if p == bytes.len() {
            AttrResult::Incomplete
        } else {
            AttrResult::Malformed { next: p }
        }
    };

    if !name_start(bytes[pos] as char) {
        return malformed_skip(pos + 1);
    }
    let mut p = pos + 1;
    while p < bytes.len() && name_char(bytes[p] as char) {
        p += 1;
    }
    if p == bytes.len() {
        return AttrResult::Incomplete;
    }
    let key = src[pos..p].to_string();

    if bytes[p] != b'=' {
        return malformed_skip(p);
    }
    p += 1;
    let quote = match bytes.get(p) {
        None => return AttrResult::Incomplete,
        Some(&q) if q == b'"' || q == b'\'' => q,
        Some(_) => return malformed_skip(p),
    };
    p += 1;
    let value_from = p;
    while p < bytes.len() && bytes[p] != quote {
        p += 1;
    }
    if p == bytes.len() {
        return AttrResult::Incomplete;
    }
    let value = entities::decode(&src[value_from..p]).into_owned();
    AttrResult::Ok {
        key,
        value,
        next: p + 1,
    }
}

// ─── the scanner ───────────────────────────────────────────────────────────

/// Incremental scanner over `<Tag> … </Tag>` regions.
///
/// Outside a wanted region it searches for an opening tag whose name is in
/// the wanted set (an empty set matches any non-ignored tag); everything
/// else, ignored regions included, is elided. Inside a wanted region every
/// nested event is emitted — except ignored tags, which are dropped while
/// their inner content passes through as text.
#[derive(Debug)]
pub struct TagScanner {
    /// Carries over at most one unfinished token across chunk boundaries.
    buf: String,
    wanted: BTreeSet<String>,
    ignored: BTreeSet<String>,
    /// Open tags inside the wanted region; index 0 is the region root.
    open_stack: Vec<String>,
    /// Ignored tags currently open inside the wanted region.
    inner_ignored: Vec<String>,
    /// Ignored tags currently open outside any wanted region.
    outer_ignored: Vec<String>,
}

impl TagScanner {
    /// * `wanted` — tag names that open a region. Empty means any
    ///   non-ignored tag opens one.
    /// * `ignored` — tag names elided from event emission.
    #[must_use]
    pub fn new(wanted: Vec<String>, ignored: Vec<String>) -> Self {
        Self {
            buf: String::new(),
            wanted: wanted.into_iter().collect(),
            ignored: ignored.into_iter().collect(),
            open_stack: Vec::new(),
            inner_ignored: Vec::new(),
            outer_ignored: Vec::new(),
        }
    }

    /// `true` while the scanner is between a wanted open and its close.
    #[must_use]
    pub fn in_region(&self) -> bool {
        !self.open_stack.is_empty()
    }

    /// Feeds the next chunk, emitting every event producible from the carry
    /// buffer plus `chunk` through `sink`. A sink error aborts the drain and
    /// propagates; the scanner state stays valid either way.
    pub fn consume<E>(
        &mut self,
        chunk: &str,
        mut sink: impl FnMut(TagEvent) -> Result<(), E>,
    ) -> Result<(), E> {
        self.buf.push_str(chunk);

        let mut pos = 0;
        let result = self.drain(&mut pos, &mut sink);
        self.buf.drain(..pos);
        result
    }

    fn drain<E>(
        &mut self,
        pos: &mut usize,
        sink: &mut impl FnMut(TagEvent) -> Result<(), E>,
    ) -> Result<(), E> {
        loop {
            let rest = &self.buf[*pos..];
            let Some(lt) = rest.find('<') else {
                // No tag can start in what is left: text inside a region,
                // noise outside.
                if !rest.is_empty() {
                    self.text(rest.to_string(), sink)?;
                    *pos = self.buf.len();
                }
                return Ok(());
            };

            if lt > 0 {
                self.text(rest[..lt].to_string(), sink)?;
                *pos += lt;
            }

            let tag_src = &self.buf[*pos..];
            match lex_tag(tag_src) {
                Lexed::Incomplete => {
                    if tag_src.len() > MAX_TAG_LEN {
                        // Not a tag after all; release the `<` as text.
                        self.text("<".to_string(), sink)?;
                        *pos += 1;
                        continue;
                    }
                    return Ok(());
                }
                Lexed::NotATag => {
                    self.text("<".to_string(), sink)?;
                    *pos += 1;
                }
                Lexed::Open {
                    name,
                    attrs,
                    self_closing,
                    consumed,
                } => {
                    let raw = &self.buf[*pos..*pos + consumed];
                    let raw = raw.to_string();
                    *pos += consumed;
                    self.open(name, attrs, self_closing, raw, sink)?;
                }
                Lexed::Close { name, consumed } => {
                    let raw = &self.buf[*pos..*pos + consumed];
                    let raw = raw.to_string();
                    *pos += consumed;
                    self.close(name, raw, sink)?;
                }
            }
        }
    }

    /// Text handling depends on where we are: dropped outside regions,
    /// passed through inside (even within an inner ignored region).
    fn text<E>(
        &mut self,
        text: String,
        sink: &mut impl FnMut(TagEvent) -> Result<(), E>,
    ) -> Result<(), E> {
        if self.in_region() {
            sink(TagEvent::Text(text))?;
        }
        Ok(())
    }

    fn open<E>(
        &mut self,
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
        raw: String,
        sink: &mut impl FnMut(TagEvent) -> Result<(), E>,
    ) -> Result<(), E> {
        if !self.in_region() {
            // Outside: ignored regions swallow everything, and only a
            // wanted open starts a region.
            if !self.outer_ignored.is_empty() {
                if self.ignored.contains(&name) && !self_closing {
                    self.outer_ignored.push(name);
                }
                return Ok(());
            }
            if self.ignored.contains(&name) {
                if !self_closing {
                    self.outer_ignored.push(name);
                }
                return Ok(());
            }
            let is_wanted = self.wanted.is_empty() || self.wanted.contains(&name);
            if is_wanted {
                sink(TagEvent::open(&name, attrs))?;
                if self_closing {
                    sink(TagEvent::close(&name))?;
                } else {
                    self.open_stack.push(name);
                }
            }
            return Ok(());
        }

        // Inside an ignored sub-region: ignored opens nest, everything else
        // is literal text.
        if !self.inner_ignored.is_empty() {
            if self.ignored.contains(&name) && !self_closing {
                self.inner_ignored.push(name);
            } else if !self.ignored.contains(&name) {
                sink(TagEvent::Text(raw))?;
            }
            return Ok(());
        }

        if self.ignored.contains(&name) {
            if !self_closing {
                self.inner_ignored.push(name);
            }
            return Ok(());
        }

        sink(TagEvent::open(&name, attrs))?;
        if self_closing {
            sink(TagEvent::close(&name))?;
        } else {
            self.open_stack.push(name);
        }
        Ok(())
    }

    fn close<E>(
        &mut self,
        name: String,
        raw: String,
        sink: &mut impl FnMut(TagEvent) -> Result<(), E>,
    ) -> Result<(), E> {
        if !self.in_region() {
            if let Some(top) = self.outer_ignored.last() {
                if *top == name {
                    self.outer_ignored.pop();
                }
            }
            // Any other close outside a region is noise.
            return Ok(());
        }

        if !self.inner_ignored.is_empty() {
            if self.inner_ignored.last() == Some(&name) {
                self.inner_ignored.pop();
                return Ok(());
            }
            if name == self.open_stack[0] {
                // The wanted region ends here: any still-open ignored tag is
                // closed implicitly at the region boundary.
                debug!("implicitly closing ignored tags {:?}", self.inner_ignored);
                self.inner_ignored.clear();
                // fall through to normal close handling
            } else if self.ignored.contains(&name) {
                return Ok(());
            } else {
                sink(TagEvent::Text(raw))?;
                return Ok(());
            }
        }

        let Some(depth) = self.open_stack.iter().rposition(|n| *n == name) else {
            // Unmatched close: discarded silently.
            debug!("discarding unmatched </{name}>");
            return Ok(());
        };

        // Mismatched closes above the match were dropped earlier; their
        // expected closes are synthesized now, as the enclosing scope ends.
        while self.open_stack.len() > depth + 1 {
            let pending = self.open_stack.pop().expect("len checked");
            debug!("synthesizing </{pending}> for mismatched close");
            sink(TagEvent::close(&pending))?;
        }
        self.open_stack.pop();
        sink(TagEvent::close(&name))?;
        Ok(())
    }
}
