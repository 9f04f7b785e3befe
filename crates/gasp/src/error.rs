//! Error taxonomy.
//!
//! Three severities, matching the propagation policy: descriptor-construction
//! errors fail fast at build time, [`Issue`]s are recorded on the parser and
//! never interrupt parsing, and [`ParseFatal`] latches the parser into a
//! permanent failed state.
use alloc::{string::String, vec::Vec};
use thiserror::Error;

use crate::descriptor::MAX_TYPE_DEPTH;

/// Rejected during descriptor construction or registry resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
    #[error("cyclic type: depth exceeded {MAX_TYPE_DEPTH} while resolving `{0}`")]
    CyclicType(String),
}

/// A recoverable problem observed while parsing.
///
/// Issues never stop the parser; the value slot involved is left unset (or
/// zeroed, for primitives) and parsing continues. The full list is available
/// through [`Parser::issues`](crate::Parser::issues).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} in <{tag}>")]
pub struct Issue {
    /// Tag name of the frame the issue was observed in.
    pub tag: String,
    pub kind: IssueKind,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("dict entry is missing its `key` attribute")]
    MissingDictKey,
    #[error("no union alternative matches `{0}`")]
    UnresolvedUnion(String),
    #[error("cannot parse `{text}` as {target}")]
    PrimitiveParse { text: String, target: &'static str },
    #[error("tuple item at position {0} is out of bounds")]
    TupleOverflow(usize),
    #[error("unresolved class reference `{0}`")]
    UnresolvedRef(String),
}

/// Unrecoverable parser failure.
///
/// Once returned from `feed`, every later `feed` returns the same error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFatal {
    #[error("text budget exceeded: accumulated {accumulated} bytes, cap is {cap}")]
    BudgetExceeded { accumulated: usize, cap: usize },
}

/// Summary failure returned by `validate`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidateError {
    #[error("no tagged region matching the root type was found")]
    RootNeverOpened,
    #[error("missing required fields: {}", .missing.join(", "))]
    MissingFields { missing: Vec<String> },
}
