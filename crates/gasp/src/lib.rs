//! Streaming tag-directed parser that turns messy, incrementally-arriving
//! LLM output into typed values.
//!
//! The input is a byte stream in which one or more XML-like tagged regions
//! carry the payload; surrounding natural-language text is ignored. The
//! output is a typed value tree (primitives, lists, sets, tuples, dicts and
//! named records with discriminated-union fields) materialized progressively
//! as chunks arrive.
//!
//! # Examples
//!
//! ```
//! use gasp::{Parser, TypeDescriptor, Value};
//!
//! let person = TypeDescriptor::class_of(
//!     "Person",
//!     vec![
//!         ("name".into(), TypeDescriptor::string()),
//!         ("age".into(), TypeDescriptor::int()),
//!     ],
//! )
//! .unwrap();
//!
//! let mut parser = Parser::new(person);
//! parser.feed("I'd say: <Person><name>Ali").unwrap();
//! parser.feed("ce</name><age>30</age></Person>").unwrap();
//! assert!(parser.is_complete());
//!
//! let value = parser.validate().unwrap();
//! assert_eq!(value.lookup_field("age"), Some(&Value::Int(30)));
//! ```
#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod descriptor;
mod entities;
mod error;
mod format;
mod machine;
mod options;
mod parser;
mod scanner;
mod value;

pub use descriptor::{parse_type_expr, Kind, Registry, TypeDescriptor, MAX_TYPE_DEPTH};
pub use error::{DescriptorError, Issue, IssueKind, ParseFatal, ValidateError};
pub use format::{format_instructions, interpolate_prompt};
pub use machine::Materializer;
pub use options::{ParserOptions, DEFAULT_IGNORED_TAGS};
pub use parser::Parser;
pub use scanner::{TagEvent, TagScanner};
pub use value::{Array, Map, Value};

#[cfg(test)]
mod tests;
