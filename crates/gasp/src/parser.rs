//! The public parser facade.
//!
//! A [`Parser`] owns one tag scanner and one stack machine. Each `feed`
//! pushes a chunk through the scanner, drains the resulting events into the
//! machine, and returns a snapshot of the root value. State is retained
//! exactly across calls: the same bytes split at any boundary yield
//! identical partial and final results.
use alloc::{boxed::Box, string::String, sync::Arc, vec::Vec};
use core::fmt;

use log::debug;

use crate::{
    descriptor::{Kind, Registry, TypeDescriptor},
    error::{Issue, ParseFatal, ValidateError},
    machine::{Materializer, StackMachine},
    options::ParserOptions,
    scanner::TagScanner,
    value::Value,
};

/// Streaming parser for one typed root value.
///
/// Instances are single-writer sequential state machines; share one across
/// threads only behind external synchronization. Descriptors, by contrast,
/// are immutable and freely shareable.
///
/// # Examples
///
/// ```
/// use gasp::{Parser, TypeDescriptor, Value};
///
/// let hobbies = TypeDescriptor::list(TypeDescriptor::string());
/// let person = TypeDescriptor::class_of(
///     "Person",
///     vec![
///         ("name".into(), TypeDescriptor::string()),
///         ("hobbies".into(), hobbies),
///     ],
/// )
/// .unwrap();
///
/// let mut parser = Parser::new(person);
/// let partial = parser.feed("<Person><name>Alice</name>").unwrap();
/// assert_eq!(
///     partial.unwrap().lookup_field("name"),
///     Some(&Value::String("Alice".into()))
/// );
/// ```
pub struct Parser {
    scanner: TagScanner,
    machine: StackMachine,
    fatal: Option<ParseFatal>,
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("scanner", &self.scanner)
            .field("machine", &self.machine)
            .field("fatal", &self.fatal)
            .finish()
    }
}

impl Parser {
    /// A parser with the default options and an empty registry.
    #[must_use]
    pub fn new(root: TypeDescriptor) -> Self {
        Self::with_registry(root, Registry::new(), ParserOptions::default())
    }

    #[must_use]
    pub fn with_options(root: TypeDescriptor, options: ParserOptions) -> Self {
        Self::with_registry(root, Registry::new(), options)
    }

    /// A parser whose `Ref` descriptors and bare type-expression names
    /// resolve against `registry`.
    #[must_use]
    pub fn with_registry(
        root: TypeDescriptor,
        registry: Registry,
        options: ParserOptions,
    ) -> Self {
        let root = Arc::new(root);
        let wanted = wanted_tags(&root, &registry);
        debug!("wanted tags: {wanted:?}, ignored tags: {:?}", options.ignored_tags);
        Self {
            scanner: TagScanner::new(wanted, options.ignored_tags),
            machine: StackMachine::new(root, registry, options.max_text_len),
            fatal: None,
        }
    }

    /// Installs the record materialization hook.
    pub fn set_materializer(&mut self, hook: Box<dyn Materializer>) {
        self.machine.set_materializer(hook);
    }

    /// Pushes a chunk and returns the current root partial, or `None` while
    /// the root tag has not been opened yet.
    ///
    /// # Errors
    ///
    /// A [`ParseFatal`] latches: every later `feed` returns the same error.
    pub fn feed(&mut self, chunk: &str) -> Result<Option<Value>, ParseFatal> {
        if let Some(fatal) = &self.fatal {
            return Err(fatal.clone());
        }
        let machine = &mut self.machine;
        if let Err(fatal) = self.scanner.consume(chunk, |event| machine.on_event(event)) {
            self.fatal = Some(fatal.clone());
            return Err(fatal);
        }
        Ok(self.machine.snapshot())
    }

    /// The current root partial without re-running the scanner.
    #[must_use]
    pub fn get_partial(&self) -> Option<Value> {
        self.machine.snapshot()
    }

    /// `true` once the root's closing tag has been consumed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.machine.is_complete()
    }

    /// The final value, with whole-object invariant checks.
    ///
    /// A value is returned whenever the root opened, even if parsing has not
    /// finished; required (non-optional) record fields with no value fail
    /// the check.
    ///
    /// # Errors
    ///
    /// [`ValidateError::RootNeverOpened`] when no wanted region was found,
    /// [`ValidateError::MissingFields`] listing unfilled required fields.
    pub fn validate(&self) -> Result<Value, ValidateError> {
        self.machine.validate()
    }

    /// Recoverable problems recorded so far, in observation order.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        self.machine.issues()
    }
}

/// Tags that open a wanted region for the given root type: the class name
/// for records, every alternative plus the alias for unions, and any tag at
/// all for primitive or container roots (the wrapper name is the caller's
/// choice there).
fn wanted_tags(root: &Arc<TypeDescriptor>, registry: &Registry) -> Vec<String> {
    let mut current = Arc::clone(root);
    for _ in 0..crate::descriptor::MAX_TYPE_DEPTH {
        match current.kind {
            Kind::Optional => {
                let inner = Arc::clone(&current.args[0]);
                current = inner;
            }
            Kind::Ref => match registry.get(&current.name) {
                Some(found) => current = Arc::clone(found),
                None => break,
            },
            _ => break,
        }
    }
    match current.kind {
        Kind::Class | Kind::Ref => alloc::vec![current.name.clone()],
        Kind::Union => {
            let mut tags: Vec<String> = current.args.iter().map(|alt| alt.name.clone()).collect();
            // Accept the alias tag itself, so `<Alias type="A">` dispatches.
            tags.push(current.name.clone());
            tags
        }
        _ => Vec::new(),
    }
}
