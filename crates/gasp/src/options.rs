use alloc::{
    string::{String, ToString},
    vec::Vec,
};

/// Tag names elided from event emission out of the box.
///
/// These are the reasoning/meta tags common in LLM output. The set is
/// per-parser configuration; see [`ParserOptions::ignored_tags`].
pub const DEFAULT_IGNORED_TAGS: &[&str] = &["think", "thinking", "system", "thought"];

/// Configuration for a [`Parser`](crate::Parser).
///
/// # Examples
///
/// ```
/// use gasp::ParserOptions;
///
/// let mut options = ParserOptions::default();
/// options.ignored_tags.push("scratchpad".to_string());
/// ```
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Tag names whose regions are elided from event emission.
    ///
    /// Outside a wanted region the whole ignored region disappears; inside a
    /// wanted region the tags are dropped but their inner content passes
    /// through as text.
    ///
    /// # Default
    ///
    /// [`DEFAULT_IGNORED_TAGS`]: `think`, `thinking`, `system`, `thought`.
    pub ignored_tags: Vec<String>,

    /// Cap on text accumulated into primitive fields, in bytes.
    ///
    /// Exceeding the cap is fatal: the parser latches into a failed state
    /// and every later `feed` returns the same error. This bounds memory on
    /// adversarial input.
    ///
    /// # Default
    ///
    /// 64 MiB.
    pub max_text_len: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            ignored_tags: DEFAULT_IGNORED_TAGS.iter().map(|t| t.to_string()).collect(),
            max_text_len: 64 * 1024 * 1024,
        }
    }
}
