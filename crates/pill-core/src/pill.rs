//! The pill data model.
//!
//! A [`Pill`] is an atomic, identity-bearing token bound to a span of the text buffer. The span
//! start is stored; the span end is always derived from the display text, so the two can never
//! disagree.

use crate::markup::escape_html;
use crate::words::normalize_search_text;
use serde_json::Value;
use std::ops::Range;

/// Instance identity of a pill placed in a [`ModelValue`](crate::ModelValue).
///
/// Two insertions of the same [`Pill`] value produce two different handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PillHandle(pub u64);

/// An atomic token anchored to the text buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Pill {
    id: String,
    value: Value,
    prefix: String,
    display_text: String,
    /// `prefix + display_text`; recomputed whenever either changes.
    text: String,
    text_len: usize,
    search_text: String,
    search_prefix: String,
    suffix: String,
    class_name: String,
    caret_position_from_end: isize,
    min_search_characters: usize,
    max_search_words: usize,
    position_start: Option<usize>,
    handle: Option<PillHandle>,
}

impl Pill {
    /// Create an unplaced pill.
    ///
    /// The search text defaults to `display_text` with diacritics stripped.
    pub fn new(id: impl Into<String>, value: Value, display_text: impl Into<String>) -> Self {
        let display_text = display_text.into();
        let mut pill = Self {
            id: id.into(),
            value,
            prefix: String::new(),
            search_text: normalize_search_text(&display_text),
            display_text,
            text: String::new(),
            text_len: 0,
            search_prefix: String::new(),
            suffix: String::new(),
            class_name: String::new(),
            caret_position_from_end: 0,
            min_search_characters: 0,
            max_search_words: 1,
            position_start: None,
            handle: None,
        };
        pill.recompute_text();
        pill
    }

    fn recompute_text(&mut self) {
        self.text = format!("{}{}", self.prefix, self.display_text);
        self.text_len = self.text.chars().count();
    }

    /// Set the fixed display prefix (e.g. `@`), shown before the display text.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self.recompute_text();
        self
    }

    /// Override the text used for matching. Diacritics are stripped.
    pub fn with_search_text(mut self, search_text: &str) -> Self {
        self.search_text = normalize_search_text(search_text);
        self
    }

    /// Set the trigger prefix that starts a search for this pill (e.g. `@` or `=`).
    pub fn with_search_prefix(mut self, search_prefix: impl Into<String>) -> Self {
        self.search_prefix = search_prefix.into();
        self
    }

    /// Set the text appended after the pill on insertion (not part of the span).
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Set an extra class name for the markup fragment.
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// Caret offset relative to the end of the inserted `text + suffix`.
    ///
    /// Negative values move the caret left, e.g. into a `"()"` suffix with `-1`.
    pub fn with_caret_position_from_end(mut self, offset: isize) -> Self {
        self.caret_position_from_end = offset;
        self
    }

    /// Minimum typed characters before this pill is offered.
    pub fn with_min_search_characters(mut self, min: usize) -> Self {
        self.min_search_characters = min;
        self
    }

    /// Maximum number of trailing words considered when matching (at least 1).
    pub fn with_max_search_words(mut self, max: usize) -> Self {
        self.max_search_words = max.max(1);
        self
    }

    /// Place the pill at a character offset.
    pub fn with_position(mut self, position_start: usize) -> Self {
        self.position_start = Some(position_start);
        self
    }

    /// Corpus-unique id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Opaque caller payload.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Display prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Display text without the prefix.
    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    /// Full text occupying the span (`prefix + display_text`).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Span length in characters.
    pub fn len(&self) -> usize {
        self.text_len
    }

    /// Returns `true` if the pill has no text at all.
    pub fn is_empty(&self) -> bool {
        self.text_len == 0
    }

    /// Normalized search text.
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Trigger prefix.
    pub fn search_prefix(&self) -> &str {
        &self.search_prefix
    }

    /// Suffix appended on insertion.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Extra markup class name.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Caret offset from the end of the inserted text.
    pub fn caret_position_from_end(&self) -> isize {
        self.caret_position_from_end
    }

    /// Minimum search characters.
    pub fn min_search_characters(&self) -> usize {
        self.min_search_characters
    }

    /// Maximum search words.
    pub fn max_search_words(&self) -> usize {
        self.max_search_words
    }

    /// Span start, if placed.
    pub fn position_start(&self) -> Option<usize> {
        self.position_start
    }

    /// Span end (exclusive), if placed.
    pub fn position_end(&self) -> Option<usize> {
        self.position_start.map(|start| start + self.text_len)
    }

    /// Span as a half-open character range, if placed.
    pub fn span(&self) -> Option<Range<usize>> {
        self.position_start
            .map(|start| start..start + self.text_len)
    }

    /// Instance handle, set once the pill lives in a model.
    pub fn handle(&self) -> Option<PillHandle> {
        self.handle
    }

    pub(crate) fn set_position_start(&mut self, position_start: usize) {
        self.position_start = Some(position_start);
    }

    pub(crate) fn set_handle(&mut self, handle: PillHandle) {
        self.handle = Some(handle);
    }

    /// Start offset for placed pills; unplaced pills sort first.
    pub(crate) fn start_or_zero(&self) -> usize {
        self.position_start.unwrap_or(0)
    }

    /// Markup fragment rendered in place of the span.
    pub fn markup(&self) -> String {
        let class = if self.class_name.is_empty() {
            "pill js-pill".to_string()
        } else {
            format!("pill js-pill {}", escape_html(&self.class_name))
        };
        format!(
            "<span class=\"{}\" tabindex=\"-1\">{}</span>",
            class,
            escape_html(&self.text)
        )
    }
}
