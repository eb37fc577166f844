//! Error taxonomy for `pill-core`.
//!
//! None of these errors cross the editing API: invalid spans are dropped or clamped, malformed
//! payloads degrade to an empty model. They surface through [`PillSet::check_invariants`] and the
//! storage decoder so callers and tests can inspect what went wrong.
//!
//! [`PillSet::check_invariants`]: crate::PillSet::check_invariants

use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced by pill bookkeeping and persistence.
pub enum PillError {
    #[error("malformed stored payload: {0}")]
    /// A persisted model value was not valid JSON or missed required fields.
    MalformedPayload(#[from] serde_json::Error),

    #[error("pill '{id}' span {start}..{end} exceeds text length {len}")]
    /// A pill span lies (partly) outside the text buffer.
    SpanOutOfBounds {
        /// Pill id.
        id: String,
        /// Span start (chars).
        start: usize,
        /// Span end (chars, exclusive).
        end: usize,
        /// Text length (chars).
        len: usize,
    },

    #[error("pill '{id}' has no position")]
    /// A pill stored in a set has never been placed.
    Unplaced {
        /// Pill id.
        id: String,
    },

    #[error("pills are not sorted: '{previous}' starts after '{next}'")]
    /// Two neighbouring pills are out of order.
    UnsortedSpans {
        /// Id of the earlier pill in the set.
        previous: String,
        /// Id of the later pill in the set.
        next: String,
    },

    #[error("pill '{previous}' overlaps pill '{next}'")]
    /// Two neighbouring pills overlap.
    OverlappingSpans {
        /// Id of the earlier pill in the set.
        previous: String,
        /// Id of the later pill in the set.
        next: String,
    },

    #[error("pill '{id}' expects '{expected}' but the text holds '{found}'")]
    /// The text under a pill span differs from the pill's display text.
    SpanTextMismatch {
        /// Pill id.
        id: String,
        /// The pill's display text.
        expected: String,
        /// The text currently under the span.
        found: String,
    },
}
