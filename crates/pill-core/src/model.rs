//! The model value: text buffer plus pill spans.
//!
//! [`ModelValue`] is the only place where text and spans change together. Every mutation splices
//! the text and reports the same change region to the [`PillSet`], so the two never drift apart.

use crate::classify::EditClass;
use crate::diff::ChangeRegion;
use crate::pill::{Pill, PillHandle};
use crate::ranges::PillSet;
use crate::text::{char_count, splice_chars};

/// Result of [`ModelValue::insert_pill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedPill {
    /// Handle of the placed pill instance.
    pub handle: PillHandle,
    /// Where the caret should go after the insertion (character offset).
    pub caret: usize,
}

/// Text buffer and the pills anchored to it.
#[derive(Debug, Clone, Default)]
pub struct ModelValue {
    text: String,
    pills: PillSet,
    next_handle: u64,
}

impl ModelValue {
    /// Create a model holding plain text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pills: PillSet::new(),
            next_handle: 0,
        }
    }

    /// Create a model from text and pre-placed pills.
    ///
    /// Pills that are unplaced, out of bounds, overlapping, or whose span does not hold their
    /// display text are dropped.
    pub fn from_parts(text: impl Into<String>, pills: Vec<Pill>) -> Self {
        let mut model = Self::new(text);
        let pills = pills
            .into_iter()
            .map(|mut pill| {
                pill.set_handle(model.allocate_handle());
                pill
            })
            .collect();
        model.pills = PillSet::from_pills(pills);
        model.pills.retain_valid(&model.text);
        model.debug_check();
        model
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text length in characters.
    pub fn char_count(&self) -> usize {
        char_count(&self.text)
    }

    /// Returns `true` if the model holds no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Placed pills, sorted by start offset.
    pub fn pills(&self) -> &PillSet {
        &self.pills
    }

    /// Look up a placed pill by handle.
    pub fn pill(&self, handle: PillHandle) -> Option<&Pill> {
        self.pills.get(handle)
    }

    /// The pill at `offset`, boundaries included.
    pub fn pill_at(&self, offset: usize) -> Option<&Pill> {
        self.pills.pill_touching(offset)
    }

    /// The pill strictly containing `offset`.
    pub fn pill_containing(&self, offset: usize) -> Option<&Pill> {
        self.pills.pill_containing(offset)
    }

    fn allocate_handle(&mut self) -> PillHandle {
        let handle = PillHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Insert `pill` (followed by its suffix) at its position, replacing text up to
    /// `replace_until`.
    ///
    /// - The position defaults to the end of the text when unset or out of bounds.
    /// - `replace_until` defaults to the position and is clamped to `[position, text_len]`.
    /// - The pill is always placed as a new instance, so inserting the same value twice yields two
    ///   pills with distinct handles.
    /// - Pills overlapping the replaced range are dereferenced.
    pub fn insert_pill(&mut self, mut pill: Pill, replace_until: Option<usize>) -> InsertedPill {
        let len = self.char_count();
        let start = pill
            .position_start()
            .filter(|&start| start <= len)
            .unwrap_or(len);
        let replace_until = replace_until.unwrap_or(start).clamp(start, len);

        let inserted = format!("{}{}", pill.text(), pill.suffix());
        let inserted_len = pill.len() + char_count(pill.suffix());
        self.text = splice_chars(&self.text, start, replace_until, &inserted);

        let handle = self.allocate_handle();
        pill.set_position_start(start);
        pill.set_handle(handle);
        let caret_from_end = pill.caret_position_from_end();

        tracing::debug!(id = pill.id(), start, replace_until, "inserting pill");
        let region = ChangeRegion::new(start, replace_until, inserted_len);
        self.pills.update(region, Some(pill));
        self.debug_check();

        let caret = (start + inserted_len)
            .saturating_add_signed(caret_from_end)
            .min(self.char_count());
        InsertedPill { handle, caret }
    }

    /// Remove a pill and its span text. Returns the removed pill.
    pub fn remove_pill(&mut self, handle: PillHandle) -> Option<Pill> {
        let pill = self.pills.take(handle)?;
        let span = pill.span()?;

        self.text = splice_chars(&self.text, span.start, span.end, "");
        self.pills
            .update(ChangeRegion::deletion(span.start, span.end), None);
        self.debug_check();

        tracing::debug!(id = pill.id(), "removed pill");
        Some(pill)
    }

    /// Replace the text after an input and update the spans. Returns the dereferenced pills.
    ///
    /// Pills whose span no longer holds their text after the update (the reported change did not
    /// match the actual one) are dereferenced as well.
    pub fn apply_edit(&mut self, new_text: impl Into<String>, class: EditClass) -> Vec<Pill> {
        self.text = new_text.into();

        let mut dropped = match class {
            EditClass::ClearAll => {
                let dropped = self.pills.as_slice().to_vec();
                self.pills.clear();
                dropped
            }
            EditClass::Region(region) => self.pills.update(region, None),
        };
        dropped.extend(self.pills.retain_valid(&self.text));
        self.debug_check();
        dropped
    }

    /// Empty the text and the pills.
    pub fn clear(&mut self) {
        self.text.clear();
        self.pills.clear();
    }

    fn debug_check(&self) {
        if cfg!(debug_assertions)
            && let Err(err) = self.pills.check_invariants(&self.text)
        {
            panic!("pill set invariant violated: {err}");
        }
    }
}
