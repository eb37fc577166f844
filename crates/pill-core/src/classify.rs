//! Edit classification.
//!
//! Given the event that triggered an input, the selection before it and the text before and after,
//! decide which [`ChangeRegion`] the edit produced. Single-key edits are known exactly from the
//! event and bypass the differ: diffing a one-character deletion next to a pill whose text shares
//! characters with its neighbours can otherwise land on the wrong side of the pill boundary.

use crate::diff::{ChangeRegion, diff};

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Control key.
    pub ctrl: bool,
    /// Meta / command key.
    pub meta: bool,
    /// Alt / option key.
    pub alt: bool,
    /// Shift key (does not disqualify a plain keystroke).
    pub shift: bool,
}

impl Modifiers {
    /// No modifiers.
    pub const NONE: Self = Self {
        ctrl: false,
        meta: false,
        alt: false,
        shift: false,
    };

    /// Returns `true` if a shortcut modifier (ctrl, meta or alt) is held.
    pub fn has_shortcut(&self) -> bool {
        self.ctrl || self.meta || self.alt
    }
}

/// The kind of event that preceded an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// Backspace key.
    Backspace,
    /// Forward-delete key.
    Delete,
    /// A character-producing keystroke. Enter is `Keypress('\n')`.
    Keypress(char),
    /// Clipboard paste.
    Paste,
    /// Clipboard cut.
    Cut,
    /// Anything else (IME composition, autocorrect, drag, programmatic change, ...).
    Other,
}

/// A pre-input event descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditEvent {
    /// What happened.
    pub kind: EditKind,
    /// Modifier keys held.
    pub modifiers: Modifiers,
}

impl EditEvent {
    /// Create an event.
    pub fn new(kind: EditKind, modifiers: Modifiers) -> Self {
        Self { kind, modifiers }
    }

    /// An event without modifiers.
    pub fn plain(kind: EditKind) -> Self {
        Self::new(kind, Modifiers::NONE)
    }

    /// Returns `true` for the Enter key.
    pub fn is_enter(&self) -> bool {
        matches!(self.kind, EditKind::Keypress('\n' | '\r'))
    }
}

/// A selection in character offsets; `start == end` is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Selection start.
    pub start: usize,
    /// Selection end.
    pub end: usize,
}

impl Selection {
    /// Create a selection, ordering the endpoints.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// A collapsed selection.
    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Returns `true` if the selection is a caret.
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// The outcome of classifying an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditClass {
    /// The buffer was emptied, or there is no baseline to diff against: drop every pill.
    ClearAll,
    /// A single change region.
    Region(ChangeRegion),
}

/// Classify an input.
///
/// `event` is the pre-input event, if one was captured; inputs without one (spell correction,
/// programmatic changes) always go through the differ.
pub fn classify(
    selection: Selection,
    previous_text: Option<&str>,
    new_text: &str,
    event: Option<&EditEvent>,
) -> EditClass {
    let previous_text = match previous_text {
        Some(text) if !text.is_empty() && !new_text.is_empty() => text,
        _ => return EditClass::ClearAll,
    };

    if let Some(region) = event.and_then(|ev| fast_path(selection, previous_text, new_text, ev)) {
        tracing::trace!(?region, kind = ?event.map(|ev| ev.kind), "classified edit from event");
        return EditClass::Region(region);
    }

    let region = diff(previous_text, new_text);
    tracing::trace!(?region, "classified edit by diff");
    EditClass::Region(region)
}

fn fast_path(
    selection: Selection,
    previous_text: &str,
    new_text: &str,
    event: &EditEvent,
) -> Option<ChangeRegion> {
    if !selection.is_collapsed() || event.modifiers.has_shortcut() {
        return None;
    }

    let caret = selection.start;
    let old_len = previous_text.chars().count();
    let new_len = new_text.chars().count();

    match event.kind {
        EditKind::Backspace if caret > 0 && caret <= old_len && new_len + 1 == old_len => {
            Some(ChangeRegion::deletion(caret - 1, caret))
        }
        EditKind::Delete if caret < old_len && new_len + 1 == old_len => {
            Some(ChangeRegion::deletion(caret, caret + 1))
        }
        EditKind::Keypress(_) if caret <= old_len && new_len == old_len + 1 => {
            Some(ChangeRegion::insertion(caret, 1))
        }
        // Lengths disagree with the event (IME, key repeat, host quirks): let the differ decide.
        _ => None,
    }
}
