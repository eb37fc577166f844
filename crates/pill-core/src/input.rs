//! The pill input control.
//!
//! [`PillInput`] owns one [`ModelValue`] and turns host events into model updates:
//!
//! 1. [`begin_edit`](PillInput::begin_edit) records the pre-input event, selection and text.
//! 2. [`input`](PillInput::input) classifies the change, updates the spans, runs the search and
//!    notifies subscribers with the current matches (an empty slice closes the suggestion UI).
//! 3. [`tick`](PillInput::tick) advances the control's timeline: the post-input cleanup and the
//!    persistence cadence run there.
//!
//! # Example
//!
//! ```rust
//! use pill_core::{EditEvent, EditKind, MemoryStore, Pill, PillInput, PillInputOptions, Selection};
//! use serde_json::Value;
//!
//! let corpus = vec![
//!     Pill::new("1", Value::Null, "John Smith")
//!         .with_prefix("@")
//!         .with_search_prefix("@")
//!         .with_min_search_characters(2),
//! ];
//! let mut input = PillInput::new(corpus, MemoryStore::new(), PillInputOptions::default());
//!
//! input.begin_edit(EditEvent::plain(EditKind::Keypress('@')), Selection::caret(0));
//! input.input("@", Selection::caret(1));
//! input.begin_edit(EditEvent::plain(EditKind::Keypress('j')), Selection::caret(1));
//! input.input("@j", Selection::caret(2));
//! input.begin_edit(EditEvent::plain(EditKind::Keypress('o')), Selection::caret(2));
//! let matches = input.input("@jo", Selection::caret(3));
//!
//! assert_eq!(matches[0].query, "jo");
//! input.accept_match(&matches[0]);
//! assert_eq!(input.model().text(), "@John Smith");
//! ```

use crate::classify::{EditEvent, Modifiers, Selection, classify};
use crate::corpus::PillCorpus;
use crate::model::{InsertedPill, ModelValue};
use crate::options::PillInputOptions;
use crate::pill::{Pill, PillHandle};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::search::{SearchMatch, find_matches};
use crate::storage::{self, PillStore};
use crate::text::slice_chars;
use std::time::Duration;

/// Search results callback type.
pub type SearchMatchCallback = Box<dyn FnMut(&[SearchMatch]) + Send>;

/// Navigation keys that may move focus onto a pill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    /// Left arrow.
    Left,
    /// Backspace.
    Backspace,
    /// Right arrow.
    Right,
    /// Forward delete.
    Delete,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// The text area gained focus.
    Focus,
}

impl NavKey {
    /// Whether a caret at the pill's start keeps the key on the text.
    fn skips_start(self) -> bool {
        !matches!(self, NavKey::Right | NavKey::Delete)
    }

    /// Whether a caret at the pill's end keeps the key on the text.
    fn skips_end(self) -> bool {
        !matches!(self, NavKey::Left | NavKey::Backspace)
    }
}

/// One complete host edit: the pre-input event and selection plus the resulting text and
/// selection.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEdit {
    /// The event that preceded the input, if the host saw one.
    pub event: Option<EditEvent>,
    /// Selection before the edit.
    pub selection_before: Selection,
    /// Text after the edit.
    pub new_text: String,
    /// Selection after the edit.
    pub selection_after: Selection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    PostInputCleanup,
    PersistFlush,
    PersistQuiet,
}

/// A headless pill text-input control.
pub struct PillInput<C, S> {
    model: ModelValue,
    corpus: C,
    store: S,
    options: PillInputOptions,
    scheduler: Scheduler<Task>,
    callbacks: Vec<SearchMatchCallback>,
    /// Event recorded by `begin_edit`, cleared by the post-input cleanup.
    pending_event: Option<EditEvent>,
    /// Selection before the pending edit.
    pre_input_selection: Selection,
    /// Text before the pending edit.
    previous_text: Option<String>,
    selection: Selection,
    last_matches: Vec<SearchMatch>,
    cleanup_task: Option<TaskHandle>,
    persist_interval: Option<TaskHandle>,
    persist_quiet: Option<TaskHandle>,
    destroyed: bool,
}

impl<C, S> PillInput<C, S>
where
    C: PillCorpus,
    S: PillStore,
{
    /// Create a control, restoring the stored model when `options.storage_key` holds one.
    pub fn new(corpus: C, store: S, options: PillInputOptions) -> Self {
        let mut input = Self {
            model: ModelValue::default(),
            corpus,
            store,
            options,
            scheduler: Scheduler::new(),
            callbacks: Vec::new(),
            pending_event: None,
            pre_input_selection: Selection::caret(0),
            previous_text: Some(String::new()),
            selection: Selection::caret(0),
            last_matches: Vec::new(),
            cleanup_task: None,
            persist_interval: None,
            persist_quiet: None,
            destroyed: false,
        };
        input.load_stored();
        input
    }

    /// Current model.
    pub fn model(&self) -> &ModelValue {
        &self.model
    }

    /// Current text.
    pub fn text(&self) -> &str {
        self.model.text()
    }

    /// Current selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Options the control was created with.
    pub fn options(&self) -> &PillInputOptions {
        &self.options
    }

    /// The corpus.
    pub fn corpus(&self) -> &C {
        &self.corpus
    }

    /// The persistence store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Matches reported after the last edit.
    pub fn last_matches(&self) -> &[SearchMatch] {
        &self.last_matches
    }

    /// Current time on the control's timeline.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Returns `true` once [`destroy`](Self::destroy) has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Markup for the rendering surface.
    pub fn markup(&self) -> String {
        crate::markup::render(&self.model)
    }

    /// Subscribe to search results.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&[SearchMatch]) + Send + 'static,
    {
        if self.destroyed {
            return;
        }
        self.callbacks.push(Box::new(callback));
    }

    /// Record the event and selection preceding an input.
    ///
    /// Schedules a zero-delay cleanup that forgets the event if no input follows (for example a
    /// keystroke the host swallowed).
    pub fn begin_edit(&mut self, event: EditEvent, selection: Selection) {
        if self.destroyed {
            return;
        }
        self.pending_event = Some(event);
        self.pre_input_selection = selection;
        self.previous_text = Some(self.model.text().to_string());

        if let Some(handle) = self.cleanup_task.take() {
            self.scheduler.cancel(handle);
        }
        self.cleanup_task = Some(
            self.scheduler
                .schedule_once(Duration::ZERO, Task::PostInputCleanup),
        );
    }

    /// Track a selection change outside an edit.
    pub fn set_selection(&mut self, selection: Selection) {
        if self.destroyed {
            return;
        }
        self.selection = selection;
        if self.pending_event.is_none() {
            self.pre_input_selection = selection;
        }
    }

    /// Apply the text produced by an input and return the search matches at the new caret.
    pub fn input(&mut self, new_text: impl Into<String>, selection: Selection) -> Vec<SearchMatch> {
        if self.destroyed {
            return Vec::new();
        }
        let new_text = new_text.into();

        let class = classify(
            self.pre_input_selection,
            self.previous_text.as_deref(),
            &new_text,
            self.pending_event.as_ref(),
        );
        tracing::trace!(?class, event = ?self.pending_event, "classified input");

        let dropped = self.model.apply_edit(new_text, class);
        for pill in &dropped {
            tracing::debug!(id = pill.id(), "pill dereferenced by edit");
        }

        self.selection = clamp_selection(selection, self.model.char_count());
        self.arm_persistence();

        let candidates = self.corpus.candidates();
        let matches = find_matches(
            &self.model,
            self.selection.start,
            self.pending_event.as_ref(),
            &candidates,
            self.options.threshold_scope,
        );

        self.post_input_cleanup();
        if let Some(handle) = self.cleanup_task.take() {
            self.scheduler.cancel(handle);
        }
        self.notify(matches.clone());
        matches
    }

    /// Run a complete host edit.
    pub fn handle_event(&mut self, edit: RawEdit) -> Vec<SearchMatch> {
        match edit.event {
            Some(event) => self.begin_edit(event, edit.selection_before),
            None => self.set_selection(edit.selection_before),
        }
        self.input(edit.new_text, edit.selection_after)
    }

    /// Advance the timeline by `elapsed`, running every task that comes due.
    pub fn tick(&mut self, elapsed: Duration) {
        if self.destroyed {
            return;
        }
        let target = self.scheduler.now() + elapsed;
        while let Some((handle, task)) = self.scheduler.pop_due(target) {
            self.run_task(handle, task);
        }
        self.scheduler.set_now(target);
    }

    fn run_task(&mut self, handle: TaskHandle, task: Task) {
        match task {
            Task::PostInputCleanup => {
                if self.cleanup_task == Some(handle) {
                    self.cleanup_task = None;
                }
                self.post_input_cleanup();
            }
            Task::PersistFlush => self.persist(),
            Task::PersistQuiet => {
                self.persist_quiet = None;
                if let Some(interval) = self.persist_interval.take() {
                    self.scheduler.cancel(interval);
                }
                self.persist();
            }
        }
    }

    /// Cancel every pending task and stop reacting to events.
    ///
    /// The model can still be changed through [`insert_pill`](Self::insert_pill) and
    /// [`remove_pill`](Self::remove_pill), but nothing is scheduled, persisted or notified.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.scheduler.cancel_all();
        self.cleanup_task = None;
        self.persist_interval = None;
        self.persist_quiet = None;
        self.callbacks.clear();
        self.pending_event = None;
        self.destroyed = true;
        tracing::debug!("pill input destroyed");
    }

    /// Insert the pill of an accepted match in place of its matched text.
    ///
    /// Returns `None` when the text before the caret no longer ends with the matched text.
    pub fn accept_match(&mut self, search_match: &SearchMatch) -> Option<InsertedPill> {
        if self.destroyed {
            return None;
        }
        let caret = self.selection.start;
        let range = search_match.replace_range(caret);
        if slice_chars(self.model.text(), range.start, range.end) != search_match.matched_text {
            tracing::warn!(
                id = search_match.pill.id(),
                matched = %search_match.matched_text,
                "stale search match"
            );
            return None;
        }

        let pill = search_match.pill.clone().with_position(range.start);
        Some(self.insert_pill(pill, Some(range.end)))
    }

    /// Insert a pill at its position (or the end of the text), replacing up to `replace_until`.
    pub fn insert_pill(&mut self, pill: Pill, replace_until: Option<usize>) -> InsertedPill {
        let inserted = self.model.insert_pill(pill, replace_until);
        if self.destroyed {
            return inserted;
        }
        self.selection = Selection::caret(inserted.caret);
        self.after_programmatic_change();
        inserted
    }

    /// Remove a pill and its text, keeping the caret on the same text.
    pub fn remove_pill(&mut self, handle: PillHandle) -> Option<Pill> {
        let removed = self.model.remove_pill(handle)?;
        if let Some(span) = removed.span() {
            let shift = |offset: usize| {
                if offset >= span.end {
                    offset - span.len()
                } else {
                    offset.min(span.start)
                }
            };
            self.selection = Selection::new(shift(self.selection.start), shift(self.selection.end));
        }
        if !self.destroyed {
            self.after_programmatic_change();
        }
        Some(removed)
    }

    /// The pill the host should focus for a navigation key at the current caret.
    ///
    /// Only a collapsed selection without ctrl or meta qualifies. Left and Backspace pass over a
    /// pill the caret sits right before; Right and Delete pass over one it sits right after;
    /// Up, Down and Focus only select a pill the caret is strictly inside.
    pub fn pill_to_focus(&self, key: NavKey, modifiers: Modifiers) -> Option<PillHandle> {
        if self.destroyed || modifiers.ctrl || modifiers.meta || !self.selection.is_collapsed() {
            return None;
        }
        let caret = self.selection.start;
        self.model
            .pills()
            .iter()
            .find(|pill| {
                pill.span().is_some_and(|span| {
                    span.start <= caret
                        && caret <= span.end
                        && !(key.skips_start() && caret == span.start)
                        && !(key.skips_end() && caret == span.end)
                })
            })
            .and_then(Pill::handle)
    }

    /// Replace the model and persist it right away.
    pub fn set_model_value(&mut self, model: ModelValue) {
        if self.destroyed {
            return;
        }
        self.cancel_persistence();
        self.replace_model(model);
        self.persist();
    }

    /// Clear the model and its stored state.
    pub fn reset(&mut self) {
        if self.destroyed {
            return;
        }
        self.cancel_persistence();
        self.replace_model(ModelValue::default());
        if let Some(key) = self.options.storage_key.as_deref() {
            self.store.remove(key);
        }
        self.notify(Vec::new());
    }

    /// Restore the stored model, if any. Returns `true` when one was loaded.
    pub fn load_stored(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(key) = self.options.storage_key.as_deref() else {
            return false;
        };
        let candidates = self.corpus.candidates();
        let Some(model) = storage::load(
            &self.store,
            key,
            &candidates,
            self.options.exclude_stored_pills_not_found_in_corpus,
        ) else {
            return false;
        };

        tracing::debug!(key, pills = model.pills().len(), "restored stored model");
        self.replace_model(model);
        true
    }

    fn replace_model(&mut self, model: ModelValue) {
        self.model = model;
        self.selection = Selection::caret(self.model.char_count());
        self.pre_input_selection = self.selection;
        self.post_input_cleanup();
    }

    fn after_programmatic_change(&mut self) {
        self.pre_input_selection = self.selection;
        self.post_input_cleanup();
        self.arm_persistence();
        self.notify(Vec::new());
    }

    fn post_input_cleanup(&mut self) {
        self.pending_event = None;
        self.previous_text = Some(self.model.text().to_string());
    }

    fn notify(&mut self, matches: Vec<SearchMatch>) {
        for callback in &mut self.callbacks {
            callback(&matches);
        }
        self.last_matches = matches;
    }

    fn arm_persistence(&mut self) {
        if self.options.storage_key.is_none() {
            return;
        }
        if self.persist_interval.is_none() {
            self.persist_interval = Some(
                self.scheduler
                    .schedule_interval(self.options.persist_interval(), Task::PersistFlush),
            );
        }
        if let Some(quiet) = self.persist_quiet.take() {
            self.scheduler.cancel(quiet);
        }
        self.persist_quiet = Some(
            self.scheduler
                .schedule_once(self.options.persist_quiet(), Task::PersistQuiet),
        );
    }

    fn cancel_persistence(&mut self) {
        for handle in [self.persist_interval.take(), self.persist_quiet.take()]
            .into_iter()
            .flatten()
        {
            self.scheduler.cancel(handle);
        }
    }

    fn persist(&mut self) {
        let Some(key) = self.options.storage_key.as_deref() else {
            return;
        };
        match storage::save(&mut self.store, key, &self.model) {
            Ok(()) => tracing::debug!(key, chars = self.model.char_count(), "flushed model"),
            Err(err) => tracing::warn!(key, error = %err, "failed to persist model"),
        }
    }
}

fn clamp_selection(selection: Selection, len: usize) -> Selection {
    Selection::new(selection.start.min(len), selection.end.min(len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::EditKind;
    use crate::storage::MemoryStore;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    fn person(id: &str, name: &str) -> Pill {
        Pill::new(id, Value::Null, name)
            .with_prefix("@")
            .with_search_prefix("@")
            .with_min_search_characters(2)
            .with_max_search_words(2)
    }

    fn control() -> PillInput<Vec<Pill>, MemoryStore> {
        PillInput::new(
            vec![person("1", "John Smith"), person("2", "Jane Doe")],
            MemoryStore::new(),
            PillInputOptions::default(),
        )
    }

    fn type_char(input: &mut PillInput<Vec<Pill>, MemoryStore>, ch: char) -> Vec<SearchMatch> {
        let caret = input.selection().start;
        let mut text = input.text().to_string();
        let byte = text
            .char_indices()
            .nth(caret)
            .map_or(text.len(), |(idx, _)| idx);
        text.insert(byte, ch);
        input.begin_edit(EditEvent::plain(EditKind::Keypress(ch)), Selection::caret(caret));
        input.input(text, Selection::caret(caret + 1))
    }

    #[test]
    fn test_typing_reports_matches_to_subscribers() {
        let mut input = control();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        input.subscribe(move |matches| {
            sink.lock().unwrap().push(matches.len());
        });

        for ch in "hi @jo".chars() {
            type_char(&mut input, ch);
        }

        assert_eq!(*seen.lock().unwrap(), vec![0, 0, 0, 2, 0, 1]);
        assert_eq!(input.last_matches()[0].pill.id(), "1");
    }

    #[test]
    fn test_accept_match_replaces_query() {
        let mut input = control();
        for ch in "hi @ja".chars() {
            type_char(&mut input, ch);
        }
        let chosen = input.last_matches()[0].clone();
        let inserted = input.accept_match(&chosen).unwrap();

        assert_eq!(input.text(), "hi @Jane Doe");
        assert_eq!(inserted.caret, 12);
        assert_eq!(input.selection(), Selection::caret(12));
        assert!(input.last_matches().is_empty());
    }

    #[test]
    fn test_stale_match_is_rejected() {
        let mut input = control();
        for ch in "@ja".chars() {
            type_char(&mut input, ch);
        }
        let chosen = input.last_matches()[0].clone();
        type_char(&mut input, 'x');
        assert!(input.accept_match(&chosen).is_none());
    }

    #[test]
    fn test_backspace_next_to_pill_dereferences_it() {
        let mut input = control();
        input.insert_pill(person("1", "John Smith"), None);
        assert_eq!(input.text(), "@John Smith");

        input.begin_edit(EditEvent::plain(EditKind::Backspace), Selection::caret(11));
        input.input("@John Smit", Selection::caret(10));
        assert!(input.model().pills().is_empty());
    }

    #[test]
    fn test_pill_to_focus() {
        let mut input = control();
        input.insert_pill(person("1", "John Smith").with_position(0), None);
        let handle = input.model().pills().as_slice()[0].handle();

        input.set_selection(Selection::caret(11));
        assert_eq!(input.pill_to_focus(NavKey::Backspace, Modifiers::NONE), handle);
        assert_eq!(input.pill_to_focus(NavKey::Right, Modifiers::NONE), None);
        assert_eq!(input.pill_to_focus(NavKey::Up, Modifiers::NONE), None);

        input.set_selection(Selection::caret(0));
        assert_eq!(input.pill_to_focus(NavKey::Delete, Modifiers::NONE), handle);
        assert_eq!(input.pill_to_focus(NavKey::Left, Modifiers::NONE), None);

        input.set_selection(Selection::caret(4));
        assert_eq!(input.pill_to_focus(NavKey::Focus, Modifiers::NONE), handle);
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        assert_eq!(input.pill_to_focus(NavKey::Left, ctrl), None);

        input.set_selection(Selection::new(2, 5));
        assert_eq!(input.pill_to_focus(NavKey::Focus, Modifiers::NONE), None);
    }

    #[test]
    fn test_pill_to_focus_between_adjacent_pills() {
        let mut input = control();
        input.insert_pill(person("a", "ab"), None);
        input.insert_pill(person("c", "cd"), None);
        assert_eq!(input.text(), "@ab@cd");
        let first = input.model().pills().as_slice()[0].handle();
        let second = input.model().pills().as_slice()[1].handle();

        input.set_selection(Selection::caret(3));
        assert_eq!(input.pill_to_focus(NavKey::Left, Modifiers::NONE), first);
        assert_eq!(input.pill_to_focus(NavKey::Backspace, Modifiers::NONE), first);
        assert_eq!(input.pill_to_focus(NavKey::Right, Modifiers::NONE), second);
        assert_eq!(input.pill_to_focus(NavKey::Delete, Modifiers::NONE), second);
        assert_eq!(input.pill_to_focus(NavKey::Up, Modifiers::NONE), None);
    }

    #[test]
    fn test_forward_delete_before_pill_keeps_it() {
        let mut input = control();
        input.set_model_value(ModelValue::from_parts(
            "ab@John Smith",
            vec![person("1", "John Smith").with_position(2)],
        ));

        input.set_selection(Selection::caret(1));
        input.begin_edit(EditEvent::plain(EditKind::Delete), Selection::caret(1));
        input.input("a@John Smith", Selection::caret(1));

        let pills = input.model().pills().as_slice();
        assert_eq!(pills.len(), 1);
        assert_eq!(pills[0].span(), Some(1..12));
    }

    #[test]
    fn test_swallowed_event_is_forgotten_after_tick() {
        let fixture = ModelValue::from_parts("x@ab yy", vec![person("1", "ab").with_position(1)]);

        // The host swallows a Backspace right after the pill, then a spell checker rewrites
        // the last word without any key event.
        let mut input = control();
        input.set_model_value(fixture.clone());
        input.begin_edit(EditEvent::plain(EditKind::Backspace), Selection::caret(4));
        input.tick(Duration::ZERO);
        input.input("x@ab z", Selection::caret(6));

        assert_eq!(input.text(), "x@ab z");
        assert_eq!(input.model().pills().len(), 1);
        assert_eq!(input.model().pills().as_slice()[0].span(), Some(1..4));

        // Without the cleanup the stale Backspace would be applied to the rewrite.
        let mut stale = control();
        stale.set_model_value(fixture);
        stale.begin_edit(EditEvent::plain(EditKind::Backspace), Selection::caret(4));
        stale.input("x@ab z", Selection::caret(6));
        assert!(stale.model().pills().is_empty());
    }

    #[test]
    fn test_accessors_reflect_construction() {
        let options = PillInputOptions::default().with_storage_key("draft");
        let corpus = vec![person("1", "John Smith")];
        let mut input = PillInput::new(corpus, MemoryStore::new(), options);

        assert_eq!(input.options().storage_key.as_deref(), Some("draft"));
        assert_eq!(input.corpus().len(), 1);
        assert_eq!(input.now(), Duration::ZERO);

        input.tick(Duration::from_millis(250));
        assert_eq!(input.now(), Duration::from_millis(250));
    }

    #[test]
    fn test_remove_pill_moves_caret() {
        let mut input = control();
        input.insert_pill(person("1", "John Smith"), None);
        let handle = input.model().pills().as_slice()[0].handle().unwrap();

        input.remove_pill(handle);
        assert_eq!(input.text(), "");
        assert_eq!(input.selection(), Selection::caret(0));
    }

    #[test]
    fn test_destroy_makes_calls_noops() {
        let mut input = control();
        type_char(&mut input, 'a');
        input.destroy();

        assert!(input.input("ab", Selection::caret(2)).is_empty());
        assert_eq!(input.text(), "a");
        input.tick(Duration::from_secs(5));
        assert!(input.is_destroyed());
    }
}
