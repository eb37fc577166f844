//! Trigger-prefix search over a pill corpus.
//!
//! On every edit the matcher looks at the words right before the caret and offers the corpus
//! pills whose search text starts with them. Candidates are grouped by their trigger prefix
//! (`@`, `=`, or none); each group is matched against its own trailing-word window:
//!
//! - a window that ends with the bare prefix offers the whole group;
//! - otherwise the window is re-based at the right-most word starting with the prefix;
//! - windows without a prefixed word must reach the group's minimum character count.
//!
//! Each candidate is then tried with progressively shorter query windows against progressively
//! shorter trailing windows of its search text, case- and diacritic-insensitively. The first
//! window pair that lines up decides whether the candidate is offered.
//!
//! Results keep group order, then corpus order; they are not ranked by relevance.

use crate::classify::EditEvent;
use crate::model::ModelValue;
use crate::options::ThresholdScope;
use crate::pill::Pill;
use crate::text::{char_count, slice_chars};
use crate::words::{last_n_words, normalize_search_text, word_starts, words};
use std::ops::Range;

/// A candidate offered for the text before the caret.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    /// What the user typed, without the trigger prefix (may be empty right after the prefix).
    pub query: String,
    /// The text before the caret that accepting this match replaces (prefix included).
    pub matched_text: String,
    /// The offered pill.
    pub pill: Pill,
}

impl SearchMatch {
    /// Character range replaced when the match is accepted with the caret at `caret`.
    pub fn replace_range(&self, caret: usize) -> Range<usize> {
        caret.saturating_sub(char_count(&self.matched_text))..caret
    }
}

/// Candidates sharing one trigger prefix, with the thresholds that govern them.
struct PrefixGroup<'a> {
    prefix: &'a str,
    min_chars: usize,
    max_words: usize,
    items: Vec<&'a Pill>,
}

fn group_by_prefix(candidates: &[Pill]) -> Vec<PrefixGroup<'_>> {
    let mut groups: Vec<PrefixGroup<'_>> = Vec::new();

    for pill in candidates {
        match groups
            .iter_mut()
            .find(|g| g.prefix == pill.search_prefix())
        {
            Some(group) => {
                group.min_chars = group.min_chars.min(pill.min_search_characters());
                group.max_words = group.max_words.min(pill.max_search_words());
                group.items.push(pill);
            }
            None => groups.push(PrefixGroup {
                prefix: pill.search_prefix(),
                min_chars: pill.min_search_characters(),
                max_words: pill.max_search_words(),
                items: vec![pill],
            }),
        }
    }

    groups
}

/// Find the candidates offered for the caret position in `model`.
///
/// Nothing is offered when the triggering key was Enter, when the caret sits strictly inside a
/// pill, or when there is no text between the caret and the preceding pill (or buffer start).
pub fn find_matches(
    model: &ModelValue,
    caret: usize,
    event: Option<&EditEvent>,
    candidates: &[Pill],
    scope: ThresholdScope,
) -> Vec<SearchMatch> {
    if event.is_some_and(EditEvent::is_enter) {
        return Vec::new();
    }

    let caret = caret.min(model.char_count());
    if model.pills().pill_containing(caret).is_some() {
        return Vec::new();
    }

    let window_start = model.pills().last_end_at_or_before(caret).unwrap_or(0);
    let text_before_caret = slice_chars(model.text(), window_start, caret);
    match_text(text_before_caret, candidates, scope)
}

/// Match raw text ending at the caret against `candidates`.
pub fn match_text(
    text_before_caret: &str,
    candidates: &[Pill],
    scope: ThresholdScope,
) -> Vec<SearchMatch> {
    if text_before_caret.is_empty() || candidates.is_empty() {
        return Vec::new();
    }

    let mut result = Vec::new();
    for group in group_by_prefix(candidates) {
        match scope {
            ThresholdScope::Group => {
                let window = last_n_words(text_before_caret, group.max_words, true);
                result.extend(group_matches(
                    group.prefix,
                    window,
                    group.min_chars,
                    &group.items,
                ));
            }
            ThresholdScope::PerCandidate => {
                for pill in &group.items {
                    let window = last_n_words(text_before_caret, pill.max_search_words(), true);
                    result.extend(group_matches(
                        group.prefix,
                        window,
                        pill.min_search_characters(),
                        std::slice::from_ref(pill),
                    ));
                }
            }
        }
    }

    tracing::trace!(count = result.len(), "search matches");
    result
}

fn group_matches(
    prefix: &str,
    window: Option<String>,
    min_chars: usize,
    items: &[&Pill],
) -> Vec<SearchMatch> {
    let Some(mut window) = window else {
        return Vec::new();
    };

    // Prefix just typed: offer everything in the group.
    if !prefix.is_empty() && window.ends_with(prefix) {
        return items
            .iter()
            .map(|pill| SearchMatch {
                query: String::new(),
                matched_text: prefix.to_string(),
                pill: (*pill).clone(),
            })
            .collect();
    }

    let mut has_prefixed_word = false;
    if !prefix.is_empty() {
        let starts = word_starts(&window);
        if let Some(&start) = starts
            .iter()
            .rev()
            .find(|&&start| window[start..].starts_with(prefix))
        {
            window = window[start..].to_string();
            has_prefixed_word = true;
        }
    }

    if !has_prefixed_word && char_count(&window) < min_chars {
        return Vec::new();
    }

    items
        .iter()
        .filter_map(|pill| match_candidate(pill, &window, prefix, min_chars))
        .collect()
}

fn match_candidate(
    pill: &Pill,
    window: &str,
    prefix: &str,
    min_chars: usize,
) -> Option<SearchMatch> {
    let compare_with = pill.search_text().trim();
    if compare_with.is_empty() {
        return None;
    }

    let compare_windows: Vec<String> = (1..=words(compare_with).len())
        .rev()
        .filter_map(|j| last_n_words(compare_with, j, false))
        .map(|w| w.to_lowercase())
        .collect();

    for i in (1..=words(window).len()).rev() {
        let Some(candidate_window) = last_n_words(window, i, true) else {
            continue;
        };
        let has_prefix = !prefix.is_empty() && candidate_window.starts_with(prefix);
        let query = if has_prefix {
            &candidate_window[prefix.len()..]
        } else {
            candidate_window.as_str()
        };
        let needle = normalize_search_text(query).to_lowercase();

        if compare_windows.iter().any(|w| w.starts_with(&needle)) {
            let accepted = if has_prefix {
                !query.is_empty() && char_count(query) >= min_chars
            } else {
                char_count(&candidate_window) >= min_chars
            };
            return accepted.then(|| SearchMatch {
                query: query.to_string(),
                matched_text: candidate_window.clone(),
                pill: pill.clone(),
            });
        }
    }

    None
}
