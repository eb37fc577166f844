//! Pill span tracking.
//!
//! [`PillSet`] owns the pills placed in a text buffer and keeps them sorted by start offset and
//! non-overlapping. Text mutations are reported as a [`ChangeRegion`]; [`PillSet::update`] shifts
//! every pill after the change, keeps every pill before it, and drops every pill whose interior
//! the change touches.
//!
//! Query complexity: O(log n) for offset lookups (binary search on start).
//! Update complexity: O(n log n) (shift + stable re-sort).

use crate::diff::ChangeRegion;
use crate::error::PillError;
use crate::pill::{Pill, PillHandle};
use crate::text::CharIndex;

/// Ordered, non-overlapping set of placed pills.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PillSet {
    /// Pills kept sorted by `position_start`.
    pills: Vec<Pill>,
}

impl PillSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self { pills: Vec::new() }
    }

    /// Build a set from placed pills, sorting them by start offset.
    ///
    /// Unplaced pills are discarded. Overlaps are not resolved here; see [`PillSet::retain_valid`].
    pub(crate) fn from_pills(pills: Vec<Pill>) -> Self {
        let mut pills: Vec<Pill> = pills
            .into_iter()
            .filter(|p| p.position_start().is_some())
            .collect();
        pills.sort_by_key(Pill::start_or_zero);
        Self { pills }
    }

    /// Number of pills.
    pub fn len(&self) -> usize {
        self.pills.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.pills.is_empty()
    }

    /// Pills in ascending start order.
    pub fn as_slice(&self) -> &[Pill] {
        &self.pills
    }

    /// Iterate pills in ascending start order.
    pub fn iter(&self) -> std::slice::Iter<'_, Pill> {
        self.pills.iter()
    }

    /// Look up a pill by instance handle.
    pub fn get(&self, handle: PillHandle) -> Option<&Pill> {
        self.pills.iter().find(|p| p.handle() == Some(handle))
    }

    /// Index of the last pill whose start is `<= offset`.
    fn last_starting_at_or_before(&self, offset: usize) -> Option<usize> {
        let idx = self.pills.partition_point(|p| p.start_or_zero() <= offset);
        idx.checked_sub(1)
    }

    /// The pill whose span strictly contains `offset` (`start < offset < end`).
    pub fn pill_containing(&self, offset: usize) -> Option<&Pill> {
        let idx = self.last_starting_at_or_before(offset)?;
        let pill = &self.pills[idx];
        let span = pill.span()?;
        (span.start < offset && offset < span.end).then_some(pill)
    }

    /// The pill whose span contains or touches `offset` (`start <= offset <= end`).
    ///
    /// When two adjacent pills touch at `offset`, the one starting there wins.
    pub fn pill_touching(&self, offset: usize) -> Option<&Pill> {
        let idx = self.last_starting_at_or_before(offset)?;
        if let Some(span) = self.pills[idx].span()
            && offset <= span.end
        {
            return Some(&self.pills[idx]);
        }
        None
    }

    /// End offset of the last pill that ends at or before `offset`.
    pub fn last_end_at_or_before(&self, offset: usize) -> Option<usize> {
        self.pills
            .iter()
            .filter_map(Pill::position_end)
            .take_while(|&end| end <= offset)
            .last()
    }

    /// Apply a text change to every span and optionally place a new pill.
    ///
    /// - A change that ends at or before a pill's start shifts the pill by the change's index
    ///   delta.
    /// - A change that starts at or after a pill's end leaves it untouched.
    /// - Any other change overlaps the pill's interior and drops it.
    ///
    /// Touching a boundary is never an overlap. Returns the dropped pills.
    pub fn update(&mut self, region: ChangeRegion, inserted: Option<Pill>) -> Vec<Pill> {
        let index_delta = region.index_delta();
        let mut retained = Vec::with_capacity(self.pills.len() + 1);
        let mut dropped = Vec::new();

        for mut pill in self.pills.drain(..) {
            let Some(span) = pill.span() else {
                dropped.push(pill);
                continue;
            };

            if region.end <= span.start {
                match span.start.checked_add_signed(index_delta) {
                    Some(start) => {
                        pill.set_position_start(start);
                        retained.push(pill);
                    }
                    None => dropped.push(pill),
                }
            } else if region.start >= span.end {
                retained.push(pill);
            } else {
                dropped.push(pill);
            }
        }

        if let Some(pill) = inserted {
            retained.push(pill);
        }

        // Stable: spans are non-overlapping, so ties only occur between zero-length pills.
        retained.sort_by_key(Pill::start_or_zero);
        self.pills = retained;

        if !dropped.is_empty() {
            tracing::debug!(
                count = dropped.len(),
                start = region.start,
                end = region.end,
                "dereferenced pills overlapping an edit"
            );
        }
        dropped
    }

    /// Remove a pill from the set without touching any text.
    pub(crate) fn take(&mut self, handle: PillHandle) -> Option<Pill> {
        let pos = self.pills.iter().position(|p| p.handle() == Some(handle))?;
        Some(self.pills.remove(pos))
    }

    /// Clear all pills.
    pub fn clear(&mut self) {
        self.pills.clear();
    }

    /// Drop every pill that is out of bounds, overlaps its predecessor, or whose span no longer
    /// holds its display text. Returns the dropped pills.
    pub(crate) fn retain_valid(&mut self, text: &str) -> Vec<Pill> {
        let index = CharIndex::new(text);
        let mut kept: Vec<Pill> = Vec::with_capacity(self.pills.len());
        let mut dropped = Vec::new();

        for pill in self.pills.drain(..) {
            let valid = match pill.span() {
                Some(span) => {
                    let after_previous = kept
                        .last()
                        .and_then(Pill::position_end)
                        .is_none_or(|prev_end| prev_end <= span.start);
                    span.end <= index.char_count()
                        && after_previous
                        && index.slice(text, span.start, span.end) == pill.text()
                }
                None => false,
            };

            if valid {
                kept.push(pill);
            } else {
                tracing::warn!(id = pill.id(), span = ?pill.span(), "dropping invalid pill span");
                dropped.push(pill);
            }
        }

        self.pills = kept;
        dropped
    }

    /// Verify the set invariants against `text`.
    ///
    /// Every pill must be placed, sorted, non-overlapping, inside the text, and its span must
    /// hold exactly its display text.
    pub fn check_invariants(&self, text: &str) -> Result<(), PillError> {
        let index = CharIndex::new(text);
        let len = index.char_count();

        for (i, pill) in self.pills.iter().enumerate() {
            let span = pill.span().ok_or_else(|| PillError::Unplaced {
                id: pill.id().to_string(),
            })?;

            if span.end > len {
                return Err(PillError::SpanOutOfBounds {
                    id: pill.id().to_string(),
                    start: span.start,
                    end: span.end,
                    len,
                });
            }

            let found = index.slice(text, span.start, span.end);
            if found != pill.text() {
                return Err(PillError::SpanTextMismatch {
                    id: pill.id().to_string(),
                    expected: pill.text().to_string(),
                    found: found.to_string(),
                });
            }

            if let Some(prev) = i.checked_sub(1).map(|j| &self.pills[j]) {
                let prev_start = prev.start_or_zero();
                let prev_end = prev.position_end().unwrap_or(prev_start);
                if prev_start > span.start {
                    return Err(PillError::UnsortedSpans {
                        previous: prev.id().to_string(),
                        next: pill.id().to_string(),
                    });
                }
                if prev_end > span.start {
                    return Err(PillError::OverlappingSpans {
                        previous: prev.id().to_string(),
                        next: pill.id().to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a PillSet {
    type Item = &'a Pill;
    type IntoIter = std::slice::Iter<'a, Pill>;

    fn into_iter(self) -> Self::IntoIter {
        self.pills.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn pill_at(id: &str, start: usize, len: usize) -> Pill {
        let mut pill = Pill::new(id, Value::Null, "x".repeat(len)).with_position(start);
        pill.set_handle(PillHandle(start as u64));
        pill
    }

    fn spans(set: &PillSet) -> Vec<(usize, usize)> {
        set.iter()
            .map(|p| (p.position_start().unwrap(), p.position_end().unwrap()))
            .collect()
    }

    fn two_pills() -> PillSet {
        PillSet::from_pills(vec![pill_at("b", 20, 4), pill_at("a", 5, 4)])
    }

    #[test]
    fn test_from_pills_sorts_by_start() {
        let set = two_pills();
        assert_eq!(spans(&set), vec![(5, 9), (20, 24)]);
        assert_eq!(set.as_slice()[0].id(), "a");
    }

    #[test]
    fn test_insert_before_shifts_all() {
        let mut set = two_pills();
        let dropped = set.update(ChangeRegion::new(0, 0, 3), None);
        assert!(dropped.is_empty());
        assert_eq!(spans(&set), vec![(8, 12), (23, 27)]);
    }

    #[test]
    fn test_overlap_drops_and_shifts_rest() {
        let mut set = two_pills();
        let dropped = set.update(ChangeRegion::new(6, 7, 0), None);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].id(), "a");
        assert_eq!(spans(&set), vec![(19, 23)]);
    }

    #[test]
    fn test_touching_boundaries_retain() {
        let mut set = two_pills();

        // Typing right after the first pill.
        set.update(ChangeRegion::new(9, 9, 1), None);
        assert_eq!(spans(&set), vec![(5, 9), (21, 25)]);

        // Deleting the character right before the second pill.
        set.update(ChangeRegion::new(20, 21, 0), None);
        assert_eq!(spans(&set), vec![(5, 9), (20, 24)]);

        // Inserting right at a pill start shifts it.
        set.update(ChangeRegion::new(5, 5, 2), None);
        assert_eq!(spans(&set), vec![(7, 11), (22, 26)]);
    }

    #[test]
    fn test_edit_after_all_pills_is_noop() {
        let mut set = two_pills();
        set.update(ChangeRegion::new(30, 35, 1), None);
        assert_eq!(spans(&set), vec![(5, 9), (20, 24)]);
    }

    #[test]
    fn test_change_spanning_multiple_pills_drops_all_of_them() {
        let mut set = two_pills();
        let dropped = set.update(ChangeRegion::new(4, 25, 1), None);
        assert_eq!(dropped.len(), 2);
        assert!(set.is_empty());
    }

    #[test]
    fn test_inserted_pill_is_sorted_in() {
        let mut set = two_pills();
        let inserted = pill_at("new", 12, 3);
        set.update(ChangeRegion::new(12, 12, 3), Some(inserted));
        assert_eq!(spans(&set), vec![(5, 9), (12, 15), (23, 27)]);
        assert_eq!(set.as_slice()[1].id(), "new");
    }

    #[test]
    fn test_offset_queries() {
        let set = two_pills();
        assert!(set.pill_containing(5).is_none());
        assert_eq!(set.pill_containing(6).map(Pill::id), Some("a"));
        assert!(set.pill_containing(9).is_none());

        assert_eq!(set.pill_touching(5).map(Pill::id), Some("a"));
        assert_eq!(set.pill_touching(9).map(Pill::id), Some("a"));
        assert!(set.pill_touching(10).is_none());
        assert!(set.pill_touching(0).is_none());

        assert_eq!(set.last_end_at_or_before(15), Some(9));
        assert_eq!(set.last_end_at_or_before(24), Some(24));
        assert_eq!(set.last_end_at_or_before(8), None);
    }

    #[test]
    fn test_check_invariants() {
        let text = format!("{}xxxx{}xxxx", " ".repeat(5), " ".repeat(11));
        let set = two_pills();
        assert!(set.check_invariants(&text).is_ok());

        let short = format!("{}xxxx ", " ".repeat(5));
        assert!(matches!(
            set.check_invariants(&short),
            Err(PillError::SpanOutOfBounds { .. })
        ));

        let wrong = " ".repeat(30);
        assert!(matches!(
            set.check_invariants(&wrong),
            Err(PillError::SpanTextMismatch { .. })
        ));

        let overlapping = PillSet::from_pills(vec![pill_at("a", 0, 4), pill_at("b", 2, 4)]);
        assert!(matches!(
            overlapping.check_invariants("xxxxxx"),
            Err(PillError::OverlappingSpans { .. })
        ));
    }

    #[test]
    fn test_retain_valid_drops_broken_pills() {
        let mut set = PillSet::from_pills(vec![
            pill_at("a", 0, 2),
            pill_at("b", 1, 2),
            pill_at("c", 4, 2),
            pill_at("d", 8, 4),
        ]);
        let dropped = set.retain_valid("xxx.xx..x");
        let dropped_ids: Vec<&str> = dropped.iter().map(Pill::id).collect();
        assert_eq!(dropped_ids, vec!["b", "d"]);
        assert_eq!(spans(&set), vec![(0, 2), (4, 6)]);
    }
}
