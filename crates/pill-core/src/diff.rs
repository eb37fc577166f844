//! Change regions and the prefix/suffix text differ.
//!
//! A [`ChangeRegion`] describes one contiguous text replacement in the coordinate space of the
//! text **before** the change, in character offsets (Unicode scalar values).
//!
//! [`diff`] is the fallback used when an edit cannot be classified from the triggering event
//! (paste, cut, autocorrect, programmatic replacement). It is not a true LCS diff: it finds the
//! longest common prefix and then the longest common suffix of what remains. A single contiguous
//! replacement is recovered exactly; several edits in one tick collapse into one region that
//! covers all of them, which is larger than necessary but still safe for span tracking.

/// A text replacement: characters `[start, end)` of the old text were replaced by
/// `inserted_len` new characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeRegion {
    /// Start character offset of the change (old and new text agree before it).
    pub start: usize,
    /// Exclusive end character offset in the old text.
    pub end: usize,
    /// Number of characters inserted at `start`.
    pub inserted_len: usize,
}

impl ChangeRegion {
    /// Create a change region.
    pub fn new(start: usize, end: usize, inserted_len: usize) -> Self {
        Self {
            start,
            end,
            inserted_len,
        }
    }

    /// Region for a pure insertion of `len` characters at `at`.
    pub fn insertion(at: usize, len: usize) -> Self {
        Self::new(at, at, len)
    }

    /// Region for a pure deletion of `[start, end)`.
    pub fn deletion(start: usize, end: usize) -> Self {
        Self::new(start, end, 0)
    }

    /// Number of old characters removed by this change.
    pub fn deleted_len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Signed shift applied to every offset at or after `end`.
    pub fn index_delta(&self) -> isize {
        self.inserted_len as isize - self.deleted_len() as isize
    }

    /// Returns `true` if the change neither deletes nor inserts anything.
    pub fn is_empty(&self) -> bool {
        self.deleted_len() == 0 && self.inserted_len == 0
    }
}

/// Compute the change region that turns `old_text` into `new_text`.
pub fn diff(old_text: &str, new_text: &str) -> ChangeRegion {
    let old: Vec<char> = old_text.chars().collect();
    let new: Vec<char> = new_text.chars().collect();
    diff_chars(&old, &new)
}

pub(crate) fn diff_chars(old: &[char], new: &[char]) -> ChangeRegion {
    let start = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let end = if start < old.len() || start < new.len() {
        common_suffix_start(old, new, start)
    } else {
        old.len().max(new.len())
    };

    // end + new_len - old_len - start, computed without going below zero.
    let inserted_len = (end + new.len()).saturating_sub(old.len() + start);

    ChangeRegion::new(start, end, inserted_len)
}

/// Old-space offset where the common suffix of `old` and `new` begins, never before `start`.
fn common_suffix_start(old: &[char], new: &[char], start: usize) -> usize {
    if start == old.len() {
        return start;
    }
    if start == new.len() {
        return old.len();
    }

    // Walk both strings backwards in lockstep until either index reaches `start`.
    let mut old_end = old.len();
    let mut new_end = new.len();
    while old_end > start && new_end > start {
        if old[old_end - 1] != new[new_end - 1] {
            break;
        }
        old_end -= 1;
        new_end -= 1;
    }
    old_end
}
