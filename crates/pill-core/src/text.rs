//! Character-offset helpers over UTF-8 `&str`.

/// Maps character offsets to byte offsets for one text snapshot.
#[derive(Debug)]
pub(crate) struct CharIndex {
    char_to_byte: Vec<usize>,
    text_len: usize,
}

impl CharIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut char_to_byte: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        char_to_byte.push(text.len());
        Self {
            char_to_byte,
            text_len: text.len(),
        }
    }

    pub(crate) fn char_count(&self) -> usize {
        self.char_to_byte.len().saturating_sub(1)
    }

    pub(crate) fn char_to_byte(&self, char_offset: usize) -> usize {
        let clamped = char_offset.min(self.char_count());
        self.char_to_byte
            .get(clamped)
            .cloned()
            .unwrap_or(self.text_len)
    }

    /// Slice `[start, end)` in characters; offsets are clamped to the text.
    pub(crate) fn slice<'a>(&self, text: &'a str, start: usize, end: usize) -> &'a str {
        let start_byte = self.char_to_byte(start);
        let end_byte = self.char_to_byte(end.max(start));
        &text[start_byte..end_byte]
    }
}

pub(crate) fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Slice `[start, end)` in characters without building an index.
pub(crate) fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    CharIndex::new(text).slice(text, start, end)
}

/// Replace characters `[start, end)` of `text` with `replacement`.
pub(crate) fn splice_chars(text: &str, start: usize, end: usize, replacement: &str) -> String {
    let index = CharIndex::new(text);
    let start_byte = index.char_to_byte(start);
    let end_byte = index.char_to_byte(end.max(start));

    let mut out = String::with_capacity(text.len() - (end_byte - start_byte) + replacement.len());
    out.push_str(&text[..start_byte]);
    out.push_str(replacement);
    out.push_str(&text[end_byte..]);
    out
}
