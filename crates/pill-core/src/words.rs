//! Word windows over text.
//!
//! Words are maximal runs of non-whitespace characters. A "window" is a suffix of the text that
//! starts at a word boundary and holds at most `n` words.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Whitespace-delimited words of `text`.
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Byte offsets at which the words of `text` start.
pub(crate) fn word_starts(text: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut in_word = false;
    for (idx, ch) in text.char_indices() {
        let is_word_char = !ch.is_whitespace();
        if is_word_char && !in_word {
            starts.push(idx);
        }
        in_word = is_word_char;
    }
    starts
}

/// The trailing window of at most `n` words of `text`.
///
/// With `allow_trailing_space`, the text may end with exactly one whitespace character, which is
/// kept in the window (so a caret right after `"@john "` still continues a multi-word search).
/// Returns `None` when the text holds no word, or ends in whitespace that is not allowed.
///
/// Every whitespace character in the window is normalized to a plain space; character counts are
/// preserved.
pub fn last_n_words(text: &str, n: usize, allow_trailing_space: bool) -> Option<String> {
    let n = n.max(1);
    let chars: Vec<char> = text.chars().collect();

    let mut end = chars.len();
    if end > 0 && chars[end - 1].is_whitespace() {
        if !allow_trailing_space {
            return None;
        }
        end -= 1;
    }
    if end == 0 || chars[end - 1].is_whitespace() {
        return None;
    }

    let mut start = end;
    let mut taken = 0;
    while taken < n {
        // Consume one word.
        while start > 0 && !chars[start - 1].is_whitespace() {
            start -= 1;
        }
        taken += 1;

        // Peek past the separating whitespace for another word.
        let mut gap = start;
        while gap > 0 && chars[gap - 1].is_whitespace() {
            gap -= 1;
        }
        if gap == 0 || taken == n {
            break;
        }
        start = gap;
    }

    Some(
        chars[start..]
            .iter()
            .map(|&ch| if ch.is_whitespace() { ' ' } else { ch })
            .collect(),
    )
}

/// Fold text to its base letters for searching.
///
/// Combining marks are stripped after canonical decomposition. Letters whose stroke or ligature
/// does not decompose (`Ł`, `Ø`, `Đ`, `ß`, `Æ`, ...) are spelled out in ASCII.
pub fn normalize_search_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.nfd().filter(|ch| !is_combining_mark(*ch)) {
        match fold_letter(ch) {
            Some(folded) => out.push_str(folded),
            None => out.push(ch),
        }
    }
    out
}

fn fold_letter(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'Ł' => "L",
        'ł' => "l",
        'Ø' => "O",
        'ø' => "o",
        'Đ' | 'Ð' => "D",
        'đ' | 'ð' => "d",
        'Ħ' => "H",
        'ħ' => "h",
        'Ŧ' => "T",
        'ŧ' => "t",
        'Ŀ' => "L",
        'ŀ' => "l",
        'ı' => "i",
        'ĸ' => "k",
        'Ŋ' => "N",
        'ŋ' => "n",
        'ß' => "ss",
        'ẞ' => "SS",
        'Æ' => "AE",
        'æ' => "ae",
        'Œ' => "OE",
        'œ' => "oe",
        'Þ' => "Th",
        'þ' => "th",
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_ignores_runs_of_whitespace() {
        assert_eq!(words("  hello \n big\tworld "), vec!["hello", "big", "world"]);
        assert!(words("   ").is_empty());
    }

    #[test]
    fn test_word_starts() {
        assert_eq!(word_starts(" ab  c"), vec![1, 5]);
        assert_eq!(word_starts("é x"), vec![0, 3]);
    }

    #[test]
    fn test_last_n_words_basic() {
        assert_eq!(last_n_words("say hello to @jo", 1, false).as_deref(), Some("@jo"));
        assert_eq!(last_n_words("say hello to @jo", 2, false).as_deref(), Some("to @jo"));
        assert_eq!(last_n_words("say hello", 5, false).as_deref(), Some("say hello"));
    }

    #[test]
    fn test_last_n_words_skips_leading_whitespace() {
        assert_eq!(last_n_words("   hello", 3, true).as_deref(), Some("hello"));
    }

    #[test]
    fn test_last_n_words_trailing_space() {
        assert_eq!(last_n_words("hi @john ", 1, true).as_deref(), Some("@john "));
        assert_eq!(last_n_words("hi @john ", 3, true).as_deref(), Some("hi @john "));
        assert_eq!(last_n_words("hi @john ", 1, false), None);
        assert_eq!(last_n_words("hi @john  ", 1, true), None);
    }

    #[test]
    fn test_last_n_words_normalizes_whitespace_kinds() {
        assert_eq!(last_n_words("a\nb", 2, false).as_deref(), Some("a b"));
        assert_eq!(last_n_words("a\n", 1, true).as_deref(), Some("a "));
    }

    #[test]
    fn test_last_n_words_empty_input() {
        assert_eq!(last_n_words("", 1, true), None);
        assert_eq!(last_n_words(" ", 1, true), None);
    }

    #[test]
    fn test_normalize_strips_accents() {
        assert_eq!(normalize_search_text("Zoë Ångström"), "Zoe Angstrom");
    }

    #[test]
    fn test_normalize_folds_letters_without_decomposition() {
        assert_eq!(normalize_search_text("Łukasz Øster"), "Lukasz Oster");
        assert_eq!(normalize_search_text("Đorđe Straße"), "Dorde Strasse");
        assert_eq!(normalize_search_text("Æsir Œuvre"), "AEsir OEuvre");
    }

    #[test]
    fn test_last_n_words_preserves_inner_spacing() {
        assert_eq!(last_n_words("x a  b", 2, false).as_deref(), Some("a  b"));
    }
}
