//! Decorator markup.
//!
//! The host renders pills with a decorator element laid over the plain-text input. This module
//! produces the decorator's HTML: escaped text with line breaks as `<br>`, and each pill's
//! [`Pill::markup`](crate::Pill::markup) fragment at its span.

use crate::model::ModelValue;
use crate::text::CharIndex;
use regex::Regex;
use std::sync::LazyLock;

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\r|\n").expect("valid line break pattern"));

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape plain text and turn line breaks into `<br>`.
pub fn clean_text(text: &str) -> String {
    LINE_BREAK.replace_all(&escape_html(text), "<br>").into_owned()
}

/// Render the decorator markup for a model.
///
/// A trailing `<br>` is padded with `&nbsp;` so the decorator keeps the height of the final empty
/// line.
pub fn render(model: &ModelValue) -> String {
    let text = model.text();
    let index = CharIndex::new(text);
    let mut out = String::with_capacity(text.len() + model.pills().len() * 48);
    let mut last_end = 0;

    for pill in model.pills() {
        let Some(span) = pill.span() else {
            continue;
        };
        out.push_str(&clean_text(index.slice(text, last_end, span.start)));
        out.push_str(&pill.markup());
        last_end = span.end;
    }
    out.push_str(&clean_text(index.slice(text, last_end, index.char_count())));

    if out.ends_with("<br>") {
        out.push_str("&nbsp;");
    }
    out
}
