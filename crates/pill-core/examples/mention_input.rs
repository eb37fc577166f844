//! Mention input example
//!
//! Simulates a host typing into a comment box with `@` mentions and `=` formulas, accepting
//! suggestions, and persisting the draft.
//!
//! Run with `RUST_LOG=pill_core=debug cargo run --example mention_input` to see the engine's logs.

use pill_core::{
    EditEvent, EditKind, MemoryStore, Modifiers, NavKey, Pill, PillInput, PillInputOptions,
    RawEdit, SearchMatch, Selection,
};
use serde_json::json;
use std::time::Duration;

fn corpus() -> Vec<Pill> {
    let people = [
        ("u1", "Grace Hopper"),
        ("u2", "Alan Turing"),
        ("u3", "Ada Lovelace"),
    ];
    let mut pills: Vec<Pill> = people
        .into_iter()
        .map(|(id, name)| {
            Pill::new(id, json!({ "userId": id }), name)
                .with_prefix("@")
                .with_search_prefix("@")
                .with_suffix(" ")
                .with_min_search_characters(1)
                .with_max_search_words(2)
        })
        .collect();

    pills.push(
        Pill::new("sum", json!({ "fn": "SUM" }), "SUM")
            .with_prefix("=")
            .with_search_prefix("=")
            .with_suffix("()")
            .with_caret_position_from_end(-1)
            .with_class_name("formula"),
    );
    pills
}

fn type_str<S: pill_core::PillStore>(
    input: &mut PillInput<Vec<Pill>, S>,
    text: &str,
) -> Vec<SearchMatch> {
    let mut matches = Vec::new();
    for ch in text.chars() {
        let caret = input.selection().start;
        let mut next: Vec<char> = input.text().chars().collect();
        next.insert(caret, ch);
        matches = input.handle_event(RawEdit {
            event: Some(EditEvent::plain(EditKind::Keypress(ch))),
            selection_before: Selection::caret(caret),
            new_text: next.into_iter().collect(),
            selection_after: Selection::caret(caret + 1),
        });
        input.tick(Duration::from_millis(80));
    }
    matches
}

fn print_matches(matches: &[SearchMatch]) {
    if matches.is_empty() {
        println!("  (no suggestions)");
    }
    for m in matches {
        println!("  suggest {:<14} for query {:?}", m.pill.display_text(), m.query);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut store = MemoryStore::new();
    let options = PillInputOptions::default().with_storage_key("comment-draft");

    {
        let mut input = PillInput::new(corpus(), &mut store, options.clone());
        input.subscribe(|matches| {
            if !matches.is_empty() {
                println!("  [callback] {} suggestion(s)", matches.len());
            }
        });

        println!("1. Typing a mention");
        let matches = type_str(&mut input, "Thanks @al");
        print_matches(&matches);
        if let Some(first) = matches.first() {
            input.accept_match(first);
        }
        println!("  text: {:?}", input.text());

        println!("\n2. Typing a formula");
        let matches = type_str(&mut input, "total =s");
        print_matches(&matches);
        if let Some(first) = matches.first() {
            input.accept_match(first);
        }
        println!("  text: {:?}, caret at {}", input.text(), input.selection().start);

        println!("\n3. Navigating onto a pill");
        input.set_selection(Selection::caret(19));
        match input.pill_to_focus(NavKey::Left, Modifiers::NONE) {
            Some(handle) => {
                let pill = input.model().pill(handle).map(Pill::display_text);
                println!("  Left at the end of a pill focuses {pill:?}");
            }
            None => println!("  caret is not next to a pill"),
        }

        println!("\n4. Rendering");
        println!("  {}", input.markup());

        input.tick(Duration::from_secs(1));
        input.destroy();
    }

    println!("\n5. Restoring the draft");
    let restored = PillInput::new(corpus(), &mut store, options);
    println!(
        "  text: {:?} with {} pill(s)",
        restored.text(),
        restored.model().pills().len()
    );
}
