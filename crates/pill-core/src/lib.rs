#![warn(missing_docs)]
//! Pill Core - Headless Pill Text-Input Engine
//!
//! # Overview
//!
//! `pill-core` keeps a plain-text buffer in which some substrings are bound to opaque reference
//! objects ("pills", such as an `@mention` or an `=SUM()` formula token). Pills behave as atomic
//! units: an edit that touches a pill's interior dereferences it, while edits around it shift it.
//! The surrounding text stays freely editable.
//!
//! It does not render anything. The host feeds raw edit events in and reads back the model, the
//! markup to draw, and the search matches to offer.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  PillInput (events, callbacks, persistence) │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  SearchMatcher (trigger-prefix groups)      │  ← Suggestions
//! ├─────────────────────────────────────────────┤
//! │  ModelValue (text + PillSet)                │  ← Data Model
//! ├─────────────────────────────────────────────┤
//! │  EditClassifier / TextDiffer                │  ← Change Regions
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use pill_core::{ModelValue, Pill, diff};
//! use serde_json::json;
//!
//! let mut model = ModelValue::new("Hi ");
//! let inserted = model.insert_pill(
//!     Pill::new("42", json!({ "userId": 42 }), "Ada").with_prefix("@"),
//!     None,
//! );
//! assert_eq!(model.text(), "Hi @Ada");
//! assert_eq!(inserted.caret, 7);
//!
//! let region = diff("cheerio", "spaghettio");
//! assert_eq!((region.start, region.end, region.inserted_len), (0, 5, 8));
//! ```
//!
//! # Module Description
//!
//! - [`diff`] - longest common prefix/suffix change regions
//! - [`classify`] - edit classification from the pre-input event
//! - [`ranges`] - ordered, non-overlapping pill spans and their update rule
//! - [`model`] - text buffer plus pills, atomic insert/remove
//! - [`search`] - trigger-prefix matching over a corpus
//! - [`storage`] - stored form and corpus reconciliation
//! - [`input`] - the control tying it together
//!
//! # Offsets
//!
//! Every offset is a character offset (Unicode scalar value), and every span is half-open.

pub mod classify;
pub mod corpus;
pub mod diff;
pub mod error;
pub mod input;
pub mod markup;
pub mod model;
pub mod options;
pub mod pill;
pub mod ranges;
pub mod scheduler;
pub mod search;
pub mod storage;
mod text;
pub mod words;

pub use classify::{EditClass, EditEvent, EditKind, Modifiers, Selection, classify};
pub use corpus::{CorpusFn, PillCorpus};
pub use diff::{ChangeRegion, diff};
pub use error::PillError;
pub use input::{NavKey, PillInput, RawEdit, SearchMatchCallback};
pub use model::{InsertedPill, ModelValue};
pub use options::{PillInputOptions, ThresholdScope};
pub use pill::{Pill, PillHandle};
pub use ranges::PillSet;
pub use scheduler::{Scheduler, TaskHandle};
pub use search::{SearchMatch, find_matches, match_text};
pub use storage::{MemoryStore, PillStore, StoredModelValue, StoredPill};
