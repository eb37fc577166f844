//! Persistence of model values.
//!
//! A [`ModelValue`] is stored as JSON under a host-chosen key. On load the stored pills are
//! reconciled against the live corpus by id, so renamed or re-configured corpus entries win over
//! stale snapshots.

use crate::error::PillError;
use crate::model::ModelValue;
use crate::pill::Pill;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A string key-value store.
///
/// The store is assumed to be per-origin and last-writer-wins; nothing here locks it.
pub trait PillStore {
    /// Read the value under `key`.
    fn get(&self, key: &str) -> Option<String>;
    /// Write `value` under `key`.
    fn set(&mut self, key: &str, value: String);
    /// Delete `key`.
    fn remove(&mut self, key: &str);
}

impl<S: PillStore + ?Sized> PillStore for &mut S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) {
        (**self).set(key, value);
    }

    fn remove(&mut self, key: &str) {
        (**self).remove(key);
    }
}

/// In-memory [`PillStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `key` holds a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PillStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Snapshot of one placed pill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPill {
    /// Corpus id.
    pub id: String,
    /// Opaque payload.
    #[serde(default)]
    pub value: Value,
    /// Display text without the prefix.
    pub text: String,
    /// Display prefix.
    #[serde(default)]
    pub prefix: String,
    /// Normalized search text.
    #[serde(default)]
    pub search_text: String,
    /// Trigger prefix.
    #[serde(default)]
    pub search_prefix: String,
    /// Text inserted after the pill.
    #[serde(default)]
    pub suffix: String,
    /// Extra markup class.
    #[serde(default)]
    pub class_name: String,
    /// Caret adjustment after insertion.
    #[serde(default)]
    pub caret_position_from_end: isize,
    /// Search threshold.
    #[serde(default)]
    pub min_search_characters: usize,
    /// Search window size.
    #[serde(default = "default_max_search_words")]
    pub max_search_words: usize,
    /// Span start.
    #[serde(default)]
    pub position_start: Option<usize>,
}

fn default_max_search_words() -> usize {
    1
}

impl From<&Pill> for StoredPill {
    fn from(pill: &Pill) -> Self {
        Self {
            id: pill.id().to_string(),
            value: pill.value().clone(),
            text: pill.display_text().to_string(),
            prefix: pill.prefix().to_string(),
            search_text: pill.search_text().to_string(),
            search_prefix: pill.search_prefix().to_string(),
            suffix: pill.suffix().to_string(),
            class_name: pill.class_name().to_string(),
            caret_position_from_end: pill.caret_position_from_end(),
            min_search_characters: pill.min_search_characters(),
            max_search_words: pill.max_search_words(),
            position_start: pill.position_start(),
        }
    }
}

impl StoredPill {
    /// Rebuild an unplaced-then-positioned pill from the snapshot alone.
    pub fn to_pill(&self) -> Pill {
        let mut pill = Pill::new(self.id.clone(), self.value.clone(), self.text.clone())
            .with_prefix(self.prefix.clone())
            .with_search_prefix(self.search_prefix.clone())
            .with_suffix(self.suffix.clone())
            .with_class_name(self.class_name.clone())
            .with_caret_position_from_end(self.caret_position_from_end)
            .with_min_search_characters(self.min_search_characters)
            .with_max_search_words(self.max_search_words);
        if !self.search_text.is_empty() {
            pill = pill.with_search_text(&self.search_text);
        }
        if let Some(start) = self.position_start {
            pill = pill.with_position(start);
        }
        pill
    }
}

/// Serialized form of a [`ModelValue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredModelValue {
    /// Buffer text.
    pub text: String,
    /// Placed pills.
    #[serde(default)]
    pub pills: Vec<StoredPill>,
}

impl From<&ModelValue> for StoredModelValue {
    fn from(model: &ModelValue) -> Self {
        Self {
            text: model.text().to_string(),
            pills: model.pills().iter().map(StoredPill::from).collect(),
        }
    }
}

impl StoredModelValue {
    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, PillError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self, PillError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuild a model, resolving every stored pill against `corpus` by id.
    ///
    /// Corpus hits are re-created from the corpus entry at the stored position. Misses are either
    /// dropped (`exclude_missing`) or rebuilt from the snapshot. Pills whose span no longer holds
    /// their text are dropped.
    pub fn reconcile(&self, corpus: &[Pill], exclude_missing: bool) -> ModelValue {
        let pills = self
            .pills
            .iter()
            .filter_map(|stored| {
                let Some(start) = stored.position_start else {
                    tracing::warn!(id = %stored.id, "dropping stored pill without position");
                    return None;
                };
                match corpus.iter().find(|candidate| candidate.id() == stored.id) {
                    Some(candidate) => Some(candidate.clone().with_position(start)),
                    None if exclude_missing => {
                        tracing::debug!(id = %stored.id, "stored pill missing from corpus");
                        None
                    }
                    None => Some(stored.to_pill()),
                }
            })
            .collect();

        ModelValue::from_parts(self.text.clone(), pills)
    }
}

/// Write `model` under `key`, or delete the key when the model is empty.
pub fn save<S: PillStore + ?Sized>(
    store: &mut S,
    key: &str,
    model: &ModelValue,
) -> Result<(), PillError> {
    if model.is_empty() {
        store.remove(key);
        return Ok(());
    }
    let json = StoredModelValue::from(model).to_json()?;
    store.set(key, json);
    Ok(())
}

/// Read the model stored under `key` and reconcile it against `corpus`.
///
/// Returns `None` when nothing is stored or the payload is malformed (the latter is logged).
pub fn load<S: PillStore + ?Sized>(
    store: &S,
    key: &str,
    corpus: &[Pill],
    exclude_missing: bool,
) -> Option<ModelValue> {
    let json = store.get(key)?;
    match StoredModelValue::from_json(&json) {
        Ok(stored) => Some(stored.reconcile(corpus, exclude_missing)),
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding stored model value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn mention(id: &str, name: &str) -> Pill {
        Pill::new(id, json!({ "id": id }), name)
            .with_prefix("@")
            .with_search_prefix("@")
    }

    fn model_with_john() -> ModelValue {
        let mut model = ModelValue::new("hi ");
        model.insert_pill(mention("1", "John"), None);
        model
    }

    #[test]
    fn test_json_shape() {
        let stored = StoredModelValue::from(&model_with_john());
        let value: Value = serde_json::from_str(&stored.to_json().unwrap()).unwrap();

        assert_eq!(value["text"], "hi @John");
        assert_eq!(value["pills"][0]["id"], "1");
        assert_eq!(value["pills"][0]["text"], "John");
        assert_eq!(value["pills"][0]["prefix"], "@");
        assert_eq!(value["pills"][0]["searchPrefix"], "@");
        assert_eq!(value["pills"][0]["positionStart"], 3);
        assert_eq!(value["pills"][0]["maxSearchWords"], 1);
    }

    #[test]
    fn test_save_and_load_with_corpus_hit() {
        let mut store = MemoryStore::new();
        save(&mut store, "draft", &model_with_john()).unwrap();

        let corpus = vec![mention("1", "John").with_class_name("vip")];
        let model = load(&store, "draft", &corpus, false).unwrap();

        assert_eq!(model.text(), "hi @John");
        let pill = &model.pills().as_slice()[0];
        assert_eq!(pill.class_name(), "vip");
        assert_eq!(pill.span(), Some(3..8));
    }

    #[test]
    fn test_corpus_miss_rebuilds_or_excludes() {
        let mut store = MemoryStore::new();
        save(&mut store, "draft", &model_with_john()).unwrap();

        let rebuilt = load(&store, "draft", &[], false).unwrap();
        assert_eq!(rebuilt.pills().len(), 1);
        assert_eq!(rebuilt.pills().as_slice()[0].value(), &json!({ "id": "1" }));

        let excluded = load(&store, "draft", &[], true).unwrap();
        assert_eq!(excluded.text(), "hi @John");
        assert!(excluded.pills().is_empty());
    }

    #[test]
    fn test_corpus_entry_with_different_text_is_dropped() {
        let mut store = MemoryStore::new();
        save(&mut store, "draft", &model_with_john()).unwrap();

        let corpus = vec![mention("1", "Johnny")];
        let model = load(&store, "draft", &corpus, false).unwrap();
        assert!(model.pills().is_empty());
    }

    #[test]
    fn test_empty_model_removes_key() {
        let mut store = MemoryStore::new();
        save(&mut store, "draft", &model_with_john()).unwrap();
        assert!(store.contains_key("draft"));

        save(&mut store, "draft", &ModelValue::default()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_malformed_payload_is_ignored() {
        let mut store = MemoryStore::new();
        store.set("draft", "{not json".to_string());
        assert!(load(&store, "draft", &[], false).is_none());

        assert!(matches!(
            StoredModelValue::from_json(r#"{"pills":[]}"#),
            Err(PillError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_minimal_payload_uses_defaults() {
        let stored = StoredModelValue::from_json(
            r#"{"text":"@x","pills":[{"id":"x","text":"x","prefix":"@","positionStart":0}]}"#,
        )
        .unwrap();
        let model = stored.reconcile(&[], false);

        let pill = &model.pills().as_slice()[0];
        assert_eq!(pill.max_search_words(), 1);
        assert_eq!(pill.search_text(), "x");
    }
}
