//! Control configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which thresholds govern a trigger-prefix group during search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThresholdScope {
    /// The tightest (minimum) `min_search_characters` and `max_search_words` across all candidates
    /// sharing a prefix apply to the whole group.
    #[default]
    Group,
    /// Every candidate is matched with its own thresholds.
    PerCandidate,
}

/// Options for a [`PillInput`](crate::PillInput).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PillInputOptions {
    /// Key under which the model is persisted; `None` disables persistence.
    pub storage_key: Option<String>,
    /// Drop stored pills whose id is not in the corpus instead of rebuilding them from the
    /// stored snapshot.
    pub exclude_stored_pills_not_found_in_corpus: bool,
    /// Flush cadence while edits keep coming, in milliseconds.
    pub persist_interval_ms: u64,
    /// Quiet period after the last edit before the final flush, in milliseconds.
    pub persist_quiet_ms: u64,
    /// Search threshold scope.
    pub threshold_scope: ThresholdScope,
}

impl Default for PillInputOptions {
    fn default() -> Self {
        Self {
            storage_key: None,
            exclude_stored_pills_not_found_in_corpus: false,
            persist_interval_ms: 500,
            persist_quiet_ms: 500,
            threshold_scope: ThresholdScope::Group,
        }
    }
}

impl PillInputOptions {
    /// Options persisting under `key`.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = Some(key.into());
        self
    }

    /// Flush cadence as a [`Duration`].
    pub fn persist_interval(&self) -> Duration {
        Duration::from_millis(self.persist_interval_ms.max(1))
    }

    /// Quiet period as a [`Duration`].
    pub fn persist_quiet(&self) -> Duration {
        Duration::from_millis(self.persist_quiet_ms)
    }
}
