//! Pill corpus: the read-only source of search candidates.

use crate::pill::Pill;

/// Supplies candidate pills for search and for reconciling stored state.
///
/// Implementations may return a fixed list or recompute it on every call.
pub trait PillCorpus {
    /// Current candidates, in the order they should be offered.
    fn candidates(&self) -> Vec<Pill>;
}

impl PillCorpus for Vec<Pill> {
    fn candidates(&self) -> Vec<Pill> {
        self.clone()
    }
}

impl PillCorpus for [Pill] {
    fn candidates(&self) -> Vec<Pill> {
        self.to_vec()
    }
}

/// A corpus backed by a closure, re-evaluated on every search.
pub struct CorpusFn<F>(pub F);

impl<F> PillCorpus for CorpusFn<F>
where
    F: Fn() -> Vec<Pill>,
{
    fn candidates(&self) -> Vec<Pill> {
        (self.0)()
    }
}
