//! In-memory mutable backend

use crate::{GraphBackend, LockedCollection, Result, TripleIter};
use graphmux_graph_ir::{Triple, TriplePattern};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use std::fmt;

/// In-memory mutable set of triples
///
/// Triples are kept in insertion order. `perform_filter` copies the matching
/// triples out before returning, so the returned iterator holds no internal
/// lock between steps.
#[derive(Default)]
pub struct SimpleGraph {
    inner: RwLock<SimpleInner>,
}

#[derive(Default)]
struct SimpleInner {
    order: Vec<Triple>,
    index: FxHashSet<Triple>,
}

impl SimpleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph holding `triples`, collapsing duplicates
    pub fn from_triples(triples: impl IntoIterator<Item = Triple>) -> Self {
        let mut inner = SimpleInner::default();
        for triple in triples {
            if inner.index.insert(triple.clone()) {
                inner.order.push(triple);
            }
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Wrap this graph in a [`LockedCollection`]
    pub fn into_collection(self) -> LockedCollection<Self> {
        LockedCollection::new(self)
    }
}

impl GraphBackend for SimpleGraph {
    fn perform_filter<'a>(&'a self, pattern: &TriplePattern) -> Result<TripleIter<'a>> {
        let inner = self.inner.read();
        let matching: Vec<Triple> = if let Some(exact) = exact_triple(pattern) {
            inner.index.get(&exact).cloned().into_iter().collect()
        } else {
            inner
                .order
                .iter()
                .filter(|t| pattern.matches(t))
                .cloned()
                .collect()
        };
        Ok(Box::new(matching.into_iter().map(Ok)))
    }

    fn perform_size(&self) -> Result<usize> {
        Ok(self.inner.read().order.len())
    }

    fn perform_contains(&self, triple: &Triple) -> Result<bool> {
        Ok(self.inner.read().index.contains(triple))
    }

    fn perform_add(&self, triple: Triple) -> Result<bool> {
        let mut inner = self.inner.write();
        if !inner.index.insert(triple.clone()) {
            return Ok(false);
        }
        inner.order.push(triple);
        Ok(true)
    }

    fn perform_remove(&self, triple: &Triple) -> Result<bool> {
        let mut inner = self.inner.write();
        if !inner.index.remove(triple) {
            return Ok(false);
        }
        inner.order.retain(|t| t != triple);
        Ok(true)
    }

    fn perform_clear(&self) -> Result<()> {
        let mut inner = self.inner.write();
        inner.order.clear();
        inner.index.clear();
        Ok(())
    }

    fn is_mutable(&self) -> bool {
        true
    }
}

fn exact_triple(pattern: &TriplePattern) -> Option<Triple> {
    Some(Triple::new(
        pattern.s.clone()?,
        pattern.p.clone()?,
        pattern.o.clone()?,
    ))
}

impl fmt::Debug for SimpleGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleGraph")
            .field("triple_count", &self.inner.read().order.len())
            .finish()
    }
}
