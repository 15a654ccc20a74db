//! Storage primitives behind a locked collection

use crate::{CollectionError, Result};
use graphmux_graph_ir::{ImmutableGraph, Triple, TriplePattern};

/// Boxed iterator over triples produced by a backend
pub type TripleIter<'a> = Box<dyn Iterator<Item = Result<Triple>> + Send + 'a>;

/// Storage primitives of a triple collection
///
/// Every `perform_*` method is called by [`LockedCollection`](crate::LockedCollection)
/// with the collection's lock already held: read primitives under the read
/// lock, mutation primitives under the write lock. Backends must not acquire
/// the collection lock themselves.
///
/// Only [`perform_filter`](GraphBackend::perform_filter) is required. The read
/// primitives default to filtering; the mutation primitives default to
/// [`CollectionError::Unsupported`], which is the correct behavior for
/// read-only backends.
///
/// Iterators returned by `perform_filter` are advanced one step at a time
/// with the read lock re-acquired for each step, so they must not hold
/// internal locks between steps.
pub trait GraphBackend: Send + Sync {
    /// Iterate over triples matching `pattern`
    fn perform_filter<'a>(&'a self, pattern: &TriplePattern) -> Result<TripleIter<'a>>;

    /// Count all triples
    fn perform_size(&self) -> Result<usize> {
        let mut count = 0;
        for triple in self.perform_filter(&TriplePattern::any())? {
            triple?;
            count += 1;
        }
        Ok(count)
    }

    fn perform_contains(&self, triple: &Triple) -> Result<bool> {
        let mut matches = self.perform_filter(&TriplePattern::from(triple))?;
        Ok(matches.next().transpose()?.is_some())
    }

    /// Insert a triple, returning `true` if it was not already present
    fn perform_add(&self, _triple: Triple) -> Result<bool> {
        Err(CollectionError::unsupported("add"))
    }

    /// Remove a triple, returning `true` if it was present
    fn perform_remove(&self, _triple: &Triple) -> Result<bool> {
        Err(CollectionError::unsupported("remove"))
    }

    /// Remove every triple
    fn perform_clear(&self) -> Result<()> {
        let all: Vec<Triple> = self
            .perform_filter(&TriplePattern::any())?
            .collect::<Result<_>>()?;
        for triple in &all {
            self.perform_remove(triple)?;
        }
        Ok(())
    }

    /// Whether the mutation primitives are supported
    fn is_mutable(&self) -> bool {
        false
    }
}

impl GraphBackend for ImmutableGraph {
    fn perform_filter<'a>(&'a self, pattern: &TriplePattern) -> Result<TripleIter<'a>> {
        let pattern = pattern.clone();
        Ok(Box::new(
            self.iter()
                .filter(move |t| pattern.matches(t))
                .cloned()
                .map(Ok),
        ))
    }

    fn perform_size(&self) -> Result<usize> {
        Ok(self.len())
    }

    fn perform_contains(&self, triple: &Triple) -> Result<bool> {
        Ok(self.contains(triple))
    }
}
