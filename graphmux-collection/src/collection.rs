//! The triple collection contract and its locking envelope

use crate::{CollectionError, GraphBackend, GraphLock, Result, TripleIter};
use graphmux_graph_ir::{ImmutableGraph, Triple, TriplePattern};
use std::fmt;
use tracing::trace;

/// An unordered, thread-safe set of triples
///
/// Duplicates collapse: adding a triple already present returns `false`.
/// On immutable collections every mutation fails with
/// [`CollectionError::Unsupported`].
///
/// This trait is object-safe; providers hand collections out as
/// `Arc<dyn TripleCollection>`.
pub trait TripleCollection: Send + Sync {
    /// Iterate over triples matching `pattern`
    ///
    /// The iterator takes the read lock for each step only. Hold
    /// [`GraphLock::read`] around the whole iteration for a frozen view.
    fn filter(&self, pattern: &TriplePattern) -> Result<FilterIter<'_>>;

    fn size(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool>;

    fn contains(&self, triple: &Triple) -> Result<bool>;

    /// Add a triple, returning `true` if the collection changed
    fn add(&self, triple: Triple) -> Result<bool>;

    /// Add every triple under one write lock, returning `true` if any was new
    fn add_all(&self, triples: Vec<Triple>) -> Result<bool>;

    /// Remove a triple, returning `true` if the collection changed
    fn remove(&self, triple: &Triple) -> Result<bool>;

    /// Remove every given triple under one write lock
    fn remove_all(&self, triples: &[Triple]) -> Result<bool>;

    fn clear(&self) -> Result<()>;

    /// The lock guarding this collection
    fn lock(&self) -> &GraphLock;

    fn is_mutable(&self) -> bool;

    /// Freeze the current contents under the read lock
    fn snapshot(&self) -> Result<ImmutableGraph>;
}

/// Locking envelope around a [`GraphBackend`]
///
/// Every read primitive runs under the read lock and every mutation
/// primitive under the write lock. Backends supply storage; they cannot
/// bypass the envelope.
pub struct LockedCollection<B> {
    backend: B,
    lock: GraphLock,
}

impl<B: GraphBackend> LockedCollection<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            lock: GraphLock::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }

    fn require_mutable(&self, op: &str) -> Result<()> {
        if self.backend.is_mutable() {
            Ok(())
        } else {
            trace!(op, "mutation rejected on immutable collection");
            Err(CollectionError::unsupported(op))
        }
    }
}

impl<B: GraphBackend> TripleCollection for LockedCollection<B> {
    fn filter(&self, pattern: &TriplePattern) -> Result<FilterIter<'_>> {
        let inner = {
            let _read = self.lock.read();
            self.backend.perform_filter(pattern)?
        };
        Ok(FilterIter {
            lock: &self.lock,
            backend: &self.backend,
            inner,
            current: None,
        })
    }

    fn size(&self) -> Result<usize> {
        let _read = self.lock.read();
        self.backend.perform_size()
    }

    fn is_empty(&self) -> Result<bool> {
        let _read = self.lock.read();
        let mut all = self.backend.perform_filter(&TriplePattern::any())?;
        Ok(all.next().transpose()?.is_none())
    }

    fn contains(&self, triple: &Triple) -> Result<bool> {
        let _read = self.lock.read();
        self.backend.perform_contains(triple)
    }

    fn add(&self, triple: Triple) -> Result<bool> {
        self.require_mutable("add")?;
        let _write = self.lock.write()?;
        self.backend.perform_add(triple)
    }

    fn add_all(&self, triples: Vec<Triple>) -> Result<bool> {
        self.require_mutable("add_all")?;
        let _write = self.lock.write()?;
        let mut changed = false;
        for triple in triples {
            changed |= self.backend.perform_add(triple)?;
        }
        Ok(changed)
    }

    fn remove(&self, triple: &Triple) -> Result<bool> {
        self.require_mutable("remove")?;
        let _write = self.lock.write()?;
        self.backend.perform_remove(triple)
    }

    fn remove_all(&self, triples: &[Triple]) -> Result<bool> {
        self.require_mutable("remove_all")?;
        let _write = self.lock.write()?;
        let mut changed = false;
        for triple in triples {
            changed |= self.backend.perform_remove(triple)?;
        }
        Ok(changed)
    }

    fn clear(&self) -> Result<()> {
        self.require_mutable("clear")?;
        let _write = self.lock.write()?;
        self.backend.perform_clear()
    }

    fn lock(&self) -> &GraphLock {
        &self.lock
    }

    fn is_mutable(&self) -> bool {
        self.backend.is_mutable()
    }

    fn snapshot(&self) -> Result<ImmutableGraph> {
        let _read = self.lock.read();
        let triples = self
            .backend
            .perform_filter(&TriplePattern::any())?
            .collect::<Result<Vec<_>>>()?;
        Ok(ImmutableGraph::from_triples(triples))
    }
}

impl<B: GraphBackend> From<B> for LockedCollection<B> {
    fn from(backend: B) -> Self {
        Self::new(backend)
    }
}

impl<B> fmt::Debug for LockedCollection<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockedCollection")
            .field("backend", &std::any::type_name::<B>())
            .field("lock", &self.lock)
            .finish()
    }
}

/// Iterator returned by [`TripleCollection::filter`]
///
/// Each call to `next` holds the collection's read lock for that step only.
pub struct FilterIter<'a> {
    lock: &'a GraphLock,
    backend: &'a dyn GraphBackend,
    inner: TripleIter<'a>,
    current: Option<Triple>,
}

impl FilterIter<'_> {
    /// Remove the triple most recently returned by `next`
    ///
    /// Takes the write lock for this single removal. Fails with
    /// [`CollectionError::LockUpgrade`] if the caller holds the read lock, and
    /// with [`CollectionError::IllegalState`] if there is no current triple.
    pub fn remove_current(&mut self) -> Result<bool> {
        if !self.backend.is_mutable() {
            return Err(CollectionError::unsupported("remove"));
        }
        let triple = self
            .current
            .take()
            .ok_or_else(|| CollectionError::illegal_state("no current triple to remove"))?;
        let _write = self.lock.write()?;
        self.backend.perform_remove(&triple)
    }
}

impl Iterator for FilterIter<'_> {
    type Item = Result<Triple>;

    fn next(&mut self) -> Option<Self::Item> {
        let _read = self.lock.read();
        let item = self.inner.next();
        self.current = match &item {
            Some(Ok(triple)) => Some(triple.clone()),
            _ => None,
        };
        item
    }
}

impl fmt::Debug for FilterIter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterIter")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}
