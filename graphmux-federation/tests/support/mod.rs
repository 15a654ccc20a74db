//! Shared harness for graphmux-federation integration tests.
//!
//! `TestProvider` wraps a [`MemoryProvider`] and counts calls, optionally
//! slowing resolution down or failing it. `RecordingEngine` stands in for a
//! generic query engine.

#![allow(dead_code)]

use graphmux_collection::{LockedCollection, SimpleGraph, TripleCollection};
use graphmux_federation::{
    CreateKind, Federation, FederationConfig, FederationError, GraphKind, GraphProvider,
    GraphSource, MemoryProvider, QueryEngine, QueryableProvider, Result,
};
use graphmux_graph_ir::{ImmutableGraph, Iri, QueryResult, Term, Triple};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub fn ex(local: &str) -> Iri {
    Iri::new(format!("http://example.org/{local}"))
}

pub fn triple(s: &str, p: &str, o: &str) -> Triple {
    Triple::new(ex(s), ex(p), Term::string(o))
}

/// Pair a provider with its weight for [`federation`]
pub fn weighted<P>(provider: &Arc<P>, weight: i32) -> (Arc<dyn GraphProvider>, i32)
where
    P: GraphProvider + 'static,
{
    let provider: Arc<dyn GraphProvider> = provider.clone();
    (provider, weight)
}

/// An active federation with the given providers and weights
pub fn federation(providers: Vec<(Arc<dyn GraphProvider>, i32)>) -> Federation {
    let federation = Federation::new(FederationConfig::default());
    for (provider, weight) in providers {
        federation.register(provider, weight);
    }
    federation.activate();
    federation
}

// =============================================================================
// Providers
// =============================================================================

#[derive(Debug)]
pub struct TestProvider {
    inner: MemoryProvider,
    resolve_calls: AtomicUsize,
    resolve_delay: Option<Duration>,
    failure: Option<String>,
    queryable: bool,
    native_queries: Mutex<Vec<String>>,
}

impl TestProvider {
    pub fn new(id: &str) -> Self {
        Self {
            inner: MemoryProvider::new(id),
            resolve_calls: AtomicUsize::new(0),
            resolve_delay: None,
            failure: None,
            queryable: false,
            native_queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_mutable(self, name: Iri, triples: Vec<Triple>) -> Self {
        self.inner.insert_mutable(name, triples);
        self
    }

    pub fn with_read_only(self, name: Iri, triples: Vec<Triple>) -> Self {
        self.inner
            .insert_read_only(name, ImmutableGraph::from_triples(triples));
        self
    }

    pub fn with_resolve_delay(mut self, delay: Duration) -> Self {
        self.resolve_delay = Some(delay);
        self
    }

    /// Fail every resolution with a backend fault
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Answer queries natively with `ASK` true
    pub fn queryable(mut self) -> Self {
        self.queryable = true;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn native_queries(&self) -> Vec<String> {
        self.native_queries.lock().clone()
    }

    fn before_resolve(&self) -> Result<()> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.resolve_delay {
            thread::sleep(delay);
        }
        match &self.failure {
            Some(message) => Err(FederationError::backend(message.clone())),
            None => Ok(()),
        }
    }
}

impl GraphProvider for TestProvider {
    fn provider_id(&self) -> &str {
        self.inner.provider_id()
    }

    fn resolve_immutable(&self, name: &Iri) -> Result<Arc<dyn TripleCollection>> {
        self.before_resolve()?;
        self.inner.resolve_immutable(name)
    }

    fn resolve_mutable(&self, name: &Iri) -> Result<Arc<dyn TripleCollection>> {
        self.before_resolve()?;
        self.inner.resolve_mutable(name)
    }

    fn create(&self, name: &Iri, kind: CreateKind) -> Result<Arc<dyn TripleCollection>> {
        self.inner.create(name, kind)
    }

    fn delete(&self, name: &Iri) -> Result<()> {
        self.inner.delete(name)
    }

    fn list_names(&self, kind: GraphKind) -> Result<Vec<Iri>> {
        self.inner.list_names(kind)
    }

    fn as_queryable(&self) -> Option<&dyn QueryableProvider> {
        if self.queryable {
            Some(self)
        } else {
            None
        }
    }
}

impl QueryableProvider for TestProvider {
    fn execute_query(&self, query: &str, _default_graph: Option<&Iri>) -> Result<QueryResult> {
        self.native_queries.lock().push(query.to_string());
        Ok(QueryResult::Boolean(true))
    }
}

/// Provider serving read-only graphs that refuses to delete them
#[derive(Debug)]
pub struct ArchiveProvider {
    names: Vec<Iri>,
}

impl ArchiveProvider {
    pub fn new(names: Vec<Iri>) -> Self {
        Self { names }
    }
}

impl GraphProvider for ArchiveProvider {
    fn provider_id(&self) -> &str {
        "archive"
    }

    fn resolve_immutable(&self, name: &Iri) -> Result<Arc<dyn TripleCollection>> {
        if self.names.contains(name) {
            Ok(Arc::new(LockedCollection::new(ImmutableGraph::empty())))
        } else {
            Err(FederationError::no_such_entity(name.clone()))
        }
    }

    fn list_names(&self, kind: GraphKind) -> Result<Vec<Iri>> {
        match kind {
            GraphKind::Mutable => Ok(Vec::new()),
            _ => Ok(self.names.clone()),
        }
    }
}

/// Provider minting a new collection on every resolution
#[derive(Debug)]
pub struct FreshProvider {
    names: Vec<Iri>,
    loads: AtomicUsize,
}

impl FreshProvider {
    pub fn new(names: Vec<Iri>) -> Self {
        Self {
            names,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn check(&self, name: &Iri) -> Result<()> {
        if !self.names.contains(name) {
            return Err(FederationError::no_such_entity(name.clone()));
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl GraphProvider for FreshProvider {
    fn provider_id(&self) -> &str {
        "fresh"
    }

    fn resolve_immutable(&self, name: &Iri) -> Result<Arc<dyn TripleCollection>> {
        self.check(name)?;
        Ok(Arc::new(LockedCollection::new(ImmutableGraph::empty())))
    }

    fn resolve_mutable(&self, name: &Iri) -> Result<Arc<dyn TripleCollection>> {
        self.check(name)?;
        Ok(Arc::new(SimpleGraph::new().into_collection()))
    }

    fn list_names(&self, kind: GraphKind) -> Result<Vec<Iri>> {
        match kind {
            GraphKind::ReadOnly => Ok(Vec::new()),
            _ => Ok(self.names.clone()),
        }
    }
}

// =============================================================================
// Query engine
// =============================================================================

/// Engine answering `ASK` false after touching every graph it can see
#[derive(Debug, Default)]
pub struct RecordingEngine {
    queries: Mutex<Vec<String>>,
    graphs_seen: AtomicUsize,
}

impl RecordingEngine {
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    pub fn graphs_seen(&self) -> usize {
        self.graphs_seen.load(Ordering::SeqCst)
    }
}

impl QueryEngine for RecordingEngine {
    fn execute(
        &self,
        source: &dyn GraphSource,
        query: &str,
        _default_graph: Option<&Iri>,
    ) -> Result<QueryResult> {
        self.queries.lock().push(query.to_string());
        for name in source.graph_names()? {
            source.graph(&name)?;
            self.graphs_seen.fetch_add(1, Ordering::SeqCst);
        }
        Ok(QueryResult::Boolean(false))
    }
}
