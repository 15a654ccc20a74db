//! In-memory graph provider
//!
//! Stores every graph in process memory using `RwLock` for interior
//! mutability. Mutable graphs are [`SimpleGraph`] collections; read-only
//! graphs are [`ImmutableGraph`] snapshots. Resolving a mutable graph as
//! read-only yields a frozen snapshot of its current contents.

use crate::{CreateKind, FederationError, GraphKind, GraphProvider, Result};
use graphmux_collection::{LockedCollection, SimpleGraph, TripleCollection};
use graphmux_graph_ir::{ImmutableGraph, Iri, Triple};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
enum StoredGraph {
    Mutable(Arc<LockedCollection<SimpleGraph>>),
    ReadOnly(Arc<LockedCollection<ImmutableGraph>>),
}

impl StoredGraph {
    fn matches(&self, kind: GraphKind) -> bool {
        match (self, kind) {
            (_, GraphKind::Either) => true,
            (StoredGraph::Mutable(_), GraphKind::Mutable) => true,
            (StoredGraph::ReadOnly(_), GraphKind::ReadOnly) => true,
            _ => false,
        }
    }
}

/// Graph provider keeping every graph in memory
pub struct MemoryProvider {
    id: String,
    graphs: RwLock<FxHashMap<Iri, StoredGraph>>,
}

impl MemoryProvider {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            graphs: RwLock::new(FxHashMap::default()),
        }
    }

    /// Add a mutable graph holding `triples`, replacing any graph of that name
    pub fn insert_mutable(&self, name: impl Into<Iri>, triples: impl IntoIterator<Item = Triple>) {
        let collection = SimpleGraph::from_triples(triples).into_collection();
        self.graphs
            .write()
            .insert(name.into(), StoredGraph::Mutable(Arc::new(collection)));
    }

    /// Add a read-only graph, replacing any graph of that name
    pub fn insert_read_only(&self, name: impl Into<Iri>, graph: ImmutableGraph) {
        self.graphs.write().insert(
            name.into(),
            StoredGraph::ReadOnly(Arc::new(LockedCollection::new(graph))),
        );
    }

    pub fn len(&self) -> usize {
        self.graphs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.read().is_empty()
    }

    fn get(&self, name: &Iri) -> Result<StoredGraph> {
        self.graphs
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| FederationError::no_such_entity(name.clone()))
    }
}

impl GraphProvider for MemoryProvider {
    fn provider_id(&self) -> &str {
        &self.id
    }

    fn resolve_immutable(&self, name: &Iri) -> Result<Arc<dyn TripleCollection>> {
        match self.get(name)? {
            StoredGraph::ReadOnly(graph) => Ok(graph),
            StoredGraph::Mutable(graph) => {
                let snapshot = graph.snapshot()?;
                Ok(Arc::new(LockedCollection::new(snapshot)))
            }
        }
    }

    fn resolve_mutable(&self, name: &Iri) -> Result<Arc<dyn TripleCollection>> {
        match self.get(name)? {
            StoredGraph::Mutable(graph) => Ok(graph),
            StoredGraph::ReadOnly(_) => Err(FederationError::no_such_entity(name.clone())),
        }
    }

    fn create(&self, name: &Iri, kind: CreateKind) -> Result<Arc<dyn TripleCollection>> {
        let mut graphs = self.graphs.write();
        if graphs.contains_key(name) {
            return Err(FederationError::EntityAlreadyExists(name.clone()));
        }
        let (stored, handle): (StoredGraph, Arc<dyn TripleCollection>) = match kind {
            CreateKind::Mutable => {
                let graph = Arc::new(SimpleGraph::new().into_collection());
                (StoredGraph::Mutable(Arc::clone(&graph)), graph)
            }
            CreateKind::ReadOnly(contents) => {
                let graph = Arc::new(LockedCollection::new(contents));
                (StoredGraph::ReadOnly(Arc::clone(&graph)), graph)
            }
        };
        graphs.insert(name.clone(), stored);
        debug!(provider_id = %self.id, graph = %name, "created in-memory graph");
        Ok(handle)
    }

    fn delete(&self, name: &Iri) -> Result<()> {
        match self.graphs.write().remove(name) {
            Some(_) => Ok(()),
            None => Err(FederationError::no_such_entity(name.clone())),
        }
    }

    fn list_names(&self, kind: GraphKind) -> Result<Vec<Iri>> {
        let mut names: Vec<Iri> = self
            .graphs
            .read()
            .iter()
            .filter(|(_, graph)| graph.matches(kind))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

impl fmt::Debug for MemoryProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryProvider")
            .field("id", &self.id)
            .field("graph_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphmux_graph_ir::Term;

    fn ex(local: &str) -> Iri {
        Iri::new(format!("http://example.org/{local}"))
    }

    #[test]
    fn test_mutable_graph_resolves_to_same_handle() {
        let provider = MemoryProvider::new("mem");
        provider.insert_mutable(ex("g"), vec![]);

        let a = provider.resolve_mutable(&ex("g")).unwrap();
        let b = provider.resolve_mutable(&ex("g")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.is_mutable());
    }

    #[test]
    fn test_read_only_view_is_snapshot() {
        let provider = MemoryProvider::new("mem");
        let t = Triple::new(ex("s"), ex("p"), Term::string("o"));
        provider.insert_mutable(ex("g"), vec![t.clone()]);

        let snapshot = provider.resolve_immutable(&ex("g")).unwrap();
        provider
            .resolve_mutable(&ex("g"))
            .unwrap()
            .remove(&t)
            .unwrap();

        assert!(!snapshot.is_mutable());
        assert!(snapshot.contains(&t).unwrap());
    }

    #[test]
    fn test_read_only_graph_is_not_mutable() {
        let provider = MemoryProvider::new("mem");
        provider.insert_read_only(ex("r"), ImmutableGraph::empty());
        assert!(matches!(
            provider.resolve_mutable(&ex("r")),
            Err(FederationError::NoSuchEntity(_))
        ));
        assert_eq!(provider.list_names(GraphKind::ReadOnly).unwrap(), vec![ex("r")]);
        assert!(provider.list_names(GraphKind::Mutable).unwrap().is_empty());
    }

    #[test]
    fn test_create_and_delete() {
        let provider = MemoryProvider::new("mem");
        provider.create(&ex("g"), CreateKind::Mutable).unwrap();
        assert!(matches!(
            provider.create(&ex("g"), CreateKind::Mutable),
            Err(FederationError::EntityAlreadyExists(_))
        ));
        provider.delete(&ex("g")).unwrap();
        assert!(matches!(
            provider.delete(&ex("g")),
            Err(FederationError::NoSuchEntity(_))
        ));
    }
}
