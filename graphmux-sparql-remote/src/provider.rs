//! Graph provider exposing SPARQL endpoints as named graphs

use crate::{RemoteGraph, RemoteGraphConfig};
use graphmux_collection::{LockedCollection, TripleCollection};
use graphmux_federation::{
    referenced_graphs, FederationError, GraphKind, GraphProvider, QueryableProvider, Result,
};
use graphmux_graph_ir::{Iri, QueryResult};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Read-only provider serving one [`RemoteGraph`] per configured name
///
/// Answers queries natively by forwarding them to the endpoint that owns
/// every graph the query references. Creation and deletion are declined.
pub struct RemoteProvider {
    id: String,
    graphs: FxHashMap<Iri, Arc<LockedCollection<RemoteGraph>>>,
}

impl RemoteProvider {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            graphs: FxHashMap::default(),
        }
    }

    /// Serve `graph` under `name`
    pub fn with_graph(mut self, name: impl Into<Iri>, graph: RemoteGraph) -> Self {
        self.graphs
            .insert(name.into(), Arc::new(graph.into_collection()));
        self
    }

    /// Build a provider with an HTTP-backed graph for each configuration
    pub fn from_configs(
        id: impl Into<String>,
        configs: impl IntoIterator<Item = (Iri, RemoteGraphConfig)>,
    ) -> crate::Result<Self> {
        let mut provider = Self::new(id);
        for (name, config) in configs {
            provider = provider.with_graph(name, RemoteGraph::from_config(&config)?);
        }
        Ok(provider)
    }

    fn graph(&self, name: &Iri) -> Result<&Arc<LockedCollection<RemoteGraph>>> {
        self.graphs
            .get(name)
            .ok_or_else(|| FederationError::no_such_entity(name.clone()))
    }

    /// The graph whose endpoint can answer `query`
    fn target(&self, query: &str, default_graph: Option<&Iri>) -> Result<&RemoteGraph> {
        let references = referenced_graphs(query, default_graph)
            .map_err(|e| FederationError::QueryParse(e.to_string()))?;
        let names: Vec<&Iri> = match references.as_bounded() {
            Some(graphs) if !graphs.is_empty() => graphs.iter().collect(),
            _ => self.graphs.keys().collect(),
        };

        let mut target: Option<&RemoteGraph> = None;
        for name in names {
            let graph = self.graph(name)?.backend();
            match target {
                Some(t) if t.endpoint() != graph.endpoint() => {
                    return Err(FederationError::illegal_argument(
                        "query references graphs on different endpoints",
                    ));
                }
                _ => target = Some(graph),
            }
        }
        target.ok_or_else(|| FederationError::illegal_argument("provider serves no graphs"))
    }
}

impl GraphProvider for RemoteProvider {
    fn provider_id(&self) -> &str {
        &self.id
    }

    fn resolve_immutable(&self, name: &Iri) -> Result<Arc<dyn TripleCollection>> {
        let graph = self.graph(name)?;
        Ok(Arc::clone(graph) as Arc<dyn TripleCollection>)
    }

    fn list_names(&self, kind: GraphKind) -> Result<Vec<Iri>> {
        if kind == GraphKind::Mutable {
            return Ok(Vec::new());
        }
        let mut names: Vec<Iri> = self.graphs.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn as_queryable(&self) -> Option<&dyn QueryableProvider> {
        Some(self)
    }
}

impl QueryableProvider for RemoteProvider {
    fn execute_query(&self, query: &str, default_graph: Option<&Iri>) -> Result<QueryResult> {
        let graph = self.target(query, default_graph)?;
        debug!(
            provider_id = %self.id,
            endpoint = graph.endpoint(),
            "forwarding query to endpoint"
        );
        Ok(graph.client().query_result_set(query)?)
    }
}

impl fmt::Debug for RemoteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteProvider")
            .field("id", &self.id)
            .field("graphs", &self.graphs.keys().collect::<Vec<_>>())
            .finish()
    }
}
