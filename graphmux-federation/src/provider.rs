//! Provider SPI
//!
//! A [`GraphProvider`] is a backend that serves named graphs. Providers
//! signal "not mine" with [`FederationError::NoSuchEntity`],
//! [`FederationError::IllegalArgument`] or [`FederationError::Unsupported`];
//! the federation then asks the next provider. Every other error is treated
//! as a genuine fault and propagated.

use crate::{FederationError, Result};
use graphmux_collection::TripleCollection;
use graphmux_graph_ir::{ImmutableGraph, Iri, QueryResult};
use std::sync::Arc;

/// Which variant of a named graph is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphKind {
    /// Read-only snapshot
    ReadOnly,
    /// Mutable collection
    Mutable,
    /// Whichever the provider serves; mutable preferred
    Either,
}

/// What [`GraphProvider::create`] should create
#[derive(Debug, Clone)]
pub enum CreateKind {
    /// Empty mutable graph
    Mutable,
    /// Read-only graph with fixed contents
    ReadOnly(ImmutableGraph),
}

impl CreateKind {
    pub fn is_mutable(&self) -> bool {
        matches!(self, CreateKind::Mutable)
    }
}

/// A backend serving named graphs
pub trait GraphProvider: Send + Sync {
    /// Identity used to order providers of equal weight
    fn provider_id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn resolve_immutable(&self, name: &Iri) -> Result<Arc<dyn TripleCollection>>;

    fn resolve_mutable(&self, name: &Iri) -> Result<Arc<dyn TripleCollection>> {
        Err(FederationError::no_such_entity(name.clone()))
    }

    fn create(&self, name: &Iri, kind: CreateKind) -> Result<Arc<dyn TripleCollection>> {
        let _ = (name, kind);
        Err(FederationError::unsupported("create"))
    }

    fn delete(&self, name: &Iri) -> Result<()> {
        let _ = name;
        Err(FederationError::unsupported("delete"))
    }

    /// Names of the graphs of `kind` this provider serves
    fn list_names(&self, kind: GraphKind) -> Result<Vec<Iri>>;

    /// Native query execution, if the provider supports it
    fn as_queryable(&self) -> Option<&dyn QueryableProvider> {
        None
    }
}

/// A provider that answers SPARQL natively
pub trait QueryableProvider: Send + Sync {
    fn execute_query(&self, query: &str, default_graph: Option<&Iri>) -> Result<QueryResult>;
}
