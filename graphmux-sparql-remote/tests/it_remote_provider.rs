//! Integration tests for serving remote graphs through a federation

mod support;

use graphmux_collection::TripleCollection;
use graphmux_federation::{
    Federation, FederationConfig, FederationError, GraphKind, GraphProvider, GraphSource,
    MemoryProvider, QueryEngine,
};
use graphmux_graph_ir::{Iri, QueryResult, Term, TriplePattern};
use parking_lot::Mutex;
use graphmux_sparql_remote::{RemoteGraph, RemoteProvider, SparqlClient, SparqlTransport};
use serde_json::json;
use std::sync::Arc;
use support::{client, ex, lit, solutions, uri, ScriptedTransport};

fn dbpedia() -> Iri {
    Iri::new("http://example.org/graphs/dbpedia")
}

/// Engine answering `ASK` true for every query it is handed
#[derive(Debug, Default)]
struct AnsweringEngine {
    queries: Mutex<Vec<String>>,
}

impl QueryEngine for AnsweringEngine {
    fn execute(
        &self,
        _source: &dyn GraphSource,
        query: &str,
        _default_graph: Option<&Iri>,
    ) -> graphmux_federation::Result<QueryResult> {
        self.queries.lock().push(query.to_string());
        Ok(QueryResult::Boolean(true))
    }
}

fn provider(transport: &Arc<ScriptedTransport>) -> RemoteProvider {
    RemoteProvider::new("remote").with_graph(dbpedia(), RemoteGraph::new(client(transport)))
}

#[test]
fn lists_graphs_as_read_only() {
    let transport = ScriptedTransport::new();
    let provider = provider(&transport);

    assert_eq!(provider.list_names(GraphKind::ReadOnly).unwrap(), vec![dbpedia()]);
    assert_eq!(provider.list_names(GraphKind::Either).unwrap(), vec![dbpedia()]);
    assert!(provider.list_names(GraphKind::Mutable).unwrap().is_empty());
    assert!(matches!(
        provider.resolve_mutable(&dbpedia()),
        Err(FederationError::NoSuchEntity(_))
    ));
}

#[test]
fn resolve_returns_the_same_collection() {
    let transport = ScriptedTransport::new();
    let provider = provider(&transport);

    let a = provider.resolve_immutable(&dbpedia()).unwrap();
    let b = provider.resolve_immutable(&dbpedia()).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!a.is_mutable());
    assert!(matches!(
        provider.resolve_immutable(&Iri::new(ex("missing"))),
        Err(FederationError::NoSuchEntity(_))
    ));
}

#[test]
fn graphs_on_different_endpoints_cannot_share_a_query() {
    let transport = ScriptedTransport::new();
    let elsewhere = SparqlClient::new(
        "http://other.example.org/sparql",
        Arc::clone(&transport) as Arc<dyn SparqlTransport>,
    );
    let provider = provider(&transport).with_graph(ex("other"), RemoteGraph::new(elsewhere));
    let queryable = provider.as_queryable().unwrap();

    let query = format!(
        "SELECT * FROM <{}> FROM <{}> WHERE {{ ?s ?p ?o }}",
        dbpedia().as_str(),
        ex("other")
    );
    assert!(matches!(
        queryable.execute_query(&query, None),
        Err(FederationError::IllegalArgument(_))
    ));
    assert!(transport.queries().is_empty());
}

#[test]
fn federation_forwards_remote_queries_to_the_endpoint() {
    let transport = ScriptedTransport::new();
    transport.respond(solutions(
        &["name"],
        vec![json!({ "name": lit("Bob") })],
    ));

    let local = MemoryProvider::new("memory");
    local.insert_mutable(ex("local"), vec![]);

    let federation = Federation::new(FederationConfig::default());
    federation.register(Arc::new(local), 20);
    federation.register(Arc::new(provider(&transport)), 10);
    federation.activate();

    let query = format!(
        "SELECT ?name WHERE {{ GRAPH <{}> {{ ?s <{}> ?name }} }}",
        dbpedia().as_str(),
        ex("name")
    );
    let result = federation.execute_query(&query, None, false).unwrap();

    let solutions = result.as_solutions().unwrap();
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0]["name"], Term::string("Bob"));
    assert_eq!(transport.queries(), vec![query]);
}

#[test]
fn federation_resolves_remote_graph_for_reading() {
    let transport = ScriptedTransport::new();
    transport.respond(solutions(
        &["s", "p", "o"],
        vec![json!({ "s": uri(&ex("alice")), "p": uri(&ex("name")), "o": lit("Alice") })],
    ));

    let federation = Federation::new(FederationConfig::default());
    federation.register(Arc::new(provider(&transport)), 10);
    federation.activate();

    let graph = federation.resolve(&dbpedia(), GraphKind::Either).unwrap();
    let triples = graph
        .filter(&TriplePattern::any())
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(triples.len(), 1);
    assert!(matches!(
        federation.resolve(&dbpedia(), GraphKind::Mutable),
        Err(FederationError::NoSuchEntity(_))
    ));
}

#[test]
fn split_endpoints_fall_back_to_the_engine() {
    let transport = ScriptedTransport::new();
    let elsewhere = SparqlClient::new(
        "http://other.example.org/sparql",
        Arc::clone(&transport) as Arc<dyn SparqlTransport>,
    );
    let provider = provider(&transport).with_graph(ex("other"), RemoteGraph::new(elsewhere));

    let engine = Arc::new(AnsweringEngine::default());
    let federation = Federation::new(FederationConfig::default())
        .with_query_engine(engine.clone() as Arc<dyn QueryEngine>);
    federation.register(Arc::new(provider), 10);
    federation.activate();

    let query = format!(
        "SELECT * FROM <{}> FROM <{}> WHERE {{ ?s ?p ?o }}",
        dbpedia().as_str(),
        ex("other")
    );
    let result = federation.execute_query(&query, None, false).unwrap();

    assert_eq!(result, QueryResult::Boolean(true));
    assert_eq!(*engine.queries.lock(), vec![query]);
    assert!(transport.queries().is_empty());
}
