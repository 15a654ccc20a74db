//! Remote SPARQL endpoints as triple collections
//!
//! [`RemoteGraph`] presents the default graph of a SPARQL query endpoint as a
//! read-only [`TripleCollection`](graphmux_collection::TripleCollection).
//! Endpoints label blank nodes per result set, so the labels carry no
//! identity across queries. Blank nodes are therefore identified by their
//! *context*: the minimal subgraph that distinguishes them from every other
//! node, discovered by a series of expansion queries. A node passed back in
//! a later filter is rewritten into a query pattern that matches its context.
//!
//! [`RemoteProvider`] serves a set of remote graphs to a
//! [`Federation`](graphmux_federation::Federation) and forwards whole
//! queries to their endpoint.
//!
//! # Example
//!
//! ```no_run
//! use graphmux_collection::TripleCollection;
//! use graphmux_graph_ir::TriplePattern;
//! use graphmux_sparql_remote::{RemoteGraph, RemoteGraphConfig};
//!
//! let config = RemoteGraphConfig::new("http://localhost:3030/ds/sparql");
//! let graph = RemoteGraph::from_config(&config)?.into_collection();
//! for triple in graph.filter(&TriplePattern::any())? {
//!     println!("{:?}", triple?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod client;
mod config;
mod error;
mod graph;
mod provider;
mod query;
mod results;
mod transport;

pub use client::SparqlClient;
pub use config::{
    RemoteGraphConfig, DEFAULT_MAX_ISOMORPHIC_CANDIDATES, MAX_ISOMORPHIC_CANDIDATES_ENV,
};
pub use error::{RemoteError, Result};
pub use graph::RemoteGraph;
pub use provider::RemoteProvider;
pub use query::MARKER_IRI;
pub use results::{parse_json_results, parse_results, parse_xml_results};
pub use transport::{HttpTransport, SparqlResponse, SparqlTransport};
