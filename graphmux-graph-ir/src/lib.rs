//! RDF graph intermediate representation shared by every graphmux crate
//!
//! This crate provides the value types that flow through triple collections,
//! providers and the remote SPARQL adapter.
//!
//! # Key Design Principles
//!
//! 1. **Expanded IRIs only** - IRIs are stored in expanded form. Prefixed
//!    names are resolved before a term is constructed.
//!
//! 2. **Explicit datatypes** - Literals always carry a datatype. Plain strings
//!    use `xsd:string`, language-tagged strings use `rdf:langString`.
//!
//! 3. **Blank nodes have identity, not labels** - Two anonymous blank nodes are
//!    equal only when they are the same instance. Contextual blank nodes (see
//!    [`BlankNode::contextual`]) compare by the shape of their context instead.
//!
//! 4. **Set semantics** - [`ImmutableGraph`] deduplicates on construction and
//!    compares by graph isomorphism.
//!
//! # Example
//!
//! ```
//! use graphmux_graph_ir::{BlankNode, ImmutableGraph, Iri, Term, Triple};
//!
//! let knows = Iri::new("http://xmlns.com/foaf/0.1/knows");
//! let g1: ImmutableGraph = vec![Triple::new(
//!     Iri::new("http://example.org/alice"),
//!     knows.clone(),
//!     BlankNode::new(),
//! )]
//! .into_iter()
//! .collect();
//! let g2: ImmutableGraph = vec![Triple::new(
//!     Iri::new("http://example.org/alice"),
//!     knows,
//!     Term::from(BlankNode::new()),
//! )]
//! .into_iter()
//! .collect();
//!
//! // Different blank node instances, same shape
//! assert_eq!(g1, g2);
//! ```

mod graph;
pub mod iso;
mod results;
mod term;
mod triple;
pub mod vocab;

pub use graph::ImmutableGraph;
pub use results::{QueryResult, Solution};
pub use term::{BlankNode, ContextualId, Iri, Literal, Subject, Term};
pub use triple::{Triple, TriplePattern};
