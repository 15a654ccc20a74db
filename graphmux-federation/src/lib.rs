//! Weighted federation of named-graph providers
//!
//! A [`Federation`] holds an ordered set of [`GraphProvider`]s and exposes
//! them as one store of named graphs:
//!
//! - [`Federation::resolve`] asks each provider in weight order until one
//!   serves the name, caching mutable handles so callers share locks
//! - [`Federation::create`], [`Federation::delete`] and
//!   [`Federation::list_names`] route to the providers the same way
//! - [`Federation::execute_query`] sends a query straight to the single
//!   provider owning every graph it references (the *fastlane*), or to a
//!   generic [`QueryEngine`] reading through the federation
//!
//! # Example
//!
//! ```
//! use graphmux_federation::{Federation, FederationConfig, GraphKind, MemoryProvider};
//! use graphmux_graph_ir::{Iri, Term, Triple};
//! use std::sync::Arc;
//!
//! let name = Iri::new("http://example.org/people");
//! let provider = MemoryProvider::new("memory");
//! provider.insert_mutable(name.clone(), vec![]);
//!
//! let federation = Federation::new(FederationConfig::default());
//! federation.register(Arc::new(provider), 10);
//! federation.activate();
//!
//! let graph = federation.resolve(&name, GraphKind::Mutable).unwrap();
//! graph
//!     .add(Triple::new(Iri::new("http://example.org/alice"), Iri::new("http://example.org/name"), Term::string("Alice")))
//!     .unwrap();
//!
//! let again = federation.resolve(&name, GraphKind::Mutable).unwrap();
//! assert_eq!(again.size().unwrap(), 1);
//! ```

mod config;
mod error;
mod federation;
mod memory;
mod provider;
mod scan;

pub use config::FederationConfig;
pub use error::{Disposition, FederationError, Result};
pub use federation::{Federation, GraphSource, Lifecycle, QueryEngine};
pub use memory::MemoryProvider;
pub use provider::{CreateKind, GraphKind, GraphProvider, QueryableProvider};
pub use scan::{referenced_graphs, GraphReferences, ScanError};
