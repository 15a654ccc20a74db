//! Lock-guarded triple collections
//!
//! A [`TripleCollection`] is an unordered set of triples that many threads
//! may read and mutate. Every implementation in this crate is a
//! [`LockedCollection`]: a locking envelope around a [`GraphBackend`] that
//! supplies the storage primitives.
//!
//! # Locking
//!
//! Each collection owns a [`GraphLock`], a reentrant read/write lock:
//!
//! - single operations (`size`, `contains`, `add`, ...) take the lock for
//!   their own duration;
//! - iterators returned by `filter` take the read lock for each step only;
//! - callers hold [`GraphLock::read`] across several operations for a
//!   consistent view, or [`GraphLock::write`] to make a compound mutation
//!   atomic.
//!
//! # Backends
//!
//! - [`SimpleGraph`]: in-memory mutable set
//! - [`ImmutableGraph`](graphmux_graph_ir::ImmutableGraph): read-only snapshot

mod backend;
mod collection;
mod error;
mod lock;
mod simple;

pub use backend::{GraphBackend, TripleIter};
pub use collection::{FilterIter, LockedCollection, TripleCollection};
pub use error::{CollectionError, Result};
pub use lock::{GraphLock, ReadGuard, WriteGuard};
pub use simple::SimpleGraph;
