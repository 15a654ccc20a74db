//! Weighted provider federation
//!
//! [`Federation`] multiplexes many [`GraphProvider`]s behind one facade.
//! Providers are ordered by descending weight, then by
//! [`GraphProvider::provider_id`], then by registration order. Requests go
//! to each provider in turn until one serves the name; a provider that
//! declines (see [`FederationError::disposition`]) passes the request on,
//! any other failure is returned to the caller.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --activate--> Active --deactivate--> Deactivated
//!                               ^                         |
//!                               +--------activate---------+
//! ```
//!
//! Registrations made before the first activation are queued and applied in
//! order on activation. While not active, every resolution fails with
//! [`FederationError::NotActive`].
//!
//! # Handle identity
//!
//! Mutable graphs are cached by name as weak references, so two callers
//! resolving the same name share one collection (and one lock) for as long
//! as either holds it. Concurrent first resolutions of a name are
//! single-flight: one caller asks the providers, the others wait for its
//! result.

use crate::scan::{referenced_graphs, GraphReferences};
use crate::{
    CreateKind, Disposition, FederationConfig, FederationError, GraphKind, GraphProvider, Result,
};
use graphmux_collection::TripleCollection;
use graphmux_graph_ir::{Iri, QueryResult};
use parking_lot::{Condvar, Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{self, AtomicU64};
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace, warn};

// ============================================================================
// Query engine seam
// ============================================================================

/// Uniform access to every graph of a federation
pub trait GraphSource: Send + Sync {
    fn graph(&self, name: &Iri) -> Result<Arc<dyn TripleCollection>>;

    fn graph_names(&self) -> Result<BTreeSet<Iri>>;
}

/// Generic cross-provider query engine
///
/// Used when no single provider owns every graph a query references.
pub trait QueryEngine: Send + Sync {
    fn execute(
        &self,
        source: &dyn GraphSource,
        query: &str,
        default_graph: Option<&Iri>,
    ) -> Result<QueryResult>;
}

// ============================================================================
// Registrations
// ============================================================================

/// Federation lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Active,
    Deactivated,
}

/// Position of a provider in the federation order; smaller ranks first
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rank {
    weight: i32,
    provider_id: String,
    seq: u64,
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .weight
            .cmp(&self.weight)
            .then_with(|| self.provider_id.cmp(&other.provider_id))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone)]
struct Registration {
    provider: Arc<dyn GraphProvider>,
    rank: Rank,
}

enum Pending {
    Register(Registration),
    Unregister(Arc<dyn GraphProvider>),
}

struct Registry {
    lifecycle: Lifecycle,
    providers: Vec<Registration>,
    queued: Vec<Pending>,
}

impl Registry {
    fn insert(&mut self, registration: Registration) {
        let at = self
            .providers
            .partition_point(|r| r.rank <= registration.rank);
        self.providers.insert(at, registration);
    }

    /// Remove every registration of `provider`, returning their ranks
    fn remove(&mut self, provider: &Arc<dyn GraphProvider>) -> Vec<Rank> {
        let mut removed = Vec::new();
        self.providers.retain(|r| {
            if same_provider(&r.provider, provider) {
                removed.push(r.rank.clone());
                false
            } else {
                true
            }
        });
        removed
    }
}

fn same_provider(a: &Arc<dyn GraphProvider>, b: &Arc<dyn GraphProvider>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

// ============================================================================
// Handle cache - single-flight coordination
// ============================================================================

enum CacheSlot {
    /// First resolution in progress; the token identifies the loader
    Loading(u64),
    Ready(CacheEntry),
}

struct CacheEntry {
    handle: Weak<dyn TripleCollection>,
    owner: Rank,
}

/// Outcome of a provider resolution; `owner` is set for cacheable handles
struct Resolved {
    handle: Arc<dyn TripleCollection>,
    owner: Option<Rank>,
}

/// A claimed `Loading` slot, released on drop
struct LoadSlot<'a> {
    federation: &'a Federation,
    name: &'a Iri,
    token: u64,
}

impl LoadSlot<'_> {
    fn is_ours(&self, cache: &FxHashMap<Iri, CacheSlot>) -> bool {
        matches!(cache.get(self.name), Some(CacheSlot::Loading(t)) if *t == self.token)
    }

    fn publish(&self, resolved: &Resolved) {
        let Some(owner) = &resolved.owner else {
            return;
        };
        let mut cache = self.federation.cache.lock();
        // A deactivation or eviction during the load invalidates the slot
        if self.is_ours(&cache) {
            cache.insert(
                self.name.clone(),
                CacheSlot::Ready(CacheEntry {
                    handle: Arc::downgrade(&resolved.handle),
                    owner: owner.clone(),
                }),
            );
        }
    }
}

impl Drop for LoadSlot<'_> {
    fn drop(&mut self) {
        let mut cache = self.federation.cache.lock();
        if self.is_ours(&cache) {
            cache.remove(self.name);
        }
        drop(cache);
        self.federation.cache_changed.notify_all();
    }
}

// ============================================================================
// Federation
// ============================================================================

/// Weighted federation of graph providers
pub struct Federation {
    config: FederationConfig,
    registry: Mutex<Registry>,
    cache: Mutex<FxHashMap<Iri, CacheSlot>>,
    cache_changed: Condvar,
    engine: RwLock<Option<Arc<dyn QueryEngine>>>,
    next_seq: AtomicU64,
}

impl Federation {
    pub fn new(config: FederationConfig) -> Self {
        Self {
            config,
            registry: Mutex::new(Registry {
                lifecycle: Lifecycle::Uninitialized,
                providers: Vec::new(),
                queued: Vec::new(),
            }),
            cache: Mutex::new(FxHashMap::default()),
            cache_changed: Condvar::new(),
            engine: RwLock::new(None),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn with_query_engine(self, engine: Arc<dyn QueryEngine>) -> Self {
        *self.engine.write() = Some(engine);
        self
    }

    /// Bind or unbind the generic query engine
    pub fn set_query_engine(&self, engine: Option<Arc<dyn QueryEngine>>) {
        *self.engine.write() = engine;
    }

    pub fn config(&self) -> &FederationConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.registry.lock().lifecycle
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, atomic::Ordering::Relaxed)
    }

    /// Registered providers in federation order
    pub fn providers(&self) -> Vec<Arc<dyn GraphProvider>> {
        self.registry
            .lock()
            .providers
            .iter()
            .map(|r| Arc::clone(&r.provider))
            .collect()
    }

    /// Register a provider with the given weight
    ///
    /// Before the first activation the registration is queued. On an active
    /// federation, cached handles of graphs the new provider also serves are
    /// evicted when their current owner ranks below it.
    pub fn register(&self, provider: Arc<dyn GraphProvider>, weight: i32) {
        let rank = Rank {
            weight,
            provider_id: provider.provider_id().to_string(),
            seq: self.next_seq(),
        };
        let registration = Registration { provider, rank };

        let mut registry = self.registry.lock();
        match registry.lifecycle {
            Lifecycle::Uninitialized => {
                debug!(
                    provider_id = %registration.rank.provider_id,
                    weight,
                    "queued provider registration"
                );
                registry.queued.push(Pending::Register(registration));
            }
            lifecycle => {
                registry.insert(registration.clone());
                drop(registry);
                info!(
                    provider_id = %registration.rank.provider_id,
                    weight,
                    "registered graph provider"
                );
                if lifecycle == Lifecycle::Active {
                    self.evict_shadowed(&registration);
                }
            }
        }
    }

    /// Unregister every registration of `provider`
    pub fn unregister(&self, provider: &Arc<dyn GraphProvider>) {
        let mut registry = self.registry.lock();
        if registry.lifecycle == Lifecycle::Uninitialized {
            debug!(
                provider_id = provider.provider_id(),
                "queued provider unregistration"
            );
            registry.queued.push(Pending::Unregister(Arc::clone(provider)));
            return;
        }

        let removed = registry.remove(provider);
        drop(registry);
        if removed.is_empty() {
            debug!(
                provider_id = provider.provider_id(),
                "unregister: provider was not registered"
            );
            return;
        }
        info!(provider_id = provider.provider_id(), "unregistered graph provider");
        self.evict_where(|_, owner| removed.contains(owner));
    }

    /// Enter the active state, applying queued registrations in order
    pub fn activate(&self) {
        let mut registry = self.registry.lock();
        if registry.lifecycle == Lifecycle::Active {
            return;
        }
        let queued = std::mem::take(&mut registry.queued);
        let applied = queued.len();
        for pending in queued {
            match pending {
                Pending::Register(registration) => registry.insert(registration),
                Pending::Unregister(provider) => {
                    registry.remove(&provider);
                }
            }
        }
        registry.lifecycle = Lifecycle::Active;
        info!(
            providers = registry.providers.len(),
            queued = applied,
            "federation activated"
        );
    }

    /// Leave the active state and clear the handle cache
    pub fn deactivate(&self) {
        {
            let mut registry = self.registry.lock();
            if registry.lifecycle != Lifecycle::Active {
                return;
            }
            registry.lifecycle = Lifecycle::Deactivated;
        }
        let evicted = {
            let mut cache = self.cache.lock();
            let evicted = cache.len();
            cache.clear();
            evicted
        };
        self.cache_changed.notify_all();
        info!(evicted, "federation deactivated");
    }

    fn ensure_active(&self) -> Result<()> {
        match self.lifecycle() {
            Lifecycle::Active => Ok(()),
            _ => Err(FederationError::NotActive),
        }
    }

    /// Snapshot of the providers in order; fails when not active
    fn ranked(&self) -> Result<Vec<Registration>> {
        let registry = self.registry.lock();
        if registry.lifecycle != Lifecycle::Active {
            return Err(FederationError::NotActive);
        }
        Ok(registry.providers.clone())
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Resolve a named graph
    ///
    /// Fails with [`FederationError::NoSuchEntity`] when no provider serves
    /// `name` as `kind`.
    pub fn resolve(&self, name: &Iri, kind: GraphKind) -> Result<Arc<dyn TripleCollection>> {
        self.ensure_active()?;
        debug!(graph = %name, ?kind, "resolving graph");
        match kind {
            GraphKind::ReadOnly => self
                .first_serving(name, |p| p.resolve_immutable(name))
                .map(|(handle, _)| handle),
            GraphKind::Mutable => self.through_cache(name, || {
                let (handle, owner) = self.first_serving(name, |p| p.resolve_mutable(name))?;
                Ok(Resolved {
                    handle,
                    owner: Some(owner),
                })
            }),
            GraphKind::Either => self.through_cache(name, || self.resolve_either(name)),
        }
    }

    fn resolve_either(&self, name: &Iri) -> Result<Resolved> {
        let mut mutable = false;
        let (handle, owner) = self.first_serving(name, |p| match p.resolve_mutable(name) {
            Ok(handle) => {
                mutable = true;
                Ok(handle)
            }
            Err(e) if e.disposition() == Disposition::TryNext => p.resolve_immutable(name),
            Err(e) => Err(e),
        })?;
        Ok(Resolved {
            handle,
            owner: mutable.then_some(owner),
        })
    }

    /// Ask each provider in order until one serves `name`
    fn first_serving<F>(&self, name: &Iri, mut attempt: F) -> Result<(Arc<dyn TripleCollection>, Rank)>
    where
        F: FnMut(&dyn GraphProvider) -> Result<Arc<dyn TripleCollection>>,
    {
        for registration in self.ranked()? {
            match attempt(registration.provider.as_ref()) {
                Ok(handle) => {
                    debug!(
                        graph = %name,
                        provider_id = %registration.rank.provider_id,
                        "graph resolved"
                    );
                    return Ok((handle, registration.rank));
                }
                Err(e) => match e.disposition() {
                    Disposition::TryNext => trace!(
                        graph = %name,
                        provider_id = %registration.rank.provider_id,
                        error = %e,
                        "provider declined"
                    ),
                    Disposition::Fatal => return Err(e),
                },
            }
        }
        Err(FederationError::no_such_entity(name.clone()))
    }

    /// Return the live cached handle for `name`, or load it single-flight
    fn through_cache<F>(&self, name: &Iri, load: F) -> Result<Arc<dyn TripleCollection>>
    where
        F: FnOnce() -> Result<Resolved>,
    {
        if !self.config.cache_enabled {
            return load().map(|r| r.handle);
        }

        let slot = {
            let mut cache = self.cache.lock();
            loop {
                match cache.get(name) {
                    Some(CacheSlot::Ready(entry)) => {
                        if let Some(handle) = entry.handle.upgrade() {
                            trace!(graph = %name, "graph cache hit");
                            return Ok(handle);
                        }
                        debug!(graph = %name, "cached graph has no live holders; reloading");
                    }
                    Some(CacheSlot::Loading(_)) => {
                        self.cache_changed.wait(&mut cache);
                        continue;
                    }
                    None => {}
                }
                let token = self.next_seq();
                cache.insert(name.clone(), CacheSlot::Loading(token));
                break LoadSlot {
                    federation: self,
                    name,
                    token,
                };
            }
        };

        let resolved = load()?;
        slot.publish(&resolved);
        Ok(resolved.handle)
    }

    // ------------------------------------------------------------------------
    // Create / delete / list
    // ------------------------------------------------------------------------

    /// Create a graph with the first provider that supports it
    pub fn create(&self, name: &Iri, kind: CreateKind) -> Result<Arc<dyn TripleCollection>> {
        let mutable = kind.is_mutable();
        for registration in self.ranked()? {
            match registration.provider.create(name, kind.clone()) {
                Ok(handle) => {
                    info!(
                        graph = %name,
                        provider_id = %registration.rank.provider_id,
                        mutable,
                        "created graph"
                    );
                    if mutable && self.config.cache_enabled {
                        self.cache.lock().insert(
                            name.clone(),
                            CacheSlot::Ready(CacheEntry {
                                handle: Arc::downgrade(&handle),
                                owner: registration.rank,
                            }),
                        );
                    }
                    return Ok(handle);
                }
                Err(e) if e.disposition() == Disposition::TryNext => trace!(
                    graph = %name,
                    provider_id = %registration.rank.provider_id,
                    error = %e,
                    "provider cannot create graph"
                ),
                Err(e) => return Err(e),
            }
        }
        Err(FederationError::unsupported(format!("create {}", name)))
    }

    /// Delete a graph with the first provider that supports it
    ///
    /// When every provider declines, fails with
    /// [`FederationError::EntityUndeletable`] if the graph exists and
    /// [`FederationError::NoSuchEntity`] otherwise.
    pub fn delete(&self, name: &Iri) -> Result<()> {
        for registration in self.ranked()? {
            match registration.provider.delete(name) {
                Ok(()) => {
                    self.evict_where(|cached, _| cached == name);
                    info!(
                        graph = %name,
                        provider_id = %registration.rank.provider_id,
                        "deleted graph"
                    );
                    return Ok(());
                }
                Err(e) if e.disposition() == Disposition::TryNext => trace!(
                    graph = %name,
                    provider_id = %registration.rank.provider_id,
                    error = %e,
                    "provider cannot delete graph"
                ),
                Err(e) => return Err(e),
            }
        }

        if self.list_names(GraphKind::Either)?.contains(name) {
            Err(FederationError::EntityUndeletable(name.clone()))
        } else {
            Err(FederationError::no_such_entity(name.clone()))
        }
    }

    /// Union of the names every provider serves as `kind`
    pub fn list_names(&self, kind: GraphKind) -> Result<BTreeSet<Iri>> {
        let mut names = BTreeSet::new();
        for registration in self.ranked()? {
            match registration.provider.list_names(kind) {
                Ok(found) => names.extend(found),
                Err(e) if e.disposition() == Disposition::TryNext => {}
                Err(e) => return Err(e),
            }
        }
        Ok(names)
    }

    // ------------------------------------------------------------------------
    // Query execution
    // ------------------------------------------------------------------------

    /// Execute a query, delegating to a single owning provider when possible
    ///
    /// With `force_fastlane` the query is treated as referencing only
    /// `default_graph`. A fastlane provider declining the query with a
    /// retryable error hands it to the generic engine.
    pub fn execute_query(
        &self,
        query: &str,
        default_graph: Option<&Iri>,
        force_fastlane: bool,
    ) -> Result<QueryResult> {
        self.ensure_active()?;
        let references = if force_fastlane {
            GraphReferences::Bounded(default_graph.into_iter().cloned().collect())
        } else {
            referenced_graphs(query, default_graph)
                .map_err(|e| FederationError::QueryParse(e.to_string()))?
        };

        if let Some(target) = self.single_target(&references)? {
            if let Some(queryable) = target.provider.as_queryable() {
                debug!(
                    provider_id = %target.rank.provider_id,
                    "executing query on fastlane"
                );
                match queryable.execute_query(query, default_graph) {
                    Err(e) if e.disposition() == Disposition::TryNext => debug!(
                        provider_id = %target.rank.provider_id,
                        error = %e,
                        "fastlane declined query"
                    ),
                    result => return result,
                }
            } else {
                debug!(
                    provider_id = %target.rank.provider_id,
                    "fastlane target has no native query support"
                );
            }
        }

        let engine = self.engine.read().clone();
        match engine {
            Some(engine) => {
                debug!("executing query with generic engine");
                engine.execute(self, query, default_graph)
            }
            None => Err(FederationError::NoQueryEngine),
        }
    }

    /// First provider, in order, owning every referenced graph
    ///
    /// A higher-ranked provider owning only part of the graphs disables the
    /// fastlane.
    fn single_target(&self, references: &GraphReferences) -> Result<Option<Registration>> {
        let Some(graphs) = references.as_bounded() else {
            debug!("query may reference any graph; no fastlane");
            return Ok(None);
        };

        for registration in self.ranked()? {
            let owned = match registration.provider.list_names(GraphKind::Either) {
                Ok(names) => names.into_iter().filter(|n| graphs.contains(n)).count(),
                Err(e) if e.disposition() == Disposition::TryNext => 0,
                Err(e) => return Err(e),
            };
            if owned == graphs.len() {
                return Ok(Some(registration));
            }
            if owned > 0 {
                debug!(
                    provider_id = %registration.rank.provider_id,
                    owned,
                    referenced = graphs.len(),
                    "referenced graphs span providers; no fastlane"
                );
                return Ok(None);
            }
        }
        Ok(None)
    }

    // ------------------------------------------------------------------------
    // Cache maintenance
    // ------------------------------------------------------------------------

    /// Drop cache entries no caller holds, returning their names
    pub fn evict_unused(&self) -> Vec<Iri> {
        let mut evicted = Vec::new();
        self.cache.lock().retain(|name, slot| match slot {
            CacheSlot::Ready(entry) if entry.handle.strong_count() == 0 => {
                evicted.push(name.clone());
                false
            }
            _ => true,
        });
        evicted.sort();
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "evicted unused graph handles");
        }
        evicted
    }

    /// Names with a live cached handle
    pub fn cached_names(&self) -> Vec<Iri> {
        let mut names: Vec<Iri> = self
            .cache
            .lock()
            .iter()
            .filter_map(|(name, slot)| match slot {
                CacheSlot::Ready(entry) if entry.handle.strong_count() > 0 => Some(name.clone()),
                _ => None,
            })
            .collect();
        names.sort();
        names
    }

    fn evict_where(&self, mut pred: impl FnMut(&Iri, &Rank) -> bool) {
        let mut evicted = 0usize;
        self.cache.lock().retain(|name, slot| match slot {
            CacheSlot::Ready(entry) if pred(name, &entry.owner) => {
                evicted += 1;
                false
            }
            _ => true,
        });
        if evicted > 0 {
            debug!(evicted, "evicted cached graph handles");
        }
    }

    /// Evict entries owned by providers ranked below `registration` for
    /// graphs it also serves
    fn evict_shadowed(&self, registration: &Registration) {
        let rank = &registration.rank;
        match registration.provider.list_names(GraphKind::Either) {
            Ok(names) => {
                let names: BTreeSet<Iri> = names.into_iter().collect();
                self.evict_where(|name, owner| owner > rank && names.contains(name));
            }
            Err(e) => {
                warn!(
                    provider_id = %rank.provider_id,
                    error = %e,
                    "cannot list graphs of new provider; evicting all lower-ranked handles"
                );
                self.evict_where(|_, owner| owner > rank);
            }
        }
    }
}

impl GraphSource for Federation {
    fn graph(&self, name: &Iri) -> Result<Arc<dyn TripleCollection>> {
        self.resolve(name, GraphKind::Either)
    }

    fn graph_names(&self) -> Result<BTreeSet<Iri>> {
        self.list_names(GraphKind::Either)
    }
}

impl fmt::Debug for Federation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("Federation")
            .field("lifecycle", &registry.lifecycle)
            .field("provider_count", &registry.providers.len())
            .field("queued_count", &registry.queued.len())
            .field("cached_count", &self.cache.lock().len())
            .field("has_query_engine", &self.engine.read().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank(weight: i32, id: &str, seq: u64) -> Rank {
        Rank {
            weight,
            provider_id: id.to_string(),
            seq,
        }
    }

    #[test]
    fn test_rank_order() {
        let mut ranks = vec![
            rank(5, "a", 0),
            rank(10, "z", 1),
            rank(10, "b", 3),
            rank(10, "b", 2),
        ];
        ranks.sort();
        assert_eq!(
            ranks,
            vec![
                rank(10, "b", 2),
                rank(10, "b", 3),
                rank(10, "z", 1),
                rank(5, "a", 0),
            ]
        );
    }

    #[test]
    fn test_inactive_federation_refuses_work() {
        let federation = Federation::new(FederationConfig::default());
        let name = Iri::new("http://example.org/g");
        assert_eq!(federation.lifecycle(), Lifecycle::Uninitialized);
        assert!(matches!(
            federation.resolve(&name, GraphKind::Either),
            Err(FederationError::NotActive)
        ));
        assert!(matches!(
            federation.list_names(GraphKind::Either),
            Err(FederationError::NotActive)
        ));

        federation.activate();
        assert!(matches!(
            federation.resolve(&name, GraphKind::Either),
            Err(FederationError::NoSuchEntity(_))
        ));

        federation.deactivate();
        assert_eq!(federation.lifecycle(), Lifecycle::Deactivated);
        assert!(matches!(
            federation.execute_query("ASK {}", None, false),
            Err(FederationError::NotActive)
        ));
    }
}
