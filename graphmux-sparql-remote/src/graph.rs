//! Read-only graph backend over a SPARQL endpoint
//!
//! Endpoints relabel blank nodes on every response, so a node seen in one
//! query cannot be named in the next. [`RemoteGraph`] therefore identifies
//! each remote blank node by its *context*: the triples around it, with the
//! node itself replaced by [`MARKER_IRI`](crate::MARKER_IRI). Two remote
//! nodes with isomorphic contexts are told apart by an index.
//!
//! Reconciliation happens lazily as the filter iterator is consumed:
//!
//! 1. the raw rows of the pattern query become raw triples
//! 2. an unmapped raw node gets a context: for `(*, *, *)` the raw triples
//!    touching it, otherwise its seed context grown by expansion queries
//!    until no strictly larger context is found
//! 3. every raw node of the chosen context is minted a local node
//!
//! Local nodes passed back as filter arguments are turned into variables
//! constrained by their recorded context.

use crate::query::{expansion_query, pattern_query, MARKER_IRI, SIZE_QUERY};
use crate::{RemoteError, RemoteGraphConfig, SparqlClient};
use graphmux_collection::{
    CollectionError, GraphBackend, LockedCollection, Result, TripleIter,
};
use graphmux_graph_ir::{
    BlankNode, ImmutableGraph, Iri, Solution, Subject, Term, Triple, TriplePattern,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

static NEXT_ORIGIN: AtomicU64 = AtomicU64::new(1);

/// Read-only view of a SPARQL endpoint's default graph
pub struct RemoteGraph {
    client: SparqlClient,
    origin: u64,
    max_isomorphic_candidates: u32,
}

impl RemoteGraph {
    /// Create an adapter over `client`
    ///
    /// The candidate bound is taken from [`RemoteGraphConfig::default`].
    pub fn new(client: SparqlClient) -> Self {
        Self {
            client,
            origin: NEXT_ORIGIN.fetch_add(1, Ordering::Relaxed),
            max_isomorphic_candidates: RemoteGraphConfig::default().max_isomorphic_candidates,
        }
    }

    /// Create an adapter with an HTTP transport built from `config`
    pub fn from_config(config: &RemoteGraphConfig) -> crate::Result<Self> {
        let client = SparqlClient::from_config(config)?;
        Ok(Self::new(client).with_max_isomorphic_candidates(config.max_isomorphic_candidates))
    }

    pub fn with_max_isomorphic_candidates(mut self, bound: u32) -> Self {
        self.max_isomorphic_candidates = bound.max(1);
        self
    }

    pub fn client(&self) -> &SparqlClient {
        &self.client
    }

    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }

    /// Identifier stamped into every blank node this adapter mints
    pub fn origin(&self) -> u64 {
        self.origin
    }

    /// Whether `node` was minted by this adapter
    pub fn owns(&self, node: &BlankNode) -> bool {
        node.contextual_id()
            .is_some_and(|id| id.origin == self.origin)
    }

    pub fn into_collection(self) -> LockedCollection<Self> {
        LockedCollection::new(self)
    }

    fn check_owned(&self, pattern: &TriplePattern) -> Result<()> {
        match pattern.blank_nodes().find(|b| !self.owns(b)) {
            Some(alien) => {
                debug!(
                    endpoint = self.endpoint(),
                    node = %alien,
                    "blank node argument was not minted by this graph"
                );
                Err(CollectionError::AlienNode)
            }
            None => Ok(()),
        }
    }

    /// Grow `start` with every incoming and outgoing triple of its blank
    /// nodes, returning the maximal contexts found
    fn expand(&self, start: &ImmutableGraph) -> Result<Vec<ImmutableGraph>> {
        let query = expansion_query(start, self.origin);
        let rows = self.client.select(&query.text)?;
        trace!(
            endpoint = self.endpoint(),
            context_len = start.len(),
            rows = rows.len(),
            "expanding blank node context"
        );

        let mut found: Vec<ImmutableGraph> = Vec::new();
        'rows: for row in &rows {
            // Every blank node of the context must be bound to a blank node
            let mut fresh_to_known: FxHashMap<&BlankNode, &BlankNode> = FxHashMap::default();
            for (known, var) in &query.nodes {
                match row.get(var) {
                    Some(Term::BlankNode(fresh)) => {
                        fresh_to_known.insert(fresh, known);
                    }
                    _ => continue 'rows,
                }
            }

            let mut triples = start.triples().to_vec();
            let mut seen: FxHashSet<Triple> = start.iter().cloned().collect();
            let mut new_node = false;
            let mut new_triple = false;
            let mut push = |t: Triple| {
                if seen.insert(t.clone()) {
                    triples.push(t);
                    new_triple = true;
                }
            };

            for (known, var) in &query.nodes {
                if let Some(p) = row.get(&format!("po{var}")) {
                    let p = predicate(p)?;
                    let o = binding(row, &format!("o{var}"))?;
                    let o = match o {
                        Term::BlankNode(fresh) => match fresh_to_known.get(fresh) {
                            Some(&mapped) => Term::BlankNode(mapped.clone()),
                            None => {
                                new_node = true;
                                o.clone()
                            }
                        },
                        _ => o.clone(),
                    };
                    push(Triple::new(known.clone(), p, o));
                }
                if let Some(p) = row.get(&format!("pi{var}")) {
                    let p = predicate(p)?;
                    let s = subject(binding(row, &format!("s{var}"))?)?;
                    let s = match s {
                        Subject::BlankNode(fresh) => match fresh_to_known.get(&fresh) {
                            Some(&mapped) => Subject::BlankNode(mapped.clone()),
                            None => {
                                new_node = true;
                                Subject::BlankNode(fresh)
                            }
                        },
                        iri => iri,
                    };
                    push(Triple::new(s, p, known.clone()));
                }
            }

            let expanded = ImmutableGraph::from_triples(triples);
            if new_node {
                push_unique(&mut found, self.expand(&expanded)?);
            } else if new_triple {
                push_unique(&mut found, self.expand(&expanded)?);
                break;
            }
        }

        if found.is_empty() {
            found.push(start.clone());
        }
        Ok(found)
    }
}

fn push_unique(found: &mut Vec<ImmutableGraph>, candidates: Vec<ImmutableGraph>) {
    for candidate in candidates {
        if !found.contains(&candidate) {
            found.push(candidate);
        }
    }
}

fn binding<'r>(row: &'r Solution, var: &str) -> crate::Result<&'r Term> {
    row.get(var)
        .ok_or_else(|| RemoteError::malformed(format!("missing binding for ?{var}")))
}

fn predicate(term: &Term) -> crate::Result<Iri> {
    term.as_iri()
        .cloned()
        .ok_or_else(|| RemoteError::malformed(format!("predicate is not an IRI: {term}")))
}

fn subject(term: &Term) -> crate::Result<Subject> {
    term.clone()
        .into_subject()
        .ok_or_else(|| RemoteError::malformed(format!("subject is a literal: {term}")))
}

/// Build raw triples from result rows, filling wildcards from bindings
fn raw_triples(pattern: &TriplePattern, rows: &[Solution]) -> crate::Result<Vec<Triple>> {
    let mut seen = FxHashSet::default();
    let mut triples = Vec::with_capacity(rows.len());
    for row in rows {
        let s = match &pattern.s {
            Some(s) => s.clone(),
            None => subject(binding(row, "s")?)?,
        };
        let p = match &pattern.p {
            Some(p) => p.clone(),
            None => predicate(binding(row, "p")?)?,
        };
        let o = match &pattern.o {
            Some(o) => o.clone(),
            None => binding(row, "o")?.clone(),
        };
        let triple = Triple { s, p, o };
        if seen.insert(triple.clone()) {
            triples.push(triple);
        }
    }
    Ok(triples)
}

/// `context` with `node` replaced by the marker IRI
fn mark(context: &ImmutableGraph, node: &BlankNode) -> ImmutableGraph {
    let marker = Iri::new(MARKER_IRI);
    context
        .iter()
        .map(|t| {
            let s = match &t.s {
                Subject::BlankNode(b) if b == node => Subject::Iri(marker.clone()),
                s => s.clone(),
            };
            let o = match &t.o {
                Term::BlankNode(b) if b == node => Term::Iri(marker.clone()),
                o => o.clone(),
            };
            Triple::new(s, t.p.clone(), o)
        })
        .collect()
}

impl GraphBackend for RemoteGraph {
    fn perform_filter<'a>(&'a self, pattern: &TriplePattern) -> Result<TripleIter<'a>> {
        if self.check_owned(pattern).is_err() {
            return Ok(Box::new(std::iter::empty()));
        }

        let query = pattern_query(pattern, self.origin);
        let rows = self.client.select(&query)?;
        let raw = raw_triples(pattern, &rows)?;
        debug!(
            endpoint = self.endpoint(),
            rows = rows.len(),
            triples = raw.len(),
            "remote filter"
        );

        Ok(Box::new(Reconciler::new(self, pattern.is_wildcard(), raw)))
    }

    fn perform_size(&self) -> Result<usize> {
        Ok(self.client.select(SIZE_QUERY)?.len())
    }
}

impl fmt::Debug for RemoteGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteGraph")
            .field("endpoint", &self.endpoint())
            .field("origin", &self.origin)
            .field("max_isomorphic_candidates", &self.max_isomorphic_candidates)
            .finish()
    }
}

/// Lazy iterator replacing raw blank nodes with local ones
///
/// The node map and used-context set live for one filter call only.
struct Reconciler<'a> {
    graph: &'a RemoteGraph,
    wildcard: bool,
    raw: std::vec::IntoIter<Triple>,
    /// All raw triples of this call, used as seed contexts
    seeds: Vec<Triple>,
    node_map: FxHashMap<BlankNode, BlankNode>,
    used_contexts: FxHashSet<ImmutableGraph>,
}

impl<'a> Reconciler<'a> {
    fn new(graph: &'a RemoteGraph, wildcard: bool, raw: Vec<Triple>) -> Self {
        Self {
            graph,
            wildcard,
            seeds: raw.clone(),
            raw: raw.into_iter(),
            node_map: FxHashMap::default(),
            used_contexts: FxHashSet::default(),
        }
    }

    fn reconcile(&mut self, raw: Triple) -> Result<Triple> {
        let s = match raw.s {
            Subject::BlankNode(b) => Subject::BlankNode(self.local(&b)?),
            iri => iri,
        };
        let o = match raw.o {
            Term::BlankNode(b) => Term::BlankNode(self.local(&b)?),
            other => other,
        };
        Ok(Triple { s, p: raw.p, o })
    }

    fn local(&mut self, node: &BlankNode) -> Result<BlankNode> {
        if self.graph.owns(node) {
            return Ok(node.clone());
        }
        if let Some(local) = self.node_map.get(node) {
            return Ok(local.clone());
        }
        let context = self.context(node)?;
        self.mint(&context);
        self.node_map.get(node).cloned().ok_or_else(|| {
            CollectionError::illegal_state(format!("no context minted for {node}"))
        })
    }

    fn context(&mut self, node: &BlankNode) -> Result<ImmutableGraph> {
        let seed: ImmutableGraph = self
            .seeds
            .iter()
            .filter(|t| t.touches(node))
            .cloned()
            .collect();
        if self.wildcard {
            return Ok(seed);
        }

        let candidates = self.graph.expand(&seed)?;
        if let Some(unused) = candidates
            .iter()
            .find(|c| !self.used_contexts.contains(*c))
        {
            self.used_contexts.insert(unused.clone());
            return Ok(unused.clone());
        }
        warn!(
            endpoint = self.graph.endpoint(),
            node = %node,
            candidates = candidates.len(),
            "remote graph seems to contain redundant triples; blank node identity may be ambiguous"
        );
        Ok(candidates.into_iter().next().unwrap_or(seed))
    }

    /// Mint local nodes for every unmapped raw node of `context`
    fn mint(&mut self, context: &ImmutableGraph) {
        let origin = self.graph.origin;
        let bound = self.graph.max_isomorphic_candidates;
        let mut minted: FxHashSet<BlankNode> = FxHashSet::default();

        for raw in context.blank_nodes() {
            if self.graph.owns(&raw) || self.node_map.contains_key(&raw) {
                continue;
            }
            let shape = mark(context, &raw);
            let mut local = None;
            for index in 0..bound {
                let candidate = BlankNode::contextual(origin, shape.clone(), index);
                if !minted.contains(&candidate) {
                    local = Some(candidate);
                    break;
                }
            }
            let local = match local {
                Some(local) => local,
                None => {
                    warn!(
                        endpoint = self.graph.endpoint(),
                        bound,
                        "isomorphic candidate bound exhausted; blank node identity is not unique"
                    );
                    BlankNode::contextual(origin, shape, bound - 1)
                }
            };
            minted.insert(local.clone());
            self.node_map.insert(raw, local);
        }
    }
}

impl Iterator for Reconciler<'_> {
    type Item = Result<Triple>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.raw.next()?;
        Some(self.reconcile(raw))
    }
}
