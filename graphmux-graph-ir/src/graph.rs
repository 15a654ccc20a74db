//! Immutable RDF graph - a frozen set of triples
//!
//! `ImmutableGraph` uses set semantics: duplicates collapse on construction,
//! keeping the first occurrence. Equality is RDF graph isomorphism, so two
//! graphs that differ only in blank node identity are equal.

use crate::iso;
use crate::{BlankNode, Subject, Term, Triple, TriplePattern};
use rustc_hash::{FxHashSet, FxHasher};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A frozen, deduplicated set of triples
///
/// # Design Decisions
///
/// - **Shared storage**: cloning is an `Arc` bump; the graph is never mutated
///   after construction.
/// - **Insertion order**: iteration follows the order of first occurrence,
///   which keeps output deterministic for a given input.
/// - **Blank-node insensitive hash**: [`ImmutableGraph::iso_hash`] replaces
///   every blank node by a constant before hashing, so isomorphic graphs hash
///   equally and `Hash` is consistent with the isomorphism-based `Eq`.
///
/// # Example
///
/// ```
/// use graphmux_graph_ir::{ImmutableGraph, Iri, Term, Triple};
///
/// let t = Triple::new(
///     Iri::new("http://example.org/alice"),
///     Iri::new("http://xmlns.com/foaf/0.1/name"),
///     Term::string("Alice"),
/// );
/// let graph: ImmutableGraph = vec![t.clone(), t.clone()].into_iter().collect();
///
/// assert_eq!(graph.len(), 1);
/// assert!(graph.contains(&t));
/// ```
#[derive(Clone)]
pub struct ImmutableGraph {
    inner: Arc<GraphInner>,
}

struct GraphInner {
    triples: Vec<Triple>,
    index: FxHashSet<Triple>,
    iso_hash: u64,
}

impl ImmutableGraph {
    /// Create an empty graph
    pub fn empty() -> Self {
        Self::from_triples(std::iter::empty())
    }

    /// Build a graph from triples, collapsing duplicates
    pub fn from_triples(triples: impl IntoIterator<Item = Triple>) -> Self {
        let mut index = FxHashSet::default();
        let mut ordered = Vec::new();
        for triple in triples {
            if index.insert(triple.clone()) {
                ordered.push(triple);
            }
        }
        let iso_hash = ordered
            .iter()
            .fold(0u64, |acc, t| acc.wrapping_add(blanked_hash(t)));
        Self {
            inner: Arc::new(GraphInner {
                triples: ordered,
                index,
                iso_hash,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.triples.is_empty()
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.inner.index.contains(triple)
    }

    /// Iterate over triples in order of first occurrence
    pub fn iter(&self) -> std::slice::Iter<'_, Triple> {
        self.inner.triples.iter()
    }

    pub fn triples(&self) -> &[Triple] {
        &self.inner.triples
    }

    /// Iterate over triples matching `pattern`
    pub fn filter<'a>(&'a self, pattern: &'a TriplePattern) -> impl Iterator<Item = &'a Triple> {
        self.iter().filter(move |t| pattern.matches(t))
    }

    /// Distinct blank nodes in order of first appearance
    pub fn blank_nodes(&self) -> Vec<BlankNode> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for b in self.iter().flat_map(Triple::blank_nodes) {
            if seen.insert(b.clone()) {
                out.push(b.clone());
            }
        }
        out
    }

    /// Hash that ignores blank node identity
    pub fn iso_hash(&self) -> u64 {
        self.inner.iso_hash
    }

    /// Check whether both graphs share the same storage
    pub fn same_instance(&self, other: &ImmutableGraph) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Check whether `other` is isomorphic to this graph
    pub fn is_isomorphic(&self, other: &ImmutableGraph) -> bool {
        self == other
    }
}

/// Hash of a triple with every blank node replaced by the same constant
fn blanked_hash(triple: &Triple) -> u64 {
    let mut h = FxHasher::default();
    match &triple.s {
        Subject::Iri(iri) => {
            1u8.hash(&mut h);
            iri.hash(&mut h);
        }
        Subject::BlankNode(_) => 0u8.hash(&mut h),
    }
    triple.p.hash(&mut h);
    match &triple.o {
        Term::BlankNode(_) => 0u8.hash(&mut h),
        ground => {
            1u8.hash(&mut h);
            ground.hash(&mut h);
        }
    }
    h.finish()
}

impl Default for ImmutableGraph {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for ImmutableGraph {
    fn eq(&self, other: &Self) -> bool {
        if self.same_instance(other) {
            return true;
        }
        self.len() == other.len()
            && self.iso_hash() == other.iso_hash()
            && iso::is_isomorphic(self.triples(), other.triples())
    }
}

impl Eq for ImmutableGraph {}

impl Hash for ImmutableGraph {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.iso_hash.hash(state);
    }
}

impl FromIterator<Triple> for ImmutableGraph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self::from_triples(iter)
    }
}

impl<'a> IntoIterator for &'a ImmutableGraph {
    type Item = &'a Triple;
    type IntoIter = std::slice::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for ImmutableGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|t| t.to_string())).finish()
    }
}

/// N-Triples document, one triple per line
impl fmt::Display for ImmutableGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in self.iter() {
            writeln!(f, "{t}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Iri, Literal};

    fn ex(local: &str) -> Iri {
        Iri::new(format!("http://example.org/{local}"))
    }

    #[test]
    fn test_dedupe_on_construction() {
        let t1 = Triple::new(ex("a"), ex("p"), Term::string("x"));
        let t2 = Triple::new(ex("b"), ex("p"), Term::string("y"));
        let g = ImmutableGraph::from_triples(vec![t1.clone(), t2.clone(), t1.clone()]);

        assert_eq!(g.len(), 2);
        assert_eq!(g.triples(), &[t1, t2]);
    }

    #[test]
    fn test_isomorphic_graphs_equal_and_hash_equal() {
        let (b1, b2) = (BlankNode::new(), BlankNode::new());
        let g1 = ImmutableGraph::from_triples(vec![
            Triple::new(ex("a"), ex("knows"), b1.clone()),
            Triple::new(b1.clone(), ex("name"), Term::string("Bob")),
        ]);
        let g2 = ImmutableGraph::from_triples(vec![
            Triple::new(b2.clone(), ex("name"), Term::string("Bob")),
            Triple::new(ex("a"), ex("knows"), b2.clone()),
        ]);

        assert_eq!(g1, g2);
        assert_eq!(g1.iso_hash(), g2.iso_hash());
    }

    #[test]
    fn test_non_isomorphic_graphs_differ() {
        let (b1, b2) = (BlankNode::new(), BlankNode::new());
        let g1 = ImmutableGraph::from_triples(vec![Triple::new(
            b1.clone(),
            ex("name"),
            Term::string("Bob"),
        )]);
        let g2 = ImmutableGraph::from_triples(vec![Triple::new(
            b2.clone(),
            ex("name"),
            Term::from(Literal::lang_string("Bob", "en")),
        )]);
        assert_ne!(g1, g2);
    }

    #[test]
    fn test_filter_and_blank_nodes() {
        let b = BlankNode::new();
        let g = ImmutableGraph::from_triples(vec![
            Triple::new(ex("a"), ex("p"), b.clone()),
            Triple::new(b.clone(), ex("q"), Term::string("v")),
            Triple::new(ex("a"), ex("q"), Term::string("w")),
        ]);

        let pattern = TriplePattern::any().with_predicate(ex("q"));
        assert_eq!(g.filter(&pattern).count(), 2);
        assert_eq!(g.blank_nodes(), vec![b]);
    }

    #[test]
    fn test_empty_graphs_equal() {
        assert_eq!(ImmutableGraph::empty(), ImmutableGraph::default());
        assert!(ImmutableGraph::empty().is_empty());
    }
}
