//! RDF graph isomorphism
//!
//! Two triple sets are isomorphic when a bijection between their blank nodes
//! maps one set exactly onto the other. Ground triples (no blank node) must
//! match exactly.
//!
//! The matcher works in two phases:
//!
//! 1. **Color refinement**: every blank node starts with the same color and is
//!    repeatedly recolored from the multiset of its incident edges (position,
//!    predicate, and the color or value at the other end). Both graphs are
//!    refined with the same deterministic function, so colors are comparable
//!    across graphs. Refinement stops when the number of color classes no
//!    longer grows. Differing color multisets prove non-isomorphism.
//! 2. **Matching**: nodes are assigned to candidates of the same color,
//!    smallest classes first, backtracking on the first incident edge that
//!    does not exist in the other graph.

use crate::{BlankNode, Iri, Term, Triple};
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use std::hash::{Hash, Hasher};

/// Check whether two triple sets are isomorphic
///
/// Inputs are treated as sets; duplicates are ignored.
pub fn is_isomorphic(a: &[Triple], b: &[Triple]) -> bool {
    find_mapping(a, b).is_some()
}

/// Find a blank node bijection mapping `a` onto `b`
///
/// Returns `None` if the triple sets are not isomorphic. Ground triples are
/// compared exactly; the returned map only covers blank nodes.
pub fn find_mapping(a: &[Triple], b: &[Triple]) -> Option<FxHashMap<BlankNode, BlankNode>> {
    let (ground_a, ga) = split(a);
    let (ground_b, gb) = split(b);

    if ground_a.len() != ground_b.len() || !ground_a.iter().all(|t| ground_b.contains(t)) {
        return None;
    }
    if ga.edges.len() != gb.edges.len() || ga.nodes.len() != gb.nodes.len() {
        return None;
    }
    if ga.nodes.is_empty() {
        return Some(FxHashMap::default());
    }

    let (colors_a, colors_b) = refine_jointly(&ga, &gb)?;

    let mut candidates: FxHashMap<u64, Vec<usize>> = FxHashMap::default();
    for (n, c) in colors_b.iter().enumerate() {
        candidates.entry(*c).or_default().push(n);
    }

    let mut order: Vec<usize> = (0..ga.nodes.len()).collect();
    order.sort_by_key(|n| (candidates.get(&colors_a[*n]).map_or(0, Vec::len), *n));

    let mut matcher = Matcher {
        a: &ga,
        b_edges: gb.edges.iter().collect(),
        colors_a: &colors_a,
        candidates: &candidates,
        order: &order,
        mapping: vec![None; ga.nodes.len()],
        used: vec![false; gb.nodes.len()],
    };
    if !matcher.solve(0) {
        return None;
    }

    let mut out = FxHashMap::default();
    for (n, m) in matcher.mapping.iter().enumerate() {
        let m = (*m)?;
        out.insert(ga.nodes[n].clone(), gb.nodes[m].clone());
    }
    Some(out)
}

// ============================================================================
// Indexed form
// ============================================================================

#[derive(Clone, PartialEq, Eq, Hash)]
enum End {
    Blank(usize),
    Ground(Term),
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct Edge {
    s: End,
    p: Iri,
    o: End,
}

/// Non-ground triples with blank nodes replaced by dense indexes
struct Indexed {
    nodes: Vec<BlankNode>,
    edges: Vec<Edge>,
    /// Edge indexes incident to each node (self loops listed once)
    incident: Vec<Vec<usize>>,
}

fn split(triples: &[Triple]) -> (FxHashSet<&Triple>, Indexed) {
    let mut ground = FxHashSet::default();
    let mut ids: FxHashMap<BlankNode, usize> = FxHashMap::default();
    let mut indexed = Indexed {
        nodes: Vec::new(),
        edges: Vec::new(),
        incident: Vec::new(),
    };
    let mut seen: FxHashSet<Edge> = FxHashSet::default();

    let mut end_of = |term: Term, indexed: &mut Indexed| match term {
        Term::BlankNode(b) => {
            let next = indexed.nodes.len();
            let id = *ids.entry(b.clone()).or_insert(next);
            if id == next {
                indexed.nodes.push(b);
                indexed.incident.push(Vec::new());
            }
            End::Blank(id)
        }
        ground => End::Ground(ground),
    };

    for t in triples {
        if t.is_ground() {
            ground.insert(t);
            continue;
        }
        let s = end_of(Term::from(t.s.clone()), &mut indexed);
        let o = end_of(t.o.clone(), &mut indexed);
        let edge = Edge {
            s,
            p: t.p.clone(),
            o,
        };
        if !seen.insert(edge.clone()) {
            continue;
        }
        let e = indexed.edges.len();
        if let End::Blank(s) = &edge.s {
            indexed.incident[*s].push(e);
        }
        if let End::Blank(o) = &edge.o {
            if edge.s != End::Blank(*o) {
                indexed.incident[*o].push(e);
            }
        }
        indexed.edges.push(edge);
    }
    (ground, indexed)
}

// ============================================================================
// Color refinement
// ============================================================================

fn fx<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut h = FxHasher::default();
    value.hash(&mut h);
    h.finish()
}

fn end_signature(end: &End, colors: &[u64]) -> (u8, u64) {
    match end {
        End::Blank(i) => (0, colors[*i]),
        End::Ground(t) => (1, fx(t)),
    }
}

fn refine(g: &Indexed, colors: &[u64]) -> Vec<u64> {
    (0..g.nodes.len())
        .map(|n| {
            let mut signature: Vec<(u8, u64, u8, u64)> = g.incident[n]
                .iter()
                .map(|&e| {
                    let edge = &g.edges[e];
                    let p = fx(&edge.p);
                    match (&edge.s, &edge.o) {
                        (End::Blank(s), End::Blank(o)) if *s == n && *o == n => (0, p, 0, 0),
                        (End::Blank(s), other) if *s == n => {
                            let (tag, c) = end_signature(other, colors);
                            (1, p, tag, c)
                        }
                        (other, _) => {
                            let (tag, c) = end_signature(other, colors);
                            (2, p, tag, c)
                        }
                    }
                })
                .collect();
            signature.sort_unstable();
            let mut h = FxHasher::default();
            colors[n].hash(&mut h);
            signature.hash(&mut h);
            h.finish()
        })
        .collect()
}

fn same_multiset(a: &[u64], b: &[u64]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

fn refine_jointly(a: &Indexed, b: &Indexed) -> Option<(Vec<u64>, Vec<u64>)> {
    let mut colors_a = vec![0u64; a.nodes.len()];
    let mut colors_b = vec![0u64; b.nodes.len()];
    let mut classes = 1usize;

    loop {
        let next_a = refine(a, &colors_a);
        let next_b = refine(b, &colors_b);
        if !same_multiset(&next_a, &next_b) {
            return None;
        }
        colors_a = next_a;
        colors_b = next_b;

        let count = colors_a
            .iter()
            .chain(colors_b.iter())
            .collect::<FxHashSet<_>>()
            .len();
        if count <= classes {
            break;
        }
        classes = count;
    }

    tracing::trace!(
        nodes = a.nodes.len(),
        classes,
        "blank node color refinement converged"
    );
    Some((colors_a, colors_b))
}

// ============================================================================
// Matching
// ============================================================================

struct Matcher<'g> {
    a: &'g Indexed,
    b_edges: FxHashSet<&'g Edge>,
    colors_a: &'g [u64],
    candidates: &'g FxHashMap<u64, Vec<usize>>,
    order: &'g [usize],
    mapping: Vec<Option<usize>>,
    used: Vec<bool>,
}

impl Matcher<'_> {
    fn solve(&mut self, depth: usize) -> bool {
        let Some(&n) = self.order.get(depth) else {
            return true;
        };
        let Some(candidates) = self.candidates.get(&self.colors_a[n]) else {
            return false;
        };
        for &m in candidates {
            if self.used[m] {
                continue;
            }
            self.mapping[n] = Some(m);
            self.used[m] = true;
            if self.consistent(n) && self.solve(depth + 1) {
                return true;
            }
            self.mapping[n] = None;
            self.used[m] = false;
        }
        false
    }

    /// Check every edge at `n` whose blank ends are all assigned
    fn consistent(&self, n: usize) -> bool {
        self.a.incident[n].iter().all(|&e| {
            let edge = &self.a.edges[e];
            match (self.map_end(&edge.s), self.map_end(&edge.o)) {
                (Some(s), Some(o)) => self.b_edges.contains(&Edge {
                    s,
                    p: edge.p.clone(),
                    o,
                }),
                _ => true,
            }
        })
    }

    fn map_end(&self, end: &End) -> Option<End> {
        match end {
            End::Blank(i) => self.mapping[*i].map(End::Blank),
            End::Ground(t) => Some(End::Ground(t.clone())),
        }
    }
}
