//! SPARQL text for pattern and context-expansion queries
//!
//! Blank nodes have no syntax that an endpoint would recognize, so every
//! blank node is written as a variable. A node minted by this adapter is
//! additionally constrained by its recorded context: the context triples
//! are emitted as extra clauses with the marker IRI replaced by the node's
//! variable.

use graphmux_graph_ir::{BlankNode, ImmutableGraph, Subject, Term, Triple, TriplePattern};
use rustc_hash::{FxHashMap, FxHashSet};

/// Reserved IRI standing for "this node" inside a minted node's context
pub const MARKER_IRI: &str = "urn:x-graphmux:remote-node";

/// Query counting every triple of the endpoint's default graph
pub(crate) const SIZE_QUERY: &str = "SELECT * WHERE { ?s ?p ?o }";

/// Writes triple patterns, assigning one variable per blank node
pub(crate) struct PatternWriter {
    origin: u64,
    clauses: String,
    vars: FxHashMap<BlankNode, String>,
    next_var: usize,
    /// Minted nodes whose context clauses are still to be written
    pending: Vec<(String, ImmutableGraph)>,
}

impl PatternWriter {
    pub(crate) fn new(origin: u64) -> Self {
        Self {
            origin,
            clauses: String::new(),
            vars: FxHashMap::default(),
            next_var: 0,
            pending: Vec::new(),
        }
    }

    /// Variable for `node`, allocating `v<n>` on first use
    fn var(&mut self, node: &BlankNode) -> String {
        let next = format!("v{}", self.next_var);
        let var = self.bind(node, &next);
        if var == next {
            self.next_var += 1;
        }
        var
    }

    /// Variable for `node`, using `preferred` if the node has none yet
    pub(crate) fn bind(&mut self, node: &BlankNode, preferred: &str) -> String {
        if let Some(var) = self.vars.get(node) {
            return var.clone();
        }
        self.vars.insert(node.clone(), preferred.to_string());
        if let Some(id) = node.contextual_id() {
            if id.origin == self.origin {
                self.pending.push((preferred.to_string(), id.context.clone()));
            }
        }
        preferred.to_string()
    }

    pub(crate) fn var_of(&self, node: &BlankNode) -> Option<&str> {
        self.vars.get(node).map(String::as_str)
    }

    fn subject(&mut self, s: &Subject, marker_var: Option<&str>) -> String {
        match s {
            Subject::Iri(iri) => match marker_var {
                Some(var) if iri.as_str() == MARKER_IRI => format!("?{var}"),
                _ => iri.to_string(),
            },
            Subject::BlankNode(b) => format!("?{}", self.var(b)),
        }
    }

    fn object(&mut self, o: &Term, marker_var: Option<&str>) -> String {
        match o {
            Term::Iri(iri) => match marker_var {
                Some(var) if iri.as_str() == MARKER_IRI => format!("?{var}"),
                _ => iri.to_string(),
            },
            Term::BlankNode(b) => format!("?{}", self.var(b)),
            Term::Literal(l) => l.to_string(),
        }
    }

    fn triple(&mut self, t: &Triple, marker_var: Option<&str>) {
        let s = self.subject(&t.s, marker_var);
        let o = self.object(&t.o, marker_var);
        self.clauses.push_str(&format!("{} {} {} .\n", s, t.p, o));
    }

    pub(crate) fn triples<'t>(&mut self, triples: impl IntoIterator<Item = &'t Triple>) {
        for t in triples {
            self.triple(t, None);
        }
    }

    /// Write the context clauses of every minted node referenced so far
    pub(crate) fn flush_contexts(&mut self) {
        while let Some((var, context)) = self.pending.pop() {
            for t in context.iter() {
                self.triple(t, Some(&var));
            }
        }
    }

    pub(crate) fn clauses(&self) -> &str {
        &self.clauses
    }
}

/// Build the SELECT query for a filter pattern
///
/// Wildcards become the projected variables `?s ?p ?o`. A bound minted node
/// becomes `?sn` / `?on` constrained by its context. Blank node arguments
/// must already be known to belong to the adapter identified by `origin`.
pub(crate) fn pattern_query(pattern: &TriplePattern, origin: u64) -> String {
    let mut writer = PatternWriter::new(origin);
    let mut projection: Vec<&str> = Vec::new();

    let s = match &pattern.s {
        None => {
            projection.push("?s");
            "?s".to_string()
        }
        Some(Subject::BlankNode(b)) => format!("?{}", writer.bind(b, "sn")),
        Some(Subject::Iri(iri)) => iri.to_string(),
    };
    let p = match &pattern.p {
        None => {
            projection.push("?p");
            "?p".to_string()
        }
        Some(iri) => iri.to_string(),
    };
    let o = match &pattern.o {
        None => {
            projection.push("?o");
            "?o".to_string()
        }
        Some(Term::BlankNode(b)) => format!("?{}", writer.bind(b, "on")),
        Some(term) => term.to_string(),
    };
    writer.flush_contexts();

    let projection = if projection.is_empty() {
        "*".to_string()
    } else {
        projection.join(" ")
    };
    format!(
        "SELECT {} WHERE {{ {} {} {} .\n{}}}",
        projection,
        s,
        p,
        o,
        writer.clauses()
    )
}

/// Query asking for every outgoing and incoming triple of each blank node
/// in a context
pub(crate) struct ExpansionQuery {
    pub(crate) text: String,
    /// Blank nodes of the context with their variable names, in order of
    /// first appearance
    pub(crate) nodes: Vec<(BlankNode, String)>,
}

/// Build the expansion query for `context`
///
/// For a node bound to `?v0` the query adds
/// `OPTIONAL { ?v0 ?pov0 ?ov0 }` and `OPTIONAL { ?sv0 ?piv0 ?v0 }`.
pub(crate) fn expansion_query(context: &ImmutableGraph, origin: u64) -> ExpansionQuery {
    let mut writer = PatternWriter::new(origin);
    writer.triples(context.iter());

    let mut seen = FxHashSet::default();
    let mut nodes = Vec::new();
    for b in context.iter().flat_map(Triple::blank_nodes) {
        if seen.insert(b.clone()) {
            if let Some(var) = writer.var_of(b) {
                nodes.push((b.clone(), var.to_string()));
            }
        }
    }
    writer.flush_contexts();

    let mut text = String::from("SELECT * WHERE {\n");
    text.push_str(writer.clauses());
    for (_, var) in &nodes {
        text.push_str(&format!("OPTIONAL {{ ?{var} ?po{var} ?o{var} }} .\n"));
        text.push_str(&format!("OPTIONAL {{ ?s{var} ?pi{var} ?{var} }} .\n"));
    }
    text.push('}');

    ExpansionQuery { text, nodes }
}
