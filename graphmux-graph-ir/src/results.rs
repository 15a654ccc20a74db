//! Query result values

use crate::{ImmutableGraph, Term};
use std::collections::BTreeMap;

/// One solution row: variable name (without `?`) to bound term
///
/// Unbound variables are absent from the map.
pub type Solution = BTreeMap<String, Term>;

/// The result of executing a SPARQL query
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryResult {
    /// SELECT results
    Solutions {
        /// Projected variable names, in header order
        variables: Vec<String>,
        solutions: Vec<Solution>,
    },
    /// ASK result
    Boolean(bool),
    /// CONSTRUCT / DESCRIBE result
    Graph(ImmutableGraph),
}

impl QueryResult {
    /// Number of solutions, triples, or 1 for a boolean
    pub fn len(&self) -> usize {
        match self {
            QueryResult::Solutions { solutions, .. } => solutions.len(),
            QueryResult::Boolean(_) => 1,
            QueryResult::Graph(g) => g.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_solutions(&self) -> Option<&[Solution]> {
        match self {
            QueryResult::Solutions { solutions, .. } => Some(solutions),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            QueryResult::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_graph(&self) -> Option<&ImmutableGraph> {
        match self {
            QueryResult::Graph(g) => Some(g),
            _ => None,
        }
    }

    /// Consume into solution rows, if this is a SELECT result
    pub fn into_solutions(self) -> Option<Vec<Solution>> {
        match self {
            QueryResult::Solutions { solutions, .. } => Some(solutions),
            _ => None,
        }
    }
}
