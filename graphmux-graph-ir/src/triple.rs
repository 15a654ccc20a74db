//! Triples and triple patterns

use crate::{BlankNode, Iri, Subject, Term};
use std::fmt;

/// An RDF triple
///
/// Triples are immutable values with structural equality. Blank nodes in
/// subject or object position compare by blank node identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Triple {
    /// Subject (IRI or blank node)
    pub s: Subject,
    /// Predicate (always an IRI)
    pub p: Iri,
    /// Object (IRI, blank node or literal)
    pub o: Term,
}

impl Triple {
    pub fn new(s: impl Into<Subject>, p: impl Into<Iri>, o: impl Into<Term>) -> Self {
        Self {
            s: s.into(),
            p: p.into(),
            o: o.into(),
        }
    }

    /// Blank nodes in subject and object position, subject first
    pub fn blank_nodes(&self) -> impl Iterator<Item = &BlankNode> {
        self.s
            .as_blank_node()
            .into_iter()
            .chain(self.o.as_blank_node())
    }

    /// Check if the triple contains no blank node
    pub fn is_ground(&self) -> bool {
        self.blank_nodes().next().is_none()
    }

    /// Check if `node` occurs in subject or object position
    pub fn touches(&self, node: &BlankNode) -> bool {
        self.blank_nodes().any(|b| b == node)
    }
}

/// N-Triples line syntax (terminated by ` .`)
impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.s, self.p, self.o)
    }
}

/// A filter over triples: each `None` position is a wildcard
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TriplePattern {
    pub s: Option<Subject>,
    pub p: Option<Iri>,
    pub o: Option<Term>,
}

impl TriplePattern {
    pub fn new(s: Option<Subject>, p: Option<Iri>, o: Option<Term>) -> Self {
        Self { s, p, o }
    }

    /// The `(*, *, *)` pattern matching every triple
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, s: impl Into<Subject>) -> Self {
        self.s = Some(s.into());
        self
    }

    pub fn with_predicate(mut self, p: impl Into<Iri>) -> Self {
        self.p = Some(p.into());
        self
    }

    pub fn with_object(mut self, o: impl Into<Term>) -> Self {
        self.o = Some(o.into());
        self
    }

    /// Check if every position is a wildcard
    pub fn is_wildcard(&self) -> bool {
        self.s.is_none() && self.p.is_none() && self.o.is_none()
    }

    pub fn matches(&self, triple: &Triple) -> bool {
        self.s.as_ref().map_or(true, |s| *s == triple.s)
            && self.p.as_ref().map_or(true, |p| *p == triple.p)
            && self.o.as_ref().map_or(true, |o| *o == triple.o)
    }

    /// Blank nodes bound in subject and object position
    pub fn blank_nodes(&self) -> impl Iterator<Item = &BlankNode> {
        self.s
            .as_ref()
            .and_then(Subject::as_blank_node)
            .into_iter()
            .chain(self.o.as_ref().and_then(Term::as_blank_node))
    }
}

impl From<&Triple> for TriplePattern {
    fn from(t: &Triple) -> Self {
        Self::new(Some(t.s.clone()), Some(t.p.clone()), Some(t.o.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Literal;

    fn ex(local: &str) -> Iri {
        Iri::new(format!("http://example.org/{local}"))
    }

    #[test]
    fn test_triple_display() {
        let t = Triple::new(ex("alice"), ex("age"), Literal::integer(30));
        assert_eq!(
            t.to_string(),
            "<http://example.org/alice> <http://example.org/age> \"30\"^^<http://www.w3.org/2001/XMLSchema#integer> ."
        );
    }

    #[test]
    fn test_blank_nodes_and_ground() {
        let b = BlankNode::new();
        let t = Triple::new(b.clone(), ex("p"), b.clone());
        assert_eq!(t.blank_nodes().count(), 2);
        assert!(!t.is_ground());
        assert!(t.touches(&b));
        assert!(!t.touches(&BlankNode::new()));

        let g = Triple::new(ex("a"), ex("p"), Term::string("x"));
        assert!(g.is_ground());
    }

    #[test]
    fn test_pattern_matches() {
        let t = Triple::new(ex("a"), ex("p"), Term::string("x"));

        assert!(TriplePattern::any().matches(&t));
        assert!(TriplePattern::any().with_subject(ex("a")).matches(&t));
        assert!(!TriplePattern::any().with_subject(ex("b")).matches(&t));
        assert!(TriplePattern::any()
            .with_predicate(ex("p"))
            .with_object(Term::string("x"))
            .matches(&t));
        assert!(!TriplePattern::any().with_object(Term::string("y")).matches(&t));
        assert!(TriplePattern::from(&t).matches(&t));
    }
}
