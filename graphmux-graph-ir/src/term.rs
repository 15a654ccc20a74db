//! RDF term types: IRI, blank node, and literal
//!
//! Terms are the building blocks of triples. A term can be:
//! - An IRI (always expanded, never prefixed)
//! - A blank node (identity based, see [`BlankNode`])
//! - A literal (lexical form + explicit datatype + optional language tag)

use crate::vocab::{rdf, xsd};
use crate::ImmutableGraph;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An expanded IRI
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri(Arc<str>);

impl Iri {
    /// Create an IRI from its expanded string form
    pub fn new(iri: impl AsRef<str>) -> Self {
        Self(Arc::from(iri.as_ref()))
    }

    /// Get the IRI string (without angle brackets)
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl From<&str> for Iri {
    fn from(s: &str) -> Self {
        Iri::new(s)
    }
}

impl From<String> for Iri {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl AsRef<str> for Iri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A literal value with explicit datatype
///
/// # Invariants
///
/// - The datatype is always present. Plain literals carry `xsd:string`.
/// - A literal with a language tag carries `rdf:langString`; the tag is
///   stored lowercased so that `"chat"@EN` and `"chat"@en` are equal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    lexical: Arc<str>,
    datatype: Iri,
    language: Option<Arc<str>>,
}

impl Literal {
    /// Create a plain string literal (xsd:string)
    pub fn string(lexical: impl AsRef<str>) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype: Iri::new(xsd::STRING),
            language: None,
        }
    }

    /// Create a language-tagged string literal (rdf:langString)
    pub fn lang_string(lexical: impl AsRef<str>, lang: impl AsRef<str>) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype: Iri::new(rdf::LANG_STRING),
            language: Some(Arc::from(lang.as_ref().to_ascii_lowercase())),
        }
    }

    /// Create a typed literal with a custom datatype
    pub fn typed(lexical: impl AsRef<str>, datatype: impl Into<Iri>) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype: datatype.into(),
            language: None,
        }
    }

    /// Create an integer literal (xsd:integer)
    pub fn integer(value: i64) -> Self {
        Self::typed(value.to_string(), xsd::INTEGER)
    }

    /// Create a boolean literal (xsd:boolean)
    pub fn boolean(value: bool) -> Self {
        Self::typed(value.to_string(), xsd::BOOLEAN)
    }

    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    pub fn datatype(&self) -> &Iri {
        &self.datatype
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Check if the datatype is xsd:string
    pub fn is_plain(&self) -> bool {
        self.language.is_none() && self.datatype.as_str() == xsd::STRING
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// N-Triples literal syntax, which is also valid SPARQL
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for c in self.lexical.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                c => write!(f, "{c}")?,
            }
        }
        f.write_str("\"")?;
        if let Some(lang) = &self.language {
            write!(f, "@{lang}")
        } else if self.datatype.as_str() != xsd::STRING {
            write!(f, "^^{}", self.datatype)
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Blank nodes
// ============================================================================

/// Identity of a blank node minted by a remote graph adapter
///
/// The node is described by the graph of triples surrounding it at the
/// endpoint (its *context*), in which the node itself has been replaced by a
/// marker IRI. `index` tells apart nodes whose contexts are isomorphic.
#[derive(Clone, Debug)]
pub struct ContextualId {
    /// Identifier of the adapter instance that minted the node
    pub origin: u64,
    /// Context graph with the node replaced by the adapter's marker IRI
    pub context: ImmutableGraph,
    /// Disambiguation index among nodes with isomorphic contexts
    pub index: u32,
}

impl PartialEq for ContextualId {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin && self.index == other.index && self.context == other.context
    }
}

impl Eq for ContextualId {}

impl Hash for ContextualId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.origin.hash(state);
        self.index.hash(state);
        self.context.iso_hash().hash(state);
    }
}

enum BlankNodeKind {
    Anonymous { label: Option<Arc<str>> },
    Contextual(ContextualId),
}

/// An RDF blank node
///
/// Blank nodes have no global name. Anonymous nodes are equal only to
/// themselves (clones share identity); the optional label is for display
/// and never participates in equality. Contextual nodes compare by
/// [`ContextualId`], so the same endpoint node observed in two separate
/// queries maps to equal values.
#[derive(Clone)]
pub struct BlankNode(Arc<BlankNodeKind>);

impl BlankNode {
    /// Create a fresh anonymous blank node
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Arc::new(BlankNodeKind::Anonymous { label: None }))
    }

    /// Create a fresh anonymous blank node carrying a display label
    ///
    /// The label does not make the node equal to other nodes with the
    /// same label.
    pub fn labeled(label: impl AsRef<str>) -> Self {
        Self(Arc::new(BlankNodeKind::Anonymous {
            label: Some(Arc::from(label.as_ref())),
        }))
    }

    /// Create a contextual blank node
    pub fn contextual(origin: u64, context: ImmutableGraph, index: u32) -> Self {
        Self(Arc::new(BlankNodeKind::Contextual(ContextualId {
            origin,
            context,
            index,
        })))
    }

    /// The contextual identity, if this node was minted by an adapter
    pub fn contextual_id(&self) -> Option<&ContextualId> {
        match &*self.0 {
            BlankNodeKind::Contextual(id) => Some(id),
            BlankNodeKind::Anonymous { .. } => None,
        }
    }

    pub fn is_contextual(&self) -> bool {
        matches!(&*self.0, BlankNodeKind::Contextual(_))
    }

    /// Display label of an anonymous node
    pub fn label(&self) -> Option<&str> {
        match &*self.0 {
            BlankNodeKind::Anonymous { label } => label.as_deref(),
            BlankNodeKind::Contextual(_) => None,
        }
    }

    /// Check whether both handles refer to the same node instance
    pub fn same_instance(&self, other: &BlankNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for BlankNode {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (&*self.0, &*other.0) {
            (BlankNodeKind::Contextual(a), BlankNodeKind::Contextual(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for BlankNode {}

impl Hash for BlankNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &*self.0 {
            BlankNodeKind::Anonymous { .. } => {
                0u8.hash(state);
                self.address().hash(state);
            }
            BlankNodeKind::Contextual(id) => {
                1u8.hash(state);
                id.hash(state);
            }
        }
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            BlankNodeKind::Anonymous { label: Some(label) } => write!(f, "_:{label}"),
            BlankNodeKind::Anonymous { label: None } => write!(f, "_:b{:x}", self.address()),
            BlankNodeKind::Contextual(id) => write!(f, "_:c{}x{}", id.origin, id.index),
        }
    }
}

impl fmt::Debug for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            BlankNodeKind::Contextual(id) => f
                .debug_struct("BlankNode")
                .field("origin", &id.origin)
                .field("index", &id.index)
                .field("context_len", &id.context.len())
                .finish(),
            BlankNodeKind::Anonymous { .. } => write!(f, "{self}"),
        }
    }
}

// ============================================================================
// Subject / Term
// ============================================================================

/// A term allowed in subject position
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Subject {
    Iri(Iri),
    BlankNode(BlankNode),
}

impl Subject {
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Subject::Iri(iri) => Some(iri),
            Subject::BlankNode(_) => None,
        }
    }

    pub fn as_blank_node(&self) -> Option<&BlankNode> {
        match self {
            Subject::BlankNode(b) => Some(b),
            Subject::Iri(_) => None,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Iri(iri) => write!(f, "{iri}"),
            Subject::BlankNode(b) => write!(f, "{b}"),
        }
    }
}

impl From<Iri> for Subject {
    fn from(iri: Iri) -> Self {
        Subject::Iri(iri)
    }
}

impl From<BlankNode> for Subject {
    fn from(b: BlankNode) -> Self {
        Subject::BlankNode(b)
    }
}

/// An RDF term (subject or object position)
///
/// # Invariants
///
/// - `Term::Iri` always contains an **expanded** IRI, never a prefixed form.
/// - The predicate position of a triple is always an [`Iri`], never a `Term`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Iri(Iri),
    BlankNode(BlankNode),
    Literal(Literal),
}

impl Term {
    /// Create an IRI term from an expanded IRI string
    pub fn iri(iri: impl AsRef<str>) -> Self {
        Term::Iri(Iri::new(iri))
    }

    /// Create a plain string literal (xsd:string)
    pub fn string(value: impl AsRef<str>) -> Self {
        Term::Literal(Literal::string(value))
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_blank_node(&self) -> Option<&BlankNode> {
        match self {
            Term::BlankNode(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// Convert to a subject, if this term may appear in subject position
    pub fn into_subject(self) -> Option<Subject> {
        match self {
            Term::Iri(iri) => Some(Subject::Iri(iri)),
            Term::BlankNode(b) => Some(Subject::BlankNode(b)),
            Term::Literal(_) => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "{iri}"),
            Term::BlankNode(b) => write!(f, "{b}"),
            Term::Literal(l) => write!(f, "{l}"),
        }
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Term::Iri(iri)
    }
}

impl From<BlankNode> for Term {
    fn from(b: BlankNode) -> Self {
        Term::BlankNode(b)
    }
}

impl From<Literal> for Term {
    fn from(l: Literal) -> Self {
        Term::Literal(l)
    }
}

impl From<Subject> for Term {
    fn from(s: Subject) -> Self {
        match s {
            Subject::Iri(iri) => Term::Iri(iri),
            Subject::BlankNode(b) => Term::BlankNode(b),
        }
    }
}
