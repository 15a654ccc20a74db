//! Static scan of SPARQL text for referenced graphs
//!
//! The federation only needs to know which named graphs a query or update
//! touches in order to pick a fastlane provider. This module tokenizes the
//! text and follows the handful of clauses that name graphs:
//!
//! - `FROM`, `FROM NAMED`, `USING`, `USING NAMED`, `WITH`
//! - `GRAPH <g>` in patterns and in `CLEAR`/`DROP`/`CREATE` updates
//! - `INTO [GRAPH]` of `LOAD`
//! - both operands of `ADD`/`MOVE`/`COPY`
//!
//! `GRAPH ?var` without a dataset clause may range over every graph, so the
//! reference set is then [`GraphReferences::Unbounded`].

mod chars;
mod lexer;

use lexer::{Lexer, Token};

use graphmux_graph_ir::Iri;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use thiserror::Error;

/// Error scanning query text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Unterminated IRI or string literal
    #[error("Lexer error at line {line}, column {column}: {message}")]
    Lexer {
        line: usize,
        column: usize,
        message: String,
    },

    /// Prefixed name with no matching `PREFIX` declaration
    #[error("Undefined prefix: {0}")]
    UndefinedPrefix(String),
}

/// Graphs referenced by a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphReferences {
    /// Exactly these graphs
    Bounded(BTreeSet<Iri>),
    /// Any graph may be touched
    Unbounded,
}

impl GraphReferences {
    pub fn as_bounded(&self) -> Option<&BTreeSet<Iri>> {
        match self {
            GraphReferences::Bounded(graphs) => Some(graphs),
            GraphReferences::Unbounded => None,
        }
    }
}

/// Determine the graphs `query` references
///
/// Unless a `FROM`, `USING` or `WITH` clause replaces the dataset, patterns
/// outside `GRAPH` blocks read `default_graph`, so it joins the set even when
/// named graphs are referenced too.
pub fn referenced_graphs(
    query: &str,
    default_graph: Option<&Iri>,
) -> Result<GraphReferences, ScanError> {
    let tokens = Lexer::new(query).tokenize()?;
    let mut scanner = Scanner::new(&tokens);
    scanner.run()?;

    if scanner.graph_var && !scanner.dataset_clause {
        return Ok(GraphReferences::Unbounded);
    }
    let mut graphs = scanner.graphs;
    if !scanner.own_dataset {
        graphs.extend(default_graph.cloned());
    }
    Ok(GraphReferences::Bounded(graphs))
}

struct Scanner<'t> {
    tokens: &'t [Token],
    pos: usize,
    base: Option<String>,
    prefixes: FxHashMap<String, String>,
    graphs: BTreeSet<Iri>,
    graph_var: bool,
    dataset_clause: bool,
    own_dataset: bool,
}

impl<'t> Scanner<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            base: None,
            prefixes: FxHashMap::default(),
            graphs: BTreeSet::new(),
            graph_var: false,
            dataset_clause: false,
            own_dataset: false,
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn eat_word(&mut self, word: &str) -> bool {
        match self.peek() {
            Some(Token::Word(w)) if w == word => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn run(&mut self) -> Result<(), ScanError> {
        while let Some(token) = self.next() {
            let Token::Word(word) = token else {
                continue;
            };
            match word.as_str() {
                "PREFIX" => self.prefix_decl(),
                "BASE" => {
                    if let Some(Token::Iri(iri)) = self.peek() {
                        self.pos += 1;
                        self.base = Some(self.resolve(iri));
                    }
                }
                "FROM" | "USING" => {
                    self.eat_word("NAMED");
                    self.dataset_clause = true;
                    self.own_dataset = true;
                    self.graph_operand()?;
                }
                "WITH" => {
                    self.own_dataset = true;
                    self.graph_operand()?;
                }
                "INTO" => self.graph_operand()?,
                "GRAPH" => {
                    if let Some(Token::Var(_)) = self.peek() {
                        self.pos += 1;
                        self.graph_var = true;
                    } else {
                        self.graph_operand()?;
                    }
                }
                "ADD" | "MOVE" | "COPY" => {
                    self.eat_word("SILENT");
                    self.eat_word("GRAPH");
                    if !self.eat_word("DEFAULT") {
                        self.graph_operand()?;
                    }
                    if self.eat_word("TO") {
                        self.eat_word("GRAPH");
                        self.graph_operand()?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn prefix_decl(&mut self) {
        let tokens = self.tokens;
        if let (Some(Token::PrefixedName { prefix, local }), Some(Token::Iri(iri))) =
            (tokens.get(self.pos), tokens.get(self.pos + 1))
        {
            if local.is_empty() {
                self.pos += 2;
                let namespace = self.resolve(iri);
                self.prefixes.insert(prefix.clone(), namespace);
            }
        }
    }

    /// Record the IRI at the cursor, if any
    fn graph_operand(&mut self) -> Result<(), ScanError> {
        let iri = match self.peek() {
            Some(Token::Iri(iri)) => self.resolve(iri),
            Some(Token::PrefixedName { prefix, local }) => match self.prefixes.get(prefix) {
                Some(namespace) => format!("{namespace}{local}"),
                None => return Err(ScanError::UndefinedPrefix(prefix.clone())),
            },
            _ => return Ok(()),
        };
        self.pos += 1;
        self.graphs.insert(Iri::new(iri));
        Ok(())
    }

    fn resolve(&self, reference: &str) -> String {
        match &self.base {
            Some(base) if !is_absolute(reference) => resolve_against(base, reference),
            _ => reference.to_string(),
        }
    }
}

/// Returns true if the IRI has an RFC 3986 scheme.
fn is_absolute(iri: &str) -> bool {
    match iri.find(':') {
        Some(colon_pos) => {
            let scheme = &iri[..colon_pos];
            !scheme.is_empty()
                && scheme.as_bytes()[0].is_ascii_alphabetic()
                && scheme
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
        }
        None => false,
    }
}

/// Resolve a relative reference against an absolute base (RFC 3986 5.2)
fn resolve_against(base: &str, reference: &str) -> String {
    let base = base.split('#').next().unwrap_or(base);
    if reference.is_empty() {
        return base.to_string();
    }
    if reference.starts_with('#') {
        return format!("{base}{reference}");
    }

    let scheme_end = base.find(':').map_or(0, |i| i + 1);
    if reference.starts_with("//") {
        return format!("{}{}", &base[..scheme_end], reference);
    }

    let (authority_end, path_and_query) = match base[scheme_end..].strip_prefix("//") {
        Some(rest) => {
            let len = rest.find('/').unwrap_or(rest.len());
            let end = scheme_end + 2 + len;
            (end, &base[end..])
        }
        None => (scheme_end, &base[scheme_end..]),
    };
    let root = &base[..authority_end];
    let base_path = path_and_query.split('?').next().unwrap_or("");

    if reference.starts_with('?') {
        return format!("{root}{base_path}{reference}");
    }
    let merged = if reference.starts_with('/') {
        reference.to_string()
    } else {
        let dir = match base_path.rfind('/') {
            Some(pos) => &base_path[..=pos],
            None => "/",
        };
        format!("{dir}{reference}")
    };
    format!("{root}{}", remove_dot_segments(&merged))
}

fn remove_dot_segments(path: &str) -> String {
    let (path, query) = match path.find('?') {
        Some(pos) => (&path[..pos], &path[pos..]),
        None => (path, ""),
    };
    let mut segments: Vec<&str> = Vec::new();
    let mut parts = path.split('/').peekable();
    while let Some(segment) = parts.next() {
        let last = parts.peek().is_none();
        match segment {
            "." => {
                if last {
                    segments.push("");
                }
            }
            ".." => {
                if segments.len() > 1 {
                    segments.pop();
                }
                if last {
                    segments.push("");
                }
            }
            s => segments.push(s),
        }
    }
    format!("{}{}", segments.join("/"), query)
}
