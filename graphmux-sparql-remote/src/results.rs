//! SPARQL results document parsing
//!
//! Handles the two results formats endpoints commonly return:
//! - SPARQL 1.1 Query Results JSON (SELECT and ASK)
//! - SPARQL Query Results XML (SELECT and ASK)
//!
//! Blank node labels in a results document are only meaningful within that
//! document. Each distinct label maps to exactly one fresh anonymous
//! [`BlankNode`] per parsed response, so two rows naming `_:b0` share a node
//! but two responses never do.

use crate::{RemoteError, Result, SparqlResponse};
use graphmux_graph_ir::vocab::{rdf, sparql_results};
use graphmux_graph_ir::{BlankNode, Iri, Literal, QueryResult, Solution, Term};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Parse a results document, choosing the format from the content type or,
/// failing that, from the body's first character
pub fn parse_results(response: &SparqlResponse) -> Result<QueryResult> {
    match detect_format(response)? {
        ResultsFormat::Json => parse_json_results(&response.body),
        ResultsFormat::Xml => parse_xml_results(&response.body),
    }
}

enum ResultsFormat {
    Json,
    Xml,
}

fn detect_format(response: &SparqlResponse) -> Result<ResultsFormat> {
    if let Some(content_type) = &response.content_type {
        let media = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if media == sparql_results::JSON_MEDIA_TYPE || media == "application/json" {
            return Ok(ResultsFormat::Json);
        }
        if media == sparql_results::XML_MEDIA_TYPE
            || media == "application/xml"
            || media == "text/xml"
        {
            return Ok(ResultsFormat::Xml);
        }
    }
    match response.body.trim_start().chars().next() {
        Some('{') => Ok(ResultsFormat::Json),
        Some('<') => Ok(ResultsFormat::Xml),
        _ => Err(RemoteError::malformed(format!(
            "unrecognized results format (content type {:?})",
            response.content_type
        ))),
    }
}

/// Maps document-local blank node labels to fresh nodes
#[derive(Default)]
struct BlankNodeScope {
    nodes: FxHashMap<String, BlankNode>,
}

impl BlankNodeScope {
    fn node(&mut self, label: &str) -> BlankNode {
        self.nodes
            .entry(label.to_string())
            .or_insert_with(|| BlankNode::labeled(label))
            .clone()
    }
}

fn literal(value: &str, datatype: Option<&str>, language: Option<&str>) -> Literal {
    match (language, datatype) {
        (Some(lang), _) if !lang.is_empty() => Literal::lang_string(value, lang),
        (_, Some(dt)) if dt != rdf::LANG_STRING => Literal::typed(value, Iri::new(dt)),
        _ => Literal::string(value),
    }
}

// ---------------------------------------------------------------------------
// SPARQL Results JSON
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct JsonDocument {
    #[serde(default)]
    head: JsonHead,
    results: Option<JsonResults>,
    boolean: Option<bool>,
}

#[derive(Deserialize, Default)]
struct JsonHead {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Deserialize)]
struct JsonResults {
    bindings: Vec<BTreeMap<String, JsonTerm>>,
}

#[derive(Deserialize)]
struct JsonTerm {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    #[serde(rename = "xml:lang", alias = "lang")]
    lang: Option<String>,
    datatype: Option<String>,
}

/// Parse SPARQL 1.1 Query Results JSON
pub fn parse_json_results(body: &str) -> Result<QueryResult> {
    let doc: JsonDocument = serde_json::from_str(body)?;

    if let Some(boolean) = doc.boolean {
        return Ok(QueryResult::Boolean(boolean));
    }
    let results = doc
        .results
        .ok_or_else(|| RemoteError::malformed("missing 'results' in JSON results"))?;

    let mut scope = BlankNodeScope::default();
    let mut solutions = Vec::with_capacity(results.bindings.len());
    for binding in results.bindings {
        let mut solution = Solution::new();
        for (var, term) in binding {
            let value = match term.kind.as_str() {
                "uri" => Term::Iri(Iri::new(&term.value)),
                "bnode" => Term::BlankNode(scope.node(&term.value)),
                "literal" | "typed-literal" => Term::Literal(literal(
                    &term.value,
                    term.datatype.as_deref(),
                    term.lang.as_deref(),
                )),
                other => {
                    return Err(RemoteError::malformed(format!(
                        "unknown term type '{}' for variable '{}'",
                        other, var
                    )))
                }
            };
            solution.insert(var, value);
        }
        solutions.push(solution);
    }

    Ok(QueryResult::Solutions {
        variables: doc.head.vars,
        solutions,
    })
}

// ---------------------------------------------------------------------------
// SPARQL Results XML
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum XmlTermKind {
    Uri,
    Bnode,
    Literal {
        datatype: Option<String>,
        language: Option<String>,
    },
}

fn attr_value(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == local)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

fn literal_kind(e: &BytesStart<'_>) -> XmlTermKind {
    XmlTermKind::Literal {
        datatype: attr_value(e, b"datatype"),
        // matches both `xml:lang` and a bare `lang`
        language: attr_value(e, b"lang"),
    }
}

/// Parse SPARQL Query Results XML
pub fn parse_xml_results(body: &str) -> Result<QueryResult> {
    let mut reader = Reader::from_str(body);

    let mut scope = BlankNodeScope::default();
    let mut saw_root = false;
    let mut variables: Vec<String> = Vec::new();
    let mut solutions: Vec<Solution> = Vec::new();

    let mut current_binding: Option<String> = None;
    let mut current_solution: Option<Solution> = None;
    let mut current_term: Option<XmlTermKind> = None;
    let mut text_buf = String::new();
    let mut in_boolean = false;

    let mut finish_term = |kind: XmlTermKind,
                           text: &str,
                           binding: &Option<String>,
                           solution: &mut Option<Solution>|
     -> Result<()> {
        let (Some(name), Some(solution)) = (binding, solution.as_mut()) else {
            return Err(RemoteError::malformed("term outside of <binding>"));
        };
        let term = match kind {
            XmlTermKind::Uri => Term::Iri(Iri::new(text)),
            XmlTermKind::Bnode => Term::BlankNode(scope.node(text)),
            XmlTermKind::Literal { datatype, language } => Term::Literal(literal(
                text,
                datatype.as_deref(),
                language.as_deref(),
            )),
        };
        solution.insert(name.clone(), term);
        Ok(())
    };

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"sparql" => saw_root = true,
                b"variable" => {
                    if let Some(name) = attr_value(e, b"name") {
                        variables.push(name);
                    }
                }
                b"result" => current_solution = Some(Solution::new()),
                b"binding" => current_binding = attr_value(e, b"name"),
                b"uri" => {
                    current_term = Some(XmlTermKind::Uri);
                    text_buf.clear();
                }
                b"bnode" => {
                    current_term = Some(XmlTermKind::Bnode);
                    text_buf.clear();
                }
                b"literal" => {
                    current_term = Some(literal_kind(e));
                    text_buf.clear();
                }
                b"boolean" => {
                    in_boolean = true;
                    text_buf.clear();
                }
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"sparql" => saw_root = true,
                b"variable" => {
                    if let Some(name) = attr_value(e, b"name") {
                        variables.push(name);
                    }
                }
                b"result" => solutions.push(Solution::new()),
                // <literal/> is the empty string
                b"literal" => {
                    finish_term(literal_kind(e), "", &current_binding, &mut current_solution)?
                }
                _ => {}
            },
            Event::End(ref e) => match e.local_name().as_ref() {
                b"result" => {
                    if let Some(solution) = current_solution.take() {
                        solutions.push(solution);
                    }
                }
                b"binding" => current_binding = None,
                b"uri" | b"bnode" | b"literal" => {
                    if let Some(kind) = current_term.take() {
                        finish_term(kind, &text_buf, &current_binding, &mut current_solution)?;
                    }
                }
                b"boolean" => {
                    let value = text_buf.trim();
                    return match value {
                        "true" | "1" => Ok(QueryResult::Boolean(true)),
                        "false" | "0" => Ok(QueryResult::Boolean(false)),
                        other => Err(RemoteError::malformed(format!(
                            "invalid <boolean> value '{}'",
                            other
                        ))),
                    };
                }
                _ => {}
            },
            Event::Text(ref e) => {
                if current_term.is_some() || in_boolean {
                    text_buf.push_str(&e.unescape()?);
                }
            }
            Event::CData(ref e) => {
                if current_term.is_some() {
                    text_buf.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(RemoteError::malformed("missing <sparql> root element"));
    }
    Ok(QueryResult::Solutions {
        variables,
        solutions,
    })
}
