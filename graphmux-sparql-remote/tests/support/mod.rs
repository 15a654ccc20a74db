//! Shared harness for graphmux-sparql-remote integration tests.
//!
//! `ScriptedTransport` stands in for an endpoint: it answers each query with
//! the next queued response and records the query text for assertions.

#![allow(dead_code)]

pub mod log_capture;

use graphmux_sparql_remote::{RemoteError, Result, SparqlClient, SparqlResponse, SparqlTransport};
use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};
use std::collections::VecDeque;
use std::sync::Arc;

pub const ENDPOINT: &str = "http://sparql.example.org/query";
pub const RESULTS_JSON: &str = "application/sparql-results+json";

// =============================================================================
// Scripted endpoint
// =============================================================================

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<SparqlResponse>>>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a JSON results document
    pub fn respond(&self, doc: JsonValue) -> &Self {
        self.responses
            .lock()
            .push_back(Ok(SparqlResponse::new(Some(RESULTS_JSON), doc.to_string())));
        self
    }

    /// Queue a raw response body
    pub fn respond_raw(&self, content_type: Option<&str>, body: &str) -> &Self {
        self.responses
            .lock()
            .push_back(Ok(SparqlResponse::new(content_type, body)));
        self
    }

    pub fn fail(&self, error: RemoteError) -> &Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    /// Every query received so far, in order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

impl SparqlTransport for ScriptedTransport {
    fn post_query(&self, _endpoint: &str, query: &str) -> Result<SparqlResponse> {
        self.queries.lock().push(query.to_string());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::transport(format!("unscripted query: {query}"))))
    }
}

pub fn client(transport: &Arc<ScriptedTransport>) -> SparqlClient {
    SparqlClient::new(ENDPOINT, Arc::clone(transport) as Arc<dyn SparqlTransport>)
}

// =============================================================================
// Results documents
// =============================================================================

pub fn ex(local: &str) -> String {
    format!("http://example.org/{local}")
}

pub fn uri(iri: &str) -> JsonValue {
    json!({ "type": "uri", "value": iri })
}

pub fn bnode(label: &str) -> JsonValue {
    json!({ "type": "bnode", "value": label })
}

pub fn lit(value: &str) -> JsonValue {
    json!({ "type": "literal", "value": value })
}

/// SELECT results document; `rows` are binding objects
pub fn solutions(vars: &[&str], rows: Vec<JsonValue>) -> JsonValue {
    json!({
        "head": { "vars": vars },
        "results": { "bindings": rows }
    })
}
