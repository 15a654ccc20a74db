//! SPARQL endpoint client

use crate::results::parse_results;
use crate::{HttpTransport, RemoteError, RemoteGraphConfig, Result, SparqlTransport};
use graphmux_graph_ir::{QueryResult, Solution};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Executes queries against one endpoint and parses the results
#[derive(Clone)]
pub struct SparqlClient {
    endpoint: String,
    transport: Arc<dyn SparqlTransport>,
}

impl SparqlClient {
    pub fn new(endpoint: impl Into<String>, transport: Arc<dyn SparqlTransport>) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
        }
    }

    /// Create a client with an [`HttpTransport`] built from `config`
    pub fn from_config(config: &RemoteGraphConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(config.endpoint.clone(), Arc::new(transport)))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Execute `query` and parse the results document
    pub fn query_result_set(&self, query: &str) -> Result<QueryResult> {
        debug!(endpoint = %self.endpoint, query, "executing remote query");
        let response = self.transport.post_query(&self.endpoint, query)?;
        parse_results(&response)
    }

    /// Execute a SELECT query and return its solution rows
    pub fn select(&self, query: &str) -> Result<Vec<Solution>> {
        match self.query_result_set(query)? {
            QueryResult::Solutions { solutions, .. } => Ok(solutions),
            other => Err(RemoteError::malformed(format!(
                "expected solutions for SELECT query, got {}",
                result_kind(&other)
            ))),
        }
    }
}

fn result_kind(result: &QueryResult) -> &'static str {
    match result {
        QueryResult::Solutions { .. } => "solutions",
        QueryResult::Boolean(_) => "a boolean",
        QueryResult::Graph(_) => "a graph",
    }
}

impl fmt::Debug for SparqlClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparqlClient")
            .field("endpoint", &self.endpoint)
            .field("transport", &self.transport)
            .finish()
    }
}
