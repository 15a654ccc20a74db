//! RDF vocabulary constants
//!
//! Only the IRIs this workspace needs to construct or recognize literals.

/// RDF vocabulary constants
pub mod rdf {
    /// rdf:type IRI
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

    /// rdf:langString IRI
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
}

/// XSD vocabulary constants
pub mod xsd {
    /// xsd:string IRI
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

    /// xsd:integer IRI
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

    /// xsd:boolean IRI
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
}

/// SPARQL results namespaces and media types
pub mod sparql_results {
    /// Namespace of the SPARQL Query Results XML format
    pub const XML_NS: &str = "http://www.w3.org/2005/sparql-results#";

    /// Media type of the SPARQL Query Results JSON format
    pub const JSON_MEDIA_TYPE: &str = "application/sparql-results+json";

    /// Media type of the SPARQL Query Results XML format
    pub const XML_MEDIA_TYPE: &str = "application/sparql-results+xml";
}
