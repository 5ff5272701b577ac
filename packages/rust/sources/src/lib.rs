//! Knowledge-source adapters for the glossary build.
//!
//! Each adapter turns one upstream source into data the consolidator can
//! overlay:
//! - [`sparql`] — root-scoped structured queries returning raw row bindings
//! - [`dictionary`] — streaming extraction of id → scope note from a
//!   gzip-compressed descriptor XML file
//! - [`ontology`] — label → definition extraction from RDF/XML, following a
//!   filtered, capped set of `owl:imports`
//!
//! Definition-producing adapters fill a [`DefinitionMap`], whose inserts are
//! first-writer-wins.

pub mod definitions;
pub mod dictionary;
pub mod ontology;
pub mod sparql;
pub mod text;
pub mod xml;

pub use definitions::DefinitionMap;
pub use dictionary::{load_dictionary_definitions, parse_dictionary, parse_dictionary_file};
pub use ontology::{OntologyLoader, import_urls, parse_ontology};
pub use sparql::{BindingValue, ConceptSource, SparqlAdapter, SparqlRow, build_query, columns};
pub use text::{extract_sentence, normalize_label};
