//! Ontology adapter: normalized English label → definition from RDF/XML.
//!
//! The root document is downloaded once into the cache directory. Its
//! `owl:imports` lines are filtered to the configured module substrings,
//! capped, and each import is fetched under a byte budget and parsed into
//! the same map. Imports that fail or run over budget are skipped.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use glossary_fetch::Fetcher;
use glossary_shared::OntologyConfig;

use crate::definitions::DefinitionMap;
use crate::text::{extract_sentence, normalize_label};
use crate::xml::{RecordSpec, for_each_record};

const RDF_ACCEPT: &str = "application/rdf+xml";

const RESOURCE_ATTR: &str = "rdf:resource=\"";

/// Field order: label, definition, comment.
const ONTOLOGY_SPEC: RecordSpec<'static> = RecordSpec {
    records: &["Description", "Class", "NamedIndividual"],
    fields: &["label", "definition", "comment"],
    lang: Some("en"),
};

/// Loads ontology definitions through a [`Fetcher`].
pub struct OntologyLoader<'a> {
    fetcher: &'a Fetcher,
    config: &'a OntologyConfig,
}

impl<'a> OntologyLoader<'a> {
    pub fn new(fetcher: &'a Fetcher, config: &'a OntologyConfig) -> Self {
        Self { fetcher, config }
    }

    /// Load the root document (cached at `cache_path`) and its filtered imports.
    ///
    /// Never fails; a missing root yields an empty map.
    #[instrument(skip_all, fields(url = %self.config.url))]
    pub async fn load(&self, cache_path: &Path) -> DefinitionMap {
        let mut definitions = DefinitionMap::new();

        if let Err(e) = self.fetcher.download_file(&self.config.url, cache_path).await {
            warn!(error = %e, "ontology download failed, continuing without it");
            return definitions;
        }

        let root = match std::fs::read(cache_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %cache_path.display(), error = %e, "cached ontology unreadable");
                return definitions;
            }
        };

        let from_root = parse_ontology(&root, &mut definitions);
        debug!(definitions = from_root, "root ontology parsed");

        let text = String::from_utf8_lossy(&root);
        let imports = import_urls(&text, &self.config.import_filters, self.config.import_limit);
        let mut followed = 0;

        for url in &imports {
            let content = self
                .fetcher
                .fetch_bytes(url, RDF_ACCEPT, self.config.max_bytes)
                .await;
            if content.is_empty() {
                debug!(%url, "import skipped");
                continue;
            }
            let added = parse_ontology(&content, &mut definitions);
            followed += 1;
            debug!(%url, added, "import parsed");
        }

        info!(
            definitions = definitions.len(),
            imports_listed = imports.len(),
            imports_followed = followed,
            "ontology definitions loaded"
        );
        definitions
    }
}

/// Parse one RDF/XML document into `definitions` (first writer wins).
///
/// Class, individual and description elements with an English label and
/// either a definition or, failing that, a comment produce an entry keyed by
/// the normalized label. A malformed document keeps whatever was extracted
/// before the error. Returns the number of entries added.
pub fn parse_ontology(content: &[u8], definitions: &mut DefinitionMap) -> usize {
    let mut added = 0;
    let result = for_each_record(content, &ONTOLOGY_SPEC, |fields| {
        let [label, definition, comment] = fields else {
            return;
        };
        let Some(label) = label else {
            return;
        };
        let Some(text) = definition.as_ref().or(comment.as_ref()) else {
            return;
        };
        if definitions.insert_first(normalize_label(label), extract_sentence(text)) {
            added += 1;
        }
    });

    if let Err(e) = result {
        debug!(error = %e, added, "ontology document only partially parsed");
    }
    added
}

/// Scan `text` line by line for `owl:imports` references, keeping those
/// whose URL contains one of `filters`, at most `limit` of them.
pub fn import_urls(text: &str, filters: &[String], limit: usize) -> Vec<String> {
    text.lines()
        .filter(|line| line.contains("owl:imports"))
        .filter_map(|line| {
            let start = line.find(RESOURCE_ATTR)? + RESOURCE_ATTR.len();
            let end = line[start..].find('"')? + start;
            Some(&line[start..end])
        })
        .filter(|url| filters.iter().any(|f| url.contains(f.as_str())))
        .take(limit)
        .map(str::to_string)
        .collect()
}
