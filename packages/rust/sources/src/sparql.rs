//! Structured-query adapter: root-scoped concept retrieval over SPARQL.
//!
//! The adapter builds one fixed query template per root concept and returns
//! the result bindings untouched. Deduplication and interpretation belong to
//! the collector.

use std::collections::BTreeMap;
use std::future::Future;

use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use glossary_fetch::Fetcher;
use glossary_shared::{GlossaryError, Result, SparqlConfig};

/// Result column names produced by [`build_query`].
pub mod columns {
    pub const ITEM: &str = "item";
    pub const LABEL_EN: &str = "itemLabelEn";
    pub const LABEL_ZH: &str = "itemLabelZh";
    pub const DESC_EN: &str = "enDesc";
    pub const DESC_ZH: &str = "zhDesc";
    pub const DICTIONARY_ID: &str = "meshId";
}

/// One bound value in a result row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BindingValue {
    pub value: String,
}

impl BindingValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// A result row: column name → bound value. Optional columns may be absent.
pub type SparqlRow = BTreeMap<String, BindingValue>;

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    #[serde(default)]
    results: SparqlResults,
}

#[derive(Debug, Default, Deserialize)]
struct SparqlResults {
    #[serde(default)]
    bindings: Vec<SparqlRow>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Anything that can list the concepts under a root.
///
/// [`SparqlAdapter`] is the network implementation; tests substitute
/// in-memory sources.
pub trait ConceptSource {
    /// Rows for entities that are transitive instances/subclasses of `root`,
    /// at most `limit` of them.
    fn query_root(&self, root: &str, limit: usize) -> impl Future<Output = Result<Vec<SparqlRow>>>;
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// SPARQL-over-HTTP concept source backed by the cached JSON fetch path.
pub struct SparqlAdapter<'a> {
    fetcher: &'a Fetcher,
    config: SparqlConfig,
}

impl<'a> SparqlAdapter<'a> {
    pub fn new(fetcher: &'a Fetcher, config: SparqlConfig) -> Self {
        Self { fetcher, config }
    }

    /// Full request URL for `query`.
    pub fn query_url(&self, query: &str) -> Result<String> {
        let timeout = self.config.query_timeout_secs.to_string();
        let url = Url::parse_with_params(
            &self.config.endpoint,
            &[("format", "json"), ("timeout", timeout.as_str()), ("query", query)],
        )
        .map_err(|e| {
            GlossaryError::config(format!("invalid SPARQL endpoint {}: {e}", self.config.endpoint))
        })?;
        Ok(url.to_string())
    }
}

impl ConceptSource for SparqlAdapter<'_> {
    #[instrument(skip_all, fields(root = %root, limit = limit))]
    async fn query_root(&self, root: &str, limit: usize) -> Result<Vec<SparqlRow>> {
        let query = build_query(root, limit, &self.config)?;
        let url = self.query_url(&query)?;
        let value = self.fetcher.fetch_json(&url).await?;

        let response: SparqlResponse = serde_json::from_value(value)
            .map_err(|e| GlossaryError::parse(format!("unexpected SPARQL response: {e}")))?;

        debug!(rows = response.results.bindings.len(), "root query returned");
        Ok(response.results.bindings)
    }
}

/// Build the query for `root`.
///
/// Selects each entity with its source-language label and description,
/// its target-language label and description (any of the configured
/// language tags) and the optional external dictionary id, restricted to
/// entities reachable from `root` through instance-of/subclass-of chains.
pub fn build_query(root: &str, limit: usize, config: &SparqlConfig) -> Result<String> {
    if root.is_empty() || !root.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(GlossaryError::validation(format!("invalid root concept id: {root:?}")));
    }

    let source = &config.source_lang;
    let targets = config
        .target_lang_tags
        .iter()
        .map(|tag| format!("\"{tag}\""))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        r#"SELECT ?item ?itemLabelEn ?itemLabelZh ?enDesc ?zhDesc ?meshId
WHERE {{
  VALUES ?root {{ wd:{root} }}
  ?item (wdt:P31/wdt:P279*|wdt:P279*) ?root .
  ?item rdfs:label ?itemLabelEn FILTER(LANG(?itemLabelEn) = "{source}") .
  ?item rdfs:label ?itemLabelZh .
  FILTER(LANG(?itemLabelZh) IN ({targets}))
  ?item schema:description ?enDesc FILTER(LANG(?enDesc) = "{source}")
  ?item schema:description ?zhDesc .
  FILTER(LANG(?zhDesc) IN ({targets}))
  OPTIONAL {{ ?item wdt:P486 ?meshId }}
}}
GROUP BY ?item ?itemLabelEn ?itemLabelZh ?enDesc ?zhDesc ?meshId
LIMIT {limit}"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossary_shared::FetchConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn query_scopes_root_and_languages() {
        let query = build_query("Q9143", 300, &SparqlConfig::default()).unwrap();
        assert!(query.contains("VALUES ?root { wd:Q9143 }"));
        assert!(query.contains(r#"IN ("zh", "zh-hans", "zh-hant")"#));
        assert!(query.contains("OPTIONAL { ?item wdt:P486 ?meshId }"));
        assert!(query.ends_with("LIMIT 300"));
    }

    #[test]
    fn query_rejects_injected_root() {
        assert!(build_query("Q1 } ?x ?y ?z {", 10, &SparqlConfig::default()).is_err());
        assert!(build_query("", 10, &SparqlConfig::default()).is_err());
    }

    #[test]
    fn query_url_encodes_parameters() {
        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        let adapter = SparqlAdapter::new(&fetcher, SparqlConfig::default());
        let url = adapter.query_url("SELECT ?x").unwrap();
        assert!(url.starts_with("https://query.wikidata.org/sparql?format=json&timeout=40&query="));
        assert!(!url.contains(' '));
    }

    #[tokio::test]
    async fn query_root_returns_bindings() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "head": {"vars": ["item"]},
            "results": {"bindings": [
                {
                    "item": {"type": "uri", "value": "http://www.wikidata.org/entity/Q42"},
                    "itemLabelEn": {"type": "literal", "xml:lang": "en", "value": "algorithm"},
                    "itemLabelZh": {"type": "literal", "xml:lang": "zh", "value": "算法"}
                }
            ]}
        });
        Mock::given(method("GET"))
            .and(path("/sparql"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let cache_dir =
            std::env::temp_dir().join(format!("glossary-sparql-test-{}", uuid::Uuid::now_v7()));
        let fetcher = Fetcher::new(FetchConfig {
            request_delay_ms: 0,
            cache_dir: cache_dir.clone(),
            ..FetchConfig::default()
        })
        .unwrap();
        let config = SparqlConfig {
            endpoint: format!("{}/sparql", server.uri()),
            ..SparqlConfig::default()
        };
        let adapter = SparqlAdapter::new(&fetcher, config);

        let rows = adapter.query_root("Q8366", 5).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][columns::LABEL_ZH].value, "算法");
        assert!(!rows[0].contains_key(columns::DICTIONARY_ID));

        let _ = std::fs::remove_dir_all(&cache_dir);
    }

    #[tokio::test]
    async fn missing_results_yield_no_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let cache_dir =
            std::env::temp_dir().join(format!("glossary-sparql-test-{}", uuid::Uuid::now_v7()));
        let fetcher = Fetcher::new(FetchConfig {
            request_delay_ms: 0,
            cache_dir: cache_dir.clone(),
            ..FetchConfig::default()
        })
        .unwrap();
        let config = SparqlConfig {
            endpoint: server.uri(),
            ..SparqlConfig::default()
        };
        let rows = SparqlAdapter::new(&fetcher, config)
            .query_root("Q1", 5)
            .await
            .unwrap();
        assert!(rows.is_empty());

        let _ = std::fs::remove_dir_all(&cache_dir);
    }
}
