//! Application configuration for the glossary builder.
//!
//! User config lives at `~/.glossary-builder/glossary.toml`.
//! CLI flags override config file values, which override defaults.
//! Every caps/URL/timeout constant of the pipeline is a field here so tests
//! can inject small caps and mock endpoints.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GlossaryError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "glossary.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".glossary-builder";

// ---------------------------------------------------------------------------
// Config structs (matching glossary.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network retrieval and cache settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Result caps applied during collection and assembly.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Structured-query endpoint settings.
    #[serde(default)]
    pub sparql: SparqlConfig,

    /// Compressed-XML dictionary source.
    #[serde(default)]
    pub dictionary: DictionaryConfig,

    /// Ontology source.
    #[serde(default)]
    pub ontology: OntologyConfig,

    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Domains and their root concepts, in query order.
    #[serde(default = "default_domains")]
    pub domains: Vec<DomainConfig>,

    /// Authoritative-source precedence, applied in order. Curated domain
    /// detail is always applied after these rows.
    #[serde(default = "default_overrides")]
    pub overrides: Vec<OverrideRule>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            limits: LimitsConfig::default(),
            sparql: SparqlConfig::default(),
            dictionary: DictionaryConfig::default(),
            ontology: OntologyConfig::default(),
            paths: PathsConfig::default(),
            domains: default_domains(),
            overrides: default_overrides(),
        }
    }
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Delay before every attempt, including the first.
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// Maximum attempts per request.
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Base backoff; the wait after attempt `n` is `n * retry_backoff_ms`.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Backoff multiplier applied after an HTTP 429.
    #[serde(default = "default_rate_limit_multiplier")]
    pub rate_limit_multiplier: u32,

    /// Connect timeout and the longest allowed gap between body reads.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Directory holding cached JSON responses and downloaded files.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Age after which the sweep removes cache files.
    #[serde(default = "default_cache_ttl_days")]
    pub cache_ttl_days: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_delay_ms: default_request_delay(),
            retry_limit: default_retry_limit(),
            retry_backoff_ms: default_retry_backoff(),
            rate_limit_multiplier: default_rate_limit_multiplier(),
            timeout_secs: default_timeout(),
            cache_dir: default_cache_dir(),
            cache_ttl_days: default_cache_ttl_days(),
        }
    }
}

fn default_user_agent() -> String {
    concat!("GlossaryBuilder/", env!("CARGO_PKG_VERSION"), " (data build)").into()
}
fn default_request_delay() -> u64 {
    600
}
fn default_retry_limit() -> u32 {
    4
}
fn default_retry_backoff() -> u64 {
    1200
}
fn default_rate_limit_multiplier() -> u32 {
    3
}
fn default_timeout() -> u64 {
    60
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from(".cache")
}
fn default_cache_ttl_days() -> u64 {
    14
}

/// `[limits]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum number of entries emitted.
    #[serde(default = "default_target_total")]
    pub target_total: usize,

    /// Distinct-entity cap per domain, checked after each root.
    #[serde(default = "default_domain_limit")]
    pub domain_limit: usize,

    /// Row limit passed to each root query.
    #[serde(default = "default_root_limit")]
    pub root_limit: usize,

    /// Generated aliases allowed on top of the curated ones.
    #[serde(default = "default_max_auto_aliases")]
    pub max_auto_aliases: usize,

    /// Number of entries in the minimal dictionary export.
    #[serde(default = "default_dictionary_export_limit")]
    pub dictionary_export_limit: usize,

    /// Minimum letters / alphanumerics ratio for a clean source term.
    #[serde(default = "default_min_letter_ratio")]
    pub min_letter_ratio: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            target_total: default_target_total(),
            domain_limit: default_domain_limit(),
            root_limit: default_root_limit(),
            max_auto_aliases: default_max_auto_aliases(),
            dictionary_export_limit: default_dictionary_export_limit(),
            min_letter_ratio: default_min_letter_ratio(),
        }
    }
}

fn default_target_total() -> usize {
    3000
}
fn default_domain_limit() -> usize {
    800
}
fn default_root_limit() -> usize {
    300
}
fn default_max_auto_aliases() -> usize {
    1
}
fn default_dictionary_export_limit() -> usize {
    600
}
fn default_min_letter_ratio() -> f64 {
    0.4
}

/// `[sparql]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparqlConfig {
    /// Query endpoint URL.
    #[serde(default = "default_sparql_endpoint")]
    pub endpoint: String,

    /// Server-side query timeout passed as a URL parameter.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,

    /// Language tag of the source-language labels.
    #[serde(default = "default_source_lang")]
    pub source_lang: String,

    /// Accepted language tags for target-language labels and descriptions.
    #[serde(default = "default_target_lang_tags")]
    pub target_lang_tags: Vec<String>,
}

impl Default for SparqlConfig {
    fn default() -> Self {
        Self {
            endpoint: default_sparql_endpoint(),
            query_timeout_secs: default_query_timeout(),
            source_lang: default_source_lang(),
            target_lang_tags: default_target_lang_tags(),
        }
    }
}

fn default_sparql_endpoint() -> String {
    "https://query.wikidata.org/sparql".into()
}
fn default_query_timeout() -> u64 {
    40
}
fn default_source_lang() -> String {
    "en".into()
}
fn default_target_lang_tags() -> Vec<String> {
    vec!["zh".into(), "zh-hans".into(), "zh-hant".into()]
}

/// `[dictionary]` section (gzip-compressed descriptor XML).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryConfig {
    /// Release year, recorded in the metadata block.
    #[serde(default = "default_dictionary_year")]
    pub year: u32,

    /// Download URL of the compressed descriptor file.
    #[serde(default = "default_dictionary_url")]
    pub url: String,

    /// File name of the download inside the cache directory.
    #[serde(default = "default_dictionary_cache_file")]
    pub cache_file: String,

    /// Provenance name.
    #[serde(default = "default_dictionary_name")]
    pub name: String,

    /// Provenance license tag.
    #[serde(default = "default_dictionary_license")]
    pub license: String,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            year: default_dictionary_year(),
            url: default_dictionary_url(),
            cache_file: default_dictionary_cache_file(),
            name: default_dictionary_name(),
            license: default_dictionary_license(),
        }
    }
}

fn default_dictionary_year() -> u32 {
    2026
}
fn default_dictionary_url() -> String {
    format!(
        "https://nlmpubs.nlm.nih.gov/projects/mesh/MESH_FILES/xmlmesh/desc{}.gz",
        default_dictionary_year()
    )
}
fn default_dictionary_cache_file() -> String {
    format!("mesh_desc_{}.gz", default_dictionary_year())
}
fn default_dictionary_name() -> String {
    "mesh".into()
}
fn default_dictionary_license() -> String {
    "NLM Terms and Conditions".into()
}

/// `[ontology]` section (RDF/XML ontology with imports).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyConfig {
    /// URL of the root ontology document.
    #[serde(default = "default_ontology_url")]
    pub url: String,

    /// File name of the root download inside the cache directory.
    #[serde(default = "default_ontology_cache_file")]
    pub cache_file: String,

    /// Only imports whose URL contains one of these substrings are followed.
    #[serde(default = "default_import_filters")]
    pub import_filters: Vec<String>,

    /// Maximum number of imports followed.
    #[serde(default = "default_import_limit")]
    pub import_limit: usize,

    /// Byte budget for each imported document.
    #[serde(default = "default_ontology_max_bytes")]
    pub max_bytes: u64,

    /// Provenance name.
    #[serde(default = "default_ontology_name")]
    pub name: String,

    /// Provenance license tag.
    #[serde(default = "default_ontology_license")]
    pub license: String,

    /// Upstream version label, recorded in the metadata block.
    #[serde(default = "default_ontology_version")]
    pub version: String,
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            url: default_ontology_url(),
            cache_file: default_ontology_cache_file(),
            import_filters: default_import_filters(),
            import_limit: default_import_limit(),
            max_bytes: default_ontology_max_bytes(),
            name: default_ontology_name(),
            license: default_ontology_license(),
            version: default_ontology_version(),
        }
    }
}

impl OntologyConfig {
    /// Comma-joined module subset derived from the import filters
    /// (`/FND/` → `FND`).
    pub fn subset(&self) -> String {
        self.import_filters
            .iter()
            .map(|f| f.trim_matches('/'))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn default_ontology_url() -> String {
    "https://raw.githubusercontent.com/edmcouncil/fibo/master/AboutFIBOProd-TBoxOnly.rdf".into()
}
fn default_ontology_cache_file() -> String {
    "fibo_prod_tbox.rdf".into()
}
fn default_import_filters() -> Vec<String> {
    vec!["/FND/".into(), "/FBC/".into(), "/SEC/".into()]
}
fn default_import_limit() -> usize {
    25
}
fn default_ontology_max_bytes() -> u64 {
    8 * 1024 * 1024
}
fn default_ontology_name() -> String {
    "fibo".into()
}
fn default_ontology_license() -> String {
    "MIT".into()
}
fn default_ontology_version() -> String {
    "master".into()
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// JSON map of lowercased term → curated alias list.
    #[serde(default = "default_aliases_file")]
    pub aliases_file: PathBuf,

    /// Directory of `*.json` curated domain-detail collections.
    #[serde(default = "default_domain_details_dir")]
    pub domain_details_dir: PathBuf,

    /// Directory the output artifacts are written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            aliases_file: default_aliases_file(),
            domain_details_dir: default_domain_details_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_aliases_file() -> PathBuf {
    PathBuf::from("data/aliases_en.json")
}
fn default_domain_details_dir() -> PathBuf {
    PathBuf::from("data/domains")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

/// `[[domains]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Display name, also used as the entry category.
    pub name: String,
    /// Root concept identifiers, queried in order.
    pub roots: Vec<String>,
}

impl DomainConfig {
    fn new(name: &str, roots: &[&str]) -> Self {
        Self {
            name: name.into(),
            roots: roots.iter().map(|r| (*r).to_string()).collect(),
        }
    }
}

fn default_domains() -> Vec<DomainConfig> {
    vec![
        DomainConfig::new(
            "Software Engineering",
            &["Q80993", "Q21198", "Q8366", "Q175263", "Q9143"],
        ),
        DomainConfig::new("Finance", &["Q8134", "Q3435731", "Q247506"]),
        DomainConfig::new("Legal", &["Q7748", "Q2135465", "Q820655"]),
        DomainConfig::new("Medical", &["Q11190", "Q12136", "Q796194", "Q12140"]),
    ]
}

/// Which authoritative definition source an override row draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideSource {
    /// Keyed by the entity's external dictionary identifier.
    Dictionary,
    /// Keyed by the normalized source-language label.
    Ontology,
}

/// `[[overrides]]` entry: entities of `domain` take their source-language
/// definition from `source` when it has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRule {
    pub source: OverrideSource,
    pub domain: String,
}

fn default_overrides() -> Vec<OverrideRule> {
    vec![
        OverrideRule {
            source: OverrideSource::Dictionary,
            domain: "Medical".into(),
        },
        OverrideRule {
            source: OverrideSource::Ontology,
            domain: "Finance".into(),
        },
    ]
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.glossary-builder/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GlossaryError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.glossary-builder/glossary.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| GlossaryError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        GlossaryError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| GlossaryError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| GlossaryError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| GlossaryError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

impl AppConfig {
    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.retry_limit == 0 {
            return Err(GlossaryError::config("fetch.retry_limit must be at least 1"));
        }
        if self.domains.is_empty() {
            return Err(GlossaryError::config("at least one [[domains]] entry is required"));
        }
        if let Some(domain) = self.domains.iter().find(|d| d.name.trim().is_empty()) {
            return Err(GlossaryError::config(format!(
                "domain with roots {:?} has an empty name",
                domain.roots
            )));
        }
        if !(0.0..=1.0).contains(&self.limits.min_letter_ratio) {
            return Err(GlossaryError::config(
                "limits.min_letter_ratio must be between 0 and 1",
            ));
        }
        Ok(())
    }

    /// Path of the cached dictionary download.
    pub fn dictionary_cache_path(&self) -> PathBuf {
        self.fetch.cache_dir.join(&self.dictionary.cache_file)
    }

    /// Path of the cached ontology root document.
    pub fn ontology_cache_path(&self) -> PathBuf {
        self.fetch.cache_dir.join(&self.ontology.cache_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("retry_limit"));
        assert!(toml_str.contains("Software Engineering"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.limits.domain_limit, 800);
        assert_eq!(parsed.domains.len(), 4);
        assert_eq!(parsed.overrides, default_overrides());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[limits]
target_total = 10

[[domains]]
name = "Legal"
roots = ["Q7748"]

[[overrides]]
source = "ontology"
domain = "Legal"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.limits.target_total, 10);
        assert_eq!(config.limits.root_limit, 300);
        assert_eq!(config.domains.len(), 1);
        assert_eq!(config.overrides[0].source, OverrideSource::Ontology);
        assert_eq!(config.fetch.retry_limit, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_zero_retries() {
        let mut config = AppConfig::default();
        config.fetch.retry_limit = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retry_limit"));
    }

    #[test]
    fn ontology_subset_from_filters() {
        assert_eq!(OntologyConfig::default().subset(), "FND,FBC,SEC");
    }
}
