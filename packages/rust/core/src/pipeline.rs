//! End-to-end build: collect → load sources → consolidate → project → write.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, instrument};

use glossary_artifacts::{build_meta, project};
use glossary_fetch::{Fetcher, JsonCache};
use glossary_shared::{AppConfig, DomainStats, OverrideSource, Result};
use glossary_sources::{
    ConceptSource, DefinitionMap, OntologyLoader, SparqlAdapter, load_dictionary_definitions,
};

use crate::collector::collect;
use crate::consolidator::{AuthoritativeSources, Consolidator, DropReason};
use crate::curated::{load_alias_overrides, load_domain_details};
use crate::writer::{ArtifactMeta, write_artifacts};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Result of a glossary build.
#[derive(Debug)]
pub struct BuildResult {
    /// Directory the artifacts were written to.
    pub output_dir: PathBuf,
    /// Number of domains queried.
    pub domains_queried: usize,
    /// Distinct entities reached per domain, in query order.
    pub domain_stats: DomainStats,
    /// Distinct entities collected across all domains.
    pub total_fetched: usize,
    /// Entries written to the indexes.
    pub emitted: usize,
    /// Entities dropped by validation, per reason.
    pub dropped: BTreeMap<DropReason, usize>,
    /// Written files with checksums.
    pub artifacts: Vec<ArtifactMeta>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

impl BuildResult {
    /// Total entities dropped by validation.
    pub fn missing(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each root concept query.
    fn root_queried(&self, domain: &str, root: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn root_queried(&self, _domain: &str, _root: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Run the full build against the configured structured-query endpoint.
pub async fn build_glossary(
    config: &AppConfig,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let fetcher = Fetcher::new(config.fetch.clone())?;
    let adapter = SparqlAdapter::new(&fetcher, config.sparql.clone());
    build_with_source(config, &fetcher, &adapter, progress).await
}

/// Run the full build with `source` supplying concept rows.
///
/// 1. Collect entities per domain and root
/// 2. Load the authoritative sources named by the override policy
/// 3. Load curated aliases and domain detail
/// 4. Consolidate
/// 5. Sort, truncate and project
/// 6. Write the artifacts atomically
///
/// Nothing is written until every entity has been consolidated.
#[instrument(skip_all, fields(output_dir = %config.paths.output_dir.display()))]
pub async fn build_with_source<S: ConceptSource>(
    config: &AppConfig,
    fetcher: &Fetcher,
    source: &S,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();
    info!(domains = config.domains.len(), "starting glossary build");

    // --- Phase 1: Collect ---
    progress.phase("Collecting concepts");
    let collection = collect(source, &config.domains, &config.limits, progress).await?;

    // --- Phase 2: Authoritative sources ---
    progress.phase("Loading authoritative sources");
    let sources = load_authoritative_sources(config, fetcher).await;

    // --- Phase 3: Curated inputs ---
    progress.phase("Loading curated overrides");
    let aliases = load_alias_overrides(&config.paths.aliases_file)?;
    let details = load_domain_details(&config.paths.domain_details_dir)?;

    // --- Phase 4: Consolidate ---
    progress.phase("Consolidating entries");
    let consolidation = Consolidator::new(config, &sources, &aliases, &details)
        .consolidate(collection.entities.records());

    // --- Phase 5: Project ---
    progress.phase("Assembling artifacts");
    let meta = build_meta(config, &collection.domain_stats, Utc::now());
    let artifacts = project(
        consolidation.entries,
        meta,
        config.limits.target_total,
        config.limits.dictionary_export_limit,
    );
    let emitted = artifacts.en_index.items.len();

    // --- Phase 6: Write ---
    progress.phase("Writing artifacts");
    let written = write_artifacts(&config.paths.output_dir, &artifacts)?;

    let result = BuildResult {
        output_dir: config.paths.output_dir.clone(),
        domains_queried: config.domains.len(),
        domain_stats: collection.domain_stats,
        total_fetched: collection.entities.len(),
        emitted,
        dropped: consolidation.dropped,
        artifacts: written,
        elapsed: start.elapsed(),
    };

    info!(
        fetched = result.total_fetched,
        emitted = result.emitted,
        missing = result.missing(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "glossary build complete"
    );

    progress.done(&result);
    Ok(result)
}

/// Load each authoritative source the override policy refers to. Sources
/// no rule uses are not fetched. Both degrade to empty on failure.
async fn load_authoritative_sources(config: &AppConfig, fetcher: &Fetcher) -> AuthoritativeSources {
    let uses = |source: OverrideSource| config.overrides.iter().any(|rule| rule.source == source);

    let dictionary = if uses(OverrideSource::Dictionary) {
        load_dictionary_definitions(fetcher, &config.dictionary, &config.dictionary_cache_path())
            .await
    } else {
        DefinitionMap::new()
    };

    let ontology = if uses(OverrideSource::Ontology) {
        OntologyLoader::new(fetcher, &config.ontology)
            .load(&config.ontology_cache_path())
            .await
    } else {
        DefinitionMap::new()
    };

    AuthoritativeSources {
        dictionary,
        ontology,
    }
}

/// Delete cache files older than the configured TTL. Returns how many were removed.
pub fn sweep_cache(config: &AppConfig) -> Result<usize> {
    let ttl = Duration::from_secs(config.fetch.cache_ttl_days.saturating_mul(SECS_PER_DAY));
    JsonCache::new(config.fetch.cache_dir.clone()).sweep_expired(ttl)
}
