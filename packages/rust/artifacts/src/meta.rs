//! Metadata block: provenance, licensing and the limits applied.

use chrono::{DateTime, Utc};

use glossary_shared::{AppConfig, BuildMeta, DomainStats, LimitsMeta, SCHEMA_VERSION, SourceMeta};

/// Name and license of the baseline structured-query source.
const BASELINE_SOURCE: &str = "wikidata";
const BASELINE_LICENSE: &str = "CC0";

/// Render `at` as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Build the metadata block written into every document.
///
/// `domain_stats` is reported as-is; it never influences the projections.
pub fn build_meta(
    config: &AppConfig,
    domain_stats: &DomainStats,
    generated_at: DateTime<Utc>,
) -> BuildMeta {
    let sources = vec![
        SourceMeta {
            name: BASELINE_SOURCE.into(),
            license: BASELINE_LICENSE.into(),
            year: None,
            version: None,
            subset: None,
            import_limit: None,
        },
        SourceMeta {
            name: config.dictionary.name.clone(),
            license: config.dictionary.license.clone(),
            year: Some(config.dictionary.year),
            version: None,
            subset: None,
            import_limit: None,
        },
        SourceMeta {
            name: config.ontology.name.clone(),
            license: config.ontology.license.clone(),
            year: None,
            version: Some(config.ontology.version.clone()),
            subset: Some(config.ontology.subset()),
            import_limit: Some(config.ontology.import_limit),
        },
    ];

    BuildMeta {
        schema_version: SCHEMA_VERSION,
        generated_at: format_timestamp(generated_at),
        sources,
        domain_stats: domain_stats.clone(),
        limits: LimitsMeta {
            target_total: config.limits.target_total,
            domain_limit: config.limits.domain_limit,
            root_limit: config.limits.root_limit,
        },
    }
}
