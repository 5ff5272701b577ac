//! Collector: drives the concept source across domains and roots and merges
//! the rows into one deduplicated entity table.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument};

use glossary_shared::{DomainConfig, DomainStats, EntityRecord, LimitsConfig, Result};
use glossary_sources::{ConceptSource, SparqlRow, columns};

use crate::pipeline::ProgressReporter;

/// Entities keyed by id, kept in discovery order.
#[derive(Debug, Clone, Default)]
pub struct EntityTable {
    records: Vec<EntityRecord>,
    index: HashMap<String, usize>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `record`, or when its id is already known, only record
    /// `domain` on the existing entry. Returns `true` for a new entity.
    pub fn upsert(&mut self, record: EntityRecord, domain: &str) -> bool {
        if let Some(&pos) = self.index.get(&record.id) {
            self.records[pos].add_domain(domain);
            return false;
        }
        let mut record = record;
        record.add_domain(domain);
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn get(&self, id: &str) -> Option<&EntityRecord> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[EntityRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<EntityRecord> {
        self.records
    }
}

/// Output of [`collect`].
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub entities: EntityTable,
    /// Distinct entities reached per domain, in query order. Reported only.
    pub domain_stats: DomainStats,
    /// Rows returned across all queries, before deduplication.
    pub rows_seen: usize,
    /// Rows skipped for lacking an id or a label.
    pub rows_skipped: usize,
}

/// Query every root of every domain and merge the rows.
///
/// Each root is queried with `limits.root_limit`. Once a domain has reached
/// `limits.domain_limit` distinct entities no further roots are issued for
/// it; the check runs after a root's rows are merged, so a root's results
/// are never cut short. A failing query aborts the collection.
#[instrument(skip_all, fields(domains = domains.len()))]
pub async fn collect<S: ConceptSource>(
    source: &S,
    domains: &[DomainConfig],
    limits: &LimitsConfig,
    progress: &dyn ProgressReporter,
) -> Result<Collection> {
    let mut collection = Collection::default();
    let total_roots: usize = domains.iter().map(|d| d.roots.len()).sum();
    let mut queried = 0;

    for domain in domains {
        let mut seen: HashSet<String> = HashSet::new();

        for root in &domain.roots {
            queried += 1;
            progress.root_queried(&domain.name, root, queried, total_roots);

            let rows = source.query_root(root, limits.root_limit).await?;
            collection.rows_seen += rows.len();

            for row in &rows {
                let Some(record) = entity_from_row(row) else {
                    collection.rows_skipped += 1;
                    continue;
                };
                seen.insert(record.id.clone());
                collection.entities.upsert(record, &domain.name);
            }

            debug!(domain = %domain.name, %root, rows = rows.len(), distinct = seen.len(), "root merged");

            if seen.len() >= limits.domain_limit {
                debug!(domain = %domain.name, limit = limits.domain_limit, "domain limit reached");
                break;
            }
        }

        info!(domain = %domain.name, entities = seen.len(), "domain collected");
        collection.domain_stats.insert(domain.name.clone(), seen.len());
    }

    info!(
        entities = collection.entities.len(),
        rows = collection.rows_seen,
        skipped = collection.rows_skipped,
        "collection complete"
    );
    Ok(collection)
}

/// Interpret one result row. The id is the last path segment of the entity
/// URI. Rows without an id or either label are rejected.
pub fn entity_from_row(row: &SparqlRow) -> Option<EntityRecord> {
    let value = |column: &str| row.get(column).map(|b| b.value.as_str());

    let id = value(columns::ITEM)?.rsplit('/').next()?.trim();
    if id.is_empty() {
        return None;
    }
    let label_en = value(columns::LABEL_EN)?;
    let label_zh = value(columns::LABEL_ZH)?;

    Some(EntityRecord {
        id: id.to_string(),
        label_en: label_en.to_string(),
        label_zh: label_zh.to_string(),
        desc_en: value(columns::DESC_EN).unwrap_or_default().to_string(),
        desc_zh: value(columns::DESC_ZH).unwrap_or_default().to_string(),
        dictionary_id: value(columns::DICTIONARY_ID)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        domains: Vec::new(),
    })
}
