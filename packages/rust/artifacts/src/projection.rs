//! Projections of the consolidated entry set into the output documents.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, instrument};

use glossary_shared::{
    BuildMeta, ConsolidatedEntry, DetailBlock, EntryExamples, LocalizedText, SourceRef,
};

/// Which language an index is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// Canonical source-language terms with their aliases.
    En,
    /// Target-language terms, no aliases.
    Zh,
}

/// One row of a lookup index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexItem {
    pub id: String,
    pub term: String,
    pub aliases: Vec<String>,
    pub category: String,
}

/// One value of the detail map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailItem {
    pub id: String,
    pub term: String,
    pub zh_term: String,
    pub definition: LocalizedText,
    pub examples: EntryExamples,
    pub category: String,
    pub sources: Vec<SourceRef>,
    pub detail: DetailBlock,
}

/// One row of the minimal dictionary export. `pinyin` is always empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DictionaryEntry {
    pub traditional: String,
    pub simplified: String,
    pub pinyin: String,
    pub english: String,
}

/// A lookup index document.
#[derive(Debug, Clone, Serialize)]
pub struct IndexDocument {
    pub meta: BuildMeta,
    pub items: Vec<IndexItem>,
}

/// The detail document.
#[derive(Debug, Clone, Serialize)]
pub struct DetailDocument {
    pub meta: BuildMeta,
    pub items: BTreeMap<String, DetailItem>,
}

/// Every document produced by one build.
#[derive(Debug, Clone)]
pub struct GlossaryArtifacts {
    pub en_index: IndexDocument,
    pub zh_index: IndexDocument,
    pub detail: DetailDocument,
    pub dictionary: Vec<DictionaryEntry>,
}

/// Sort entries case-insensitively by term and keep the first `target_total`.
///
/// The sort is stable, so entries with terms differing only in case keep
/// their consolidation order.
pub fn select_entries(
    mut entries: Vec<ConsolidatedEntry>,
    target_total: usize,
) -> Vec<ConsolidatedEntry> {
    entries.sort_by_cached_key(|entry| entry.term.to_lowercase());
    if entries.len() > target_total {
        debug!(
            dropped = entries.len() - target_total,
            target_total, "truncating to target total"
        );
        entries.truncate(target_total);
    }
    entries
}

/// Build the lookup index for `language`.
pub fn index_items(entries: &[ConsolidatedEntry], language: Language) -> Vec<IndexItem> {
    entries
        .iter()
        .map(|entry| match language {
            Language::En => IndexItem {
                id: entry.id.clone(),
                term: entry.term.clone(),
                aliases: entry.aliases.clone(),
                category: entry.category.clone(),
            },
            Language::Zh => IndexItem {
                id: entry.id.clone(),
                term: zh_term_or_term(entry).to_string(),
                aliases: Vec::new(),
                category: entry.category.clone(),
            },
        })
        .collect()
}

/// Build the id-keyed detail map.
pub fn detail_items(entries: &[ConsolidatedEntry]) -> BTreeMap<String, DetailItem> {
    entries
        .iter()
        .map(|entry| {
            let item = DetailItem {
                id: entry.id.clone(),
                term: entry.term.clone(),
                zh_term: zh_term_or_term(entry).to_string(),
                definition: entry.definition.clone(),
                examples: entry.examples.clone(),
                category: entry.category.clone(),
                sources: entry.sources.clone(),
                detail: entry.detail.clone(),
            };
            (entry.id.clone(), item)
        })
        .collect()
}

/// Pair the target-language term of the first `limit` entries with the
/// canonical term. Both script variants carry the same text and the
/// phonetic field stays empty.
pub fn dictionary_export(entries: &[ConsolidatedEntry], limit: usize) -> Vec<DictionaryEntry> {
    entries
        .iter()
        .take(limit)
        .map(|entry| {
            let zh = if entry.zh_term.is_empty() {
                entry.definition.zh.clone()
            } else {
                entry.zh_term.clone()
            };
            DictionaryEntry {
                traditional: zh.clone(),
                simplified: zh,
                pinyin: String::new(),
                english: entry.term.clone(),
            }
        })
        .collect()
}

/// Select, sort and project `entries` into every output document.
#[instrument(skip_all, fields(entries = entries.len(), target_total = target_total))]
pub fn project(
    entries: Vec<ConsolidatedEntry>,
    meta: BuildMeta,
    target_total: usize,
    dictionary_limit: usize,
) -> GlossaryArtifacts {
    let selected = select_entries(entries, target_total);

    let artifacts = GlossaryArtifacts {
        en_index: IndexDocument {
            meta: meta.clone(),
            items: index_items(&selected, Language::En),
        },
        zh_index: IndexDocument {
            meta: meta.clone(),
            items: index_items(&selected, Language::Zh),
        },
        detail: DetailDocument {
            meta,
            items: detail_items(&selected),
        },
        dictionary: dictionary_export(&selected, dictionary_limit),
    };

    debug!(
        items = artifacts.en_index.items.len(),
        dictionary = artifacts.dictionary.len(),
        "artifacts projected"
    );
    artifacts
}

fn zh_term_or_term(entry: &ConsolidatedEntry) -> &str {
    if entry.zh_term.is_empty() {
        &entry.term
    } else {
        &entry.zh_term
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossary_shared::{DomainStats, LimitsMeta, Scenarios};

    fn entry(id: &str, term: &str, zh_term: &str) -> ConsolidatedEntry {
        let definition = LocalizedText {
            en: format!("{term} definition"),
            zh: format!("{term} 定义"),
        };
        ConsolidatedEntry {
            id: id.into(),
            term: term.into(),
            aliases: vec![format!("{term}s")],
            definition: definition.clone(),
            examples: EntryExamples::default(),
            category: "Finance".into(),
            sources: vec![],
            zh_term: zh_term.into(),
            detail: DetailBlock {
                definition: definition.clone(),
                detailed_explanation: definition,
                scenarios: Scenarios::default(),
                examples: vec![],
                pitfalls: vec![],
                related: vec![],
            },
        }
    }

    fn meta() -> BuildMeta {
        BuildMeta {
            schema_version: 2,
            generated_at: "2026-01-01T00:00:00Z".into(),
            sources: vec![],
            domain_stats: DomainStats::new(),
            limits: LimitsMeta {
                target_total: 2,
                domain_limit: 10,
                root_limit: 5,
            },
        }
    }

    #[test]
    fn selection_is_case_insensitive_and_truncated() {
        let entries = vec![
            entry("Q3", "bond", "债券"),
            entry("Q1", "Annuity", "年金"),
            entry("Q2", "asset", "资产"),
            entry("Q4", "Coupon", "息票"),
        ];
        let selected = select_entries(entries, 3);
        let terms: Vec<_> = selected.iter().map(|e| e.term.as_str()).collect();
        assert_eq!(terms, vec!["Annuity", "asset", "bond"]);
    }

    #[test]
    fn selection_keeps_everything_under_target() {
        let selected = select_entries(vec![entry("Q1", "b", "乙"), entry("Q2", "a", "甲")], 10);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].id, "Q2");
    }

    #[test]
    fn zh_index_falls_back_to_term_and_drops_aliases() {
        let entries = vec![entry("Q1", "ledger", ""), entry("Q2", "loan", "贷款")];
        let zh = index_items(&entries, Language::Zh);
        assert_eq!(zh[0].term, "ledger");
        assert_eq!(zh[1].term, "贷款");
        assert!(zh.iter().all(|item| item.aliases.is_empty()));

        let en = index_items(&entries, Language::En);
        assert_eq!(en[1].aliases, vec!["loans"]);
    }

    #[test]
    fn detail_map_is_keyed_by_id() {
        let items = detail_items(&[entry("Q7", "equity", "股本")]);
        let json = serde_json::to_value(&items).unwrap();
        assert_eq!(json["Q7"]["zhTerm"], "股本");
        assert_eq!(json["Q7"]["definition"]["zh_CN"], "equity 定义");
        assert!(json["Q7"]["detail"].get("detailedExplanation").is_some());
    }

    #[test]
    fn dictionary_export_takes_first_entries() {
        let entries = vec![entry("Q1", "asset", "资产"), entry("Q2", "bond", ""), entry("Q3", "coupon", "息票")];
        let export = dictionary_export(&entries, 2);
        assert_eq!(export.len(), 2);
        assert_eq!(export[0].simplified, "资产");
        assert_eq!(export[0].traditional, "资产");
        assert_eq!(export[0].pinyin, "");
        assert_eq!(export[1].simplified, "bond 定义");
        assert_eq!(export[1].english, "bond");
    }

    #[test]
    fn project_shares_meta_and_selection() {
        let entries = vec![entry("Q2", "b", "乙"), entry("Q1", "a", "甲"), entry("Q3", "c", "丙")];
        let artifacts = project(entries, meta(), 2, 600);

        assert_eq!(artifacts.en_index.items.len(), 2);
        assert_eq!(artifacts.zh_index.items[0].term, "甲");
        assert_eq!(artifacts.detail.items.len(), 2);
        assert!(!artifacts.detail.items.contains_key("Q3"));
        assert_eq!(artifacts.dictionary.len(), 2);
        assert_eq!(artifacts.en_index.meta, artifacts.detail.meta);
    }
}
