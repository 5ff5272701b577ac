//! Consolidator: validates collected entities and reconciles every
//! definition source into one immutable [`ConsolidatedEntry`] per entity.
//!
//! Precedence, lowest to highest:
//! 1. baseline short descriptions from the structured query
//! 2. authoritative sources, applied in the order of the configured
//!    `[[overrides]]` rows (dictionary by identifier, ontology by label)
//! 3. curated domain detail, always last

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use tracing::{debug, info, instrument};

use glossary_shared::{
    AppConfig, ConsolidatedEntry, DetailBlock, DetailExample, EntityRecord, EntryExamples,
    LocalizedText, OverrideRule, OverrideSource, Scenarios, SourceRef,
};
use glossary_sources::{DefinitionMap, extract_sentence, normalize_label};

use crate::curated::{AliasOverrides, DomainDetails};
use crate::terms::{has_cjk, is_term_clean, plural_variant};

/// Category used for entities that were not reached through any domain.
pub const DEFAULT_CATEGORY: &str = "General";

const BASELINE_SOURCE: &str = "wikidata";
const BASELINE_LICENSE: &str = "CC0";

/// Definition maps from the authoritative sources.
#[derive(Debug, Clone, Default)]
pub struct AuthoritativeSources {
    /// Dictionary identifier → definition.
    pub dictionary: DefinitionMap,
    /// Normalized label → definition.
    pub ontology: DefinitionMap,
}

/// Why an entity was left out of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DropReason {
    /// One side of the baseline bilingual definition is empty.
    MissingDefinition,
    /// The source-language term failed the quality heuristic.
    UncleanTerm,
    /// The target-language label is empty or has no CJK character.
    MissingTargetLabel,
    /// The target-language definition has no CJK character.
    UntranslatedDefinition,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::MissingDefinition => "missing bilingual definition",
            Self::UncleanTerm => "unclean term",
            Self::MissingTargetLabel => "missing target-language label",
            Self::UntranslatedDefinition => "untranslated definition",
        };
        f.write_str(reason)
    }
}

/// Output of [`Consolidator::consolidate`].
#[derive(Debug, Clone, Default)]
pub struct Consolidation {
    /// Entries in entity discovery order.
    pub entries: Vec<ConsolidatedEntry>,
    /// Dropped entity count per reason.
    pub dropped: BTreeMap<DropReason, usize>,
}

impl Consolidation {
    /// Total entities dropped.
    pub fn missing(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// Applies the precedence policy to collected entities.
pub struct Consolidator<'a> {
    config: &'a AppConfig,
    sources: &'a AuthoritativeSources,
    aliases: &'a AliasOverrides,
    details: &'a DomainDetails,
}

impl<'a> Consolidator<'a> {
    pub fn new(
        config: &'a AppConfig,
        sources: &'a AuthoritativeSources,
        aliases: &'a AliasOverrides,
        details: &'a DomainDetails,
    ) -> Self {
        Self {
            config,
            sources,
            aliases,
            details,
        }
    }

    /// Consolidate every entity, dropping and tallying those that fail validation.
    #[instrument(skip_all, fields(entities = entities.len()))]
    pub fn consolidate(&self, entities: &[EntityRecord]) -> Consolidation {
        let mut result = Consolidation::default();

        for entity in entities {
            match self.consolidate_entity(entity) {
                Ok(entry) => result.entries.push(entry),
                Err(reason) => {
                    debug!(id = %entity.id, term = %entity.label_en, %reason, "entity dropped");
                    *result.dropped.entry(reason).or_default() += 1;
                }
            }
        }

        info!(
            entries = result.entries.len(),
            dropped = result.missing(),
            "consolidation complete"
        );
        result
    }

    /// Build the entry for one entity, or report why it does not qualify.
    pub fn consolidate_entity(
        &self,
        entity: &EntityRecord,
    ) -> std::result::Result<ConsolidatedEntry, DropReason> {
        let mut definition = LocalizedText {
            en: extract_sentence(&entity.desc_en),
            zh: extract_sentence(&entity.desc_zh),
        };
        let term = entity.label_en.as_str();

        if definition.en.is_empty() || definition.zh.is_empty() {
            return Err(DropReason::MissingDefinition);
        }
        if !is_term_clean(term, self.config.limits.min_letter_ratio) {
            return Err(DropReason::UncleanTerm);
        }
        if !has_cjk(&entity.label_zh) {
            return Err(DropReason::MissingTargetLabel);
        }
        if !has_cjk(&definition.zh) {
            return Err(DropReason::UntranslatedDefinition);
        }

        let mut sources = vec![SourceRef {
            source: BASELINE_SOURCE.into(),
            qid: Some(entity.id.clone()),
            id: None,
            license: BASELINE_LICENSE.into(),
        }];

        for rule in self.rules_for(entity) {
            if let Some((text, source)) = self.authoritative_definition(rule.source, entity) {
                definition.en = text.to_string();
                sources.push(source);
            }
        }

        let detail = self.details.get(term);
        let mut examples = EntryExamples::default();
        if let Some(detail) = detail {
            if !detail.definition_en.is_empty() {
                definition.en = detail.definition_en.clone();
            }
            if !detail.definition_zh.is_empty() {
                definition.zh = detail.definition_zh.clone();
            }
            examples.en = detail.examples_en.clone();
            examples.zh = detail.examples_zh.clone();
        }

        let detail = DetailBlock {
            definition: definition.clone(),
            detailed_explanation: LocalizedText {
                en: non_empty_or(&entity.desc_en, &definition.en),
                zh: non_empty_or(&entity.desc_zh, &definition.zh),
            },
            scenarios: Scenarios::default(),
            examples: detail_examples(&examples),
            pitfalls: Vec::new(),
            related: Vec::new(),
        };

        Ok(ConsolidatedEntry {
            id: entity.id.clone(),
            term: term.to_string(),
            aliases: self.aliases_for(term),
            definition,
            examples,
            category: entity
                .primary_domain()
                .unwrap_or(DEFAULT_CATEGORY)
                .to_string(),
            sources,
            zh_term: entity.label_zh.clone(),
            detail,
        })
    }

    /// Override rows whose domain the entity belongs to, in policy order.
    fn rules_for(&self, entity: &EntityRecord) -> impl Iterator<Item = &OverrideRule> {
        self.config
            .overrides
            .iter()
            .filter(move |rule| entity.in_domain(&rule.domain))
    }

    /// Definition and provenance record from `source`, if it has one for `entity`.
    fn authoritative_definition(
        &self,
        source: OverrideSource,
        entity: &EntityRecord,
    ) -> Option<(&'a str, SourceRef)> {
        match source {
            OverrideSource::Dictionary => {
                let id = entity.dictionary_id.as_deref()?;
                let text = self.sources.dictionary.get(id)?;
                Some((
                    text,
                    SourceRef {
                        source: self.config.dictionary.name.clone(),
                        qid: None,
                        id: Some(id.to_string()),
                        license: self.config.dictionary.license.clone(),
                    },
                ))
            }
            OverrideSource::Ontology => {
                let text = self.sources.ontology.get(&normalize_label(&entity.label_en))?;
                Some((
                    text,
                    SourceRef {
                        source: self.config.ontology.name.clone(),
                        qid: None,
                        id: None,
                        license: self.config.ontology.license.clone(),
                    },
                ))
            }
        }
    }

    /// Curated aliases followed by the generated plural, deduplicated
    /// case-insensitively, never repeating the term, capped at the curated
    /// count plus `max_auto_aliases`.
    fn aliases_for(&self, term: &str) -> Vec<String> {
        let curated = self.aliases.get(term);
        let cap = curated.len() + self.config.limits.max_auto_aliases;

        let term_key = term.to_lowercase();
        let mut seen = HashSet::new();
        let mut aliases = Vec::new();

        for alias in curated.iter().cloned().chain(plural_variant(term)) {
            if aliases.len() >= cap {
                break;
            }
            let key = alias.to_lowercase();
            if alias.is_empty() || key == term_key || !seen.insert(key) {
                continue;
            }
            aliases.push(alias);
        }
        aliases
    }
}

/// Zip curated example lists into detail examples.
fn detail_examples(examples: &EntryExamples) -> Vec<DetailExample> {
    let count = examples.en.len().max(examples.zh.len());
    (0..count)
        .map(|i| {
            let mut description = BTreeMap::new();
            if let Some(en) = examples.en.get(i) {
                description.insert("en".to_string(), en.clone());
            }
            if let Some(zh) = examples.zh.get(i) {
                description.insert("zh_CN".to_string(), zh.clone());
            }
            DetailExample {
                title: String::new(),
                description,
            }
        })
        .collect()
}

fn non_empty_or(raw: &str, fallback: &str) -> String {
    match raw.trim() {
        "" => fallback.to_string(),
        trimmed => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curated::DomainDetail;

    fn entity(id: &str, en: &str, domains: &[&str]) -> EntityRecord {
        EntityRecord {
            id: id.into(),
            label_en: en.into(),
            label_zh: "术语".into(),
            desc_en: format!("Baseline {en} description. More text."),
            desc_zh: "基线描述。更多文字".into(),
            dictionary_id: None,
            domains: domains.iter().map(|d| (*d).to_string()).collect(),
        }
    }

    struct Fixture {
        config: AppConfig,
        sources: AuthoritativeSources,
        aliases: AliasOverrides,
        details: DomainDetails,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: AppConfig::default(),
                sources: AuthoritativeSources::default(),
                aliases: AliasOverrides::default(),
                details: DomainDetails::default(),
            }
        }

        fn consolidator(&self) -> Consolidator<'_> {
            Consolidator::new(&self.config, &self.sources, &self.aliases, &self.details)
        }
    }

    #[test]
    fn baseline_definition_survives_without_overrides() {
        let fx = Fixture::new();
        let entry = fx
            .consolidator()
            .consolidate_entity(&entity("Q1", "contract", &["Legal"]))
            .unwrap();

        assert_eq!(entry.definition.en, "Baseline contract description");
        assert_eq!(entry.definition.zh, "基线描述。");
        assert_eq!(entry.category, "Legal");
        assert_eq!(entry.zh_term, "术语");
        assert_eq!(entry.sources.len(), 1);
        assert_eq!(entry.sources[0].qid.as_deref(), Some("Q1"));
        assert_eq!(entry.aliases, vec!["contracts"]);
        assert_eq!(
            entry.detail.detailed_explanation.en,
            "Baseline contract description. More text."
        );
        assert!(entry.detail.examples.is_empty());
    }

    #[test]
    fn validation_drops_and_tallies() {
        let fx = Fixture::new();
        let mut no_zh_desc = entity("Q1", "contract", &[]);
        no_zh_desc.desc_zh = "   ".into();
        let numeric = entity("Q2", "1984", &[]);
        let mut latin_zh_label = entity("Q3", "tort", &[]);
        latin_zh_label.label_zh = "tort".into();
        let mut untranslated = entity("Q4", "lien", &[]);
        untranslated.desc_zh = "lien".into();
        let ok = entity("Q5", "deed", &[]);

        let result = fx
            .consolidator()
            .consolidate(&[no_zh_desc, numeric, latin_zh_label, untranslated, ok]);

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].category, DEFAULT_CATEGORY);
        assert_eq!(result.missing(), 4);
        assert_eq!(result.dropped[&DropReason::MissingDefinition], 1);
        assert_eq!(result.dropped[&DropReason::UncleanTerm], 1);
        assert_eq!(result.dropped[&DropReason::MissingTargetLabel], 1);
        assert_eq!(result.dropped[&DropReason::UntranslatedDefinition], 1);
    }

    #[test]
    fn precedence_curated_over_authoritative_over_baseline() {
        let mut fx = Fixture::new();
        fx.config.overrides.push(OverrideRule {
            source: OverrideSource::Ontology,
            domain: "Medical".into(),
        });
        fx.sources.dictionary = [("D001", "Dictionary definition")].into_iter().collect();
        fx.sources.ontology = [("blood pressure", "Ontology definition")].into_iter().collect();

        let mut e = entity("Q9", "Blood Pressure", &["Medical"]);
        e.dictionary_id = Some("D001".into());

        // Authoritative tiers only: the later policy row wins.
        let entry = fx.consolidator().consolidate_entity(&e).unwrap();
        assert_eq!(entry.definition.en, "Ontology definition");
        let names: Vec<_> = entry.sources.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(names, vec!["wikidata", "mesh", "fibo"]);
        assert_eq!(entry.sources[1].id.as_deref(), Some("D001"));

        // Curated detail beats everything.
        fx.details = [(
            "blood pressure".to_string(),
            DomainDetail {
                definition_en: "Curated definition.".into(),
                definition_zh: "人工定义。".into(),
                examples_en: vec!["120/80".into(), "Hypertension".into()],
                examples_zh: vec!["血压读数".into()],
            },
        )]
        .into_iter()
        .collect();

        let entry = fx.consolidator().consolidate_entity(&e).unwrap();
        assert_eq!(entry.definition.en, "Curated definition.");
        assert_eq!(entry.definition.zh, "人工定义。");
        assert_eq!(entry.detail.definition, entry.definition);
        assert_eq!(entry.examples.en.len(), 2);
        assert_eq!(entry.detail.examples.len(), 2);
        assert_eq!(entry.detail.examples[0].description["zh_CN"], "血压读数");
        assert!(!entry.detail.examples[1].description.contains_key("zh_CN"));
    }

    #[test]
    fn authoritative_sources_apply_only_to_their_domain() {
        let mut fx = Fixture::new();
        fx.sources.dictionary = [("D002", "Dictionary definition")].into_iter().collect();
        fx.sources.ontology = [("interest", "Ontology definition")].into_iter().collect();

        let mut legal = entity("Q1", "interest", &["Legal"]);
        legal.dictionary_id = Some("D002".into());
        let entry = fx.consolidator().consolidate_entity(&legal).unwrap();
        assert_eq!(entry.definition.en, "Baseline interest description");
        assert_eq!(entry.sources.len(), 1);

        let finance = entity("Q2", "Interest", &["Legal", "Finance"]);
        let entry = fx.consolidator().consolidate_entity(&finance).unwrap();
        assert_eq!(entry.definition.en, "Ontology definition");
        assert_eq!(entry.category, "Legal");
        assert_eq!(entry.sources[1].license, "MIT");
    }

    #[test]
    fn aliases_dedupe_and_cap() {
        let mut fx = Fixture::new();
        fx.aliases = [(
            "Hash Table".to_string(),
            vec!["hashmap".into(), "HashMap".into(), "hash table".into(), "dictionary".into()],
        )]
        .into_iter()
        .collect();

        let entry = fx
            .consolidator()
            .consolidate_entity(&entity("Q1", "Hash Table", &[]))
            .unwrap();
        // Cap is 4 curated + 1 generated.
        assert_eq!(entry.aliases, vec!["hashmap", "dictionary", "Hash Tables"]);

        fx.config.limits.max_auto_aliases = 0;
        let entry = fx
            .consolidator()
            .consolidate_entity(&entity("Q2", "queue", &[]))
            .unwrap();
        assert!(entry.aliases.is_empty());
    }

    #[test]
    fn acronyms_get_no_generated_alias() {
        let fx = Fixture::new();
        let entry = fx
            .consolidator()
            .consolidate_entity(&entity("Q1", "API", &[]))
            .unwrap();
        assert!(entry.aliases.is_empty());
    }
}
