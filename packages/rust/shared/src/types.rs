//! Core data model for the glossary build.
//!
//! [`EntityRecord`] is what the collector produces per discovered concept;
//! [`ConsolidatedEntry`] is the immutable, fully-reconciled record the
//! artifact projections are built from. Serialized field names match the
//! JSON consumed by the presentation layer (`camelCase`, `zh_CN`).

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Schema version written into every artifact's metadata block.
pub const SCHEMA_VERSION: u32 = 2;

// ---------------------------------------------------------------------------
// EntityRecord
// ---------------------------------------------------------------------------

/// One concept discovered by the structured query, deduplicated by `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    /// Global entity identifier (e.g. `Q9143`).
    pub id: String,
    /// Source-language label.
    pub label_en: String,
    /// Target-language label.
    pub label_zh: String,
    /// Raw source-language short description.
    pub desc_en: String,
    /// Raw target-language short description.
    pub desc_zh: String,
    /// External dictionary identifier, when the entity carries one.
    pub dictionary_id: Option<String>,
    /// Domains the entity was reached from, in discovery order.
    pub domains: Vec<String>,
}

impl EntityRecord {
    /// First domain the entity was discovered under.
    pub fn primary_domain(&self) -> Option<&str> {
        self.domains.first().map(String::as_str)
    }

    /// Whether the entity was reached from `domain`.
    pub fn in_domain(&self, domain: &str) -> bool {
        self.domains.iter().any(|d| d == domain)
    }

    /// Record `domain` if it is not already listed. Returns `true` when added.
    pub fn add_domain(&mut self, domain: &str) -> bool {
        if self.in_domain(domain) {
            return false;
        }
        self.domains.push(domain.to_string());
        true
    }
}

// ---------------------------------------------------------------------------
// ConsolidatedEntry
// ---------------------------------------------------------------------------

/// A bilingual text pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    #[serde(rename = "zh_CN")]
    pub zh: String,
}

/// Bilingual example lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryExamples {
    pub en: Vec<String>,
    #[serde(rename = "zh_CN")]
    pub zh: Vec<String>,
}

/// Provenance of a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub source: String,
    /// Entity id in the baseline source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qid: Option<String>,
    /// Record id in an authoritative source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub license: String,
}

/// A single example inside the detail block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailExample {
    pub title: String,
    pub description: BTreeMap<String, String>,
}

/// Usage-scenario placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenarios {
    #[serde(rename = "use")]
    pub use_cases: Vec<String>,
    pub avoid: Vec<String>,
}

/// Nested long-form detail of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailBlock {
    pub definition: LocalizedText,
    pub detailed_explanation: LocalizedText,
    pub scenarios: Scenarios,
    pub examples: Vec<DetailExample>,
    pub pitfalls: Vec<String>,
    pub related: Vec<String>,
}

/// The final per-entity record after every precedence rule is applied.
/// Built once by the consolidator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedEntry {
    pub id: String,
    pub term: String,
    pub aliases: Vec<String>,
    pub definition: LocalizedText,
    pub examples: EntryExamples,
    pub category: String,
    pub sources: Vec<SourceRef>,
    pub zh_term: String,
    pub detail: DetailBlock,
}

// ---------------------------------------------------------------------------
// Metadata block
// ---------------------------------------------------------------------------

/// A contributing source as listed in the metadata block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMeta {
    pub name: String,
    pub license: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_limit: Option<usize>,
}

/// Limits applied during the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsMeta {
    pub target_total: usize,
    pub domain_limit: usize,
    pub root_limit: usize,
}

/// Metadata shared by every output artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildMeta {
    pub schema_version: u32,
    /// UTC timestamp, `YYYY-MM-DDTHH:MM:SSZ`.
    pub generated_at: String,
    pub sources: Vec<SourceMeta>,
    pub domain_stats: DomainStats,
    pub limits: LimitsMeta,
}

// ---------------------------------------------------------------------------
// DomainStats
// ---------------------------------------------------------------------------

/// Entity counts per domain, kept in the order the domains were queried.
///
/// Serializes as a JSON object whose keys follow that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainStats(Vec<(String, usize)>);

impl DomainStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the count for `domain`, keeping its original position if present.
    pub fn insert(&mut self, domain: impl Into<String>, count: usize) {
        let domain = domain.into();
        match self.0.iter_mut().find(|(name, _)| *name == domain) {
            Some(slot) => slot.1 = count,
            None => self.0.push((domain, count)),
        }
    }

    pub fn get(&self, domain: &str) -> Option<usize> {
        self.0
            .iter()
            .find(|(name, _)| name == domain)
            .map(|(_, count)| *count)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(name, count)| (name.as_str(), *count))
    }
}

impl Index<&str> for DomainStats {
    type Output = usize;

    fn index(&self, domain: &str) -> &usize {
        match self.0.iter().find(|(name, _)| name == domain) {
            Some((_, count)) => count,
            None => panic!("no stats for domain {domain:?}"),
        }
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for DomainStats {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        let mut stats = Self::new();
        for (domain, count) in iter {
            stats.insert(domain, count);
        }
        stats
    }
}

impl Serialize for DomainStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in &self.0 {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DomainStats {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatsVisitor;

        impl<'de> Visitor<'de> for StatsVisitor {
            type Value = DomainStats;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of domain names to counts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<DomainStats, A::Error> {
                let mut stats = DomainStats::new();
                while let Some((name, count)) = access.next_entry::<String, usize>()? {
                    stats.insert(name, count);
                }
                Ok(stats)
            }
        }

        deserializer.deserialize_map(StatsVisitor)
    }
}
