//! Curated inputs: the alias override file and the domain-detail directory.
//!
//! Both are hand-maintained JSON and are parsed leniently: entries that do
//! not have the expected shape are skipped rather than failing the build.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use glossary_shared::{GlossaryError, Result};

/// Lowercased canonical term → curated aliases (never empty).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasOverrides {
    entries: HashMap<String, Vec<String>>,
}

impl AliasOverrides {
    /// Aliases for `term`, matched case-insensitively.
    pub fn get(&self, term: &str) -> &[String] {
        self.entries
            .get(&term.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Curated bilingual definitions and examples for one term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainDetail {
    pub definition_en: String,
    pub definition_zh: String,
    pub examples_en: Vec<String>,
    pub examples_zh: Vec<String>,
}

/// Lowercased term → curated detail. The first record seen for a term wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainDetails {
    entries: HashMap<String, DomainDetail>,
}

impl DomainDetails {
    /// Detail for `term`, matched case-insensitively.
    pub fn get(&self, term: &str) -> Option<&DomainDetail> {
        self.entries.get(&term.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add the records of one JSON document. Returns how many were new.
    fn extend_from(&mut self, document: &Value) -> usize {
        let Some(items) = document.as_array() else {
            return 0;
        };
        let mut added = 0;
        for item in items.iter().filter(|item| item.is_object()) {
            let term = item.get("term").and_then(scalar_text).unwrap_or_default();
            let key = term.trim().to_lowercase();
            if key.is_empty() || self.entries.contains_key(&key) {
                continue;
            }
            self.entries.insert(key, parse_detail(item));
            added += 1;
        }
        added
    }
}

impl FromIterator<(String, DomainDetail)> for DomainDetails {
    fn from_iter<I: IntoIterator<Item = (String, DomainDetail)>>(iter: I) -> Self {
        let mut entries = HashMap::new();
        for (term, detail) in iter {
            entries.entry(term.to_lowercase()).or_insert(detail);
        }
        Self { entries }
    }
}

impl FromIterator<(String, Vec<String>)> for AliasOverrides {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(term, aliases)| (term.to_lowercase(), aliases))
            .filter(|(term, aliases)| !term.is_empty() && !aliases.is_empty())
            .collect();
        Self { entries }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load the alias override file. A missing file yields an empty table.
///
/// The file must be a JSON object; anything else is treated as empty.
/// Keys are trimmed and lowercased, non-list values and blank aliases are
/// skipped, and keys left without aliases are dropped.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_alias_overrides(path: &Path) -> Result<AliasOverrides> {
    if !path.exists() {
        debug!("alias override file not found");
        return Ok(AliasOverrides::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| GlossaryError::io(path, e))?;
    let document: Value = serde_json::from_str(&content)
        .map_err(|e| GlossaryError::parse(format!("invalid alias file {}: {e}", path.display())))?;

    let Some(object) = document.as_object() else {
        warn!("alias override file is not a JSON object, ignoring");
        return Ok(AliasOverrides::default());
    };

    let overrides: AliasOverrides = object
        .iter()
        .filter_map(|(key, value)| {
            let aliases = clean_list(value.as_array()?);
            Some((key.trim().to_string(), aliases))
        })
        .collect();

    debug!(terms = overrides.len(), "alias overrides loaded");
    Ok(overrides)
}

/// Load every `*.json` file in `dir` as a list of detail records.
///
/// Files are read in file-name order and the first record for a term wins.
/// Unreadable or malformed files are skipped with a warning; a missing
/// directory yields an empty table.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_domain_details(dir: &Path) -> Result<DomainDetails> {
    let mut details = DomainDetails::default();
    if !dir.is_dir() {
        debug!("domain detail directory not found");
        return Ok(details);
    }

    let mut files: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| GlossaryError::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    for file in &files {
        let document = match std::fs::read_to_string(file)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<Value>(&s).map_err(|e| e.to_string()))
        {
            Ok(document) => document,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "skipping unreadable domain detail file");
                continue;
            }
        };
        let added = details.extend_from(&document);
        debug!(file = %file.display(), added, "domain detail file loaded");
    }

    debug!(terms = details.len(), files = files.len(), "domain details loaded");
    Ok(details)
}

fn parse_detail(item: &Value) -> DomainDetail {
    let text = |field: &str| {
        item.get(field)
            .and_then(scalar_text)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };
    let list = |field: &str| {
        item.get(field)
            .and_then(Value::as_array)
            .map(|values| clean_list(values))
            .unwrap_or_default()
    };
    DomainDetail {
        definition_en: text("definition_en"),
        definition_zh: text("definition_zh"),
        examples_en: list("examples_en"),
        examples_zh: list("examples_zh"),
    }
}

/// Trimmed, non-empty textual values of `values`.
fn clean_list(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(scalar_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Text of a JSON scalar. Arrays, objects and null have none.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
