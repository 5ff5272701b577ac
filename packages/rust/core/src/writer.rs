//! Artifact writer.
//!
//! Serializes the projected documents and writes each one atomically into
//! the output directory (temp file, then rename), returning per-file
//! checksums.

use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use glossary_artifacts::GlossaryArtifacts;
use glossary_shared::{GlossaryError, Result};

pub const EN_INDEX_FILE: &str = "glossary_en_index.json";
pub const ZH_INDEX_FILE: &str = "glossary_zh_index.json";
pub const DETAIL_FILE: &str = "glossary_detail.json";
pub const DICTIONARY_FILE: &str = "cedict_min.json";

/// Metadata for a single written artifact file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactMeta {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Write every document of `artifacts` into `output_dir`.
///
/// Documents are serialized up front, so a serialization failure leaves the
/// directory untouched.
#[instrument(skip_all, fields(output_dir = %output_dir.display()))]
pub fn write_artifacts(output_dir: &Path, artifacts: &GlossaryArtifacts) -> Result<Vec<ArtifactMeta>> {
    let documents = [
        (EN_INDEX_FILE, to_pretty_json(&artifacts.en_index)?),
        (ZH_INDEX_FILE, to_pretty_json(&artifacts.zh_index)?),
        (DETAIL_FILE, to_pretty_json(&artifacts.detail)?),
        (DICTIONARY_FILE, to_pretty_json(&artifacts.dictionary)?),
    ];

    std::fs::create_dir_all(output_dir).map_err(|e| GlossaryError::io(output_dir, e))?;

    let mut metas = Vec::with_capacity(documents.len());
    for (filename, content) in &documents {
        metas.push(write_atomic(output_dir, filename, content)?);
    }

    info!(count = metas.len(), "artifacts written");
    Ok(metas)
}

/// Write `content` to `dir/filename` via a hidden temp file and a rename.
fn write_atomic(dir: &Path, filename: &str, content: &str) -> Result<ArtifactMeta> {
    let target = dir.join(filename);
    let temp = dir.join(format!(".{filename}.tmp"));

    std::fs::write(&temp, content).map_err(|e| GlossaryError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| GlossaryError::io(&target, e))?;

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    debug!(file = %filename, size = content.len(), "wrote artifact");

    Ok(ArtifactMeta {
        filename: filename.to_string(),
        sha256: hash,
        size_bytes: content.len(),
    })
}

fn to_pretty_json<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| GlossaryError::Serialization(format!("JSON serialization failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use glossary_artifacts::{DetailDocument, DictionaryEntry, IndexDocument, IndexItem};
    use glossary_shared::{BuildMeta, DomainStats, LimitsMeta};

    fn artifacts() -> GlossaryArtifacts {
        let meta = BuildMeta {
            schema_version: 2,
            generated_at: "2026-01-01T00:00:00Z".into(),
            sources: vec![],
            domain_stats: DomainStats::from_iter([("Legal", 1)]),
            limits: LimitsMeta {
                target_total: 10,
                domain_limit: 10,
                root_limit: 10,
            },
        };
        GlossaryArtifacts {
            en_index: IndexDocument {
                meta: meta.clone(),
                items: vec![IndexItem {
                    id: "Q1".into(),
                    term: "contract".into(),
                    aliases: vec!["contracts".into()],
                    category: "Legal".into(),
                }],
            },
            zh_index: IndexDocument {
                meta: meta.clone(),
                items: vec![IndexItem {
                    id: "Q1".into(),
                    term: "合同".into(),
                    aliases: vec![],
                    category: "Legal".into(),
                }],
            },
            detail: DetailDocument {
                meta,
                items: BTreeMap::new(),
            },
            dictionary: vec![DictionaryEntry {
                traditional: "合同".into(),
                simplified: "合同".into(),
                pinyin: String::new(),
                english: "contract".into(),
            }],
        }
    }

    #[test]
    fn writes_all_files_with_checksums() {
        let dir = std::env::temp_dir().join(format!("glossary-writer-test-{}", uuid::Uuid::now_v7()));

        let metas = write_artifacts(&dir, &artifacts()).unwrap();
        let names: Vec<_> = metas.iter().map(|m| m.filename.as_str()).collect();
        assert_eq!(names, vec![EN_INDEX_FILE, ZH_INDEX_FILE, DETAIL_FILE, DICTIONARY_FILE]);

        for meta in &metas {
            let content = std::fs::read(dir.join(&meta.filename)).unwrap();
            assert_eq!(content.len(), meta.size_bytes);
            assert_eq!(format!("{:x}", Sha256::digest(&content)), meta.sha256);
            assert!(!dir.join(format!(".{}.tmp", meta.filename)).exists());
        }

        let zh: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join(ZH_INDEX_FILE)).unwrap()).unwrap();
        assert_eq!(zh["items"][0]["term"], "合同");
        assert_eq!(zh["meta"]["domainStats"]["Legal"], 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rewrite_replaces_previous_output() {
        let dir = std::env::temp_dir().join(format!("glossary-writer-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DICTIONARY_FILE), "stale").unwrap();

        write_artifacts(&dir, &artifacts()).unwrap();
        let export = std::fs::read_to_string(dir.join(DICTIONARY_FILE)).unwrap();
        assert!(export.contains("\"pinyin\": \"\""));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
