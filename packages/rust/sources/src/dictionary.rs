//! Compressed-XML dictionary adapter (descriptor id → scope note).
//!
//! The descriptor file is large, so it is downloaded once into the cache
//! directory and then decompressed and parsed as a stream, one
//! `DescriptorRecord` at a time.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use tracing::{info, instrument, warn};

use glossary_fetch::Fetcher;
use glossary_shared::{DictionaryConfig, GlossaryError, Result};

use crate::definitions::DefinitionMap;
use crate::text::extract_sentence;
use crate::xml::{RecordSpec, for_each_record};

const DESCRIPTOR_SPEC: RecordSpec<'static> = RecordSpec {
    records: &["DescriptorRecord"],
    fields: &["DescriptorUI", "ScopeNote"],
    lang: None,
};

/// Download (if not cached) and parse the dictionary.
///
/// This source is best-effort: any download or parse failure is logged and
/// yields an empty map.
#[instrument(skip_all, fields(url = %config.url))]
pub async fn load_dictionary_definitions(
    fetcher: &Fetcher,
    config: &DictionaryConfig,
    cache_path: &Path,
) -> DefinitionMap {
    if let Err(e) = fetcher.download_file(&config.url, cache_path).await {
        warn!(error = %e, "dictionary download failed, continuing without it");
        return DefinitionMap::new();
    }

    let path = cache_path.to_path_buf();
    let parsed = tokio::task::spawn_blocking(move || parse_dictionary_file(&path)).await;

    match parsed {
        Ok(Ok(definitions)) => {
            info!(definitions = definitions.len(), "dictionary definitions loaded");
            definitions
        }
        Ok(Err(e)) => {
            warn!(error = %e, "dictionary parse failed, continuing without it");
            DefinitionMap::new()
        }
        Err(e) => {
            warn!(error = %e, "dictionary parse task failed, continuing without it");
            DefinitionMap::new()
        }
    }
}

/// Parse a gzip-compressed descriptor file. Concatenated members are read
/// as one stream.
pub fn parse_dictionary_file(path: &Path) -> Result<DefinitionMap> {
    let file = File::open(path).map_err(|e| GlossaryError::io(path, e))?;
    parse_dictionary(BufReader::new(MultiGzDecoder::new(file)))
}

/// Parse uncompressed descriptor XML. Only records carrying both an id and
/// a scope note produce an entry; the note is cut to its first sentence.
pub fn parse_dictionary<R: BufRead>(reader: R) -> Result<DefinitionMap> {
    let mut definitions = DefinitionMap::new();
    for_each_record(reader, &DESCRIPTOR_SPEC, |fields| {
        if let [Some(id), Some(note)] = fields {
            definitions.insert_first(id.as_str(), extract_sentence(note));
        }
    })?;
    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use glossary_shared::FetchConfig;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DESCRIPTORS: &str = r#"<?xml version="1.0"?>
<!DOCTYPE DescriptorRecordSet SYSTEM "desc2026.dtd">
<DescriptorRecordSet LanguageCode="eng">
  <DescriptorRecord DescriptorClass="1">
    <DescriptorUI>D000001</DescriptorUI>
    <DescriptorName><String>Calcimycin</String></DescriptorName>
    <ConceptList>
      <Concept PreferredConceptYN="Y">
        <ConceptUI>M0000001</ConceptUI>
        <ScopeNote>An ionophorous, polyether antibiotic. It binds calcium.
        </ScopeNote>
      </Concept>
    </ConceptList>
    <PharmacologicalActionList>
      <PharmacologicalAction>
        <DescriptorReferredTo><DescriptorUI>D000900</DescriptorUI></DescriptorReferredTo>
      </PharmacologicalAction>
    </PharmacologicalActionList>
  </DescriptorRecord>
  <DescriptorRecord DescriptorClass="1">
    <DescriptorUI>D000002</DescriptorUI>
    <DescriptorName><String>No note</String></DescriptorName>
  </DescriptorRecord>
  <DescriptorRecord DescriptorClass="1">
    <DescriptorUI>D000001</DescriptorUI>
    <ConceptList><Concept><ScopeNote>Duplicate id, ignored.</ScopeNote></Concept></ConceptList>
  </DescriptorRecord>
</DescriptorRecordSet>"#;

    fn gzip(content: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn extracts_id_and_first_sentence() {
        let defs = parse_dictionary(DESCRIPTORS.as_bytes()).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(
            defs.get("D000001"),
            Some("An ionophorous, polyether antibiotic")
        );
        assert!(defs.get("D000002").is_none());
        assert!(defs.get("D000900").is_none());
    }

    #[test]
    fn parses_gzip_file() {
        let dir = std::env::temp_dir().join(format!("glossary-dict-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("desc.gz");
        std::fs::write(&path, gzip(DESCRIPTORS)).unwrap();

        let defs = parse_dictionary_file(&path).unwrap();
        assert_eq!(defs.len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn reads_every_gzip_member() {
        let dir = std::env::temp_dir().join(format!("glossary-dict-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("desc.gz");

        let (head, tail) = DESCRIPTORS.split_at(DESCRIPTORS.len() / 2);
        let mut bytes = gzip(head);
        bytes.extend(gzip(tail));
        std::fs::write(&path, bytes).unwrap();

        let defs = parse_dictionary_file(&path).unwrap();
        assert_eq!(
            defs.get("D000001"),
            Some("An ionophorous, polyether antibiotic")
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn load_downloads_and_parses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(DESCRIPTORS)))
            .expect(1)
            .mount(&server)
            .await;

        let dir = std::env::temp_dir().join(format!("glossary-dict-test-{}", uuid::Uuid::now_v7()));
        let fetcher = Fetcher::new(FetchConfig {
            request_delay_ms: 0,
            cache_dir: dir.clone(),
            ..FetchConfig::default()
        })
        .unwrap();
        let config = DictionaryConfig {
            url: format!("{}/desc.gz", server.uri()),
            ..DictionaryConfig::default()
        };

        let path = dir.join(&config.cache_file);
        let defs = load_dictionary_definitions(&fetcher, &config, &path).await;
        assert_eq!(defs.get("D000001"), Some("An ionophorous, polyether antibiotic"));

        // Second load reuses the downloaded file.
        let again = load_dictionary_definitions(&fetcher, &config, &path).await;
        assert_eq!(again.len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn load_degrades_to_empty_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = std::env::temp_dir().join(format!("glossary-dict-test-{}", uuid::Uuid::now_v7()));
        let fetcher = Fetcher::new(FetchConfig {
            request_delay_ms: 0,
            retry_limit: 2,
            retry_backoff_ms: 1,
            cache_dir: dir.clone(),
            ..FetchConfig::default()
        })
        .unwrap();
        let config = DictionaryConfig {
            url: server.uri(),
            ..DictionaryConfig::default()
        };

        let defs = load_dictionary_definitions(&fetcher, &config, &dir.join("desc.gz")).await;
        assert!(defs.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
