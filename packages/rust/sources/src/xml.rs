//! Streaming, namespace-agnostic record extraction over XML.
//!
//! Elements are matched by local name only (`rdfs:label`, `skos:label` and
//! a bare `label` are the same field). A record's fields are collected while
//! its element is open and handed to the callback when it closes; the frame
//! is dropped right after, so peak memory is bounded by the deepest open
//! record rather than by document size.

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use glossary_shared::{GlossaryError, Result};

/// Which elements are records, which child elements are fields, and the
/// optional `xml:lang` a field must carry (fields without the attribute
/// always qualify).
#[derive(Debug, Clone, Copy)]
pub struct RecordSpec<'a> {
    pub records: &'a [&'a str],
    pub fields: &'a [&'a str],
    pub lang: Option<&'a str>,
}

impl RecordSpec<'_> {
    fn is_record(&self, local: &[u8]) -> bool {
        self.records.iter().any(|r| r.as_bytes() == local)
    }

    fn field_index(&self, local: &[u8]) -> Option<usize> {
        self.fields.iter().position(|f| f.as_bytes() == local)
    }

    fn lang_matches(&self, element: &BytesStart<'_>) -> bool {
        let Some(wanted) = self.lang else {
            return true;
        };
        match element.try_get_attribute("xml:lang") {
            Ok(Some(attr)) => String::from_utf8_lossy(&attr.value).to_lowercase() == wanted,
            Ok(None) => true,
            Err(_) => false,
        }
    }
}

/// An open record element and the first non-empty value seen per field.
struct Frame {
    depth: usize,
    fields: Vec<Option<String>>,
}

/// Text being collected for one field element.
struct Capture {
    field: usize,
    depth: usize,
    text: String,
}

/// Stream `reader`, calling `on_record` with the field values of every
/// record element in document order (inner records before outer ones).
///
/// Values are trimmed; the first non-empty occurrence of a field inside a
/// record wins. Malformed XML stops the scan with a parse error, after the
/// records completed so far have been delivered.
pub fn for_each_record<R, F>(reader: R, spec: &RecordSpec<'_>, mut on_record: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(&[Option<String>]),
{
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();
    let mut frames: Vec<Frame> = Vec::new();
    let mut capture: Option<Capture> = None;
    let mut depth: usize = 0;

    loop {
        let event = xml.read_event_into(&mut buf).map_err(|e| {
            GlossaryError::parse(format!(
                "XML error at byte {}: {e}",
                xml.buffer_position()
            ))
        })?;

        match event {
            Event::Start(element) => {
                depth += 1;
                let local = element.local_name();
                if spec.is_record(local.as_ref()) {
                    frames.push(Frame {
                        depth,
                        fields: vec![None; spec.fields.len()],
                    });
                } else if capture.is_none() {
                    if let Some(field) = spec.field_index(local.as_ref()) {
                        let open = frames
                            .last()
                            .is_some_and(|frame| frame.fields[field].is_none());
                        if open && spec.lang_matches(&element) {
                            capture = Some(Capture {
                                field,
                                depth,
                                text: String::new(),
                            });
                        }
                    }
                }
            }
            Event::Text(text) => {
                if let Some(c) = capture.as_mut().filter(|c| c.depth == depth) {
                    match text.unescape() {
                        Ok(s) => c.text.push_str(&s),
                        Err(_) => c.text.push_str(&String::from_utf8_lossy(&text)),
                    }
                }
            }
            Event::CData(data) => {
                if let Some(c) = capture.as_mut().filter(|c| c.depth == depth) {
                    c.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some(done) = capture.take_if(|c| c.depth == depth) {
                    let value = done.text.trim();
                    if let Some(frame) = frames.last_mut() {
                        if !value.is_empty() && frame.fields[done.field].is_none() {
                            frame.fields[done.field] = Some(value.to_string());
                        }
                    }
                }
                if frames.last().is_some_and(|frame| frame.depth == depth) {
                    if let Some(frame) = frames.pop() {
                        on_record(&frame.fields);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: RecordSpec<'static> = RecordSpec {
        records: &["Class", "Description"],
        fields: &["label", "definition"],
        lang: Some("en"),
    };

    fn collect(xml: &str) -> Vec<Vec<Option<String>>> {
        let mut out = Vec::new();
        for_each_record(xml.as_bytes(), &SPEC, |fields| out.push(fields.to_vec())).unwrap();
        out
    }

    #[test]
    fn matches_by_local_name() {
        let records = collect(
            r#"<rdf:RDF xmlns:rdf="r" xmlns:owl="o" xmlns:rdfs="s" xmlns:skos="k">
                 <owl:Class><rdfs:label>Bond</rdfs:label><skos:definition>A debt.</skos:definition></owl:Class>
               </rdf:RDF>"#,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0][0].as_deref(), Some("Bond"));
        assert_eq!(records[0][1].as_deref(), Some("A debt."));
    }

    #[test]
    fn honors_language_filter_and_first_value() {
        let records = collect(
            r#"<Class>
                 <label xml:lang="de">Anleihe</label>
                 <label xml:lang="EN">Bond</label>
                 <label>Other</label>
               </Class>"#,
        );
        assert_eq!(records[0][0].as_deref(), Some("Bond"));
        assert_eq!(records[0][1], None);
    }

    #[test]
    fn nested_records_are_separate() {
        let records = collect(
            r#"<Description><label>Outer</label>
                 <Class><label>Inner</label><definition>In.</definition></Class>
               </Description>"#,
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0][0].as_deref(), Some("Inner"));
        assert_eq!(records[1][0].as_deref(), Some("Outer"));
        assert_eq!(records[1][1], None);
    }

    #[test]
    fn blank_values_do_not_block_later_ones() {
        let records = collect(
            r#"<Class><label>  </label><label><![CDATA[Swap]]></label></Class>"#,
        );
        assert_eq!(records[0][0].as_deref(), Some("Swap"));
    }

    #[test]
    fn unescapes_entities() {
        let records = collect(r#"<Class><label>Profit &amp; loss</label></Class>"#);
        assert_eq!(records[0][0].as_deref(), Some("Profit & loss"));
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let result = for_each_record(
            "<Class><label>x</Class>".as_bytes(),
            &SPEC,
            |_| {},
        );
        assert!(result.is_err());
    }
}
