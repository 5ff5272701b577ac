//! Output projections for the glossary build.
//!
//! Everything here is a pure function of the consolidated entry set and the
//! build configuration. Writing the documents to disk is left to the caller.
//!
//! - [`select_entries`] — case-insensitive sort by term, truncated to the target size
//! - [`index_items`] — per-language lookup index
//! - [`detail_items`] — id-keyed map of full records
//! - [`dictionary_export`] — minimal dictionary-style export
//! - [`build_meta`] — the metadata block shared by every document

pub mod meta;
pub mod projection;

pub use meta::{build_meta, format_timestamp};
pub use projection::{
    DetailDocument, DetailItem, DictionaryEntry, GlossaryArtifacts, IndexDocument, IndexItem,
    Language, detail_items, dictionary_export, index_items, project, select_entries,
};
