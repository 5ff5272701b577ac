//! Shared types, error model, and configuration for the glossary builder.
//!
//! This crate is the foundation depended on by all other glossary crates.
//! It provides:
//! - [`GlossaryError`] — the unified error type
//! - Data model ([`EntityRecord`], [`ConsolidatedEntry`], [`BuildMeta`])
//! - Configuration ([`AppConfig`] and its sections, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DictionaryConfig, DomainConfig, FetchConfig, LimitsConfig, OntologyConfig,
    OverrideRule, OverrideSource, PathsConfig, SparqlConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{GlossaryError, Result};
pub use types::{
    BuildMeta, ConsolidatedEntry, DetailBlock, DetailExample, DomainStats, EntityRecord, EntryExamples,
    LimitsMeta, LocalizedText, SCHEMA_VERSION, Scenarios, SourceMeta, SourceRef,
};
