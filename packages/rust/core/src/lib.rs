//! Glossary build orchestration.
//!
//! - [`collector`] — root-scoped concept collection with deduplication
//! - [`curated`] — alias override and domain-detail loaders
//! - [`consolidator`] — validation and the definition precedence policy
//! - [`terms`] — label quality checks and plural alias generation
//! - [`writer`] — atomic artifact output with checksums
//! - [`pipeline`] — the end-to-end build and progress reporting

pub mod collector;
pub mod consolidator;
pub mod curated;
pub mod pipeline;
pub mod terms;
pub mod writer;

pub use collector::{Collection, EntityTable, collect, entity_from_row};
pub use consolidator::{AuthoritativeSources, Consolidation, Consolidator, DropReason};
pub use curated::{AliasOverrides, DomainDetail, DomainDetails, load_alias_overrides, load_domain_details};
pub use pipeline::{
    BuildResult, ProgressReporter, SilentProgress, build_glossary, build_with_source, sweep_cache,
};
pub use writer::{ArtifactMeta, write_artifacts};
