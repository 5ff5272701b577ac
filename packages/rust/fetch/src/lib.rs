//! Resilient network retrieval for the glossary build.
//!
//! This crate provides:
//! - [`Fetcher`] — rate-limited HTTP client with linear backoff, amplified
//!   after 429 responses, and byte-budget enforcement
//! - [`JsonCache`] — content-addressed on-disk cache backing JSON fetches,
//!   with an out-of-band expiry sweep

pub mod cache;
pub mod fetcher;

pub use cache::JsonCache;
pub use fetcher::Fetcher;
