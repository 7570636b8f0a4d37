//! In-memory cache of provider results keyed by normalized query.
//!
//! Entries live for a fixed TTL (24 hours by default). Expired entries are
//! treated as absent on read and stay in the map until the next successful
//! fetch for the same key overwrites them. Nothing is persisted.

pub mod key;
pub mod memory;

pub use key::normalize_key;
pub use memory::{CacheEntry, DEFAULT_TTL, ResultCache};
