//! Remote data cache over backend reads.
//!
//! # Responsibility
//! - Derive cache keys from resource + filter tuples (`key`).
//! - Describe per-resource staleness and retry policy (`policy`).
//! - Serve fresh entries, dedupe in-flight fetches, invalidate key
//!   families (`client`).
//!
//! # Invariants
//! - Distinct filter combinations never share an entry.
//! - Writes are last-writer-wins per key, except that a fetch superseded
//!   by an invalidation is never served as fresh.

pub mod client;
pub mod key;
pub mod policy;

pub use client::{CacheStats, QueryClient};
pub use key::QueryKey;
pub use policy::QueryPolicy;
