//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define storage contracts used by persisted client state.
//! - Isolate SQLite query details from settings orchestration.

pub mod kv_repo;
