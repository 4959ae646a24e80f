//! Shard storage core for time-series point data.
//!
//! A [`Shard`] is a time-bounded, independently persisted partition of
//! point data backed by one embedded redb database file. It durably
//! writes, overwrites, scans, and deletes per-series samples through
//! serializable, crash-atomic transactions, with keys laid out so that a
//! forward range scan yields one series in chronological order.
//!
//! Ingestion, shard placement, retention, and query planning live in the
//! calling system; this crate only implements the storage contract they
//! call into.

pub mod collection;
pub mod encoding;
pub mod error;
pub mod shard;
pub mod store;

// Re-export common types for convenience
pub use collection::Shards;
pub use encoding::point::{FieldValue, Fields};
pub use error::{Error, Result};
pub use shard::{SeriesScan, Shard};
pub use store::ShardStore;
