//! Time-bounded shard storage.
//!
//! A [`Shard`] is the physical storage for one time range of point data. It
//! wraps a [`ShardStore`] and exposes the write/delete/scan contract the
//! ingestion layer consumes. Point keys sort by (series, time), so a
//! forward range scan over one series yields chronologically ordered
//! samples straight off the B-tree, without a secondary index.

use std::path::Path;
use std::time::Duration;

use redb::{ReadableDatabase, ReadableTable, TableError};
use tracing::{debug, trace};

use crate::encoding::key::{decode_point_key, point_key, series_prefix_range, series_scan_range};
use crate::encoding::point::{decode_point, encode_point, Fields};
use crate::error::{Error, Result};
use crate::store::{ShardStore, VALUES};

/// Physical storage for a given time range.
///
/// Constructed closed; [`Shard::open`] binds it to a database file and
/// [`Shard::close`] releases it. Writes and scans between the two operate
/// inside the engine's transactions: one writer at a time, snapshot-isolated
/// readers that neither block writers nor are blocked by them.
#[derive(Debug)]
pub struct Shard {
    id: u64,
    start_time: i64,
    end_time: i64,
    store: ShardStore,
}

impl Shard {
    /// Creates a closed shard covering `[start_time, end_time]`.
    ///
    /// Times are nanoseconds since the Unix epoch. Fails with
    /// `InvalidInput` when `start_time > end_time`.
    pub fn new(id: u64, start_time: i64, end_time: i64) -> Result<Self> {
        if start_time > end_time {
            return Err(Error::InvalidInput(format!(
                "shard start time {} is after end time {}",
                start_time, end_time
            )));
        }

        Ok(Self {
            id,
            start_time,
            end_time,
            store: ShardStore::new(),
        })
    }

    /// Returns the shard identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the inclusive start of the covered time range, in nanoseconds.
    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Returns the inclusive end of the covered time range, in nanoseconds.
    pub fn end_time(&self) -> i64 {
        self.end_time
    }

    /// Returns the duration between the shard's start and end time.
    pub fn duration(&self) -> Duration {
        // Wrapping is exact here: under start <= end the true difference
        // always fits in u64, even for ranges wider than i64::MAX.
        Duration::from_nanos(self.end_time.wrapping_sub(self.start_time) as u64)
    }

    /// Returns whether the shard currently holds an open store.
    pub fn is_open(&self) -> bool {
        self.store.is_open()
    }

    /// Opens the shard's store at `path` and initializes its tables.
    ///
    /// If initialization fails, the partially opened store is closed before
    /// the error surfaces, so the caller never observes a leaked handle.
    /// Reopening a previously closed shard on the same path finds the data
    /// written before the close.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        self.store.open(path)?;

        if let Err(err) = self.store.init() {
            let _ = self.store.close();
            return Err(err);
        }

        debug!(shard = self.id, path = %path.display(), "shard opened");
        Ok(())
    }

    /// Closes the shard's store.
    ///
    /// After a close the shard must not be written to until reopened.
    pub fn close(&mut self) -> Result<()> {
        self.store.close()?;
        debug!(shard = self.id, "shard closed");
        Ok(())
    }

    /// Writes one point for `series_id` at `timestamp`.
    ///
    /// The write is a single serializable transaction: on any failure the
    /// store remains at its last committed state. When a point already
    /// exists at this (series, timestamp) key, `overwrite` decides between
    /// replacing it and failing with `DuplicatePoint` without side effects.
    ///
    /// Fails with `InvalidInput` when the value map is empty or the
    /// timestamp falls outside the shard's time range, and `WriteFailed`
    /// when the transaction cannot be applied or committed.
    pub fn write_series(
        &self,
        series_id: u32,
        timestamp: i64,
        values: &Fields,
        overwrite: bool,
    ) -> Result<()> {
        if values.is_empty() {
            return Err(Error::InvalidInput(
                "point must carry at least one field value".to_string(),
            ));
        }

        if timestamp < self.start_time || timestamp > self.end_time {
            return Err(Error::InvalidInput(format!(
                "timestamp {} outside shard range [{}, {}]",
                timestamp, self.start_time, self.end_time
            )));
        }

        let record = encode_point(series_id, timestamp, values)?;
        let key = point_key(series_id, timestamp);

        let db = self.store.db()?;
        let txn = db
            .begin_write()
            .map_err(|err| Error::WriteFailed(format!("begin transaction: {}", err)))?;

        {
            let mut table = txn
                .open_table(VALUES)
                .map_err(|err| Error::WriteFailed(format!("open values table: {}", err)))?;

            if !overwrite {
                let exists = table
                    .get(key.as_slice())
                    .map_err(|err| Error::WriteFailed(format!("read existing point: {}", err)))?
                    .is_some();
                if exists {
                    // Dropping the uncommitted transaction aborts it.
                    return Err(Error::DuplicatePoint {
                        series_id,
                        timestamp,
                    });
                }
            }

            table
                .insert(key.as_slice(), record.as_slice())
                .map_err(|err| Error::WriteFailed(format!("put point: {}", err)))?;
        }

        txn.commit()
            .map_err(|err| Error::WriteFailed(format!("commit: {}", err)))?;

        trace!(shard = self.id, series_id, timestamp, "point written");
        Ok(())
    }

    /// Removes every stored point of `series_id` in one transaction.
    ///
    /// All-or-nothing: either the whole series prefix is gone after commit
    /// or, on `WriteFailed`, nothing changed. Deleting a series with no
    /// stored points is a successful no-op.
    pub fn delete_series(&self, series_id: u32) -> Result<()> {
        let db = self.store.db()?;
        let txn = db
            .begin_write()
            .map_err(|err| Error::WriteFailed(format!("begin transaction: {}", err)))?;

        let removed = {
            let mut table = txn
                .open_table(VALUES)
                .map_err(|err| Error::WriteFailed(format!("open values table: {}", err)))?;

            let (low, high) = series_prefix_range(series_id);
            let mut keys = Vec::new();
            {
                let entries = table
                    .range(low.as_slice()..=high.as_slice())
                    .map_err(|err| Error::WriteFailed(format!("scan series prefix: {}", err)))?;
                for entry in entries {
                    let (key, _) = entry
                        .map_err(|err| Error::WriteFailed(format!("read series key: {}", err)))?;
                    keys.push(key.value().to_vec());
                }
            }

            for key in &keys {
                table
                    .remove(key.as_slice())
                    .map_err(|err| Error::WriteFailed(format!("delete point: {}", err)))?;
            }

            keys.len()
        };

        txn.commit()
            .map_err(|err| Error::WriteFailed(format!("commit: {}", err)))?;

        trace!(shard = self.id, series_id, removed, "series deleted");
        Ok(())
    }

    /// Scans `series_id` over `[from, to]` inclusive, in timestamp order.
    ///
    /// The returned sequence decodes lazily from a snapshot taken at call
    /// time: concurrent writers are neither blocked nor observed, and a
    /// fresh call re-scans from a fresh snapshot. A record that fails to
    /// decode terminates the scan with `CorruptRecord`; corrupt data is
    /// surfaced, never skipped.
    pub fn scan_series(&self, series_id: u32, from: i64, to: i64) -> Result<SeriesScan> {
        let db = self.store.db()?;

        if from > to {
            return Ok(SeriesScan { entries: None });
        }
        let txn = db
            .begin_read()
            .map_err(|err| Error::Io(format!("begin read transaction: {}", err)))?;

        let table = match txn.open_table(VALUES) {
            Ok(table) => table,
            // A store that was never initialized holds no points.
            Err(TableError::TableDoesNotExist(_)) => return Ok(SeriesScan { entries: None }),
            Err(err) => return Err(Error::Io(format!("open values table: {}", err))),
        };

        let (low, high) = series_scan_range(series_id, from, to);
        let entries = table
            .range(low.as_slice()..=high.as_slice())
            .map_err(|err| Error::Io(format!("scan series: {}", err)))?;

        Ok(SeriesScan {
            entries: Some(entries),
        })
    }
}

/// Lazy, snapshot-isolated scan over one series of one shard.
///
/// Yields `(timestamp, values)` pairs in ascending timestamp order. The
/// iterator fuses after the first error.
pub struct SeriesScan {
    entries: Option<redb::Range<'static, &'static [u8], &'static [u8]>>,
}

impl std::fmt::Debug for SeriesScan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesScan")
            .field("exhausted", &self.entries.is_none())
            .finish()
    }
}

impl Iterator for SeriesScan {
    type Item = Result<(i64, Fields)>;

    fn next(&mut self) -> Option<Self::Item> {
        let entries = self.entries.as_mut()?;

        let result = match entries.next()? {
            Ok((key, value)) => decode_entry(key.value(), value.value()),
            Err(err) => Err(Error::Io(format!("scan advance: {}", err))),
        };

        if result.is_err() {
            self.entries = None;
        }

        Some(result)
    }
}

/// Decodes one stored entry, cross-checking the record header against the
/// key it was stored under.
fn decode_entry(key: &[u8], record: &[u8]) -> Result<(i64, Fields)> {
    let (key_series, key_timestamp) = decode_point_key(key)?;
    let (series_id, timestamp, values) = decode_point(record)?;

    if series_id != key_series || timestamp != key_timestamp {
        return Err(Error::CorruptRecord(format!(
            "record header ({}, {}) does not match key ({}, {})",
            series_id, timestamp, key_series, key_timestamp
        )));
    }

    Ok((timestamp, values))
}
