//! Byte-budget enforcement and bucket statistics.
//!
//! Eviction walks a bucket in ascending stored-at order and deletes entries
//! until the summed body size is at or under the budget. Stored-at is the
//! write time, so this is FIFO by write rather than by last access.

use super::connection::CacheDb;
use crate::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Outcome of one budget enforcement pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EvictionReport {
    pub bucket: String,
    pub deleted: u64,
    pub freed_bytes: u64,
    pub remaining_bytes: u64,
}

/// Size and age summary of a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BucketStats {
    pub name: String,
    pub entries: u64,
    pub total_bytes: u64,
    pub oldest_stored_at: Option<i64>,
    pub newest_stored_at: Option<i64>,
}

impl CacheDb {
    /// Total stored body bytes in a bucket.
    pub async fn bucket_size(&self, bucket: &str) -> Result<u64, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let total: i64 = conn.query_row(
                    "SELECT COALESCE(SUM(size), 0) FROM cache_entries WHERE bucket = ?1",
                    params![bucket],
                    |row| row.get(0),
                )?;
                Ok(total as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete oldest entries until the bucket's total size is <= `budget`.
    ///
    /// Runs as a single transaction on the connection thread.
    pub async fn enforce_budget(&self, bucket: &str, budget: u64) -> Result<EvictionReport, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<EvictionReport, Error> {
                let tx = conn.transaction()?;

                let candidates: Vec<(String, u64)> = {
                    let mut stmt = tx.prepare(
                        "SELECT key_hash, size FROM cache_entries WHERE bucket = ?1
                        ORDER BY stored_at ASC, rowid ASC",
                    )?;
                    stmt.query_map(params![&bucket], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
                        .collect::<Result<Vec<_>, _>>()?
                };

                let mut total: u64 = candidates.iter().map(|(_, size)| size).sum();
                let mut report = EvictionReport { bucket: bucket.clone(), ..Default::default() };

                for (key_hash, size) in candidates {
                    if total <= budget {
                        break;
                    }
                    tx.execute(
                        "DELETE FROM cache_entries WHERE bucket = ?1 AND key_hash = ?2",
                        params![&bucket, key_hash],
                    )?;
                    total -= size;
                    report.deleted += 1;
                    report.freed_bytes += size;
                }

                tx.commit()?;
                report.remaining_bytes = total;
                Ok(report)
            })
            .await
            .map_err(Error::from)
    }

    /// Entry count, total size and stored-at range of a bucket.
    pub async fn bucket_stats(&self, bucket: &str) -> Result<BucketStats, Error> {
        let name = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<BucketStats, Error> {
                let stats = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(size), 0), MIN(stored_at), MAX(stored_at)
                    FROM cache_entries WHERE bucket = ?1",
                    params![&name],
                    |row| {
                        Ok(BucketStats {
                            name: name.clone(),
                            entries: row.get::<_, i64>(0)? as u64,
                            total_bytes: row.get::<_, i64>(1)? as u64,
                            oldest_stored_at: row.get(2)?,
                            newest_stored_at: row.get(3)?,
                        })
                    },
                )?;
                Ok(stats)
            })
            .await
            .map_err(Error::from)
    }
}
