//! Bucket and entry CRUD operations.
//!
//! A bucket is created on first use (the equivalent of opening a named
//! cache). Entries are keyed by bucket name plus request identity, and
//! every stored response is stamped with [`CACHED_AT_HEADER`].

use std::collections::BTreeMap;

use super::connection::CacheDb;
use super::hash::{compute_cache_key, is_valid_key};
use crate::message::{CACHED_AT_HEADER, SiteRequest, SiteResponse};
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored request/response pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEntry {
    pub bucket: String,
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub size: u64,
    /// Write time in epoch milliseconds.
    pub stored_at: i64,
}

impl CachedEntry {
    /// Milliseconds elapsed between the write and `now_ms`.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.stored_at).max(0)
    }

    pub fn into_response(self) -> SiteResponse {
        SiteResponse { status: self.status, headers: self.headers, body: self.body }
    }
}

/// Entry listing row without the body.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntryMeta {
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub size: u64,
    pub stored_at: i64,
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<(CachedEntry, String)> {
    let entry = CachedEntry {
        bucket: row.get(0)?,
        key_hash: row.get(1)?,
        method: row.get(2)?,
        url: row.get(3)?,
        status: row.get::<_, i64>(4)? as u16,
        headers: BTreeMap::new(),
        body: row.get(6)?,
        size: row.get::<_, i64>(7)? as u64,
        stored_at: row.get(8)?,
    };
    let headers_json: String = row.get(5)?;
    Ok((entry, headers_json))
}

impl CacheDb {
    /// Create the bucket if it doesn't exist yet.
    pub async fn open_bucket(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO cache_buckets (name, created_at) VALUES (?1, ?2)",
                    params![name, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a bucket exists.
    pub async fn has_bucket(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_buckets WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// List all bucket names, sorted.
    pub async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_buckets ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a bucket and every entry in it.
    ///
    /// Returns false if the bucket didn't exist.
    pub async fn delete_bucket(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_buckets WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response for a request, replacing any previous entry.
    ///
    /// The stored headers gain [`CACHED_AT_HEADER`] set to `stored_at`.
    /// Returns the stored size in bytes.
    pub async fn put_entry(
        &self, bucket: &str, request: &SiteRequest, response: &SiteResponse, stored_at: i64,
    ) -> Result<u64, Error> {
        let bucket = bucket.to_string();
        let key_hash = request.cache_key();
        let method = request.method.to_ascii_uppercase();
        let url = request.url.to_string();
        let status = response.status as i64;
        let mut headers = response.headers.clone();
        headers.insert(CACHED_AT_HEADER.to_string(), stored_at.to_string());
        let headers_json = serde_json::to_string(&headers)?;
        let body = response.body.clone();
        let size = body.len() as u64;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO cache_buckets (name, created_at) VALUES (?1, ?2)",
                    params![&bucket, chrono::Utc::now().to_rfc3339()],
                )?;
                tx.execute(
                    "INSERT INTO cache_entries (
                        bucket, key_hash, method, url, status, headers_json, body, size, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(bucket, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        size = excluded.size,
                        stored_at = excluded.stored_at",
                    params![bucket, key_hash, method, url, status, headers_json, body, size as i64, stored_at],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(size)
    }

    /// Get an entry by its key hash.
    pub async fn get_entry(&self, bucket: &str, key_hash: &str) -> Result<Option<CachedEntry>, Error> {
        if !is_valid_key(key_hash) {
            return Err(Error::InvalidHash);
        }
        let bucket = bucket.to_string();
        let key_hash = key_hash.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT bucket, key_hash, method, url, status, headers_json, body, size, stored_at
                    FROM cache_entries WHERE bucket = ?1 AND key_hash = ?2",
                )?;

                match stmt.query_row(params![bucket, key_hash], row_to_entry) {
                    Ok((mut entry, headers_json)) => {
                        entry.headers = serde_json::from_str(&headers_json)?;
                        Ok(Some(entry))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the stored entry for a request.
    pub async fn match_entry(&self, bucket: &str, request: &SiteRequest) -> Result<Option<CachedEntry>, Error> {
        self.get_entry(bucket, &request.cache_key()).await
    }

    /// Delete the entry for a method and URL.
    pub async fn delete_entry(&self, bucket: &str, method: &str, url: &str) -> Result<bool, Error> {
        let bucket = bucket.to_string();
        let key_hash = compute_cache_key(method, url);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM cache_entries WHERE bucket = ?1 AND key_hash = ?2",
                    params![bucket, key_hash],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List entries in a bucket, oldest stored-at first.
    pub async fn list_entries(&self, bucket: &str) -> Result<Vec<EntryMeta>, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntryMeta>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key_hash, method, url, status, size, stored_at
                    FROM cache_entries WHERE bucket = ?1
                    ORDER BY stored_at ASC, rowid ASC",
                )?;
                let rows = stmt
                    .query_map(params![bucket], |row| {
                        Ok(EntryMeta {
                            key_hash: row.get(0)?,
                            method: row.get(1)?,
                            url: row.get(2)?,
                            status: row.get::<_, i64>(3)? as u16,
                            size: row.get::<_, i64>(4)? as u64,
                            stored_at: row.get(5)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }
}
