/// Connection caching
///
/// The host may run many workflows against the same data source; building a
/// session pool per invocation is wasteful, so pools are cached process-wide
/// keyed by the data-source identifier. The host stamps each data source
/// with its last-updated time, and a changed stamp means "configuration
/// changed, reconnect": the cached pool is rebuilt and the superseded one is
/// closed.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use chrono::{DateTime, Utc};
use oracle::pool::{CloseMode, Pool, PoolBuilder};

use crate::client;
use crate::error::{classify_connect_error, Error};
use crate::source::SourceOptions;

/// Upper bound on sessions per cached pool; the driver manages the rest.
const MAX_POOL_SESSIONS: u32 = 4;

/// Identifies a cache slot: an opaque data-source id plus the host's
/// last-updated stamp for that data source.
#[derive(Debug, Clone)]
pub struct CacheKey {
    pub data_source_id: String,
    pub updated_at: DateTime<Utc>,
}

/// A handle that must be released when its cache entry is replaced.
pub trait CloseHandle {
    fn close_handle(&self);
}

impl CloseHandle for Pool {
    fn close_handle(&self) {
        if let Err(e) = self.close(&CloseMode::Force) {
            log::warn!("failed to close superseded connection pool: {}", e);
        }
    }
}

struct CacheEntry<H> {
    updated_at: DateTime<Utc>,
    handle: H,
}

/// A mutex-guarded map from data-source id to `(updated_at, handle)`.
///
/// The whole check-then-build-then-store sequence runs under one lock, so
/// two concurrent callers cannot both build a handle for the same id and a
/// replacement can never tear a concurrent read.
pub struct CacheMap<H> {
    entries: Mutex<HashMap<String, CacheEntry<H>>>,
}

impl<H: Clone + CloseHandle> CacheMap<H> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached handle when the stamp matches, otherwise builds a
    /// new one and stores it, closing any handle it replaces. A failed build
    /// leaves the previous entry untouched.
    pub fn get_or_build<F>(
        &self,
        data_source_id: &str,
        updated_at: DateTime<Utc>,
        build: F,
    ) -> Result<H, Error>
    where
        F: FnOnce() -> Result<H, Error>,
    {
        let mut entries = self.entries.lock().map_err(|_| Error::CacheLock)?;

        if let Some(entry) = entries.get(data_source_id) {
            if entry.updated_at == updated_at {
                log::debug!("connection cache hit for data source '{}'", data_source_id);
                return Ok(entry.handle.clone());
            }
            log::info!(
                "data source '{}' changed, rebuilding its connection",
                data_source_id
            );
        }

        let handle = build()?;
        let superseded = entries.insert(
            data_source_id.to_string(),
            CacheEntry {
                updated_at,
                handle: handle.clone(),
            },
        );
        if let Some(old) = superseded {
            old.handle.close_handle();
        }
        Ok(handle)
    }
}

impl<H: Clone + CloseHandle> Default for CacheMap<H> {
    fn default() -> Self {
        Self::new()
    }
}

static POOL_CACHE: OnceLock<CacheMap<Pool>> = OnceLock::new();

fn pool_cache() -> &'static CacheMap<Pool> {
    POOL_CACHE.get_or_init(CacheMap::new)
}

/// Obtains a session pool for the given source.
///
/// With a `CacheKey` the process-wide cache is consulted and kept current;
/// with `None` a fresh pool is always built and the cache is neither read
/// nor written (used for one-shot connectivity tests).
pub fn get_pool(source: &SourceOptions, key: Option<&CacheKey>) -> Result<Pool, Error> {
    match key {
        None => build_pool(source),
        Some(key) => {
            pool_cache().get_or_build(&key.data_source_id, key.updated_at, || build_pool(source))
        }
    }
}

fn build_pool(source: &SourceOptions) -> Result<Pool, Error> {
    source.validate()?;
    client::prime(source.client_path())?;

    let descriptor = source.connect_descriptor();
    log::info!(
        "building connection pool for {}:{}/{}",
        source.host,
        source.port,
        source.database
    );

    PoolBuilder::new(&source.username, &source.password, &descriptor)
        .max_connections(MAX_POOL_SESSIONS)
        .build()
        .map_err(|e| classify_connect_error(&e.to_string(), &descriptor, &source.database))
}
