//! Cross-run seen store — remembers identity keys already reported so later
//! runs only surface new postings.
//!
//! Lives outside the pipeline core: the driver never consults it. `main`
//! reads the store with `filter_unseen` before reporting and writes it with
//! `mark_seen` only once the report has been written and delivered.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::job::JobRecord;

pub const DEFAULT_REDIS_KEY: &str = "jobwatch:seen";

#[derive(Debug, Error)]
pub enum SeenStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt seen-store file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait SeenStore: Send {
    async fn contains(&mut self, key: &str) -> Result<bool, SeenStoreError>;
    async fn add(&mut self, key: &str) -> Result<(), SeenStoreError>;
    /// Persists pending additions.
    async fn flush(&mut self) -> Result<(), SeenStoreError>;
}

/// Drops records already in `store`. Read-only: nothing is recorded here.
pub async fn filter_unseen(
    records: Vec<JobRecord>,
    store: &mut dyn SeenStore,
) -> Result<Vec<JobRecord>, SeenStoreError> {
    let total = records.len();
    let mut fresh = Vec::with_capacity(total);

    for record in records {
        let key = record.identity.to_string();
        if store.contains(&key).await? {
            debug!("Already reported: {key}");
            continue;
        }
        fresh.push(record);
    }

    info!("Seen store: {} of {} records are new", fresh.len(), total);
    Ok(fresh)
}

/// Records every reported key, then flushes.
pub async fn mark_seen(
    records: &[JobRecord],
    store: &mut dyn SeenStore,
) -> Result<(), SeenStoreError> {
    for record in records {
        store.add(&record.identity.to_string()).await?;
    }
    store.flush().await?;
    debug!("Marked {} records as seen", records.len());
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// File-backed store
// ────────────────────────────────────────────────────────────────────────────

/// JSON array of keys on disk. A missing file is an empty store.
pub struct FileSeenStore {
    path: PathBuf,
    keys: BTreeSet<String>,
    dirty: bool,
}

impl FileSeenStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SeenStoreError> {
        let path = path.into();
        let keys = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<BTreeSet<String>>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded {} seen keys from {}", keys.len(), path.display());
        Ok(Self {
            path,
            keys,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl SeenStore for FileSeenStore {
    async fn contains(&mut self, key: &str) -> Result<bool, SeenStoreError> {
        Ok(self.keys.contains(key))
    }

    async fn add(&mut self, key: &str) -> Result<(), SeenStoreError> {
        self.dirty |= self.keys.insert(key.to_string());
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SeenStoreError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Atomic replace: write a sibling temp file, then rename over.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&self.keys)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        self.dirty = false;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis-backed store
// ────────────────────────────────────────────────────────────────────────────

/// A Redis set. Writes go straight through, so `flush` has nothing to do.
pub struct RedisSeenStore {
    conn: redis::aio::MultiplexedConnection,
    key: String,
}

impl RedisSeenStore {
    pub async fn connect(url: &str, key: &str) -> Result<Self, SeenStoreError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Redis seen store connected (set {key})");
        Ok(Self {
            conn,
            key: key.to_string(),
        })
    }
}

#[async_trait]
impl SeenStore for RedisSeenStore {
    async fn contains(&mut self, key: &str) -> Result<bool, SeenStoreError> {
        Ok(self.conn.sismember::<_, _, bool>(&self.key, key).await?)
    }

    async fn add(&mut self, key: &str) -> Result<(), SeenStoreError> {
        self.conn.sadd::<_, _, ()>(&self.key, key).await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SeenStoreError> {
        Ok(())
    }
}
