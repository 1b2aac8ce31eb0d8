//! Content-id → block-name index.
//!
//! Two backends are available:
//!   - **RocksDB** (default `rocksdb` feature): on-disk store created per run
//!     and destroyed when the index is closed or dropped.
//!   - **Memory**: `RwLock<HashMap>`, same semantics, no storage.
//!
//! Both implement `BlockIndex`. Writes happen once, single-threaded, while the
//! archive map loads; reads happen concurrently from the extraction workers,
//! so implementations must be `Sync` and `get` must take `&self`.

use std::collections::HashMap;
use std::sync::RwLock;

use ppc_core::{PpcError, PpcResult};

/// Trait for index backends (RocksDB and in-memory).
pub trait BlockIndex: Send + Sync {
    /// Insert or overwrite the block holding `content_id`.
    fn put(&self, content_id: &str, block_name: &str) -> PpcResult<()>;
    /// Look up the block holding `content_id`.
    fn get(&self, content_id: &str) -> PpcResult<Option<String>>;
    /// Approximate number of distinct keys.
    fn estimate_num_keys(&self) -> PpcResult<u64>;
}

/// In-memory index backend
#[derive(Debug, Default)]
pub struct MemoryIndex {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockIndex for MemoryIndex {
    fn put(&self, content_id: &str, block_name: &str) -> PpcResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| PpcError::Index("memory index lock poisoned".into()))?;
        entries.insert(content_id.to_string(), block_name.to_string());
        Ok(())
    }

    fn get(&self, content_id: &str) -> PpcResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| PpcError::Index("memory index lock poisoned".into()))?;
        Ok(entries.get(content_id).cloned())
    }

    fn estimate_num_keys(&self) -> PpcResult<u64> {
        let entries = self
            .entries
            .read()
            .map_err(|_| PpcError::Index("memory index lock poisoned".into()))?;
        Ok(entries.len() as u64)
    }
}

// ── RocksDB backend ──────────────────────────────────────────────────────────

#[cfg(feature = "rocksdb")]
mod rocksdb_backend {
    use std::path::{Path, PathBuf};

    use ppc_core::config::IndexConfig;
    use tracing::{debug, warn};

    use super::*;

    /// Ephemeral RocksDB index owned by a single run.
    ///
    /// `open` fails if a store already exists at the path; it is destroyed
    /// by `close_and_destroy` or, failing that, when the value is dropped.
    pub struct RocksIndex {
        db: Option<rocksdb::DB>,
        opts: rocksdb::Options,
        path: PathBuf,
    }

    impl RocksIndex {
        /// Create a fresh RocksDB index at `path`.
        pub fn open(path: &Path, config: &IndexConfig) -> PpcResult<Self> {
            let mut opts = rocksdb::Options::default();
            let parallelism = match config.increase_parallelism {
                n if n > 0 => n,
                _ => std::thread::available_parallelism()
                    .map(|n| n.get() as i32)
                    .unwrap_or(16),
            };
            opts.increase_parallelism(parallelism);
            opts.optimize_level_style_compaction(
                config.level_compaction_memtable_mb * 1024 * 1024,
            );
            opts.create_if_missing(true);
            // the store belongs to this run; never reuse one left on disk
            opts.set_error_if_exists(true);

            let db = rocksdb::DB::open(&opts, path).map_err(|e| {
                PpcError::Index(format!("Failed to open DB at {}: {e}", path.display()))
            })?;
            debug!(path = %path.display(), parallelism, "index opened");

            Ok(RocksIndex {
                db: Some(db),
                opts,
                path: path.to_path_buf(),
            })
        }

        /// Close the database and delete its storage.
        pub fn close_and_destroy(mut self) -> PpcResult<()> {
            self.destroy()
        }

        fn destroy(&mut self) -> PpcResult<()> {
            // The DB handle must be released before its files can be removed.
            let Some(db) = self.db.take() else {
                return Ok(());
            };
            drop(db);
            rocksdb::DB::destroy(&self.opts, &self.path).map_err(|e| {
                PpcError::Index(format!("destroying index {}: {e}", self.path.display()))
            })?;
            // destroy() leaves the directory itself behind
            if self.path.exists() {
                std::fs::remove_dir_all(&self.path).map_err(|e| {
                    PpcError::Index(format!("removing index {}: {e}", self.path.display()))
                })?;
            }
            debug!(path = %self.path.display(), "index destroyed");
            Ok(())
        }

        fn db(&self) -> PpcResult<&rocksdb::DB> {
            self.db
                .as_ref()
                .ok_or_else(|| PpcError::Index("index already closed".into()))
        }
    }

    impl BlockIndex for RocksIndex {
        fn put(&self, content_id: &str, block_name: &str) -> PpcResult<()> {
            self.db()?
                .put(content_id.as_bytes(), block_name.as_bytes())
                .map_err(|e| {
                    PpcError::Index(format!(
                        "Failed to put key-value in DB: {content_id} {block_name}: {e}"
                    ))
                })
        }

        fn get(&self, content_id: &str) -> PpcResult<Option<String>> {
            let value = self
                .db()?
                .get(content_id.as_bytes())
                .map_err(|e| PpcError::Index(format!("Failed to get {content_id}: {e}")))?;
            value
                .map(|bytes| {
                    String::from_utf8(bytes).map_err(|e| {
                        PpcError::Index(format!("non-UTF-8 block name for {content_id}: {e}"))
                    })
                })
                .transpose()
        }

        fn estimate_num_keys(&self) -> PpcResult<u64> {
            let n = self
                .db()?
                .property_int_value("rocksdb.estimate-num-keys")
                .map_err(|e| PpcError::Index(format!("reading key estimate: {e}")))?;
            Ok(n.unwrap_or(0))
        }
    }

    impl Drop for RocksIndex {
        fn drop(&mut self) {
            if let Err(e) = self.destroy() {
                warn!("failed to destroy index on drop: {e}");
            }
        }
    }
}

#[cfg(feature = "rocksdb")]
pub use rocksdb_backend::RocksIndex;
