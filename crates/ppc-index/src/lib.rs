//! ppc-index: archive map parsing and the content-id → block index
//!
//! # Overview
//! - `archive_map`: line reader for `<content_id> <block_name>` map files
//! - `index`: `BlockIndex` trait with RocksDB and in-memory backends

pub mod archive_map;
pub mod index;

pub use archive_map::{count_lines, load_index, ArchiveMapReader, LoadOptions, LoadSummary};
pub use index::{BlockIndex, MemoryIndex};

#[cfg(feature = "rocksdb")]
pub use index::RocksIndex;
