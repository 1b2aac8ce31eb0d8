//! ppc-extract: pull single members out of compressed archive blocks
//!
//! # Overview
//! - `sandbox`: per-run and per-task scratch directories, removed on drop
//! - `extractor`: the `MemberExtractor` capability (spawned `tar`, or linked zstd)
//! - `single`: one lookup-free extraction with optional copy-out / consumption
//! - `batch`: index lookup + extraction fanned out over a fixed worker pool
//! - `checksum`: forced read of extracted bytes for throughput measurement

pub mod batch;
pub mod checksum;
pub mod extractor;
pub mod sandbox;
pub mod single;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

use std::path::Path;

pub use batch::{extract_batch, ProgressFn};
pub use extractor::{MemberExtractor, NativeZstdExtractor, TarCommandExtractor};
pub use sandbox::{Sandbox, TaskDir};
pub use single::{extract_one, CopyFailure, CopyOutcome, Extracted, SingleOptions};

/// Directories and extraction mechanism shared by every extraction in a run.
#[derive(Clone, Copy)]
pub struct ExtractContext<'a> {
    /// Root the archive map's block names are relative to
    pub input_dir: &'a Path,
    /// Parent of sandboxes and destination of interactive copies
    pub output_dir: &'a Path,
    /// Sandbox directory name prefix
    pub sandbox_prefix: &'a str,
    pub extractor: &'a dyn MemberExtractor,
}
