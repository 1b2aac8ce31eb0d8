//! Archive map reader: `<content_id> <block_name>` per line.
//!
//! Every referenced block must exist under the input directory; the first
//! missing block stops the load with `PpcError::MissingBlock`, so a bad map
//! is rejected before any extraction runs.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use ppc_core::{ArchiveMapEntry, ContentId, PpcError, PpcResult};
use tracing::{debug, info};

use crate::index::BlockIndex;

/// Count the lines of a map file (first pass, used to size query sets).
pub fn count_lines(path: &Path) -> PpcResult<usize> {
    let file = open_map(path)?;
    let mut n = 0;
    for line in BufReader::new(file).lines() {
        line?;
        n += 1;
    }
    debug!(map = %path.display(), lines = n, "archive map counted");
    Ok(n)
}

fn open_map(path: &Path) -> PpcResult<File> {
    File::open(path)
        .map_err(|e| PpcError::Config(format!("Failed to open file {}: {e}", path.display())))
}

/// Streaming reader over an archive map file.
pub struct ArchiveMapReader {
    lines: Lines<BufReader<File>>,
    input_dir: PathBuf,
    validate_ids: bool,
}

impl ArchiveMapReader {
    pub fn open(path: &Path, input_dir: &Path) -> PpcResult<Self> {
        let file = open_map(path)?;
        Ok(ArchiveMapReader {
            lines: BufReader::new(file).lines(),
            input_dir: input_dir.to_path_buf(),
            validate_ids: false,
        })
    }

    /// Reject ids that are not 40-char lowercase hex.
    pub fn validate_ids(mut self, enabled: bool) -> Self {
        self.validate_ids = enabled;
        self
    }

    fn check(&self, entry: ArchiveMapEntry) -> PpcResult<ArchiveMapEntry> {
        if self.validate_ids {
            ContentId::validate(&entry.content_id)?;
        }
        let block_path = self.input_dir.join(&entry.block_name);
        if entry.block_name.is_empty() || !block_path.is_file() {
            return Err(PpcError::MissingBlock(block_path));
        }
        Ok(entry)
    }
}

impl Iterator for ArchiveMapReader {
    type Item = PpcResult<ArchiveMapEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e.into())),
        };
        Some(self.check(ArchiveMapEntry::parse_line(&line)))
    }
}

/// Options for `load_index`
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub validate_ids: bool,
}

/// Outcome of loading an archive map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    /// Entries written to the index
    pub loaded: usize,
}

/// Load every map entry into `index`, handing each to `on_entry` as well.
///
/// Stops at the first missing block, invalid id (if enabled), or index
/// write failure.
pub fn load_index<F>(
    map_path: &Path,
    input_dir: &Path,
    index: &dyn BlockIndex,
    options: &LoadOptions,
    mut on_entry: F,
) -> PpcResult<LoadSummary>
where
    F: FnMut(&ArchiveMapEntry),
{
    let reader = ArchiveMapReader::open(map_path, input_dir)?.validate_ids(options.validate_ids);
    let mut loaded = 0;
    for entry in reader {
        let entry = entry?;
        index.put(&entry.content_id, &entry.block_name)?;
        on_entry(&entry);
        loaded += 1;
    }

    info!(map = %map_path.display(), loaded, "archive map loaded");
    Ok(LoadSummary { loaded })
}
