use serde::{Deserialize, Serialize};

/// Top-level configuration (loaded from ppc.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PpcConfig {
    pub index: IndexConfig,
    pub extract: ExtractConfig,
    pub bench: BenchConfig,
    pub ingest: IngestConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Background threads for flush/compaction (0 = cpu_count)
    pub increase_parallelism: i32,
    /// Memtable budget handed to level-style compaction tuning, in MiB
    pub level_compaction_memtable_mb: usize,
    /// Directory name prefix; the process id is appended
    pub path_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Worker pool width for batch extraction
    pub workers: usize,
    /// Sandbox directory name prefix; the process id is appended
    pub sandbox_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Bernoulli probability of selecting each id for the benchmark
    pub sample_proportion: f64,
    /// Seed for both the sampling and shuffling generators
    pub seed: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Reject map lines whose id is not a 40-char lowercase hex hash
    pub validate_ids: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            increase_parallelism: 0,
            level_compaction_memtable_mb: 512,
            path_prefix: "rocksdb_compressed_archive_index_".into(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            workers: 16,
            sandbox_prefix: "tmp.ppc_access_".into(),
        }
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            sample_proportion: 0.1,
            seed: 42,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl BenchConfig {
    /// Reject probabilities outside [0, 1] before any sampling happens.
    pub fn validate(&self) -> crate::PpcResult<()> {
        if !(0.0..=1.0).contains(&self.sample_proportion) {
            return Err(crate::PpcError::Config(format!(
                "bench.sample_proportion must be within [0, 1], got {}",
                self.sample_proportion
            )));
        }
        Ok(())
    }
}
