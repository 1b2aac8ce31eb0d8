//! Benchmark CSV report: one header line, one data row.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

const MIB: f64 = (1u64 << 20) as f64;

/// Throughput figures for one benchmark run
#[derive(Debug, Clone, PartialEq)]
pub struct BenchReport {
    pub map_name: String,
    pub ms_per_file: f64,
    pub mib_per_sec: f64,
    pub files_per_sec: f64,
}

#[derive(Serialize)]
struct Row<'a> {
    #[serde(rename = "FILE_ARCHIVE_MAP")]
    map: &'a str,
    #[serde(rename = "TIME_FILE_DECOMPRESSION(ms/file)")]
    ms_per_file: String,
    #[serde(rename = "FILE_ACCESS_SPEED(MiB/s)")]
    mib_per_sec: String,
    #[serde(rename = "THROUGHPUT(files/s)")]
    files_per_sec: String,
}

impl BenchReport {
    /// Derive the rates from totals. Empty runs and zero elapsed time
    /// produce zeros rather than NaN or infinity.
    pub fn new(map_name: impl Into<String>, files: usize, bytes: u64, elapsed: Duration) -> Self {
        let ms = elapsed.as_secs_f64() * 1000.0;
        let (ms_per_file, mib_per_sec, files_per_sec) = if files == 0 || ms <= 0.0 {
            (0.0, 0.0, 0.0)
        } else {
            (
                ms / files as f64,
                (bytes as f64 / MIB) / ms * 1000.0,
                files as f64 / ms * 1000.0,
            )
        };
        BenchReport {
            map_name: map_name.into(),
            ms_per_file,
            mib_per_sec,
            files_per_sec,
        }
    }

    pub fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer
            .serialize(Row {
                map: &self.map_name,
                ms_per_file: format!("{:.2}", self.ms_per_file),
                mib_per_sec: format!("{:.2}", self.mib_per_sec),
                files_per_sec: format!("{:.2}", self.files_per_sec),
            })
            .context("writing benchmark report")?;
        writer.flush().context("flushing benchmark report")?;
        Ok(())
    }
}
