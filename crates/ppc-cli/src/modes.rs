//! The three user-facing workflows: interactive lookup, benchmark, test.

use std::io::{BufRead, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use ppc_core::config::PpcConfig;
use ppc_extract::{extract_batch, extract_one, CopyOutcome, ExtractContext, SingleOptions};
use ppc_index::{count_lines, load_index, BlockIndex, LoadOptions, LoadSummary};
use tracing::{info, warn};

use crate::report::BenchReport;
use crate::sampling::{seeded, shuffle_ids, QuerySet};

/// Run mode selected by the last positional argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// `I`: read ids from stdin and copy each file out
    Interactive,
    /// `B`: time a sampled batch and print a CSV report
    Benchmark,
    /// `T`: extract every id once
    Test,
    /// Anything else: build the index and stop
    IndexOnly(String),
}

impl Mode {
    pub fn parse(arg: &str) -> Self {
        match arg {
            "I" => Mode::Interactive,
            "B" => Mode::Benchmark,
            "T" => Mode::Test,
            other => Mode::IndexOnly(other.to_string()),
        }
    }
}

/// Everything a mode needs for one run.
pub struct Session<'a> {
    pub ctx: ExtractContext<'a>,
    pub index: &'a dyn BlockIndex,
    pub config: &'a PpcConfig,
    pub map_path: &'a Path,
}

impl Session<'_> {
    fn map_name(&self) -> String {
        self.map_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.map_path.display().to_string())
    }
}

/// Archive map loaded into the index, plus the ids the mode will query.
pub struct Loaded {
    pub summary: LoadSummary,
    pub queries: Vec<String>,
}

/// Load the archive map into the index and build the mode's query set.
pub fn load(session: &Session<'_>, mode: &Mode) -> Result<Loaded> {
    let lines = count_lines(session.map_path)?;
    let mut queries = match mode {
        Mode::Benchmark => QuerySet::sampled(
            session.config.bench.sample_proportion,
            session.config.bench.seed,
            lines,
        )?,
        Mode::Test => QuerySet::full(lines),
        Mode::Interactive | Mode::IndexOnly(_) => QuerySet::Empty,
    };

    let options = LoadOptions {
        validate_ids: session.config.ingest.validate_ids,
    };
    let summary = load_index(
        session.map_path,
        session.ctx.input_dir,
        session.index,
        &options,
        |entry| queries.offer(&entry.content_id),
    )?;

    match session.index.estimate_num_keys() {
        Ok(keys) => info!(estimated_keys = keys, "index ready"),
        Err(e) => warn!("could not read index key estimate: {e}"),
    }

    Ok(Loaded {
        summary,
        queries: queries.into_ids(),
    })
}

/// Dispatch to the selected mode.
pub fn run<R: BufRead, W: Write>(
    session: &Session<'_>,
    mode: &Mode,
    loaded: Loaded,
    input: R,
    out: &mut W,
) -> Result<()> {
    match mode {
        Mode::Interactive => interactive(session, input, out),
        Mode::Benchmark => benchmark(session, loaded.queries, out).map(|_| ()),
        Mode::Test => test(session, &loaded.summary, &loaded.queries, out),
        Mode::IndexOnly(arg) => {
            warn!(mode = %arg, "unknown mode: index built, nothing else to do");
            Ok(())
        }
    }
}

/// Prompt for ids until `exit` or end of input.
///
/// Unknown ids and failed copies are reported and the loop continues; any
/// extraction failure ends the run.
pub fn interactive<R: BufRead, W: Write>(
    session: &Session<'_>,
    mut input: R,
    out: &mut W,
) -> Result<()> {
    let options = SingleOptions {
        interactive: true,
        bench: false,
    };
    let mut line = String::new();

    loop {
        writeln!(
            out,
            "--> Type a FILE ID to get the corresponding file. Type 'exit' to exit"
        )?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line).context("reading stdin")? == 0 {
            break;
        }
        let content_id = line.trim_end_matches(['\n', '\r']);
        if content_id == "exit" {
            break;
        }

        let block = match session.index.get(content_id) {
            Ok(Some(block)) => block,
            Ok(None) => {
                writeln!(out, "The file {content_id} is not in these compressed archives")?;
                continue;
            }
            Err(e) => {
                warn!(content_id, "index lookup failed: {e}");
                writeln!(out, "Failed to get value from DB")?;
                writeln!(out, "The file {content_id} is not in these compressed archives")?;
                continue;
            }
        };

        let extracted = extract_one(&session.ctx, &block, content_id, options)
            .with_context(|| format!("extracting {content_id} from {block}"))?;
        match extracted.copy {
            Some(CopyOutcome::Copied(dest)) => {
                writeln!(out, "OK! The desired file has been copied to {}", dest.display())?
            }
            Some(CopyOutcome::UpToDate(dest)) => {
                writeln!(out, "OK! {} is already up to date", dest.display())?
            }
            Some(CopyOutcome::Failed(failure)) => writeln!(out, "{failure}")?,
            None => {}
        }
    }

    Ok(())
}

/// Shuffle the sampled ids, time one batch over them, print the CSV report.
pub fn benchmark<W: Write>(
    session: &Session<'_>,
    mut queries: Vec<String>,
    out: &mut W,
) -> Result<BenchReport> {
    shuffle_ids(&mut queries, &mut seeded(session.config.bench.seed));
    info!(queries = queries.len(), "benchmark starting");

    let start = Instant::now();
    let bytes = extract_batch(
        &session.ctx,
        session.index,
        &queries,
        session.config.extract.workers,
        None,
    )?;
    let elapsed = start.elapsed();

    let report = BenchReport::new(session.map_name(), queries.len(), bytes, elapsed);
    report.write_csv(&mut *out)?;
    Ok(report)
}

/// Extract every id once; success means nothing failed.
pub fn test<W: Write>(
    session: &Session<'_>,
    summary: &LoadSummary,
    queries: &[String],
    out: &mut W,
) -> Result<()> {
    let name = session.map_name();
    writeln!(
        out,
        "Number of loaded keys: {}. Running {} queries. \
         Testing if all the files in the filename_archive_map: {} are singularly decompressable.",
        summary.loaded,
        queries.len(),
        name
    )?;
    out.flush()?;

    let pb = make_progress_bar(queries.len() as u64);
    let pb_clone = pb.clone();
    let progress = move |done: u64, _total: u64| pb_clone.set_position(done);
    let bytes = extract_batch(
        &session.ctx,
        session.index,
        queries,
        session.config.extract.workers,
        Some(&progress),
    )?;
    pb.finish_and_clear();
    info!(files = queries.len(), bytes, "test run complete");

    writeln!(out, "ALL the files in: {name} are singularly decompressable!")?;
    Ok(())
}

fn make_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) =
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb.set_prefix("test");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
