//! ppc-access: random access into compressed tar archive blocks
//!
//! Usage:
//!   ppc-access [OPTIONS] <archive_map_file> <decompression_command> <input_dir> <output_dir> <mode>
//!
//! Modes:
//!   I  - interactive: type content ids, get the files copied to output_dir
//!   B  - benchmark: time a seeded 10% sample, print a CSV report
//!   T  - test: check every mapped file can be extracted on its own

mod modes;
mod report;
mod sampling;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ppc_core::config::PpcConfig;
use ppc_extract::{ExtractContext, MemberExtractor, NativeZstdExtractor, TarCommandExtractor};
use ppc_index::RocksIndex;
use tracing::{debug, info, warn};

use crate::modes::{Mode, Session};

#[derive(Parser, Debug)]
#[command(
    name = "ppc-access",
    version,
    about = "Index content ids to archive blocks and extract single files"
)]
struct Cli {
    /// Path to a ppc.toml configuration file
    #[arg(long, short = 'c', env = "PPC_CONFIG")]
    config: Option<PathBuf>,

    /// How archive members are extracted
    #[arg(long, value_enum, default_value = "tar")]
    extractor: ExtractorKind,

    /// Worker pool width for benchmark and test runs
    #[arg(long)]
    workers: Option<usize>,

    /// Reject archive map lines whose id is not a 40-char lowercase hex hash
    #[arg(long)]
    validate_ids: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PPC_LOG")]
    log: Option<String>,

    /// Log format (json, text)
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Text file of "<content_id> <block_name>" lines
    archive_map_file: PathBuf,

    /// Decompressor handed to `tar -I` (e.g. zstd)
    decompression_command: String,

    /// Directory the block names are relative to
    input_dir: PathBuf,

    /// Directory for the index, scratch space, and copied files
    output_dir: PathBuf,

    /// I (interactive), B (benchmark), or T (test)
    mode: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExtractorKind {
    /// Spawn `tar` with the decompression command
    Tar,
    /// Decode zstd-compressed tar blocks in process
    Native,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_missing) = load_config(cli.config.as_deref())?;
    if let Some(level) = &cli.log {
        config.log.level = level.clone();
    }
    let log_format = cli
        .log_format
        .unwrap_or_else(|| LogFormat::from_config(&config.log.format));
    init_logging(&config.log.level, log_format);

    if let Some(path) = config_missing {
        warn!(config = %path.display(), "config file not found, using defaults");
    }
    if let Some(workers) = cli.workers {
        config.extract.workers = workers;
    }
    if cli.validate_ids {
        config.ingest.validate_ids = true;
    }
    config.bench.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        mode = %cli.mode,
        map = %cli.archive_map_file.display(),
        "ppc-access starting"
    );

    run(&cli, &config)
}

fn run(cli: &Cli, config: &PpcConfig) -> Result<()> {
    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating output dir: {}", cli.output_dir.display()))?;

    let extractor: Box<dyn MemberExtractor> = match cli.extractor {
        ExtractorKind::Tar => Box::new(TarCommandExtractor::new(&cli.decompression_command)),
        ExtractorKind::Native => {
            debug!(
                command = %cli.decompression_command,
                "native extractor selected, decompression command unused"
            );
            Box::new(NativeZstdExtractor::new())
        }
    };

    let index_path = cli.output_dir.join(format!(
        "{}{}",
        config.index.path_prefix,
        std::process::id()
    ));
    let index = RocksIndex::open(&index_path, &config.index)
        .with_context(|| format!("opening index: {}", index_path.display()))?;

    let session = Session {
        ctx: ExtractContext {
            input_dir: &cli.input_dir,
            output_dir: &cli.output_dir,
            sandbox_prefix: &config.extract.sandbox_prefix,
            extractor: extractor.as_ref(),
        },
        index: &index,
        config,
        map_path: &cli.archive_map_file,
    };
    let mode = Mode::parse(&cli.mode);

    let outcome = modes::load(&session, &mode).and_then(|loaded| {
        let stdin = io::stdin();
        let mut stdout = io::stdout().lock();
        modes::run(&session, &mode, loaded, stdin.lock(), &mut stdout)?;
        stdout.flush().context("flushing stdout")
    });

    // The index goes away whether or not the mode succeeded.
    let closed = index
        .close_and_destroy()
        .with_context(|| format!("removing index: {}", index_path.display()));
    outcome?;
    closed
}

/// Read the TOML config, falling back to defaults when no path is given or
/// the file does not exist. Returns the missing path so it can be logged
/// once logging is up.
fn load_config(path: Option<&Path>) -> Result<(PpcConfig, Option<PathBuf>)> {
    let Some(path) = path else {
        return Ok((PpcConfig::default(), None));
    };
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("parsing config: {}", path.display()))?;
        Ok((config, None))
    } else {
        Ok((PpcConfig::default(), Some(path.to_path_buf())))
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the prompt and the report; logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
}
