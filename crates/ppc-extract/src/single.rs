//! Single-file extraction inside a fresh sandbox.

use std::fmt;
use std::path::{Path, PathBuf};

use ppc_core::{PpcError, PpcResult};
use tracing::{debug, warn};

use crate::checksum::consume_file;
use crate::sandbox::Sandbox;
use crate::ExtractContext;

/// Flags for `extract_one`
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleOptions {
    /// Copy the member to `output_dir/content_id`
    pub interactive: bool,
    /// Read and checksum the member to force real I/O
    pub bench: bool,
}

/// A copy-out that failed; the request is abandoned, the run continues.
#[derive(Debug)]
pub struct CopyFailure {
    pub from: PathBuf,
    pub to: PathBuf,
    pub error: std::io::Error,
}

impl fmt::Display for CopyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR! {}", self.error)?;
        writeln!(f, "path1(): {}", self.from.display())?;
        writeln!(f, "path2(): {}", self.to.display())?;
        match self.error.raw_os_error() {
            Some(code) => writeln!(f, "code().value():    {code}")?,
            None => writeln!(f, "code().value():    none")?,
        }
        write!(f, "code().kind():     {:?}", self.error.kind())
    }
}

/// Result of copying the member out in interactive mode
#[derive(Debug)]
pub enum CopyOutcome {
    Copied(PathBuf),
    /// Destination already exists and is not older than the extracted file
    UpToDate(PathBuf),
    Failed(CopyFailure),
}

/// Result of `extract_one`
#[derive(Debug)]
pub struct Extracted {
    /// Member length in bytes; 0 when the interactive copy failed
    pub bytes: u64,
    /// Set only in interactive mode
    pub copy: Option<CopyOutcome>,
}

/// Extract `content_id` from `block_name` into a fresh sandbox.
///
/// Extraction failures and a missing member are fatal errors. In interactive
/// mode a failed copy to the output directory is reported through
/// `CopyOutcome::Failed` instead. The sandbox is removed on every path.
pub fn extract_one(
    ctx: &ExtractContext<'_>,
    block_name: &str,
    content_id: &str,
    options: SingleOptions,
) -> PpcResult<Extracted> {
    let sandbox = Sandbox::create(ctx.output_dir, ctx.sandbox_prefix, "single")?;

    let archive = ctx.input_dir.join(block_name);
    ctx.extractor
        .extract_member(&archive, content_id, sandbox.path())?;

    let extracted = sandbox.path().join(content_id);
    let bytes = match std::fs::metadata(&extracted) {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => return Err(PpcError::MemberMissing(extracted)),
    };
    debug!(content_id, block = block_name, bytes, "member extracted");

    let mut copy = None;
    if options.interactive {
        let outcome = copy_out(&extracted, ctx.output_dir, content_id);
        if let CopyOutcome::Failed(failure) = &outcome {
            warn!(content_id, "copy to output failed: {}", failure.error);
            sandbox.close()?;
            return Ok(Extracted {
                bytes: 0,
                copy: Some(outcome),
            });
        }
        copy = Some(outcome);
    }

    if options.bench {
        consume_file(&extracted)?;
    }

    sandbox.close()?;
    Ok(Extracted { bytes, copy })
}

/// Copy with update-if-newer semantics into `output_dir/content_id`.
fn copy_out(extracted: &Path, output_dir: &Path, content_id: &str) -> CopyOutcome {
    let dest = output_dir.join(content_id);
    let fail = |error: std::io::Error| {
        CopyOutcome::Failed(CopyFailure {
            from: extracted.to_path_buf(),
            to: dest.clone(),
            error,
        })
    };

    if let Some(parent) = dest.parent() {
        if !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                return fail(e);
            }
        }
    }

    if dest.is_file() {
        let newer = std::fs::metadata(extracted)
            .and_then(|m| m.modified())
            .and_then(|src| {
                std::fs::metadata(&dest)
                    .and_then(|m| m.modified())
                    .map(|dst| src > dst)
            });
        match newer {
            Ok(false) => return CopyOutcome::UpToDate(dest.clone()),
            Ok(true) => {}
            Err(e) => return fail(e),
        }
    }

    match std::fs::copy(extracted, &dest) {
        Ok(_) => CopyOutcome::Copied(dest.clone()),
        Err(e) => fail(e),
    }
}
