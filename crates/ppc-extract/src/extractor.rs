//! Member extraction: "extract member M of archive A into directory D".
//!
//! `TarCommandExtractor` spawns `tar -xf A M -I<decompressor>` with D as the
//! child's working directory. `NativeZstdExtractor` streams a zstd-compressed
//! tar through the linked `zstd` and `tar` crates and stops at the member.

use std::fs::File;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use ppc_core::{PpcError, PpcResult};
use tracing::debug;

/// Capability to materialize one archive member on disk.
pub trait MemberExtractor: Send + Sync {
    /// Extract `member` from `archive` into `dest`; returns the expected
    /// path of the extracted file (`dest/member`).
    fn extract_member(&self, archive: &Path, member: &str, dest: &Path) -> PpcResult<PathBuf>;
}

/// Runs the system `tar` with an external decompression program.
#[derive(Debug, Clone)]
pub struct TarCommandExtractor {
    decompress_command: String,
}

impl TarCommandExtractor {
    pub fn new(decompress_command: impl Into<String>) -> Self {
        Self {
            decompress_command: decompress_command.into(),
        }
    }

    fn command_line(&self, archive: &Path, member: &str) -> String {
        format!(
            "tar -xf {} {} -I{}",
            archive.display(),
            member,
            self.decompress_command
        )
    }
}

impl MemberExtractor for TarCommandExtractor {
    fn extract_member(&self, archive: &Path, member: &str, dest: &Path) -> PpcResult<PathBuf> {
        let command = self.command_line(archive, member);
        // The child runs inside `dest`, so a relative archive path would
        // resolve against the wrong directory.
        let archive = std::fs::canonicalize(archive).map_err(|e| PpcError::Extraction {
            command: command.clone(),
            reason: format!("resolving archive path: {e}"),
        })?;

        debug!(%command, cwd = %dest.display(), "spawning extractor");
        let output = Command::new("tar")
            .arg("-xf")
            .arg(&archive)
            .arg(member)
            .arg(format!("-I{}", self.decompress_command))
            .current_dir(dest)
            .output()
            .map_err(|e| PpcError::Extraction {
                command: command.clone(),
                reason: format!("spawning tar: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PpcError::Extraction {
                command,
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        Ok(dest.join(member))
    }
}

/// In-process extractor for `.tar.zst` blocks.
#[derive(Debug, Clone, Default)]
pub struct NativeZstdExtractor;

impl NativeZstdExtractor {
    pub fn new() -> Self {
        Self
    }
}

/// Compare tar entry names ignoring a leading `./`.
fn same_member(entry: &Path, member: &Path) -> bool {
    let strip = |p: &Path| -> PathBuf {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    };
    strip(entry) == strip(member)
}

impl MemberExtractor for NativeZstdExtractor {
    fn extract_member(&self, archive: &Path, member: &str, dest: &Path) -> PpcResult<PathBuf> {
        let command = format!("zstd-tar extract {} {}", archive.display(), member);
        let fail = |reason: String| PpcError::Extraction {
            command: command.clone(),
            reason,
        };

        let file = File::open(archive).map_err(|e| fail(format!("opening archive: {e}")))?;
        let decoder =
            zstd::stream::read::Decoder::new(file).map_err(|e| fail(format!("zstd: {e}")))?;
        let mut tarball = tar::Archive::new(decoder);
        let wanted = Path::new(member);

        let entries = tarball
            .entries()
            .map_err(|e| fail(format!("reading tar: {e}")))?;
        for entry in entries {
            let mut entry = entry.map_err(|e| fail(format!("reading tar entry: {e}")))?;
            let matches = {
                let path = entry
                    .path()
                    .map_err(|e| fail(format!("reading tar entry path: {e}")))?;
                same_member(&path, wanted)
            };
            if matches {
                entry
                    .unpack_in(dest)
                    .map_err(|e| fail(format!("unpacking member: {e}")))?;
                return Ok(dest.join(member));
            }
        }

        Err(fail(format!("{member}: Not found in archive")))
    }
}
