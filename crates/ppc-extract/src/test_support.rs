//! Archive fixtures for tests in this crate and its dependents.

use std::fs::File;
use std::io;
use std::path::Path;

/// Write a zstd-compressed tar holding `members`.
pub fn write_tar_zst(path: &Path, members: &[(&str, &[u8])]) -> io::Result<()> {
    let file = File::create(path)?;
    let encoder = zstd::stream::write::Encoder::new(file, 3)?.auto_finish();
    let mut builder = tar::Builder::new(encoder);
    for (name, data) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data)?;
    }
    builder.into_inner()?;
    Ok(())
}
