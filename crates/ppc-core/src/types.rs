use crate::error::{PpcError, PpcResult};

/// Length of a SHA1 content id in hex characters
pub const CONTENT_ID_LEN: usize = 40;

/// One line of the archive map: which block holds which file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMapEntry {
    /// Content hash naming the member inside the block
    pub content_id: String,
    /// Path of the compressed block, relative to the input directory
    pub block_name: String,
}

impl ArchiveMapEntry {
    /// Split a map line at its first space.
    ///
    /// A line without a separator keeps the whole line as the id and leaves
    /// `block_name` empty; the block existence check rejects it later.
    pub fn parse_line(line: &str) -> Self {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match line.split_once(' ') {
            Some((id, block)) => ArchiveMapEntry {
                content_id: id.to_string(),
                block_name: block.to_string(),
            },
            None => ArchiveMapEntry {
                content_id: line.to_string(),
                block_name: String::new(),
            },
        }
    }
}

/// Content id format checks (SHA1, lowercase hex)
pub struct ContentId;

impl ContentId {
    pub fn validate(id: &str) -> PpcResult<()> {
        if id.len() != CONTENT_ID_LEN {
            return Err(PpcError::InvalidContentId {
                id: id.to_string(),
                reason: "SHA1 id must be 40 characters long",
            });
        }
        if !id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(PpcError::InvalidContentId {
                id: id.to_string(),
                reason: "SHA1 id must contain just 0123456789abcdef chars",
            });
        }
        Ok(())
    }
}
