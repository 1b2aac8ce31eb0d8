use std::path::PathBuf;

use thiserror::Error;

pub type PpcResult<T> = Result<T, PpcError>;

#[derive(Debug, Error)]
pub enum PpcError {
    #[error("config error: {0}")]
    Config(String),

    #[error("File {} does not exist.", .0.display())]
    MissingBlock(PathBuf),

    #[error("{id} is not a valid file id: {reason}")]
    InvalidContentId { id: String, reason: &'static str },

    #[error("index error: {0}")]
    Index(String),

    #[error("file id {0} is missing from the index")]
    IndexMiss(String),

    #[error("Failed to run {command}: {reason}")]
    Extraction { command: String, reason: String },

    #[error("File {} not found! Error while decompressing file.", .0.display())]
    MemberMissing(PathBuf),

    #[error("sandbox error at {}: {source}", path.display())]
    Sandbox {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

