//! ppc-core: types shared by the index, extraction, and CLI crates.

pub mod config;
pub mod error;
pub mod types;

pub use error::{PpcError, PpcResult};
pub use types::{ArchiveMapEntry, ContentId};
