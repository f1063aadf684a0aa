use std::io;

use thiserror::Error;

/// Failures that abort a check. Integrity problems are reported as
/// [`crate::Finding`]s instead.
#[derive(Debug, Error)]
pub enum TarcheckError {
    #[error("open {path}")]
    Open { path: String, source: io::Error },
    #[error("read header")]
    ReadHeader(#[source] io::Error),
    #[error("rewind input")]
    Rewind(#[source] io::Error),
    #[error("zstd decoder")]
    Decoder(#[source] io::Error),
    #[error("tar read")]
    TarEntry(#[source] io::Error),
    #[error("read entry {name}")]
    EntryContent { name: String, source: io::Error },
    #[error("parse manifest.json")]
    ParseManifest(#[source] serde_json::Error),
    #[error("parse index.json")]
    ParseIndex(#[source] serde_json::Error),
}
