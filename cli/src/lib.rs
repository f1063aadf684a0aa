use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::{info, warn};

pub mod detect;
pub mod docker;
pub mod error;
pub mod index;
pub mod oci;
pub mod report;

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
mod testutil;

pub use detect::{open_stream, ArchiveStream, ZSTD_MAGIC};
pub use docker::{check_docker_archive, DockerManifestEntry, DockerReport};
pub use error::TarcheckError;
pub use index::ArchiveIndex;
pub use oci::{check_oci_layout, Digest, OciIndex, OciReport};
pub use report::{ArchiveReport, Finding};

/// Open `path`, index it and run every layout check whose manifest is present.
pub fn check_archive(path: &Path) -> Result<ArchiveReport, TarcheckError> {
    let file = File::open(path).map_err(|source| TarcheckError::Open {
        path: path.display().to_string(),
        source,
    })?;
    check_reader(BufReader::new(file))
}

/// Same as [`check_archive`] for any seekable source. The source and any
/// decoder wrapped around it are dropped before returning.
pub fn check_reader<R: Read + Seek>(source: R) -> Result<ArchiveReport, TarcheckError> {
    let stream = open_stream(source)?;
    let compressed = stream.is_compressed();
    let index = ArchiveIndex::scan(stream)?;
    info!(entries = index.len(), compressed, "archive indexed");
    if index.is_empty() {
        warn!("archive contains no entries");
    }

    let docker = index
        .docker_manifest()
        .map(|manifest| check_docker_archive(manifest, &index))
        .transpose()?;
    let oci = index
        .oci_index()
        .map(|oci_index| check_oci_layout(oci_index, &index))
        .transpose()?;

    Ok(ArchiveReport {
        entries: index.len(),
        docker,
        oci,
    })
}
