use std::fmt;

use serde::Serialize;

use crate::docker::DockerReport;
use crate::oci::OciReport;

/// A reference that could not be resolved inside the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Finding {
    MissingConfig(String),
    MissingLayer(String),
    MissingBlob(String),
    UnexpectedDigest(String),
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::MissingConfig(path) => write!(f, "MISSING: config {:?}", path),
            Finding::MissingLayer(path) => write!(f, "MISSING: layer {:?}", path),
            Finding::MissingBlob(path) => write!(f, "MISSING: {}", path),
            Finding::UnexpectedDigest(digest) => {
                write!(f, "UNEXPECTED digest format: {:?}", digest)
            }
        }
    }
}

/// Outcome of checking one archive. Either layout, both, or neither may be present.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveReport {
    pub entries: usize,
    pub docker: Option<DockerReport>,
    pub oci: Option<OciReport>,
}

impl ArchiveReport {
    pub fn is_classified(&self) -> bool {
        self.docker.is_some() || self.oci.is_some()
    }

    /// True when every detected layout resolved all of its references.
    pub fn is_complete(&self) -> bool {
        self.docker.as_ref().map_or(true, |d| d.complete)
            && self.oci.as_ref().map_or(true, |o| o.complete)
    }
}

impl fmt::Display for ArchiveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(docker) = &self.docker {
            write!(f, "{}", docker)?;
        }
        if let Some(oci) = &self.oci {
            write!(f, "{}", oci)?;
        }
        if !self.is_classified() {
            writeln!(
                f,
                "No manifest.json or index.json detected; tar may have an unexpected layout."
            )?;
        }
        Ok(())
    }
}
