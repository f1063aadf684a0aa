//! OCI image layout: a top-level `index.json` whose descriptors point at
//! content-addressed files under `blobs/`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::TarcheckError;
use crate::index::ArchiveIndex;
use crate::report::Finding;

pub const REF_NAME_ANNOTATION: &str = "org.opencontainers.image.ref.name";

/// `index.json` at the root of an OCI layout.
#[derive(Debug, Clone, Deserialize)]
pub struct OciIndex {
    pub manifests: Vec<OciDescriptor>,
}

/// Manifest descriptor. Only `digest` is required.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OciDescriptor {
    pub digest: String,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub annotations: Option<HashMap<String, String>>,
}

impl OciDescriptor {
    pub fn ref_name(&self) -> Option<&str> {
        self.annotations
            .as_ref()
            .and_then(|a| a.get(REF_NAME_ANNOTATION))
            .map(String::as_str)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unexpected digest format: {0:?}")]
pub struct DigestError(pub String);

/// `<algorithm>:<hex>` content identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub algorithm: String,
    pub hex: String,
}

impl Digest {
    /// Location of the blob inside an OCI layout.
    pub fn blob_path(&self) -> String {
        format!("blobs/{}/{}", self.algorithm, self.hex)
    }
}

impl FromStr for Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((algorithm, hex))
                if !algorithm.is_empty() && !hex.is_empty() && !hex.contains(':') =>
            {
                Ok(Digest {
                    algorithm: algorithm.to_string(),
                    hex: hex.to_string(),
                })
            }
            _ => Err(DigestError(s.to_string())),
        }
    }
}

pub fn parse_index(bytes: &[u8]) -> Result<OciIndex, TarcheckError> {
    serde_json::from_slice(bytes).map_err(TarcheckError::ParseIndex)
}

#[derive(Debug, Clone, Serialize)]
pub struct OciManifestReport {
    pub digest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OciReport {
    pub complete: bool,
    pub manifests: Vec<OciManifestReport>,
}

/// Check that every descriptor in `index_json` resolves to a blob entry.
pub fn check_oci_layout(
    index_json: &[u8],
    index: &ArchiveIndex,
) -> Result<OciReport, TarcheckError> {
    let oci_index = parse_index(index_json)?;
    let mut manifests = Vec::with_capacity(oci_index.manifests.len());

    for descriptor in &oci_index.manifests {
        let finding = match descriptor.digest.parse::<Digest>() {
            Err(DigestError(raw)) => Some(Finding::UnexpectedDigest(raw)),
            Ok(digest) => {
                let path = digest.blob_path();
                (!index.contains(&path)).then_some(Finding::MissingBlob(path))
            }
        };
        if let Some(finding) = &finding {
            warn!(%finding, digest = %descriptor.digest, "oci descriptor not resolved");
        }
        manifests.push(OciManifestReport {
            digest: descriptor.digest.clone(),
            media_type: descriptor.media_type.clone(),
            size: descriptor.size,
            ref_name: descriptor.ref_name().map(str::to_string),
            findings: finding.into_iter().collect(),
        });
    }

    let complete = manifests.iter().all(|m| m.findings.is_empty());
    info!(manifests = manifests.len(), complete, "oci layout check finished");
    Ok(OciReport { complete, manifests })
}

impl fmt::Display for OciReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Detected OCI layout (index.json). Checking blobs/ references..."
        )?;
        for (i, manifest) in self.manifests.iter().enumerate() {
            write!(f, "manifest[{}] digest={}", i, manifest.digest)?;
            if let Some(name) = &manifest.ref_name {
                write!(f, " ref={}", name)?;
            }
            writeln!(f)?;
            for finding in &manifest.findings {
                writeln!(f, "  {}", finding)?;
            }
        }
        if self.complete {
            writeln!(f, "All OCI index referenced blobs present.")
        } else {
            writeln!(f, "Some OCI index referenced blobs are missing.")
        }
    }
}
