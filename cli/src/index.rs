//! Single forward pass over a tar stream.

use std::collections::HashSet;
use std::io::Read;

use tracing::{debug, trace};

use crate::error::TarcheckError;

pub const DOCKER_MANIFEST_FILE: &str = "manifest.json";
pub const OCI_INDEX_FILE: &str = "index.json";

/// Names present in an archive plus the raw bytes of the manifests found in it.
#[derive(Debug, Default)]
pub struct ArchiveIndex {
    entries: HashSet<String>,
    docker_manifest: Option<Vec<u8>>,
    oci_index: Option<Vec<u8>>,
}

impl ArchiveIndex {
    /// Walk every entry of `reader` once. Only `manifest.json` and
    /// `index.json` bodies are read; everything else is skipped by name.
    /// When several entries share one of those basenames the last wins.
    pub fn scan<R: Read>(reader: R) -> Result<Self, TarcheckError> {
        let mut archive = tar::Archive::new(reader);
        let mut index = ArchiveIndex::default();

        for entry in archive.entries().map_err(TarcheckError::TarEntry)? {
            let mut entry = entry.map_err(TarcheckError::TarEntry)?;
            let raw = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            let name = normalize_entry_name(&raw).to_string();
            trace!(%name, kind = ?entry.header().entry_type(), "indexed entry");

            match base_name(&name) {
                DOCKER_MANIFEST_FILE => {
                    let body = read_body(&mut entry, &name)?;
                    debug!(%name, bytes = body.len(), "captured docker manifest");
                    index.docker_manifest = Some(body);
                }
                OCI_INDEX_FILE => {
                    let body = read_body(&mut entry, &name)?;
                    debug!(%name, bytes = body.len(), "captured oci index");
                    index.oci_index = Some(body);
                }
                _ => {}
            }
            index.entries.insert(name);
        }

        debug!(entries = index.entries.len(), "archive scan complete");
        Ok(index)
    }

    /// Membership test; `./` on either side is ignored.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains(normalize_entry_name(path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Captured `manifest.json`, if one was found and it is not empty.
    pub fn docker_manifest(&self) -> Option<&[u8]> {
        self.docker_manifest.as_deref().filter(|b| !b.is_empty())
    }

    /// Captured `index.json`, if one was found and it is not empty.
    pub fn oci_index(&self) -> Option<&[u8]> {
        self.oci_index.as_deref().filter(|b| !b.is_empty())
    }
}

fn read_body<R: Read>(entry: &mut R, name: &str) -> Result<Vec<u8>, TarcheckError> {
    let mut body = Vec::new();
    entry
        .read_to_end(&mut body)
        .map_err(|source| TarcheckError::EntryContent {
            name: name.to_string(),
            source,
        })?;
    Ok(body)
}

/// Strip a single leading `./`.
pub fn normalize_entry_name(name: &str) -> &str {
    name.strip_prefix("./").unwrap_or(name)
}

/// Last `/`-separated component, ignoring trailing slashes.
pub fn base_name(name: &str) -> &str {
    let trimmed = name.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
