//! `docker save` archive layout: a top-level `manifest.json` naming config
//! and layer files by path.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::error::TarcheckError;
use crate::index::ArchiveIndex;
use crate::report::Finding;

/// One image in a docker-archive `manifest.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct DockerManifestEntry {
    #[serde(rename = "Config")]
    pub config: String,
    /// Present in every manifest but `null` for untagged images.
    #[serde(rename = "RepoTags", deserialize_with = "null_as_empty")]
    pub repo_tags: Vec<String>,
    #[serde(rename = "Layers")]
    pub layers: Vec<String>,
}

pub type DockerManifest = Vec<DockerManifestEntry>;

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn parse_manifest(bytes: &[u8]) -> Result<DockerManifest, TarcheckError> {
    serde_json::from_slice(bytes).map_err(TarcheckError::ParseManifest)
}

#[derive(Debug, Clone, Serialize)]
pub struct DockerImageReport {
    pub repo_tags: Vec<String>,
    pub config: String,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DockerReport {
    pub complete: bool,
    pub images: Vec<DockerImageReport>,
}

/// Check that every config and layer path in `manifest` is an archive entry.
pub fn check_docker_archive(
    manifest: &[u8],
    index: &ArchiveIndex,
) -> Result<DockerReport, TarcheckError> {
    let entries = parse_manifest(manifest)?;
    let mut images = Vec::with_capacity(entries.len());

    for entry in entries {
        let mut findings = Vec::new();
        if !index.contains(&entry.config) {
            findings.push(Finding::MissingConfig(entry.config.clone()));
        }
        for layer in &entry.layers {
            if !index.contains(layer) {
                findings.push(Finding::MissingLayer(layer.clone()));
            }
        }
        for finding in &findings {
            warn!(%finding, config = %entry.config, "docker-archive reference not found");
        }
        images.push(DockerImageReport {
            repo_tags: entry.repo_tags,
            config: entry.config,
            findings,
        });
    }

    let complete = images.iter().all(|image| image.findings.is_empty());
    info!(images = images.len(), complete, "docker-archive check finished");
    Ok(DockerReport { complete, images })
}

impl fmt::Display for DockerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Detected docker-archive (manifest.json). Checking referenced files..."
        )?;
        for (i, image) in self.images.iter().enumerate() {
            writeln!(
                f,
                "entry[{}] tags=[{}] config={}",
                i,
                image.repo_tags.join(" "),
                image.config
            )?;
            for finding in &image.findings {
                writeln!(f, "  {}", finding)?;
            }
        }
        if self.complete {
            writeln!(f, "All docker-archive referenced files present.")
        } else {
            writeln!(f, "Some docker-archive referenced files are missing.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TarFixture;

    const MANIFEST: &[u8] = br#"[
        {
            "Config": "abc123.json",
            "RepoTags": ["app:latest", "app:1.0"],
            "Layers": ["l1/layer.tar", "l2/layer.tar"]
        }
    ]"#;

    fn index_of(tar: Vec<u8>) -> ArchiveIndex {
        ArchiveIndex::scan(&tar[..]).unwrap()
    }

    #[test]
    fn all_references_present() {
        let index = index_of(
            TarFixture::new()
                .file("./abc123.json", b"{}")
                .file("./l1/layer.tar", b"x")
                .file("l2/layer.tar", b"y")
                .finish(),
        );
        let report = check_docker_archive(MANIFEST, &index).unwrap();
        assert!(report.complete);
        assert_eq!(report.images.len(), 1);
        assert_eq!(report.images[0].repo_tags, vec!["app:latest", "app:1.0"]);
        assert!(report.to_string().contains("All docker-archive referenced files present."));
        assert!(!report.to_string().contains("MISSING"));
    }

    #[test]
    fn reports_each_missing_reference() {
        let index = index_of(TarFixture::new().file("l1/layer.tar", b"x").finish());
        let report = check_docker_archive(MANIFEST, &index).unwrap();
        assert!(!report.complete);
        assert_eq!(
            report.images[0].findings,
            vec![
                Finding::MissingConfig("abc123.json".to_string()),
                Finding::MissingLayer("l2/layer.tar".to_string()),
            ]
        );
        let text = report.to_string();
        assert!(text.contains("  MISSING: config \"abc123.json\""));
        assert!(text.contains("  MISSING: layer \"l2/layer.tar\""));
        assert!(text.ends_with("Some docker-archive referenced files are missing.\n"));
    }

    #[test]
    fn empty_manifest_is_complete() {
        let report = check_docker_archive(b"[]", &ArchiveIndex::default()).unwrap();
        assert!(report.complete);
        assert!(report.images.is_empty());
    }

    #[test]
    fn null_repo_tags_are_empty() {
        let manifest = br#"[{"Config":"c.json","RepoTags":null,"Layers":[]}]"#;
        let entries = parse_manifest(manifest).unwrap();
        assert!(entries[0].repo_tags.is_empty());
    }

    #[test]
    fn missing_required_field_is_parse_error() {
        for manifest in [
            &br#"[{"RepoTags":[],"Layers":[]}]"#[..],
            &br#"[{"Config":"c.json","Layers":[]}]"#[..],
            &br#"[{"Config":"c.json","RepoTags":[]}]"#[..],
            &br#"{"Config":"c.json"}"#[..],
            &b"not json"[..],
        ] {
            let err = check_docker_archive(manifest, &ArchiveIndex::default()).unwrap_err();
            assert!(matches!(err, TarcheckError::ParseManifest(_)));
        }
    }
}
