//! Version metadata and raw file retrieval.
//!
//! Every raw file (game jar, mapping file) is downloaded once into the [`Layout`] and
//! reused on later calls. Version documents are memoized for the life of the process.

use dashmap::DashMap;
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::{Layout, Urls};
use crate::error::{MappingError, Result};
use crate::fetch::{Fetcher, write_atomically};

#[derive(Debug, Clone, Deserialize)]
struct VersionManifest {
    versions: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct ManifestEntry {
    id: String,
    url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadFile {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Downloads {
    pub client: DownloadFile,
    pub client_mappings: Option<DownloadFile>,
}

#[derive(Debug, Clone, Deserialize)]
struct VersionDocument {
    downloads: Downloads,
}

/// One entry of the yarn release index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YarnRelease {
    pub game_version: String,
    pub build: u32,
    pub version: String,
    #[serde(default)]
    pub stable: bool,
}

pub struct Metadata {
    layout: Layout,
    urls: Urls,
    fetcher: Arc<dyn Fetcher>,
    downloads: DashMap<String, Downloads>,
}

impl Metadata {
    pub fn new(layout: Layout, urls: Urls, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            layout,
            urls,
            fetcher,
            downloads: DashMap::new(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn downloads(&self, version: &str) -> Result<Downloads> {
        if let Some(hit) = self.downloads.get(version) {
            return Ok(hit.clone());
        }

        let manifest_url = format!("{}/mc/game/version_manifest_v2.json", self.urls.launcher_meta);
        let manifest: VersionManifest = serde_json::from_slice(&self.fetcher.fetch(&manifest_url)?)?;
        let entry = manifest
            .versions
            .into_iter()
            .find(|v| v.id == version)
            .ok_or_else(|| MappingError::NotFound(format!("game version {version}")))?;

        let document: VersionDocument = serde_json::from_slice(&self.fetcher.fetch(&entry.url)?)?;
        self.downloads
            .insert(version.to_string(), document.downloads.clone());
        Ok(document.downloads)
    }

    /// Path of the original (obfuscated) game jar, downloading it if needed.
    pub fn artifact_path(&self, version: &str) -> Result<PathBuf> {
        let path = self.layout.artifact_path(version);
        if path.exists() {
            return Ok(path);
        }

        let downloads = self.downloads(version)?;
        info!(version, "downloading game jar");
        let bytes = self.fetcher.fetch(&downloads.client.url)?;
        write_atomically(&path, &bytes)?;
        Ok(path)
    }

    pub fn official_mapping_path(&self, version: &str) -> Result<PathBuf> {
        let path = self.layout.mapping_path("official", version, "txt");
        if path.exists() {
            return Ok(path);
        }

        let mappings = self
            .downloads(version)?
            .client_mappings
            .ok_or_else(|| MappingError::NotFound(format!("official mappings for {version}")))?;
        info!(version, "downloading official mappings");
        let bytes = self.fetcher.fetch(&mappings.url)?;
        write_atomically(&path, &bytes)?;
        Ok(path)
    }

    pub fn yarn_mapping_path(&self, version: &str) -> Result<PathBuf> {
        let path = self.layout.mapping_path("yarn", version, "tiny");
        if path.exists() {
            return Ok(path);
        }

        let index_url = format!("{}/v2/versions/yarn", self.urls.fabric_meta);
        let releases: Vec<YarnRelease> = serde_json::from_slice(&self.fetcher.fetch(&index_url)?)?;
        let Some(latest) = latest_yarn_build(&releases, version) else {
            error!(version, "no yarn build published");
            return Err(MappingError::NotFound(format!("yarn build for {version}")));
        };

        info!(version, yarn = %latest.version, "downloading yarn mappings");
        let archive_url = format!(
            "{}/net/fabricmc/yarn/{v}/yarn-{v}-tiny.gz",
            self.urls.fabric_maven,
            v = latest.version
        );
        let archive = self.fetcher.fetch(&archive_url)?;
        let bytes = gunzip(&archive).map_err(|e| MappingError::io(&path, e))?;
        write_atomically(&path, &bytes)?;
        Ok(path)
    }
}

/// The release with the highest build number for `game_version`.
pub fn latest_yarn_build<'a>(releases: &'a [YarnRelease], game_version: &str) -> Option<&'a YarnRelease> {
    releases
        .iter()
        .filter(|r| r.game_version == game_version)
        .max_by_key(|r| r.build)
}

fn gunzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}
