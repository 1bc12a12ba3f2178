use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::Cli;
use crate::error::{MappingError, Result};

pub const HOME_ENV: &str = "MAPPING_FINDER_HOME";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Urls {
    pub launcher_meta: String,
    pub fabric_meta: String,
    pub fabric_maven: String,
}

impl Default for Urls {
    fn default() -> Self {
        Self {
            launcher_meta: "https://launchermeta.mojang.com".to_string(),
            fabric_meta: "https://meta.fabricmc.net".to_string(),
            fabric_maven: "https://maven.fabricmc.net".to_string(),
        }
    }
}

/// JVM flags and tool arguments for one external Java program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JavaProgram {
    pub java_params: Vec<String>,
    pub tool_params: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub java_path: String,
    pub urls: Urls,
    pub remapper: JavaProgram,
    pub decompiler: JavaProgram,
    pub workers: usize,
    pub queue_capacity: usize,
    pub fetch_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            java_path: "java".to_string(),
            urls: Urls::default(),
            remapper: JavaProgram {
                java_params: vec!["-Xms2G".to_string(), "-Xmx2G".to_string()],
                tool_params: Vec::new(),
            },
            decompiler: JavaProgram {
                java_params: vec!["-Xms2G".to_string(), "-Xmx2G".to_string()],
                tool_params: vec![
                    "--thread-count=1".to_string(),
                    "--skip-extra-files".to_string(),
                ],
            },
            workers: 4,
            queue_capacity: 100,
            fetch_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Reads settings from `path`, writing the defaults there first if it does not exist.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "writing default settings");
            let settings = Settings::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| MappingError::io(parent, e))?;
            }
            let json = serde_json::to_vec_pretty(&settings)?;
            std::fs::write(path, json).map_err(|e| MappingError::io(path, e))?;
            return Ok(settings);
        }

        let raw = std::fs::read(path).map_err(|e| MappingError::io(path, e))?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

/// Every on-disk location, relative to one data root.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn mapping_path(&self, namespace: &str, version: &str, extension: &str) -> PathBuf {
        self.root
            .join("cache")
            .join("mappings")
            .join(namespace)
            .join(format!("{version}.{extension}"))
    }

    pub fn artifact_path(&self, version: &str) -> PathBuf {
        self.root
            .join("cache")
            .join("artifacts")
            .join(format!("{version}.jar"))
    }

    pub fn remapped_path(&self, namespace: &str, version: &str) -> PathBuf {
        self.root
            .join("cache")
            .join("remapped")
            .join(namespace)
            .join(format!("{version}.jar"))
    }

    pub fn source_dir(&self, namespace: &str, version: &str) -> PathBuf {
        self.root
            .join("cache")
            .join("source")
            .join(namespace)
            .join(version)
    }

    pub fn library_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    /// Java classpath wildcard covering every library jar.
    pub fn library_classpath(&self) -> String {
        format!("{}/*", self.library_dir().display())
    }

    pub fn decompiler_jar(&self) -> PathBuf {
        self.library_dir().join("vineflower.jar")
    }

    pub fn state_db_path(&self) -> PathBuf {
        self.root.join("state.lmdb")
    }
}

pub fn resolve_home(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.home.clone() {
        return Ok(p);
    }

    if let Ok(p) = env::var(HOME_ENV) {
        return Ok(PathBuf::from(p));
    }

    let base = dirs::data_local_dir()
        .or_else(dirs::cache_dir)
        .or_else(dirs::home_dir)
        .ok_or_else(|| MappingError::NotFound("data directory".to_string()))?;
    Ok(base.join("mapping-finder"))
}

pub fn resolve_config_path(cli: &Cli, home: &Path) -> PathBuf {
    cli.config
        .clone()
        .unwrap_or_else(|| home.join("config.json"))
}

/// Makes sure the parent directory of `path` exists.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| MappingError::io(parent, e))?;
    }
    Ok(())
}
