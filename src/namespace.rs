//! Naming namespaces a game version can be viewed in.
//!
//! Each namespace knows where its raw mapping file comes from, which [`MappingFormat`]
//! reads it, and how the external remapper is driven for it. [`Namespaces`] is the
//! name-to-service registry everything else looks services up in.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::{JavaProgram, Layout, ensure_parent};
use crate::error::{MappingError, Result};
use crate::format::MappingFormat;
use crate::line_mapping::LineMapping;
use crate::meta::Metadata;
use crate::symbol::SymbolPairs;
use crate::tiny_mapping::TinyMapping;
use crate::tool::ToolRunner;

pub const OFFICIAL: &str = "official";
pub const YARN: &str = "yarn";

const ART_MAIN_CLASS: &str = "net.neoforged.art.Main";
const TINY_REMAPPER_MAIN_CLASS: &str = "net.fabricmc.tinyremapper.Main";

pub trait NamespaceService: Send + Sync {
    fn name(&self) -> &'static str;

    /// Local path of the raw mapping file, fetched first if it is not cached yet.
    fn resolved_path(&self, version: &str) -> Result<PathBuf>;

    fn parse(&self, version: &str) -> Result<SymbolPairs>;

    /// Remaps the game jar into this namespace and returns the remapped jar's path.
    fn remap(&self, version: &str) -> Result<PathBuf>;
}

/// What every namespace needs to fetch files and run the remapper.
#[derive(Clone)]
pub struct RemapContext {
    pub meta: Arc<Metadata>,
    pub runner: Arc<dyn ToolRunner>,
    pub java_path: String,
    pub remapper: JavaProgram,
}

impl RemapContext {
    fn layout(&self) -> &Layout {
        self.meta.layout()
    }

    fn run_remapper(&self, main_class: &str, tool_args: Vec<String>, capture_output: bool) -> Result<()> {
        let mut args = self.remapper.java_params.clone();
        args.push("-cp".to_string());
        args.push(self.layout().library_classpath());
        args.push(main_class.to_string());
        args.extend(tool_args);
        args.extend(self.remapper.tool_params.iter().cloned());
        self.runner.run(&self.java_path, &args, capture_output)
    }
}

fn path_arg(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Mojang's published mappings, in the line-oriented format.
pub struct Official {
    ctx: RemapContext,
}

impl Official {
    pub fn new(ctx: RemapContext) -> Self {
        Self { ctx }
    }
}

impl NamespaceService for Official {
    fn name(&self) -> &'static str {
        OFFICIAL
    }

    fn resolved_path(&self, version: &str) -> Result<PathBuf> {
        self.ctx.meta.official_mapping_path(version)
    }

    fn parse(&self, version: &str) -> Result<SymbolPairs> {
        let path = self.resolved_path(version)?;
        LineMapping.parse_file(&path)
    }

    fn remap(&self, version: &str) -> Result<PathBuf> {
        let jar = self.ctx.meta.artifact_path(version)?;
        let mapping = self.resolved_path(version)?;
        let output = self.ctx.layout().remapped_path(self.name(), version);
        ensure_parent(&output)?;

        info!(version, namespace = self.name(), "remapping");
        // The file maps named -> obfuscated, so the remapper runs it in reverse.
        self.ctx.run_remapper(
            ART_MAIN_CLASS,
            vec![
                "--input".to_string(),
                path_arg(&jar),
                "--output".to_string(),
                path_arg(&output),
                "--map".to_string(),
                path_arg(&mapping),
                "--reverse".to_string(),
            ],
            true,
        )?;
        Ok(output)
    }
}

/// Fabric's community mappings, in the tab-separated format.
pub struct Yarn {
    ctx: RemapContext,
    format: TinyMapping,
}

impl Yarn {
    pub fn new(ctx: RemapContext) -> Self {
        Self {
            ctx,
            format: TinyMapping::default(),
        }
    }
}

impl NamespaceService for Yarn {
    fn name(&self) -> &'static str {
        YARN
    }

    fn resolved_path(&self, version: &str) -> Result<PathBuf> {
        self.ctx.meta.yarn_mapping_path(version)
    }

    fn parse(&self, version: &str) -> Result<SymbolPairs> {
        let path = self.resolved_path(version)?;
        self.format.parse_file(&path)
    }

    fn remap(&self, version: &str) -> Result<PathBuf> {
        let jar = self.ctx.meta.artifact_path(version)?;
        let mapping = self.resolved_path(version)?;
        let output = self.ctx.layout().remapped_path(self.name(), version);
        ensure_parent(&output)?;

        info!(version, namespace = self.name(), "remapping");
        self.ctx.run_remapper(
            TINY_REMAPPER_MAIN_CLASS,
            vec![
                path_arg(&jar),
                path_arg(&output),
                path_arg(&mapping),
                "official".to_string(),
                "named".to_string(),
            ],
            false,
        )?;
        Ok(output)
    }
}

#[derive(Clone, Default)]
pub struct Namespaces {
    services: BTreeMap<&'static str, Arc<dyn NamespaceService>>,
}

impl Namespaces {
    /// Registry holding the official and yarn namespaces.
    pub fn standard(ctx: RemapContext) -> Self {
        Self::with_services(vec![
            Arc::new(Official::new(ctx.clone())) as Arc<dyn NamespaceService>,
            Arc::new(Yarn::new(ctx)),
        ])
    }

    pub fn with_services(services: Vec<Arc<dyn NamespaceService>>) -> Self {
        Self {
            services: services.into_iter().map(|s| (s.name(), s)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn NamespaceService>> {
        self.services
            .get(name)
            .cloned()
            .ok_or_else(|| MappingError::UnknownNamespace(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.services.keys().copied()
    }
}
