//! Source generation: remap the game jar into a namespace, then decompile it.
//!
//! The [`TaskRegistry`] tracks each (version, namespace) through the pipeline. A job is
//! claimed (Pending) before any work starts; every exit path other than success reverts
//! the claim, including a panic inside a pool worker.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::catalog::ensure_remapped;
use crate::config::{JavaProgram, Layout, Settings};
use crate::error::{MappingError, Result};
use crate::namespace::Namespaces;
use crate::pool::{JobHandle, WorkerPool};
use crate::registry::TaskRegistry;
use crate::scan::{class_name_to_source_path, scan_sources};
use crate::symbol::TaskKey;
use crate::tool::ToolRunner;

pub struct SourceGenerator {
    namespaces: Namespaces,
    registry: Arc<TaskRegistry>,
    runner: Arc<dyn ToolRunner>,
    layout: Layout,
    java_path: String,
    decompiler: JavaProgram,
}

/// Holds a Pending claim; dropping it without [`PendingGuard::complete`] reverts to Absent.
struct PendingGuard {
    registry: Arc<TaskRegistry>,
    key: TaskKey,
    armed: bool,
}

impl PendingGuard {
    fn complete(mut self) -> Result<()> {
        self.armed = false;
        self.registry.done(&self.key)
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!(task = %self.key, "source generation failed, task reverted");
            self.registry.failure(&self.key);
        }
    }
}

impl SourceGenerator {
    pub fn new(
        namespaces: Namespaces,
        registry: Arc<TaskRegistry>,
        runner: Arc<dyn ToolRunner>,
        layout: Layout,
        settings: &Settings,
    ) -> Self {
        Self {
            namespaces,
            registry,
            runner,
            layout,
            java_path: settings.java_path.clone(),
            decompiler: settings.decompiler.clone(),
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Runs the whole pipeline on the calling thread and returns the source directory.
    pub fn generate_source(&self, version: &str, namespace: &str) -> Result<PathBuf> {
        self.namespaces.get(namespace)?;
        let guard = self.claim(TaskKey::new(version, namespace))?;
        self.run(guard)
    }

    /// Claims the task now and runs the pipeline on `pool`. The claim is visible as
    /// Pending as soon as this returns.
    pub fn submit(
        self: &Arc<Self>,
        pool: &WorkerPool,
        version: &str,
        namespace: &str,
    ) -> Result<JobHandle<Result<PathBuf>>> {
        self.namespaces.get(namespace)?;
        let guard = self.claim(TaskKey::new(version, namespace))?;
        let this = Arc::clone(self);
        pool.submit(move || this.run(guard))
    }

    /// Reads one generated class source. Only served once the tree is Available.
    pub fn class_source(&self, version: &str, namespace: &str, class_name: &str) -> Result<String> {
        self.namespaces.get(namespace)?;
        let key = TaskKey::new(version, namespace);
        if !self.registry.is_available(&key) {
            return Err(MappingError::NotFound(format!("generated source for {key}")));
        }

        let path = self
            .layout
            .source_dir(namespace, version)
            .join(class_name_to_source_path(class_name)?);
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MappingError::NotFound(format!("class {class_name}")),
            _ => MappingError::io(&path, e),
        })
    }

    fn claim(&self, key: TaskKey) -> Result<PendingGuard> {
        if self.registry.is_available(&key) {
            return Err(MappingError::AlreadyGenerated(key));
        }
        if !self.registry.start_pending(&key) {
            return Err(MappingError::Busy(key));
        }
        // Done may have landed between the two checks above.
        if self.registry.is_available(&key) {
            self.registry.failure(&key);
            return Err(MappingError::AlreadyGenerated(key));
        }

        Ok(PendingGuard {
            registry: Arc::clone(&self.registry),
            key,
            armed: true,
        })
    }

    fn run(&self, guard: PendingGuard) -> Result<PathBuf> {
        let TaskKey { version, namespace } = guard.key.clone();
        let start = Instant::now();
        let service = self.namespaces.get(&namespace)?;

        let remapped = service.remap(&version)?;
        let classes = ensure_remapped(&remapped)?;
        info!(task = %guard.key, classes, "remapped jar ready, decompiling");

        let source_dir = self.layout.source_dir(&namespace, &version);
        std::fs::create_dir_all(&source_dir).map_err(|e| MappingError::io(&source_dir, e))?;
        self.decompile(&remapped, &source_dir)?;

        let sources = scan_sources(&source_dir).len();
        info!(
            task = %guard.key,
            sources,
            duration_ms = start.elapsed().as_millis() as u64,
            "source generated"
        );
        guard.complete()?;
        Ok(source_dir)
    }

    fn decompile(&self, remapped: &std::path::Path, source_dir: &std::path::Path) -> Result<()> {
        let mut args = self.decompiler.java_params.clone();
        args.push("-jar".to_string());
        args.push(self.layout.decompiler_jar().to_string_lossy().into_owned());
        args.extend(self.decompiler.tool_params.iter().cloned());
        args.push(remapped.to_string_lossy().into_owned());
        args.push(source_dir.to_string_lossy().into_owned());
        self.runner.run(&self.java_path, &args, true)
    }
}
