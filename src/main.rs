use anyhow::{Context, Result, bail};
use clap::Parser;
use mapping_finder::cache::MappingCache;
use mapping_finder::cli::{Cli, Commands, OutputFormat};
use mapping_finder::config::{Layout, Settings, resolve_config_path, resolve_home};
use mapping_finder::fetch::{CurlFetcher, Fetcher};
use mapping_finder::meta::Metadata;
use mapping_finder::namespace::{Namespaces, RemapContext};
use mapping_finder::pool::WorkerPool;
use mapping_finder::registry::{TaskRegistry, TaskState};
use mapping_finder::source::SourceGenerator;
use mapping_finder::store::StateStore;
use mapping_finder::symbol::{SymbolId, SymbolPair, TaskKey};
use mapping_finder::tool::{ProcessRunner, ToolRunner};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "MAPPING_FINDER_LOG";
const MIN_KEYWORD_LEN: usize = 3;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let home = resolve_home(&cli)?;
    let config_path = resolve_config_path(&cli, &home);
    let settings = Settings::load_or_init(&config_path)
        .with_context(|| format!("failed to load settings from {}", config_path.display()))?;
    let layout = Layout::new(&home);
    let app = App::new(layout, settings);

    match cli.command.clone() {
        Commands::Load { version, namespace } => {
            let start = Instant::now();
            let index = app.cache.load_mapping(&version, &namespace)?;
            let output = LoadResult {
                version,
                namespace,
                symbols: index.len(),
                duration_ms: start.elapsed().as_millis() as u64,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Search {
            version,
            keyword,
            namespace,
            limit,
            format,
        } => {
            if keyword.chars().count() < MIN_KEYWORD_LEN {
                bail!("keyword must be at least {MIN_KEYWORD_LEN} characters");
            }
            let index = app.cache.load_mapping(&version, &namespace)?;
            let output = SearchResult {
                version,
                namespace,
                results: index.search(&keyword, limit),
                keyword,
            };
            write_search_output(&output, format)?;
        }
        Commands::Generate { version, namespace } => {
            let generator = Arc::new(app.source_generator()?);
            let pool = WorkerPool::new(app.settings.workers, app.settings.queue_capacity);
            let handle = generator.submit(&pool, &version, &namespace)?;
            let source_dir = handle
                .wait()?
                .with_context(|| format!("failed to generate {namespace}/{version}"))?;
            pool.shutdown_and_drain();
            println!(
                "{}",
                serde_json::to_string_pretty(&GenerateResult {
                    version,
                    namespace,
                    source_dir: source_dir.to_string_lossy().to_string(),
                })?
            );
        }
        Commands::Status { version, namespace } => {
            let registry = app.open_registry()?;
            match version {
                Some(version) => {
                    let namespace = namespace.unwrap_or_else(|| "yarn".to_string());
                    app.namespaces.get(&namespace)?;
                    let state = registry.state(&TaskKey::new(&version, &namespace));
                    let output = StatusResult {
                        version,
                        namespace,
                        state,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                None => {
                    let mut available = registry.available();
                    if let Some(ns) = namespace {
                        available.retain(|k, _| *k == ns);
                    }
                    println!("{}", serde_json::to_string_pretty(&available)?);
                }
            }
        }
        Commands::Source {
            version,
            class_name,
            namespace,
        } => {
            let generator = app.source_generator()?;
            let content = generator.class_source(&version, &namespace, &class_name)?;
            print!("{content}");
            if !content.ends_with('\n') {
                println!();
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct App {
    layout: Layout,
    settings: Settings,
    runner: Arc<dyn ToolRunner>,
    namespaces: Namespaces,
    cache: MappingCache,
}

impl App {
    fn new(layout: Layout, settings: Settings) -> Self {
        let fetcher: Arc<dyn Fetcher> = Arc::new(CurlFetcher::new(Duration::from_secs(
            settings.fetch_timeout_secs,
        )));
        let runner: Arc<dyn ToolRunner> = Arc::new(ProcessRunner);
        let meta = Arc::new(Metadata::new(
            layout.clone(),
            settings.urls.clone(),
            fetcher,
        ));
        let namespaces = Namespaces::standard(RemapContext {
            meta,
            runner: Arc::clone(&runner),
            java_path: settings.java_path.clone(),
            remapper: settings.remapper.clone(),
        });

        Self {
            cache: MappingCache::new(namespaces.clone()),
            layout,
            settings,
            runner,
            namespaces,
        }
    }

    fn open_registry(&self) -> Result<TaskRegistry> {
        let db_path = self.layout.state_db_path();
        let store = StateStore::open(db_path.clone())
            .with_context(|| format!("failed to open state store {}", db_path.display()))?;
        Ok(TaskRegistry::open(store)?)
    }

    fn source_generator(&self) -> Result<SourceGenerator> {
        Ok(SourceGenerator::new(
            self.namespaces.clone(),
            Arc::new(self.open_registry()?),
            Arc::clone(&self.runner),
            self.layout.clone(),
            &self.settings,
        ))
    }
}

#[derive(Debug, Serialize)]
struct LoadResult {
    version: String,
    namespace: String,
    symbols: usize,
    duration_ms: u64,
}

#[derive(Debug, Serialize)]
struct SearchResult {
    version: String,
    namespace: String,
    keyword: String,
    results: Vec<SymbolPair>,
}

#[derive(Debug, Serialize)]
struct GenerateResult {
    version: String,
    namespace: String,
    source_dir: String,
}

#[derive(Debug, Serialize)]
struct StatusResult {
    version: String,
    namespace: String,
    state: TaskState,
}

fn write_search_output(result: &SearchResult, format: OutputFormat) -> Result<()> {
    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)?,
        OutputFormat::Text => result
            .results
            .iter()
            .map(|pair| {
                format!(
                    "{:<6} {} -> {}",
                    format!("{:?}", pair.target.kind).to_lowercase(),
                    describe(&pair.origin),
                    describe(&pair.target)
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    };

    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn describe(symbol: &SymbolId) -> String {
    if symbol.is_class() {
        symbol.name.clone()
    } else if symbol.owner.is_empty() {
        format!("{}{}", symbol.name, symbol.descriptor)
    } else {
        format!("{}.{}{}", symbol.owner, symbol.name, symbol.descriptor)
    }
}
