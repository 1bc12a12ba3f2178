use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "mapping-finder")]
#[command(about = "Search game symbol mappings and generate readable sources per namespace")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory holding caches, libraries and state.
    #[arg(long, value_name = "DIR", global = true)]
    pub home: Option<PathBuf>,

    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Parse and index a mapping.
    Load {
        version: String,

        #[arg(short = 'n', long, default_value = "yarn")]
        namespace: String,
    },
    Search {
        version: String,

        keyword: String,

        #[arg(short = 'n', long, default_value = "yarn")]
        namespace: String,

        #[arg(short = 'l', long, value_name = "N", default_value_t = 20)]
        limit: usize,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Remap and decompile a version.
    Generate {
        version: String,

        #[arg(short = 'n', long, default_value = "yarn")]
        namespace: String,
    },
    Status {
        version: Option<String>,

        #[arg(short = 'n', long)]
        namespace: Option<String>,
    },
    /// Print one generated class.
    Source {
        version: String,

        class_name: String,

        #[arg(short = 'n', long, default_value = "yarn")]
        namespace: String,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
