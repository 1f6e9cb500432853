use clap::{Args, Parser, Subcommand, ValueEnum};
use doc_catalog_core::hasher::HashAlgorithm;
use doc_catalog_core::ConflictPolicy;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "doc-catalog")]
#[command(about = "Catalog files and flag duplicate content", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Walk the search directories and build the catalog
    Run(RunArgs),
    /// List sessions recorded in a store
    Sessions {
        /// Store to read
        #[arg(short, long, default_value = "document_catalog.db")]
        store: PathBuf,
    },
    /// Print the merged configuration values
    PrintConfig(RunArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Directories to search
    #[arg(short = 's', long = "search-dir")]
    pub search_dirs: Vec<PathBuf>,

    /// Base directory for relative paths and subdirectory columns
    #[arg(short = 'b', long)]
    pub base_dir: Option<PathBuf>,

    /// Session id (generated when omitted)
    #[arg(short = 'g', long)]
    pub session_id: Option<String>,

    /// Destination store
    #[arg(short = 'd', long)]
    pub store: Option<PathBuf>,

    /// Prior persisted store to merge from
    #[arg(short = 'e', long)]
    pub existing_store: Option<PathBuf>,

    /// Existing catalog export (CSV) to merge from
    #[arg(short = 'i', long)]
    pub input_file: Option<PathBuf>,

    /// Export destination (CSV)
    #[arg(short = 'o', long)]
    pub output_file: Option<PathBuf>,

    /// Directory names to exclude at any depth
    #[arg(long = "exclude-dir")]
    pub exclude_dirs: Vec<String>,

    /// Skip content checksums; identity falls back to relative paths
    #[arg(long)]
    pub no_content_check: bool,

    /// Content hash algorithm (blake3, sha256, xxh64)
    #[arg(long)]
    pub hash_algorithm: Option<HashAlgorithm>,

    /// Rows to buffer before each batch write
    #[arg(long)]
    pub flush_threshold: Option<usize>,

    /// What to do when the destination store already exists
    #[arg(long, value_enum)]
    pub if_store_exists: Option<PolicyArg>,

    /// Print each newly admitted file
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    Append,
    Overwrite,
    Error,
}

impl From<PolicyArg> for ConflictPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Append => ConflictPolicy::Append,
            PolicyArg::Overwrite => ConflictPolicy::Overwrite,
            PolicyArg::Error => ConflictPolicy::Error,
        }
    }
}
