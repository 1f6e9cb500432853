use crate::error::Error;
use crate::hasher::HashAlgorithm;
use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_FLUSH_THRESHOLD: usize = 100;
pub const DEFAULT_HASH_BUFFER_SIZE: usize = 64 * 1024;
pub const DEFAULT_STORE_PATH: &str = "document_catalog.db";

/// How to treat a destination store that already exists on first use.
///
/// The engine never prompts; an interactive wrapper must resolve the answer
/// to one of these before the run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    Append,
    Overwrite,
    Error,
}

/// Immutable configuration for one catalog run, constructed once and passed
/// by reference into each component.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub search_dirs: Vec<PathBuf>,
    pub base_dir: PathBuf,
    pub exclude_dirs: Vec<String>,
    /// Prior catalog export (CSV) to merge from.
    pub existing_catalog: Option<PathBuf>,
    /// Prior persisted store to merge from.
    pub existing_store: Option<PathBuf>,
    pub store_path: PathBuf,
    pub export_path: Option<PathBuf>,
    /// When false, identity falls back to relative-path equality and no
    /// checksums are computed for walked files.
    pub check_contents: bool,
    pub hash_algorithm: HashAlgorithm,
    /// Read-buffer size for streaming checksum computation, in bytes.
    pub hash_buffer_size: usize,
    /// Rows buffered in memory before each batch write.
    pub flush_threshold: usize,
    /// Caller-provided session id; generated when absent.
    pub session_id: Option<String>,
    pub conflict_policy: ConflictPolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            search_dirs: vec![PathBuf::from(".")],
            base_dir: PathBuf::from("."),
            exclude_dirs: Vec::new(),
            existing_catalog: None,
            existing_store: None,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            export_path: None,
            check_contents: true,
            hash_algorithm: HashAlgorithm::Blake3,
            hash_buffer_size: DEFAULT_HASH_BUFFER_SIZE,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            session_id: None,
            conflict_policy: ConflictPolicy::Error,
        }
    }
}

impl CatalogConfig {
    /// Reject configurations that would fail after work has started.
    pub fn validate(&self) -> Result<(), Error> {
        if self.search_dirs.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one search directory is required".to_string(),
            ));
        }

        if let Some(export) = &self.export_path {
            match export.extension().and_then(|ext| ext.to_str()) {
                Some("csv") => {}
                _ => {
                    return Err(Error::InvalidConfig(format!(
                        "export path '{}' must have a .csv extension",
                        export.display()
                    )))
                }
            }
        }

        if let Some(import) = &self.existing_catalog {
            if !import.is_file() {
                return Err(Error::InvalidConfig(format!(
                    "existing catalog '{}' does not exist",
                    import.display()
                )));
            }
        }

        if self.flush_threshold == 0 {
            return Err(Error::InvalidConfig(
                "flush threshold must be at least 1".to_string(),
            ));
        }

        if self.hash_buffer_size == 0 {
            return Err(Error::InvalidConfig(
                "hash buffer size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Values read from an optional `Config.toml`; a CLI wrapper layers its own
/// flags on top before building the final `CatalogConfig`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub search_dirs: Option<Vec<String>>,
    pub base_dir: Option<String>,
    pub exclude_dirs: Option<Vec<String>>,
    pub store_path: Option<String>,
    pub export_path: Option<String>,
    pub hash_algorithm: Option<HashAlgorithm>,
    pub flush_threshold: Option<usize>,
    pub hash_buffer_size: Option<usize>,
}

pub fn load_file_config() -> Result<FileConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    builder.try_deserialize::<FileConfig>()
}
