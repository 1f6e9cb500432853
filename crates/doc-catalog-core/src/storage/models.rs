use crate::config::CatalogConfig;
use crate::hasher::HashAlgorithm;
use crate::record::FileRecord;

/// One engine run's configuration and timestamp, persisted before any file
/// row that references it.
#[derive(Debug, Clone)]
pub struct CatalogSession {
    pub session_id: String,
    pub search_dirs: Vec<String>,
    pub base_dir: String,
    pub hash_algorithm: String,
    /// Buffer-flush threshold the run was configured with.
    pub buffer_size: i64,
    pub created_at: String,
}

impl CatalogSession {
    pub fn new(config: &CatalogConfig, session_id: String) -> Self {
        Self {
            session_id,
            search_dirs: config
                .search_dirs
                .iter()
                .map(|dir| dir.display().to_string())
                .collect(),
            base_dir: config.base_dir.display().to_string(),
            hash_algorithm: config.hash_algorithm.name().to_string(),
            buffer_size: config.flush_threshold as i64,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A row bound for the files table.
#[derive(Debug, Clone)]
pub struct FileRow {
    pub relative_path: String,
    pub filename: String,
    pub extension: String,
    pub size_bytes: Option<i64>,
    pub human_readable_size: Option<String>,
    pub checksum: Option<String>,
    /// Algorithm the checksum was computed with; absent when the checksum is.
    pub hash_algorithm: Option<String>,
    pub session_id: String,
    pub file_key: String,
}

impl FileRow {
    pub fn from_record(
        record: &FileRecord,
        session_id: &str,
        algorithm: HashAlgorithm,
    ) -> Self {
        let checksum = record.checksum().map(str::to_string);
        let hash_algorithm = checksum.as_ref().map(|_| algorithm.name().to_string());
        Self {
            relative_path: record.relative_path.display().to_string(),
            filename: record.name.clone(),
            extension: record.extension.clone(),
            size_bytes: record.size.map(|size| size as i64),
            human_readable_size: record.human_readable_size(),
            checksum,
            hash_algorithm,
            session_id: session_id.to_string(),
            file_key: record.key(),
        }
    }
}

/// A files row joined with its session's base directory, as read back from a
/// prior persisted store.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub base_dir: String,
    pub relative_path: String,
    pub filename: String,
    pub extension: String,
    pub size_bytes: Option<i64>,
    pub checksum: Option<String>,
    pub hash_algorithm: Option<String>,
    pub file_key: String,
}
