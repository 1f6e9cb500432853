use crate::error::Error;
use crate::record::FileRecord;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const PATH_COLUMN: &str = "File Path";
const SIZE_COLUMN: &str = "File Size";
const CHECKSUM_COLUMN: &str = "Checksum";
const DUPLICATE_COLUMN: &str = "Duplicate";

/// Columns the engine recomputes from the path on every export; consuming
/// them here keeps the merged export from emitting a column twice.
fn is_derived(column: &str) -> bool {
    matches!(
        column,
        "Filename" | "Extension" | "Readable Size" | "Base Directory" | "Relative Path"
    ) || column.starts_with("Subdirectory ")
}

/// Read a prior catalog export. The `File Path` column is mandatory;
/// recognized columns map onto record fields (checksums are trusted as-is),
/// everything else is carried as opaque extra attributes in column order.
pub fn read_catalog(path: &Path, base_dir: &Path) -> Result<Vec<FileRecord>, Error> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let path_idx = headers
        .iter()
        .position(|header| header == PATH_COLUMN)
        .ok_or_else(|| {
            Error::Schema(format!(
                "import '{}' is missing the required '{}' column",
                path.display(),
                PATH_COLUMN
            ))
        })?;
    let size_idx = headers.iter().position(|header| header == SIZE_COLUMN);
    let checksum_idx = headers.iter().position(|header| header == CHECKSUM_COLUMN);
    let duplicate_idx = headers.iter().position(|header| header == DUPLICATE_COLUMN);

    let recognized = [Some(path_idx), size_idx, checksum_idx, duplicate_idx];
    let extra_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, header)| !recognized.contains(&Some(*idx)) && !is_derived(header))
        .map(|(idx, header)| (idx, header.to_string()))
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let file_path = row.get(path_idx).map(str::trim).unwrap_or_default();
        if file_path.is_empty() {
            continue;
        }

        let size = size_idx
            .and_then(|idx| row.get(idx))
            .and_then(|value| value.trim().parse::<u64>().ok());
        let checksum = checksum_idx
            .and_then(|idx| row.get(idx))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(String::from);
        let duplicate = duplicate_idx
            .and_then(|idx| row.get(idx))
            .map(parse_flag)
            .unwrap_or(false);
        let extra = extra_columns
            .iter()
            .filter_map(|(idx, name)| {
                row.get(*idx).map(|value| (name.clone(), value.to_string()))
            })
            .collect();

        records.push(FileRecord::from_import_row(
            PathBuf::from(file_path),
            base_dir,
            size,
            checksum,
            duplicate,
            extra,
        ));
    }

    debug!("imported {} records from {}", records.len(), path.display());
    Ok(records)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "y"
    )
}
