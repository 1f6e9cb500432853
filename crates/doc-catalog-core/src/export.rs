use crate::error::Error;
use crate::record::FileRecord;
use std::path::Path;

const GOAL_COLUMNS: [&str; 6] = [
    "Filename",
    "Extension",
    "File Size",
    "Readable Size",
    "Checksum",
    "Duplicate",
];

/// The final ordered, column-normalized record set handed to the export
/// boundary. Rendering beyond plain CSV is somebody else's problem.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}

/// Normalize the admitted records into the export column order:
/// File Path, Base Directory, Relative Path, Subdirectory 1..N (N = max
/// depth over all records), the goal columns, then any remaining extra
/// attributes in first-encountered order.
pub fn build_table(records: &[FileRecord], base_dir: &Path) -> ExportTable {
    let max_depth = records
        .iter()
        .map(|record| record.subdirectories().len())
        .max()
        .unwrap_or(0);

    let mut columns = vec![
        "File Path".to_string(),
        "Base Directory".to_string(),
        "Relative Path".to_string(),
    ];
    for depth in 1..=max_depth {
        columns.push(format!("Subdirectory {}", depth));
    }
    columns.extend(GOAL_COLUMNS.iter().map(|column| column.to_string()));

    let fixed_len = columns.len();
    for record in records {
        for (name, _) in &record.extra {
            if !columns.iter().any(|column| column == name) {
                columns.push(name.clone());
            }
        }
    }

    let base = base_dir.display().to_string();
    let rows = records
        .iter()
        .map(|record| {
            let mut row = Vec::with_capacity(columns.len());
            row.push(record.path.display().to_string());
            row.push(base.clone());
            row.push(record.relative_path.display().to_string());

            let subdirs = record.subdirectories();
            for depth in 0..max_depth {
                row.push(subdirs.get(depth).cloned().unwrap_or_default());
            }

            row.push(record.name.clone());
            row.push(record.extension.clone());
            row.push(record.size.map(|size| size.to_string()).unwrap_or_default());
            row.push(record.human_readable_size().unwrap_or_default());
            row.push(record.checksum().unwrap_or_default().to_string());
            row.push(record.duplicate.to_string());

            for column in &columns[fixed_len..] {
                let value = record
                    .extra
                    .iter()
                    .find(|(name, _)| name == column)
                    .map(|(_, value)| value.clone())
                    .unwrap_or_default();
                row.push(value);
            }
            row
        })
        .collect();

    ExportTable { columns, rows }
}

/// Thin CSV sink for the normalized table.
pub fn write_csv(table: &ExportTable, path: &Path) -> Result<(), Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
