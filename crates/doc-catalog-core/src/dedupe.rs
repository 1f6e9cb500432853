use crate::record::FileRecord;
use std::collections::HashSet;
use tracing::debug;

/// Single-pass duplicate tagging over the final admitted sequence.
///
/// The slice must already be ordered Existing-first then New-in-traversal
/// order; the first record bearing a given checksum is canonical and stays
/// unmarked, every later holder is marked duplicate. Records without a known
/// checksum are never marked and never claim a checksum slot.
///
/// Returns the number of records marked duplicate.
pub fn mark_duplicates(records: &mut [FileRecord]) -> usize {
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates = 0usize;

    for record in records.iter_mut() {
        let checksum = match record.checksum() {
            Some(checksum) => checksum.to_string(),
            None => {
                record.duplicate = false;
                continue;
            }
        };
        if seen.contains(&checksum) {
            record.duplicate = true;
            duplicates += 1;
        } else {
            record.duplicate = false;
            seen.insert(checksum);
        }
    }

    debug!("duplicate pass: {} of {} records marked", duplicates, records.len());
    duplicates
}
