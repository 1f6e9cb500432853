use super::models::{CatalogSession, FileRow, StoredFile};
use super::sqlite::Database;
use rusqlite::{params, Result};
use tracing::debug;

impl Database {
    // ── Sessions ─────────────────────────────────────────────────

    pub fn insert_session(&self, session: &CatalogSession) -> Result<()> {
        let dirs_json =
            serde_json::to_string(&session.search_dirs).unwrap_or_default();
        self.connection().execute(
            "INSERT INTO sessions \
             (session_id, search_dirs, base_dir, hash_algorithm, buffer_size, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.session_id,
                dirs_json,
                session.base_dir,
                session.hash_algorithm,
                session.buffer_size,
                session.created_at,
            ],
        )?;
        debug!("Persisted session {}", session.session_id);
        Ok(())
    }

    /// Sessions newest-first.
    pub fn list_sessions(&self) -> Result<Vec<CatalogSession>> {
        let mut stmt = self.connection().prepare(
            "SELECT session_id, search_dirs, base_dir, hash_algorithm, buffer_size, created_at \
             FROM sessions ORDER BY created_at DESC",
        )?;
        let sessions = stmt
            .query_map([], |row| {
                let dirs_json: String = row.get(1)?;
                Ok(CatalogSession {
                    session_id: row.get(0)?,
                    search_dirs: serde_json::from_str(&dirs_json).unwrap_or_default(),
                    base_dir: row.get(2)?,
                    hash_algorithm: row.get(3)?,
                    buffer_size: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(sessions)
    }

    // ── Files ────────────────────────────────────────────────────

    /// Write one batch of rows in a single transaction. Re-running a session
    /// over the same tree upserts on the file key instead of failing.
    pub fn insert_file_rows(&self, rows: &[FileRow]) -> Result<usize> {
        let tx = self.connection().unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO files \
                 (relative_path, filename, extension, size_bytes, human_readable_size, \
                  checksum, hash_algorithm, session_id, file_key) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
                 ON CONFLICT(file_key) DO UPDATE SET \
                     relative_path = excluded.relative_path, \
                     filename = excluded.filename, \
                     extension = excluded.extension, \
                     size_bytes = excluded.size_bytes, \
                     human_readable_size = excluded.human_readable_size, \
                     checksum = excluded.checksum, \
                     hash_algorithm = excluded.hash_algorithm, \
                     session_id = excluded.session_id",
            )?;
            for row in rows {
                count += stmt.execute(params![
                    row.relative_path,
                    row.filename,
                    row.extension,
                    row.size_bytes,
                    row.human_readable_size,
                    row.checksum,
                    row.hash_algorithm,
                    row.session_id,
                    row.file_key,
                ])?;
            }
        }
        tx.commit()?;
        debug!("Wrote batch of {} file rows", count);
        Ok(count)
    }

    pub fn count_files(&self) -> Result<i64> {
        self.connection()
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))
    }

    /// Join files with their sessions, in insertion order. A session id
    /// narrows the join; `None` loads every session's rows.
    pub fn load_session_files(&self, session_id: Option<&str>) -> Result<Vec<StoredFile>> {
        const BASE_SQL: &str =
            "SELECT s.base_dir, f.relative_path, f.filename, f.extension, \
                    f.size_bytes, f.checksum, f.hash_algorithm, f.file_key \
             FROM files f \
             INNER JOIN sessions s ON f.session_id = s.session_id";

        match session_id {
            Some(id) => {
                let mut stmt = self.connection().prepare(&format!(
                    "{} WHERE f.session_id = ?1 ORDER BY f.rowid",
                    BASE_SQL
                ))?;
                let files = stmt
                    .query_map(params![id], row_to_stored_file)?
                    .collect::<Result<Vec<_>>>()?;
                Ok(files)
            }
            None => {
                let mut stmt = self
                    .connection()
                    .prepare(&format!("{} ORDER BY f.rowid", BASE_SQL))?;
                let files = stmt
                    .query_map([], row_to_stored_file)?
                    .collect::<Result<Vec<_>>>()?;
                Ok(files)
            }
        }
    }
}

fn row_to_stored_file(row: &rusqlite::Row<'_>) -> Result<StoredFile> {
    Ok(StoredFile {
        base_dir: row.get(0)?,
        relative_path: row.get(1)?,
        filename: row.get(2)?,
        extension: row.get(3)?,
        size_bytes: row.get(4)?,
        checksum: row.get(5)?,
        hash_algorithm: row.get(6)?,
        file_key: row.get(7)?,
    })
}
