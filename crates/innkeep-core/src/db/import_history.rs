//! Import history operations

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{ImportSession, ImportStatus, NewImportSession, Platform};

impl Database {
    /// Create a new import session
    pub fn create_import_session(&self, session: &NewImportSession) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO import_sessions (filename, file_size_bytes, platform, operator)
            VALUES (?, ?, ?, ?)
            "#,
            params![
                session.filename,
                session.file_size_bytes,
                session.platform.as_str(),
                session.operator,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Update import session with final row counts
    pub fn update_import_session_results(
        &self,
        session_id: i64,
        imported: i64,
        duplicates: i64,
        skipped: i64,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE import_sessions SET
                imported_count = ?,
                duplicate_count = ?,
                skipped_count = ?
            WHERE id = ?
            "#,
            params![imported, duplicates, skipped, session_id],
        )?;
        Ok(())
    }

    /// Mark import session as completed
    pub fn mark_import_completed(&self, session_id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE import_sessions SET status = 'completed' WHERE id = ?",
            params![session_id],
        )?;
        Ok(())
    }

    /// Mark import session as failed
    pub fn mark_import_failed(&self, session_id: i64, error: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE import_sessions SET status = 'failed', error = ? WHERE id = ?",
            params![error, session_id],
        )?;
        Ok(())
    }

    /// List import sessions, newest first
    pub fn list_import_sessions(&self, limit: i64, offset: i64) -> Result<Vec<ImportSession>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, filename, file_size_bytes, platform, imported_count, duplicate_count,
                   skipped_count, operator, status, error, created_at
            FROM import_sessions
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )?;

        let sessions = stmt
            .query_map(params![limit, offset], |row| {
                Self::map_import_session_row(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// Count import sessions
    pub fn count_import_sessions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM import_sessions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get a single import session by ID
    pub fn get_import_session(&self, id: i64) -> Result<Option<ImportSession>> {
        let conn = self.conn()?;

        let result = conn.query_row(
            r#"
            SELECT id, filename, file_size_bytes, platform, imported_count, duplicate_count,
                   skipped_count, operator, status, error, created_at
            FROM import_sessions
            WHERE id = ?
            "#,
            params![id],
            |row| Self::map_import_session_row(row),
        );

        match result {
            Ok(session) => Ok(Some(session)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Helper to map a row to ImportSession
    fn map_import_session_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ImportSession> {
        let platform_str: String = row.get(3)?;
        let status_str: Option<String> = row.get(8)?;
        let created_at_str: String = row.get(10)?;

        Ok(ImportSession {
            id: row.get(0)?,
            filename: row.get(1)?,
            file_size_bytes: row.get(2)?,
            // Platform was validated on insert, but default to Booking.com if somehow corrupt
            platform: platform_str.parse().unwrap_or(Platform::BookingCom),
            imported_count: row.get(4)?,
            duplicate_count: row.get(5)?,
            skipped_count: row.get(6)?,
            operator: row.get(7)?,
            status: status_str
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(ImportStatus::Pending),
            error: row.get(9)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
