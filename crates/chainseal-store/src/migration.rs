//! Database schema migrations for SQLite.
//!
//! Each migration moves the schema from version N to N+1 and is recorded
//! in `schema_migrations`.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema. Idempotent.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get::<_, Option<u32>>(0)
        })
        .optional()?
        .flatten()
        .unwrap_or(0);

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{} is newer than supported v{}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::debug!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: sealed documents and their chunks.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per sealed document; presence means finalized
        CREATE TABLE documents (
            document_id BLOB PRIMARY KEY,     -- 16 bytes
            chunk_count INTEGER NOT NULL,
            sealed_at INTEGER NOT NULL        -- local time of insert (Unix ms)
        );

        CREATE TABLE chunks (
            document_id BLOB NOT NULL REFERENCES documents(document_id),
            idx INTEGER NOT NULL,             -- 0-based chain position
            prev_hash TEXT NOT NULL,          -- 'GENESIS' or 64 hex chars
            hash BLOB NOT NULL,               -- 32 bytes, Blake3 of canonical payload
            iv BLOB NOT NULL,                 -- 12 bytes
            cipher_text BLOB NOT NULL,
            PRIMARY KEY (document_id, idx)
        );

        CREATE INDEX idx_documents_sealed ON documents(sealed_at);
        "#,
    )?;

    Ok(())
}

/// Current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
