//! SQLite implementation of the ChunkStore trait.
//!
//! Uses rusqlite with bundled SQLite, wrapped in async via
//! `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};

use chainseal_core::{Chunk, DocumentId, StoredChunk};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{check_contiguous, ChunkStore, InsertResult};

/// SQLite-based store.
///
/// Thread-safe via internal Mutex. All operations run on the blocking pool.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path, creating and migrating it
    /// as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

#[async_trait]
impl ChunkStore for SqliteStore {
    async fn insert_chain(&self, id: &DocumentId, chunks: &[Chunk]) -> Result<InsertResult> {
        check_contiguous(chunks)?;

        let id = *id;
        let chunks = chunks.to_vec();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            let inserted = tx.execute(
                "INSERT OR IGNORE INTO documents (document_id, chunk_count, sealed_at)
                 VALUES (?1, ?2, ?3)",
                params![id.as_bytes().as_slice(), chunks.len() as i64, now_millis()],
            )?;
            if inserted == 0 {
                return Ok(InsertResult::AlreadySealed);
            }

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO chunks (document_id, idx, prev_hash, hash, iv, cipher_text)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?;
                for chunk in &chunks {
                    stmt.execute(params![
                        id.as_bytes().as_slice(),
                        chunk.index,
                        chunk.prev_hash.to_text(),
                        chunk.hash.as_bytes().as_slice(),
                        chunk.iv.as_bytes().as_slice(),
                        chunk.cipher_text.as_ref(),
                    ])?;
                }
            }

            tx.commit()?;
            tracing::debug!(document = %id, chunks = chunks.len(), "stored sealed chain");
            Ok(InsertResult::Inserted)
        })
        .await
    }

    async fn get_chain(&self, id: &DocumentId) -> Result<Option<Vec<Chunk>>> {
        let id = *id;

        self.blocking(move |conn| {
            let Some((expected, rows)) = fetch_rows(conn, &id)? else {
                return Ok(None);
            };

            if rows.len() as i64 != expected {
                return Err(StoreError::InvalidData(format!(
                    "document {} expects {} chunks, found {}",
                    id,
                    expected,
                    rows.len()
                )));
            }

            let chunks = rows
                .into_iter()
                .enumerate()
                .map(|(position, row)| {
                    Chunk::try_from(row).map_err(|e| {
                        StoreError::InvalidData(format!("chunk {}: {}", position, e))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            check_contiguous(&chunks)?;
            Ok(Some(chunks))
        })
        .await
    }

    async fn get_stored_chain(&self, id: &DocumentId) -> Result<Option<Vec<StoredChunk>>> {
        let id = *id;
        self.blocking(move |conn| Ok(fetch_rows(conn, &id)?.map(|(_, rows)| rows)))
            .await
    }

    async fn has_chain(&self, id: &DocumentId) -> Result<bool> {
        let id = *id;
        self.blocking(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM documents WHERE document_id = ?1)",
                params![id.as_bytes().as_slice()],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    async fn list_documents(&self) -> Result<Vec<DocumentId>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare("SELECT document_id FROM documents ORDER BY document_id")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            ids.into_iter()
                .map(|bytes| {
                    DocumentId::try_from(bytes.as_slice()).map_err(|_| {
                        StoreError::InvalidData(format!(
                            "document id has {} bytes, expected 16",
                            bytes.len()
                        ))
                    })
                })
                .collect()
        })
        .await
    }

    async fn count(&self) -> Result<usize> {
        self.blocking(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }
}

/// The declared chunk count and the raw `chunks` rows of a document,
/// ordered by stored index.
fn fetch_rows(conn: &Connection, id: &DocumentId) -> Result<Option<(i64, Vec<StoredChunk>)>> {
    let expected: Option<i64> = conn
        .query_row(
            "SELECT chunk_count FROM documents WHERE document_id = ?1",
            params![id.as_bytes().as_slice()],
            |row| row.get(0),
        )
        .optional()?;

    let Some(expected) = expected else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT idx, prev_hash, hash, iv, cipher_text FROM chunks
         WHERE document_id = ?1 ORDER BY idx",
    )?;
    let rows = stmt
        .query_map(params![id.as_bytes().as_slice()], |row| {
            Ok(StoredChunk {
                index: row.get(0)?,
                prev_hash: row.get(1)?,
                hash: row.get(2)?,
                iv: row.get(3)?,
                cipher_text: Bytes::from(row.get::<_, Vec<u8>>(4)?),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Some((expected, rows)))
}
