//! In-memory implementation of the ChunkStore trait.
//!
//! Same write-once semantics as SQLite, nothing persisted.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chainseal_core::{Chunk, DocumentId};

use crate::error::{Result, StoreError};
use crate::traits::{check_contiguous, ChunkStore, InsertResult};

/// In-memory store. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    chains: RwLock<BTreeMap<DocumentId, Vec<Chunk>>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<DocumentId, Vec<Chunk>>>> {
        self.chains
            .read()
            .map_err(|e| StoreError::Task(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<DocumentId, Vec<Chunk>>>> {
        self.chains
            .write()
            .map_err(|e| StoreError::Task(format!("lock poisoned: {}", e)))
    }
}

#[async_trait]
impl ChunkStore for MemoryStore {
    async fn insert_chain(&self, id: &DocumentId, chunks: &[Chunk]) -> Result<InsertResult> {
        check_contiguous(chunks)?;

        let mut chains = self.write()?;
        if chains.contains_key(id) {
            return Ok(InsertResult::AlreadySealed);
        }
        chains.insert(*id, chunks.to_vec());
        Ok(InsertResult::Inserted)
    }

    async fn get_chain(&self, id: &DocumentId) -> Result<Option<Vec<Chunk>>> {
        Ok(self.read()?.get(id).cloned())
    }

    async fn has_chain(&self, id: &DocumentId) -> Result<bool> {
        Ok(self.read()?.contains_key(id))
    }

    async fn list_documents(&self) -> Result<Vec<DocumentId>> {
        Ok(self.read()?.keys().copied().collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
