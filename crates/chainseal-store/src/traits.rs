//! ChunkStore trait: the abstract interface for sealed-chain persistence.
//!
//! Storage is write-once per document. A chain is inserted whole or not
//! at all, and a second insert for the same document never replaces the
//! first one.

use async_trait::async_trait;
use chainseal_core::{Chunk, DocumentId, FinalizedDocument, StoredChunk};

use crate::error::{Result, StoreError};

/// Result of inserting a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Chain was stored.
    Inserted,
    /// A chain already exists for this document; nothing was written.
    AlreadySealed,
}

/// Async interface for storing sealed chunk chains.
///
/// All methods are async to support both blocking (SQLite) and async
/// backends. SQLite work runs under `spawn_blocking`.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Store the full chain of a document.
    ///
    /// Rejects an empty chain with `InvalidData`.
    async fn insert_chain(&self, id: &DocumentId, chunks: &[Chunk]) -> Result<InsertResult>;

    /// Load a chain, ordered by index.
    ///
    /// Fails with `InvalidData` if any stored field no longer parses or the
    /// indices are not `0, 1, 2, ...`.
    async fn get_chain(&self, id: &DocumentId) -> Result<Option<Vec<Chunk>>>;

    /// Load a chain as stored, without validating its fields.
    ///
    /// Rows come back ordered by stored index, gaps included, so a verifier
    /// can localize damage that [`get_chain`](Self::get_chain) would reject
    /// outright. Backends that can only hold valid chunks use the default.
    async fn get_stored_chain(&self, id: &DocumentId) -> Result<Option<Vec<StoredChunk>>> {
        Ok(self
            .get_chain(id)
            .await?
            .map(|chunks| chunks.iter().map(StoredChunk::from).collect()))
    }

    /// Check if a chain exists.
    async fn has_chain(&self, id: &DocumentId) -> Result<bool>;

    /// All sealed document IDs.
    async fn list_documents(&self) -> Result<Vec<DocumentId>>;

    /// Number of sealed documents.
    async fn count(&self) -> Result<usize>;
}

/// Typed helpers on top of [`ChunkStore`].
pub trait ChunkStoreExt: ChunkStore {
    /// Persist a finalized document.
    fn save_sealed<T>(
        &self,
        doc: &FinalizedDocument<T>,
    ) -> impl std::future::Future<Output = Result<InsertResult>> + Send;

    /// Load a finalized document.
    fn load_sealed<T>(
        &self,
        id: &DocumentId,
    ) -> impl std::future::Future<Output = Result<Option<FinalizedDocument<T>>>> + Send;
}

impl<S: ChunkStore + ?Sized> ChunkStoreExt for S {
    async fn save_sealed<T>(&self, doc: &FinalizedDocument<T>) -> Result<InsertResult> {
        self.insert_chain(&doc.id(), doc.chunks()).await
    }

    async fn load_sealed<T>(&self, id: &DocumentId) -> Result<Option<FinalizedDocument<T>>> {
        match self.get_chain(id).await? {
            Some(chunks) => FinalizedDocument::from_parts(*id, chunks)
                .map(Some)
                .map_err(|e| StoreError::InvalidData(e.to_string())),
            None => Ok(None),
        }
    }
}

/// Check that chunk indices run 0, 1, 2, ... in order.
pub(crate) fn check_contiguous(chunks: &[Chunk]) -> Result<()> {
    if chunks.is_empty() {
        return Err(StoreError::InvalidData("empty chain".into()));
    }
    for (i, chunk) in chunks.iter().enumerate() {
        if chunk.index as usize != i {
            return Err(StoreError::InvalidData(format!(
                "chunk at position {} has index {}",
                i, chunk.index
            )));
        }
    }
    Ok(())
}
