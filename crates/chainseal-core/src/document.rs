//! Document lifecycle: a mutable draft, sealed once into a chunk chain.
//!
//! The two states are separate types. Item mutation only exists on
//! [`DraftDocument`]; a [`FinalizedDocument`] exposes its chunks read-only
//! and has no way back to the draft state.

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use tracing::info;

use crate::chain::ChainBuilder;
use crate::chunk::Chunk;
use crate::crypto::CryptoContext;
use crate::error::{FinalizeError, RestoreError};
use crate::item::Question;
use crate::partition::partition;

/// A 16-byte document identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub [u8; 16]);

impl DocumentId {
    /// Generate a new random ID.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        Self::try_from(bytes.as_slice()).map_err(|_| hex::FromHexError::InvalidStringLength)
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.to_hex())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<&[u8]> for DocumentId {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 16] = slice.try_into()?;
        Ok(Self(arr))
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Lifecycle status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Finalized,
}

/// A document under construction. Items are freely mutable.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftDocument<T = Question> {
    id: DocumentId,
    items: Vec<T>,
}

impl<T> DraftDocument<T> {
    /// Create an empty draft with a fresh ID.
    pub fn new() -> Self {
        Self::with_id(DocumentId::generate())
    }

    /// Create an empty draft with the given ID.
    pub fn with_id(id: DocumentId) -> Self {
        Self {
            id,
            items: Vec::new(),
        }
    }

    /// Create a draft pre-filled with items.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut draft = Self::new();
        draft.items.extend(items);
        draft
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append an item.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Insert an item at a position.
    ///
    /// Panics if `index > len`, like [`Vec::insert`].
    pub fn insert(&mut self, index: usize, item: T) {
        self.items.insert(index, item);
    }

    /// Remove and return the item at a position, if present.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        self.items.extend(items);
    }
}

impl<T: Serialize> DraftDocument<T> {
    /// Partition and seal the current items into a new finalized document.
    ///
    /// The draft itself is not modified; on error nothing is produced.
    pub fn seal(
        &self,
        ctx: &CryptoContext,
        parts: usize,
    ) -> Result<FinalizedDocument<T>, FinalizeError> {
        if self.items.is_empty() {
            return Err(FinalizeError::EmptyDocument);
        }
        if parts == 0 {
            return Err(FinalizeError::InvalidPartCount(parts));
        }

        let segments = partition(&self.items, parts);
        let chunks = ChainBuilder::new(ctx).build(&segments)?;

        Ok(FinalizedDocument {
            id: self.id,
            chunks,
            _items: PhantomData,
        })
    }
}

impl<T> Default for DraftDocument<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A sealed document. Only the chunk chain is authoritative.
pub struct FinalizedDocument<T = Question> {
    id: DocumentId,
    chunks: Vec<Chunk>,
    _items: PhantomData<fn() -> T>,
}

impl<T> FinalizedDocument<T> {
    /// Rebuild a sealed document from stored parts.
    pub fn from_parts(id: DocumentId, chunks: Vec<Chunk>) -> Result<Self, RestoreError> {
        if chunks.is_empty() {
            return Err(RestoreError::NoChunks);
        }
        Ok(Self {
            id,
            chunks,
            _items: PhantomData,
        })
    }

    /// Split into ID and chunks (for persistence).
    pub fn into_parts(self) -> (DocumentId, Vec<Chunk>) {
        (self.id, self.chunks)
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

impl<T> Clone for FinalizedDocument<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            chunks: self.chunks.clone(),
            _items: PhantomData,
        }
    }
}

impl<T> fmt::Debug for FinalizedDocument<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinalizedDocument")
            .field("id", &self.id)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

impl<T> PartialEq for FinalizedDocument<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.chunks == other.chunks
    }
}

/// A document in either lifecycle state.
#[derive(Debug, Clone)]
pub enum Document<T = Question> {
    Draft(DraftDocument<T>),
    Finalized(FinalizedDocument<T>),
}

impl<T> Document<T> {
    /// Create an empty draft document.
    pub fn new() -> Self {
        Document::Draft(DraftDocument::new())
    }

    pub fn id(&self) -> DocumentId {
        match self {
            Document::Draft(d) => d.id(),
            Document::Finalized(f) => f.id(),
        }
    }

    pub fn status(&self) -> DocumentStatus {
        match self {
            Document::Draft(_) => DocumentStatus::Draft,
            Document::Finalized(_) => DocumentStatus::Finalized,
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, Document::Finalized(_))
    }

    /// The sealed chunks; empty while in draft.
    pub fn chunks(&self) -> &[Chunk] {
        match self {
            Document::Draft(_) => &[],
            Document::Finalized(f) => f.chunks(),
        }
    }

    pub fn as_draft(&self) -> Option<&DraftDocument<T>> {
        match self {
            Document::Draft(d) => Some(d),
            Document::Finalized(_) => None,
        }
    }

    /// Mutable access to the draft, `None` once finalized.
    pub fn as_draft_mut(&mut self) -> Option<&mut DraftDocument<T>> {
        match self {
            Document::Draft(d) => Some(d),
            Document::Finalized(_) => None,
        }
    }

    pub fn as_finalized(&self) -> Option<&FinalizedDocument<T>> {
        match self {
            Document::Draft(_) => None,
            Document::Finalized(f) => Some(f),
        }
    }
}

impl<T: Serialize> Document<T> {
    /// Seal the draft into `parts` chunks and switch to the finalized state.
    ///
    /// One-shot: a finalized document returns `AlreadyFinalized` and its
    /// chain is left as is. On any error a draft stays a draft.
    pub fn finalize(&mut self, ctx: &CryptoContext, parts: usize) -> Result<(), FinalizeError> {
        let sealed = match self {
            Document::Draft(draft) => draft.seal(ctx, parts)?,
            Document::Finalized(_) => return Err(FinalizeError::AlreadyFinalized),
        };

        info!(
            document = %sealed.id(),
            chunks = sealed.chunk_count(),
            "document finalized"
        );
        *self = Document::Finalized(sealed);
        Ok(())
    }
}

impl<T> Default for Document<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<DraftDocument<T>> for Document<T> {
    fn from(draft: DraftDocument<T>) -> Self {
        Document::Draft(draft)
    }
}

impl<T> From<FinalizedDocument<T>> for Document<T> {
    fn from(sealed: FinalizedDocument<T>) -> Self {
        Document::Finalized(sealed)
    }
}
