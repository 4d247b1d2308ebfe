//! # Chainseal Core
//!
//! Pure primitives for sealing a document into an encrypted hash chain
//! and checking it later.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over in-memory documents and chunks.
//!
//! ## Key Types
//!
//! - [`Document`] - Draft or finalized; only drafts accept item edits
//! - [`Chunk`] - One encrypted segment linked to its predecessor by hash
//! - [`StoredChunk`] - A chunk as read back from storage, fields unvalidated
//! - [`CryptoContext`] - The loaded key, passed to every sealing operation
//! - [`VerificationReport`] - Per-chunk linkage and content findings
//!
//! ## Flow
//!
//! ```rust
//! use chainseal_core::{read, CryptoContext, Document, DraftDocument, EncryptionKey, Question};
//!
//! let ctx = CryptoContext::new(EncryptionKey::generate());
//!
//! let mut doc: Document = DraftDocument::from_items([
//!     Question::new("2 + 2?", ["3", "4"], 1),
//!     Question::new("Capital of France?", ["Paris", "Rome"], 0),
//! ])
//! .into();
//!
//! doc.finalize(&ctx, 5).unwrap();
//! assert_eq!(read(&ctx, &doc).unwrap().len(), 2);
//! assert!(doc.verify(&ctx).unwrap().is_valid());
//! ```
//!
//! ## Canonicalization
//!
//! Chunk payloads are encoded using deterministic CBOR. See [`canonical`].

pub mod canonical;
pub mod chain;
pub mod chunk;
pub mod crypto;
pub mod document;
pub mod error;
pub mod item;
pub mod partition;
pub mod reader;
pub mod verify;

pub use canonical::{canonical_payload, canonical_payload_raw, decode_payload, Payload};
pub use chain::ChainBuilder;
pub use chunk::{Chunk, PrevHash, StoredChunk, GENESIS};
pub use crypto::{ChunkHash, ChunkIv, CryptoContext, EncryptionKey, IV_LEN, KEY_LEN};
pub use document::{Document, DocumentId, DocumentStatus, DraftDocument, FinalizedDocument};
pub use error::{ChunkFieldError, CoreError, FinalizeError, KeyError, ReadError, RestoreError};
pub use item::Question;
pub use partition::partition;
pub use reader::{open_chunks, read, read_sealed};
pub use verify::{
    verify, verify_chunks, verify_stored, CheckOutcome, ChunkReport, FailureReason, Verdict,
    VerificationReport,
};
