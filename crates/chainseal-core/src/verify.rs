//! Integrity verification with per-chunk localization.
//!
//! Each chunk gets two independent checks:
//!
//! - **Linkage** compares stored fields only: chunk 0 must carry the
//!   genesis sentinel, chunk `i > 0` must carry the stored hash of chunk
//!   `i - 1`, and every stored index must equal the chunk's position. No
//!   decryption is involved.
//! - **Content** decrypts the chunk, re-derives the canonical payload from
//!   the decoded items, the stored `prevHash` text and the chunk's
//!   position, and compares its hash against the stored `hash`.
//!
//! Checks run on [`StoredChunk`], the unvalidated storage form, so a field
//! that no longer parses fails its own chunk instead of the whole load.
//! All chunks are checked even after a failure. Findings are data, not
//! errors: a compromised document is a normal answer.
//!
//! The chain has no separately trusted root. Rewriting the last chunk's
//! ciphertext together with a matching recomputed hash passes both checks;
//! for any earlier chunk the next chunk's linkage catches it.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use tracing::{info, warn};

use crate::canonical::{canonical_payload_raw, decode_payload};
use crate::chunk::{Chunk, StoredChunk, GENESIS};
use crate::crypto::{ChunkHash, ChunkIv, CryptoContext};
use crate::document::{Document, DocumentId, FinalizedDocument};

/// Document-level verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Valid,
    Compromised,
}

/// Why a check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// Chunk 0 does not carry the genesis sentinel.
    #[serde(rename = "invalid genesis")]
    InvalidGenesis,
    /// `prevHash` does not equal the previous chunk's stored hash.
    #[serde(rename = "prevHash mismatch")]
    PrevHashMismatch,
    /// Stored index differs from the chunk's position in the chain.
    #[serde(rename = "index mismatch")]
    IndexMismatch,
    /// Ciphertext did not decrypt under the loaded key.
    #[serde(rename = "decryption failed")]
    DecryptionFailed,
    /// Recomputed payload hash differs from the stored hash.
    #[serde(rename = "hash mismatch")]
    HashMismatch,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::InvalidGenesis => "invalid genesis",
            FailureReason::PrevHashMismatch => "prevHash mismatch",
            FailureReason::IndexMismatch => "index mismatch",
            FailureReason::DecryptionFailed => "decryption failed",
            FailureReason::HashMismatch => "hash mismatch",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOutcome {
    Passed,
    Failed(FailureReason),
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, CheckOutcome::Passed)
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            CheckOutcome::Passed => None,
            CheckOutcome::Failed(reason) => Some(*reason),
        }
    }
}

/// Verification result for one chunk.
///
/// Serializes with a derived `valid` flag next to the two checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ChunkReport {
    /// Position of the chunk in the chain.
    pub index: usize,
    pub linkage: CheckOutcome,
    pub content: CheckOutcome,
}

impl ChunkReport {
    /// A chunk is valid only if both checks passed.
    pub fn valid(&self) -> bool {
        self.linkage.passed() && self.content.passed()
    }

    /// Every failing reason, linkage first.
    pub fn reasons(&self) -> Vec<FailureReason> {
        self.linkage
            .reason()
            .into_iter()
            .chain(self.content.reason())
            .collect()
    }

    /// The first failing reason, if any.
    pub fn reason(&self) -> Option<FailureReason> {
        self.linkage.reason().or(self.content.reason())
    }
}

impl Serialize for ChunkReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ChunkReport", 4)?;
        state.serialize_field("index", &self.index)?;
        state.serialize_field("valid", &self.valid())?;
        state.serialize_field("linkage", &self.linkage)?;
        state.serialize_field("content", &self.content)?;
        state.end()
    }
}

/// Full verification report for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub document_id: DocumentId,
    pub status: Verdict,
    pub per_chunk: Vec<ChunkReport>,
}

impl VerificationReport {
    pub fn is_valid(&self) -> bool {
        self.status == Verdict::Valid
    }

    /// Positions of every invalid chunk.
    pub fn compromised_indices(&self) -> Vec<usize> {
        self.per_chunk
            .iter()
            .filter(|r| !r.valid())
            .map(|r| r.index)
            .collect()
    }
}

/// Verify a sealed document.
pub fn verify<T>(ctx: &CryptoContext, doc: &FinalizedDocument<T>) -> VerificationReport {
    verify_chunks(ctx, doc.id(), doc.chunks())
}

/// Verify a typed chunk sequence belonging to `document_id`.
pub fn verify_chunks(
    ctx: &CryptoContext,
    document_id: DocumentId,
    chunks: &[Chunk],
) -> VerificationReport {
    let stored: Vec<StoredChunk> = chunks.iter().map(StoredChunk::from).collect();
    verify_stored(ctx, document_id, &stored)
}

/// Verify a chain exactly as it was read back from storage.
pub fn verify_stored(
    ctx: &CryptoContext,
    document_id: DocumentId,
    chunks: &[StoredChunk],
) -> VerificationReport {
    let per_chunk: Vec<ChunkReport> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let previous = i.checked_sub(1).map(|p| &chunks[p]);
            let report = ChunkReport {
                index: i,
                linkage: check_linkage(chunk, i, previous),
                content: check_content(ctx, chunk, i),
            };
            if !report.valid() {
                warn!(
                    document = %document_id,
                    index = i,
                    reasons = ?report.reasons(),
                    "chunk failed verification"
                );
            }
            report
        })
        .collect();

    let status = if !per_chunk.is_empty() && per_chunk.iter().all(ChunkReport::valid) {
        Verdict::Valid
    } else {
        Verdict::Compromised
    };

    info!(document = %document_id, chunks = per_chunk.len(), ?status, "verification complete");

    VerificationReport {
        document_id,
        status,
        per_chunk,
    }
}

fn check_linkage(
    chunk: &StoredChunk,
    position: usize,
    previous: Option<&StoredChunk>,
) -> CheckOutcome {
    let linked = match previous {
        None => chunk.prev_hash == GENESIS,
        Some(prev) => chunk.prev_hash == hex::encode(&prev.hash),
    };

    if !linked {
        let reason = match previous {
            None => FailureReason::InvalidGenesis,
            Some(_) => FailureReason::PrevHashMismatch,
        };
        return CheckOutcome::Failed(reason);
    }
    if i64::try_from(position).map_or(true, |p| p != chunk.index) {
        return CheckOutcome::Failed(FailureReason::IndexMismatch);
    }
    CheckOutcome::Passed
}

fn check_content(ctx: &CryptoContext, chunk: &StoredChunk, position: usize) -> CheckOutcome {
    let plaintext = ChunkIv::try_from(chunk.iv.as_slice())
        .ok()
        .and_then(|iv| ctx.decrypt(&iv, &chunk.cipher_text).ok());
    let Some(plaintext) = plaintext else {
        return CheckOutcome::Failed(FailureReason::DecryptionFailed);
    };

    let recomputed = u32::try_from(position)
        .ok()
        .and_then(|index| {
            let payload = decode_payload(&plaintext).ok()?;
            canonical_payload_raw(&payload.items, &chunk.prev_hash, index).ok()
        })
        .map(|bytes| ChunkHash::hash(&bytes));

    match recomputed {
        Some(hash) if hash.as_bytes().as_slice() == chunk.hash.as_slice() => CheckOutcome::Passed,
        _ => CheckOutcome::Failed(FailureReason::HashMismatch),
    }
}

impl<T> Document<T> {
    /// Verify the sealed chain; `None` while the document is a draft.
    pub fn verify(&self, ctx: &CryptoContext) -> Option<VerificationReport> {
        self.as_finalized().map(|sealed| verify(ctx, sealed))
    }
}
