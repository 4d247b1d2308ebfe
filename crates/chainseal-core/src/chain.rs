//! Chain builder: seal segments into hash-linked, encrypted chunks.

use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use crate::canonical::{canonical_payload, item_to_value};
use crate::chunk::{Chunk, PrevHash};
use crate::crypto::{ChunkHash, CryptoContext};
use crate::error::CoreError;

/// Builds a chunk chain from ordered segments.
///
/// For each segment `i`:
/// 1. `prev = Genesis` when `i == 0`, else the hash of segment `i - 1`
/// 2. `P = canonical({ items, prevHash: prev, index: i })`
/// 3. `hash = Blake3(P)`
/// 4. `(iv, cipherText) = Encrypt(key, P)` under a fresh IV
///
/// Nothing is returned unless every segment seals, so a failure never
/// exposes a partial chain.
pub struct ChainBuilder<'a> {
    ctx: &'a CryptoContext,
}

impl<'a> ChainBuilder<'a> {
    /// Create a builder bound to the process crypto context.
    pub fn new(ctx: &'a CryptoContext) -> Self {
        Self { ctx }
    }

    /// Seal every segment, in order.
    pub fn build<T: Serialize>(&self, segments: &[&[T]]) -> Result<Vec<Chunk>, CoreError> {
        let mut chunks = Vec::with_capacity(segments.len());
        let mut prev_hash = PrevHash::Genesis;

        for (i, segment) in segments.iter().enumerate() {
            let index = u32::try_from(i)
                .map_err(|_| CoreError::EncodingError("too many segments".into()))?;

            let chunk = self.seal_segment(segment, prev_hash, index)?;
            debug!(index, hash = %chunk.hash, "sealed chunk");

            prev_hash = PrevHash::Chunk(chunk.hash);
            chunks.push(chunk);
        }

        Ok(chunks)
    }

    fn seal_segment<T: Serialize>(
        &self,
        segment: &[T],
        prev_hash: PrevHash,
        index: u32,
    ) -> Result<Chunk, CoreError> {
        let items = segment
            .iter()
            .map(item_to_value)
            .collect::<Result<Vec<_>, _>>()?;

        let payload = canonical_payload(&items, &prev_hash, index)?;
        let hash = ChunkHash::hash(&payload);
        let (iv, cipher_text) = self.ctx.encrypt(&payload)?;

        Ok(Chunk {
            index,
            prev_hash,
            hash,
            iv,
            cipher_text: Bytes::from(cipher_text),
        })
    }
}
