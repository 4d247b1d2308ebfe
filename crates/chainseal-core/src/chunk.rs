//! Chunk: one encrypted, hash-linked segment of a sealed document.

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::crypto::{ChunkHash, ChunkIv};
use crate::error::ChunkFieldError;

/// Sentinel stored as `prevHash` of the first chunk.
pub const GENESIS: &str = "GENESIS";

/// The back-link of a chunk.
///
/// Serialized as `"GENESIS"` or the 64-character hex hash of the
/// predecessor.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrevHash {
    /// No predecessor (index 0).
    Genesis,
    /// Hash of the previous chunk's canonical payload.
    Chunk(ChunkHash),
}

impl PrevHash {
    /// Textual form, as it appears in the canonical payload.
    pub fn to_text(&self) -> String {
        match self {
            PrevHash::Genesis => GENESIS.to_string(),
            PrevHash::Chunk(hash) => hash.to_hex(),
        }
    }

    /// Check if this is the genesis sentinel.
    pub fn is_genesis(&self) -> bool {
        matches!(self, PrevHash::Genesis)
    }
}

impl FromStr for PrevHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == GENESIS {
            Ok(PrevHash::Genesis)
        } else {
            ChunkHash::from_hex(s).map(PrevHash::Chunk)
        }
    }
}

impl From<ChunkHash> for PrevHash {
    fn from(hash: ChunkHash) -> Self {
        PrevHash::Chunk(hash)
    }
}

impl fmt::Debug for PrevHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrevHash::Genesis => f.write_str("Genesis"),
            PrevHash::Chunk(hash) => write!(f, "{:?}", hash),
        }
    }
}

impl fmt::Display for PrevHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl Serialize for PrevHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for PrevHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One encrypted, hash-linked segment.
///
/// `hash` is computed over the canonical plaintext payload before
/// encryption; `cipher_text` is that same payload encrypted under `iv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Position in the chain, 0-based.
    pub index: u32,

    /// `Genesis` for index 0, otherwise the stored hash of the predecessor.
    pub prev_hash: PrevHash,

    /// Blake3 hash of the canonical payload.
    pub hash: ChunkHash,

    /// Nonce used for this chunk's encryption.
    pub iv: ChunkIv,

    /// Encrypted canonical payload (includes the authentication tag).
    #[serde(with = "hex_bytes")]
    pub cipher_text: Bytes,
}

impl Chunk {
    /// Size of the ciphertext in bytes.
    pub fn cipher_text_len(&self) -> usize {
        self.cipher_text.len()
    }
}

/// A chunk exactly as it was read back from storage.
///
/// Fields are kept as raw values so an unparseable `prevHash`, a hash or
/// nonce of the wrong length, or an index out of place can be reported
/// against the one chunk that carries it. [`verify_stored`] works on this
/// form; [`Chunk::try_from`] is the strict conversion used for reads.
///
/// [`verify_stored`]: crate::verify::verify_stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredChunk {
    pub index: i64,
    pub prev_hash: String,
    pub hash: Vec<u8>,
    pub iv: Vec<u8>,
    pub cipher_text: Bytes,
}

impl From<&Chunk> for StoredChunk {
    fn from(chunk: &Chunk) -> Self {
        Self {
            index: i64::from(chunk.index),
            prev_hash: chunk.prev_hash.to_text(),
            hash: chunk.hash.as_bytes().to_vec(),
            iv: chunk.iv.as_bytes().to_vec(),
            cipher_text: chunk.cipher_text.clone(),
        }
    }
}

impl TryFrom<StoredChunk> for Chunk {
    type Error = ChunkFieldError;

    fn try_from(stored: StoredChunk) -> Result<Self, Self::Error> {
        let index =
            u32::try_from(stored.index).map_err(|_| ChunkFieldError::Index(stored.index))?;

        // Only the exact text we write is accepted; re-cased hex is a change.
        let prev_hash = match stored.prev_hash.parse::<PrevHash>() {
            Ok(prev) if prev.to_text() == stored.prev_hash => prev,
            _ => return Err(ChunkFieldError::PrevHash(stored.prev_hash)),
        };

        let hash: [u8; 32] = stored
            .hash
            .as_slice()
            .try_into()
            .map_err(|_| ChunkFieldError::HashLength(stored.hash.len()))?;
        let iv = ChunkIv::try_from(stored.iv.as_slice())
            .map_err(|_| ChunkFieldError::IvLength(stored.iv.len()))?;

        Ok(Chunk {
            index,
            prev_hash,
            hash: ChunkHash::from_bytes(hash),
            iv,
            cipher_text: stored.cipher_text,
        })
    }
}

mod hex_bytes {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map(Bytes::from).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chunk() -> Chunk {
        Chunk {
            index: 1,
            prev_hash: PrevHash::Chunk(ChunkHash::from_bytes([0xab; 32])),
            hash: ChunkHash::from_bytes([0xcd; 32]),
            iv: ChunkIv::from_bytes([0x01; 12]),
            cipher_text: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
        }
    }

    #[test]
    fn test_prev_hash_parse() {
        assert_eq!("GENESIS".parse::<PrevHash>().unwrap(), PrevHash::Genesis);

        let hash = ChunkHash::from_bytes([0x11; 32]);
        assert_eq!(
            hash.to_hex().parse::<PrevHash>().unwrap(),
            PrevHash::Chunk(hash)
        );

        assert!("genesis".parse::<PrevHash>().is_err());
    }

    #[test]
    fn test_stored_chunk_converts_back() {
        let chunk = sample_chunk();
        let stored = StoredChunk::from(&chunk);
        assert_eq!(stored.prev_hash, "ab".repeat(32));
        assert_eq!(Chunk::try_from(stored).unwrap(), chunk);
    }

    #[test]
    fn test_stored_chunk_field_errors() {
        let base = StoredChunk::from(&sample_chunk());

        let mut stored = base.clone();
        stored.prev_hash = "AB".repeat(32);
        assert!(matches!(Chunk::try_from(stored), Err(ChunkFieldError::PrevHash(_))));

        let mut stored = base.clone();
        stored.hash.pop();
        assert_eq!(Chunk::try_from(stored), Err(ChunkFieldError::HashLength(31)));

        let mut stored = base.clone();
        stored.iv.push(0);
        assert_eq!(Chunk::try_from(stored), Err(ChunkFieldError::IvLength(13)));

        let mut stored = base;
        stored.index = -1;
        assert_eq!(Chunk::try_from(stored), Err(ChunkFieldError::Index(-1)));
    }

    #[test]
    fn test_chunk_json_shape() {
        let json = serde_json::to_value(sample_chunk()).unwrap();
        let obj = json.as_object().unwrap();

        let mut keys: Vec<_> = obj.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["cipherText", "hash", "index", "iv", "prevHash"]);

        assert_eq!(obj["index"], 1);
        assert_eq!(obj["prevHash"], "ab".repeat(32));
        assert_eq!(obj["iv"], "01".repeat(12));
        assert_eq!(obj["cipherText"], "deadbeef");
    }

    #[test]
    fn test_genesis_serializes_as_sentinel() {
        let mut chunk = sample_chunk();
        chunk.index = 0;
        chunk.prev_hash = PrevHash::Genesis;

        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["prevHash"], "GENESIS");

        let back: Chunk = serde_json::from_value(json).unwrap();
        assert_eq!(back, chunk);
    }
}
