//! Reader: decrypt a sealed chain and reassemble the original items.
//!
//! Plaintext only lives in the returned vector. Nothing is cached, and
//! every call decrypts again.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::canonical::{decode_payload, item_from_value};
use crate::chunk::Chunk;
use crate::crypto::CryptoContext;
use crate::document::{Document, FinalizedDocument};
use crate::error::ReadError;

/// Decrypt every chunk in index order and concatenate their items.
///
/// Access control is the caller's job; this must only be reached after
/// the reader has been authorized.
pub fn read<T: DeserializeOwned>(
    ctx: &CryptoContext,
    doc: &Document<T>,
) -> Result<Vec<T>, ReadError> {
    match doc {
        Document::Finalized(sealed) => read_sealed(ctx, sealed),
        Document::Draft(_) => Err(ReadError::NotFinalized),
    }
}

/// Same as [`read`], for a value already known to be sealed.
pub fn read_sealed<T: DeserializeOwned>(
    ctx: &CryptoContext,
    doc: &FinalizedDocument<T>,
) -> Result<Vec<T>, ReadError> {
    let items = open_chunks(ctx, doc.chunks())?;
    debug!(document = %doc.id(), items = items.len(), "document opened");
    Ok(items)
}

/// Decrypt and decode a chunk sequence.
pub fn open_chunks<T: DeserializeOwned>(
    ctx: &CryptoContext,
    chunks: &[Chunk],
) -> Result<Vec<T>, ReadError> {
    let mut items = Vec::new();

    // Errors name the position in the chain, not the stored index field.
    for (index, chunk) in chunks.iter().enumerate() {
        let plaintext = ctx
            .decrypt(&chunk.iv, &chunk.cipher_text)
            .map_err(|_| ReadError::Decryption { index })?;

        let payload = decode_payload(&plaintext).map_err(|e| ReadError::MalformedPayload {
            index,
            reason: e.to_string(),
        })?;

        for value in &payload.items {
            let item = item_from_value(value).map_err(|e| ReadError::MalformedPayload {
                index,
                reason: e.to_string(),
            })?;
            items.push(item);
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::EncryptionKey;
    use crate::document::DraftDocument;
    use crate::item::Question;
    use bytes::Bytes;

    fn ctx() -> CryptoContext {
        CryptoContext::new(EncryptionKey::from_bytes([0x11; 32]))
    }

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question::new(format!("Q{}", i), ["a", "b", "c"], (i % 3) as u32))
            .collect()
    }

    #[test]
    fn test_roundtrip_preserves_order() {
        let ctx = ctx();
        let original = questions(7);
        let mut doc: Document = DraftDocument::from_items(original.clone()).into();
        doc.finalize(&ctx, 5).unwrap();

        let items = read(&ctx, &doc).unwrap();
        assert_eq!(items, original);
    }

    #[test]
    fn test_read_draft_rejected() {
        let doc: Document = DraftDocument::from_items(questions(2)).into();
        assert!(matches!(read(&ctx(), &doc), Err(ReadError::NotFinalized)));
    }

    #[test]
    fn test_wrong_key_reports_first_chunk() {
        let mut doc: Document = DraftDocument::from_items(questions(4)).into();
        doc.finalize(&ctx(), 2).unwrap();

        let other = CryptoContext::new(EncryptionKey::from_bytes([0x22; 32]));
        assert!(matches!(
            read(&other, &doc),
            Err(ReadError::Decryption { index: 0 })
        ));
    }

    #[test]
    fn test_truncated_ciphertext_reports_chunk_index() {
        let ctx = ctx();
        let draft: DraftDocument = DraftDocument::from_items(questions(6));
        let sealed = draft.seal(&ctx, 3).unwrap();

        let (id, mut chunks) = sealed.into_parts();
        let truncated = chunks[2].cipher_text.slice(..chunks[2].cipher_text.len() - 4);
        chunks[2].cipher_text = truncated;
        let sealed = FinalizedDocument::<Question>::from_parts(id, chunks).unwrap();

        assert!(matches!(
            read_sealed(&ctx, &sealed),
            Err(ReadError::Decryption { index: 2 })
        ));
    }

    #[test]
    fn test_error_names_position_not_stored_index() {
        let ctx = ctx();
        let draft: DraftDocument = DraftDocument::from_items(questions(6));
        let (id, mut chunks) = draft.seal(&ctx, 3).unwrap().into_parts();
        chunks[1].index = 7;
        chunks[1].cipher_text = Bytes::from_static(b"garbage");
        let sealed = FinalizedDocument::<Question>::from_parts(id, chunks).unwrap();

        assert!(matches!(
            read_sealed(&ctx, &sealed),
            Err(ReadError::Decryption { index: 1 })
        ));
    }

    #[test]
    fn test_wrong_item_type_is_malformed() {
        let ctx = ctx();
        let draft: DraftDocument<String> = DraftDocument::from_items(["not a question".to_string()]);
        let (id, chunks) = draft.seal(&ctx, 1).unwrap().into_parts();

        let as_questions = FinalizedDocument::<Question>::from_parts(id, chunks).unwrap();
        assert!(matches!(
            read_sealed(&ctx, &as_questions),
            Err(ReadError::MalformedPayload { index: 0, .. })
        ));
    }

    #[test]
    fn test_empty_ciphertext_fails() {
        let ctx = ctx();
        let draft: DraftDocument = DraftDocument::from_items(questions(1));
        let (id, mut chunks) = draft.seal(&ctx, 1).unwrap().into_parts();
        chunks[0].cipher_text = Bytes::new();
        let sealed = FinalizedDocument::<Question>::from_parts(id, chunks).unwrap();

        assert!(read_sealed(&ctx, &sealed).is_err());
    }
}
