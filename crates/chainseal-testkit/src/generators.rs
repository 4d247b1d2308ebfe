//! Proptest generators for property-based testing.

use proptest::prelude::*;

use chainseal_core::{ChunkHash, DocumentId, EncryptionKey, Question};

/// A random symmetric key.
pub fn encryption_key() -> impl Strategy<Value = EncryptionKey> {
    any::<[u8; 32]>().prop_map(EncryptionKey::from_bytes)
}

/// A random document ID.
pub fn document_id() -> impl Strategy<Value = DocumentId> {
    any::<[u8; 16]>().prop_map(DocumentId::from_bytes)
}

/// A random chunk hash.
pub fn chunk_hash() -> impl Strategy<Value = ChunkHash> {
    any::<[u8; 32]>().prop_map(ChunkHash::from_bytes)
}

/// A valid part count.
pub fn part_count() -> impl Strategy<Value = usize> {
    1usize..=12
}

/// A single question with arbitrary unicode text.
pub fn question() -> impl Strategy<Value = Question> {
    (
        "\\PC{0,40}",
        prop::collection::vec("\\PC{0,12}", 0..6),
        0u32..6,
    )
        .prop_map(|(text, options, correct)| Question::new(text, options, correct))
}

/// A non-empty question list of at most `max_len` items.
pub fn questions(max_len: usize) -> impl Strategy<Value = Vec<Question>> {
    prop::collection::vec(question(), 1..=max_len.max(1))
}

/// Parameters for sealing a document.
#[derive(Debug, Clone)]
pub struct SealParams {
    pub key: [u8; 32],
    pub items: Vec<Question>,
    pub parts: usize,
}

impl Arbitrary for SealParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (any::<[u8; 32]>(), questions(24), part_count())
            .prop_map(|(key, items, parts)| SealParams { key, items, parts })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainseal_core::{read_sealed, CryptoContext, DraftDocument};

    proptest! {
        #[test]
        fn test_params_always_sealable(params: SealParams) {
            let ctx = CryptoContext::new(EncryptionKey::from_bytes(params.key));
            let sealed = DraftDocument::from_items(params.items.clone())
                .seal(&ctx, params.parts)
                .unwrap();

            prop_assert!(sealed.chunk_count() <= params.parts);
            prop_assert_eq!(read_sealed(&ctx, &sealed).unwrap(), params.items);
        }

        #[test]
        fn test_document_id_hex_round_trip(id in document_id()) {
            prop_assert_eq!(DocumentId::from_hex(&id.to_hex()).unwrap(), id);
        }
    }
}
