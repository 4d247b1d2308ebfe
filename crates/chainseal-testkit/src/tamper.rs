//! Out-of-band corruption of sealed documents.
//!
//! These helpers reproduce the tampering shapes the verifier must catch.
//! They rebuild the document through `into_parts`/`from_parts`, which is
//! the only way to alter a sealed chain; nothing here is reachable from
//! production code.

use bytes::Bytes;
use chainseal_core::{Chunk, ChunkHash, Document, FinalizedDocument, PrevHash};

/// Mutate one chunk's ciphertext in place.
///
/// `hash`, `prevHash`, `iv` and `index` are never touched. The mutation
/// sees a fixed-size slice, so the length cannot change. Panics if `index`
/// is out of range or if the mutation leaves every byte unchanged.
pub fn corrupt<T, F>(doc: FinalizedDocument<T>, index: usize, mutate: F) -> FinalizedDocument<T>
where
    F: FnOnce(&mut [u8]),
{
    rewrite_chunk(doc, index, |chunk| {
        let original = chunk.cipher_text.clone();
        let mut bytes = original.to_vec();
        mutate(&mut bytes);

        assert_ne!(
            bytes.as_slice(),
            &original[..],
            "corruption must change at least one byte"
        );
        chunk.cipher_text = Bytes::from(bytes);
    })
}

/// [`corrupt`] for a [`Document`]. Panics on a draft.
pub fn corrupt_document<T, F>(doc: Document<T>, index: usize, mutate: F) -> Document<T>
where
    F: FnOnce(&mut [u8]),
{
    match doc {
        Document::Finalized(sealed) => corrupt(sealed, index, mutate).into(),
        Document::Draft(_) => panic!("cannot corrupt a draft document"),
    }
}

/// The canonical mutation: XOR one byte with `0xff`.
///
/// `position` wraps around the ciphertext length. Panics on an empty
/// ciphertext.
pub fn flip_byte(position: usize) -> impl FnOnce(&mut [u8]) {
    move |bytes: &mut [u8]| {
        assert!(!bytes.is_empty(), "cannot flip a byte of an empty ciphertext");
        let len = bytes.len();
        bytes[position % len] ^= 0xff;
    }
}

/// Replace a chunk's stored hash, leaving ciphertext and `prevHash` intact.
pub fn tamper_hash<T>(doc: FinalizedDocument<T>, index: usize) -> FinalizedDocument<T> {
    rewrite_chunk(doc, index, |chunk| {
        let mut bytes = *chunk.hash.as_bytes();
        bytes[0] ^= 0x01;
        chunk.hash = ChunkHash::from_bytes(bytes);
    })
}

/// Replace a chunk's stored `prevHash` with `prev`.
pub fn tamper_prev_hash<T>(
    doc: FinalizedDocument<T>,
    index: usize,
    prev: PrevHash,
) -> FinalizedDocument<T> {
    rewrite_chunk(doc, index, |chunk| {
        assert_ne!(chunk.prev_hash, prev, "tampered prevHash must differ");
        chunk.prev_hash = prev;
    })
}

/// Apply `f` to one chunk and reassemble the document.
pub fn rewrite_chunk<T, F>(doc: FinalizedDocument<T>, index: usize, f: F) -> FinalizedDocument<T>
where
    F: FnOnce(&mut Chunk),
{
    let (id, mut chunks) = doc.into_parts();
    let len = chunks.len();
    let chunk = chunks
        .get_mut(index)
        .unwrap_or_else(|| panic!("chunk {} out of range (len {})", index, len));
    f(chunk);
    FinalizedDocument::from_parts(id, chunks).expect("chain is still non-empty")
}

/// Apply `f` to the whole chunk list (reorder, drop, duplicate).
pub fn rewrite_chain<T, F>(doc: FinalizedDocument<T>, f: F) -> FinalizedDocument<T>
where
    F: FnOnce(&mut Vec<Chunk>),
{
    let (id, mut chunks) = doc.into_parts();
    f(&mut chunks);
    FinalizedDocument::from_parts(id, chunks).expect("rewritten chain must stay non-empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestFixture;

    #[test]
    fn test_corrupt_touches_only_cipher_text() {
        let fixture = TestFixture::new();
        let doc = fixture.sealed(6, 3);
        let before = doc.chunks().to_vec();

        let after = corrupt(doc, 1, flip_byte(0));
        let after = after.chunks();

        assert_eq!(before[0], after[0]);
        assert_eq!(before[2], after[2]);
        assert_eq!(before[1].hash, after[1].hash);
        assert_eq!(before[1].prev_hash, after[1].prev_hash);
        assert_eq!(before[1].iv, after[1].iv);
        assert_eq!(before[1].cipher_text.len(), after[1].cipher_text.len());
        assert_ne!(before[1].cipher_text, after[1].cipher_text);
    }

    #[test]
    #[should_panic(expected = "change at least one byte")]
    fn test_corrupt_rejects_noop() {
        let fixture = TestFixture::new();
        let doc = fixture.sealed(2, 1);
        let _ = corrupt(doc, 0, |_| {});
    }

    #[test]
    #[should_panic(expected = "empty ciphertext")]
    fn test_flip_byte_rejects_empty() {
        let mut empty: [u8; 0] = [];
        flip_byte(3)(&mut empty[..]);
    }

    #[test]
    fn test_flip_byte_wraps_position() {
        let mut bytes = [0u8; 4];
        flip_byte(6)(&mut bytes[..]);
        assert_eq!(bytes, [0, 0, 0xff, 0]);
    }

    #[test]
    fn test_rewrite_chain_drops_chunk() {
        let fixture = TestFixture::new();
        let doc = fixture.sealed(6, 3);
        let before = doc.chunks().to_vec();

        let after = rewrite_chain(doc, |chunks| {
            chunks.remove(1);
        });
        assert_eq!(after.chunks(), &[before[0].clone(), before[2].clone()][..]);
    }

    #[test]
    #[should_panic(expected = "cannot corrupt a draft")]
    fn test_corrupt_document_rejects_draft() {
        let fixture = TestFixture::new();
        let _ = corrupt_document(Document::from(fixture.draft(2)), 0, flip_byte(0));
    }

    #[test]
    fn test_tamper_hash_changes_only_hash() {
        let fixture = TestFixture::new();
        let doc = fixture.sealed(4, 2);
        let before = doc.chunks()[0].clone();

        let after = tamper_hash(doc, 0);
        let after = &after.chunks()[0];
        assert_ne!(before.hash, after.hash);
        assert_eq!(before.cipher_text, after.cipher_text);
    }
}
