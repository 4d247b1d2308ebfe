//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use chainseal_core::{
    CryptoContext, Document, DraftDocument, EncryptionKey, FinalizedDocument, Question,
};
use chainseal_store::MemoryStore;

/// Key used by [`TestFixture::new`].
pub const FIXTURE_KEY: [u8; 32] = [0x42; 32];

/// A crypto context with a known key and a memory store.
pub struct TestFixture {
    pub key: EncryptionKey,
    pub ctx: CryptoContext,
    pub store: MemoryStore,
}

impl TestFixture {
    /// Fixture with [`FIXTURE_KEY`].
    pub fn new() -> Self {
        Self::with_key(FIXTURE_KEY)
    }

    /// Fixture with a specific key.
    pub fn with_key(bytes: [u8; 32]) -> Self {
        let key = EncryptionKey::from_bytes(bytes);
        Self {
            ctx: CryptoContext::new(key.clone()),
            key,
            store: MemoryStore::new(),
        }
    }

    /// A draft holding `n` sample questions.
    pub fn draft(&self, n: usize) -> DraftDocument {
        DraftDocument::from_items(sample_questions(n))
    }

    /// Seal `n` sample questions into `parts` chunks.
    pub fn sealed(&self, n: usize, parts: usize) -> FinalizedDocument {
        self.draft(n)
            .seal(&self.ctx, parts)
            .expect("fixture documents are non-empty")
    }

    /// Same as [`sealed`](Self::sealed), wrapped as a [`Document`].
    pub fn finalized_document(&self, n: usize, parts: usize) -> Document {
        self.sealed(n, parts).into()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// `n` distinct questions with deterministic content.
pub fn sample_questions(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| {
            Question::new(
                format!("Question {}: what is {} + {}?", i + 1, i, i),
                [
                    format!("{}", 2 * i),
                    format!("{}", 2 * i + 1),
                    format!("{}", i),
                ],
                0,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainseal_core::read;

    #[test]
    fn test_fixture_round_trip() {
        let fixture = TestFixture::new();
        let doc = fixture.finalized_document(7, 5);

        assert_eq!(doc.chunks().len(), 5);
        assert_eq!(read(&fixture.ctx, &doc).unwrap(), sample_questions(7));
    }

    #[test]
    fn test_sample_questions_distinct() {
        let questions = sample_questions(10);
        for (i, a) in questions.iter().enumerate() {
            for b in &questions[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_fixtures_with_same_key_interoperate() {
        let writer = TestFixture::new();
        let reader = TestFixture::new();
        let doc = writer.finalized_document(3, 2);
        assert!(read(&reader.ctx, &doc).is_ok());
    }
}
