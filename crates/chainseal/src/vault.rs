//! The Vault: drafts in memory, sealed chains in a [`ChunkStore`].
//!
//! The vault owns the process-wide [`CryptoContext`] and is the only
//! writer of sealed chains. Finalization runs under one async mutex so
//! the draft check and the state flip cannot interleave with another
//! finalize or edit.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use chainseal_core::{
    read_sealed, verify_stored, CryptoContext, Document, DocumentId, DraftDocument,
    FinalizeError, FinalizedDocument, Question, ReadError, VerificationReport,
};
use chainseal_store::{ChunkStore, ChunkStoreExt, InsertResult};

use crate::config::SealConfig;
use crate::error::{Result, SealError};

/// Outcome of the external access-control check for a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied,
}

impl From<bool> for AccessDecision {
    fn from(allowed: bool) -> Self {
        if allowed {
            AccessDecision::Allowed
        } else {
            AccessDecision::Denied
        }
    }
}

/// Drafts plus sealed storage behind one key.
pub struct Vault<S, T = Question> {
    ctx: CryptoContext,
    part_count: NonZeroUsize,
    store: S,
    drafts: Mutex<HashMap<DocumentId, DraftDocument<T>>>,
}

impl<S, T> Vault<S, T>
where
    S: ChunkStore,
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create a vault from loaded configuration.
    pub fn new(config: &SealConfig, store: S) -> Self {
        Self {
            ctx: config.crypto_context(),
            part_count: config.part_count,
            store,
            drafts: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The crypto context used for every seal, read and verify.
    pub fn crypto(&self) -> &CryptoContext {
        &self.ctx
    }

    /// Default part count from configuration.
    pub fn part_count(&self) -> NonZeroUsize {
        self.part_count
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Drafts
    // ─────────────────────────────────────────────────────────────────────────

    /// Start an empty draft.
    pub async fn create_draft(&self) -> DocumentId {
        self.insert_draft(DraftDocument::new()).await
    }

    /// Start a draft pre-filled with items.
    pub async fn create_draft_with(&self, items: impl IntoIterator<Item = T>) -> DocumentId {
        self.insert_draft(DraftDocument::from_items(items)).await
    }

    async fn insert_draft(&self, draft: DraftDocument<T>) -> DocumentId {
        let id = draft.id();
        self.drafts.lock().await.insert(id, draft);
        id
    }

    /// Mutate a draft in place.
    ///
    /// Sealed documents have no draft and return `AlreadyFinalized`.
    pub async fn edit_draft<F, R>(&self, id: &DocumentId, f: F) -> Result<R>
    where
        F: FnOnce(&mut DraftDocument<T>) -> R,
    {
        let mut drafts = self.drafts.lock().await;
        match drafts.get_mut(id) {
            Some(draft) => Ok(f(draft)),
            None => Err(self.missing_draft(id).await?),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Finalize
    // ─────────────────────────────────────────────────────────────────────────

    /// Seal a draft into `parts` chunks and persist the chain.
    ///
    /// On any error the draft is kept and nothing is stored.
    pub async fn finalize(&self, id: &DocumentId, parts: usize) -> Result<FinalizedDocument<T>> {
        let mut drafts = self.drafts.lock().await;

        let sealed = match drafts.get(id) {
            Some(draft) => draft.seal(&self.ctx, parts)?,
            None => return Err(self.missing_draft(id).await?),
        };

        match self.store.save_sealed(&sealed).await? {
            InsertResult::Inserted => {}
            InsertResult::AlreadySealed => {
                warn!(document = %id, "chain already stored, refusing to reseal");
                drafts.remove(id);
                return Err(FinalizeError::AlreadyFinalized.into());
            }
        }

        drafts.remove(id);
        info!(document = %id, chunks = sealed.chunk_count(), "document finalized");
        Ok(sealed)
    }

    /// Finalize with the configured part count.
    pub async fn finalize_default(&self, id: &DocumentId) -> Result<FinalizedDocument<T>> {
        self.finalize(id, self.part_count.get()).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Load a document in whichever state it is in.
    pub async fn load(&self, id: &DocumentId) -> Result<Document<T>> {
        if let Some(draft) = self.drafts.lock().await.get(id) {
            return Ok(Document::Draft(draft.clone()));
        }
        Ok(Document::Finalized(self.load_sealed(id).await?))
    }

    /// Decrypt a sealed document for a reader already checked by the
    /// access-control collaborator.
    pub async fn read(&self, id: &DocumentId, decision: AccessDecision) -> Result<Vec<T>> {
        if decision == AccessDecision::Denied {
            warn!(document = %id, "read denied");
            return Err(SealError::NotAuthorized(*id));
        }

        let sealed = self.load_sealed(id).await?;
        Ok(read_sealed(&self.ctx, &sealed)?)
    }

    /// Produce an integrity report for a sealed document.
    ///
    /// Runs on the chain as stored, so damaged fields show up in the
    /// report of the chunk that holds them.
    pub async fn verify(&self, id: &DocumentId) -> Result<VerificationReport> {
        match self.store.get_stored_chain(id).await? {
            Some(chunks) => Ok(verify_stored(&self.ctx, *id, &chunks)),
            None => Err(self.not_sealed(id).await),
        }
    }

    async fn load_sealed(&self, id: &DocumentId) -> Result<FinalizedDocument<T>> {
        match self.store.load_sealed(id).await? {
            Some(sealed) => Ok(sealed),
            None => Err(self.not_sealed(id).await),
        }
    }

    /// Error for an id with no stored chain: still a draft, or unknown.
    async fn not_sealed(&self, id: &DocumentId) -> SealError {
        if self.drafts.lock().await.contains_key(id) {
            ReadError::NotFinalized.into()
        } else {
            SealError::DocumentNotFound(*id)
        }
    }

    /// Error for an id with no draft: sealed or unknown.
    async fn missing_draft(&self, id: &DocumentId) -> Result<SealError> {
        if self.store.has_chain(id).await? {
            Ok(FinalizeError::AlreadyFinalized.into())
        } else {
            Ok(SealError::DocumentNotFound(*id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainseal_core::{EncryptionKey, FailureReason, Verdict};
    use chainseal_store::MemoryStore;

    fn vault() -> Vault<MemoryStore> {
        let config = SealConfig::new(EncryptionKey::from_bytes([3u8; 32]));
        Vault::new(&config, MemoryStore::new())
    }

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question::new(format!("question {}", i), ["a", "b", "c"], (i % 3) as u32))
            .collect()
    }

    #[tokio::test]
    async fn test_create_edit_finalize_read() {
        let vault = vault();
        let id = vault.create_draft().await;
        vault
            .edit_draft(&id, |draft| draft.extend(questions(7)))
            .await
            .unwrap();

        let sealed = vault.finalize(&id, 5).await.unwrap();
        assert_eq!(sealed.chunk_count(), 5);

        let items = vault.read(&id, AccessDecision::Allowed).await.unwrap();
        assert_eq!(items, questions(7));
    }

    #[tokio::test]
    async fn test_finalize_twice() {
        let vault = vault();
        let id = vault.create_draft_with(questions(3)).await;

        let first = vault.finalize(&id, 2).await.unwrap();
        let err = vault.finalize(&id, 2).await.unwrap_err();
        assert!(matches!(err, SealError::Finalize(FinalizeError::AlreadyFinalized)));

        let stored = vault.load(&id).await.unwrap();
        assert_eq!(stored.as_finalized(), Some(&first));
    }

    #[tokio::test]
    async fn test_empty_draft_stays_draft() {
        let vault = vault();
        let id = vault.create_draft().await;

        let err = vault.finalize_default(&id).await.unwrap_err();
        assert!(matches!(err, SealError::Finalize(FinalizeError::EmptyDocument)));

        let doc = vault.load(&id).await.unwrap();
        assert!(!doc.is_finalized());
        assert!(doc.chunks().is_empty());
        assert_eq!(vault.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_edit_after_finalize_rejected() {
        let vault = vault();
        let id = vault.create_draft_with(questions(2)).await;
        vault.finalize(&id, 1).await.unwrap();

        let err = vault
            .edit_draft(&id, |draft| draft.push(Question::new("late", ["x"], 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, SealError::Finalize(FinalizeError::AlreadyFinalized)));
    }

    #[tokio::test]
    async fn test_denied_read() {
        let vault = vault();
        let id = vault.create_draft_with(questions(2)).await;
        vault.finalize(&id, 2).await.unwrap();

        let err = vault.read(&id, AccessDecision::Denied).await.unwrap_err();
        assert!(matches!(err, SealError::NotAuthorized(denied) if denied == id));
    }

    #[tokio::test]
    async fn test_read_draft_not_finalized() {
        let vault = vault();
        let id = vault.create_draft_with(questions(2)).await;

        let err = vault.read(&id, AccessDecision::Allowed).await.unwrap_err();
        assert!(matches!(err, SealError::Read(ReadError::NotFinalized)));
    }

    #[tokio::test]
    async fn test_unknown_document() {
        let vault = vault();
        let id = DocumentId::generate();

        assert!(matches!(
            vault.verify(&id).await.unwrap_err(),
            SealError::DocumentNotFound(_)
        ));
        assert!(matches!(
            vault.finalize(&id, 1).await.unwrap_err(),
            SealError::DocumentNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_verify_draft_not_finalized() {
        let vault = vault();
        let id = vault.create_draft_with(questions(2)).await;

        let err = vault.verify(&id).await.unwrap_err();
        assert!(matches!(err, SealError::Read(ReadError::NotFinalized)));
    }

    #[tokio::test]
    async fn test_verify_fresh_document() {
        let vault = vault();
        let id = vault.create_draft_with(questions(7)).await;
        vault.finalize(&id, 5).await.unwrap();

        let report = vault.verify(&id).await.unwrap();
        assert_eq!(report.status, Verdict::Valid);
        assert_eq!(report.per_chunk.len(), 5);
    }

    #[tokio::test]
    async fn test_wrong_key_vault_reports_decryption_failures() {
        let store = MemoryStore::new();
        let writer: Vault<MemoryStore> = Vault::new(
            &SealConfig::new(EncryptionKey::from_bytes([1u8; 32])),
            store,
        );
        let id = writer.create_draft_with(questions(4)).await;
        let sealed = writer.finalize(&id, 2).await.unwrap();

        let other_store = MemoryStore::new();
        other_store.save_sealed(&sealed).await.unwrap();
        let reader: Vault<MemoryStore> = Vault::new(
            &SealConfig::new(EncryptionKey::from_bytes([2u8; 32])),
            other_store,
        );

        let err = reader.read(&id, AccessDecision::Allowed).await.unwrap_err();
        assert!(matches!(err, SealError::Read(ReadError::Decryption { index: 0 })));

        let report = reader.verify(&id).await.unwrap();
        assert_eq!(report.status, Verdict::Compromised);
        assert!(report
            .per_chunk
            .iter()
            .all(|c| c.linkage.passed() && c.reason() == Some(FailureReason::DecryptionFailed)));
    }
}
