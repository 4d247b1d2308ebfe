//! Property tests over arbitrary documents, keys and part counts.

use proptest::prelude::*;

use chainseal_core::{
    read, read_sealed, verify, CryptoContext, Document, DraftDocument, EncryptionKey,
    FailureReason, FinalizeError, PrevHash, Verdict,
};
use chainseal_testkit::generators::{chunk_hash, encryption_key, questions, SealParams};
use chainseal_testkit::{
    corrupt, flip_byte, rewrite_chain, rewrite_chunk, tamper_hash, tamper_prev_hash,
};

fn seal(params: &SealParams) -> (CryptoContext, chainseal_core::FinalizedDocument) {
    let ctx = CryptoContext::new(EncryptionKey::from_bytes(params.key));
    let sealed = DraftDocument::from_items(params.items.clone())
        .seal(&ctx, params.parts)
        .unwrap();
    (ctx, sealed)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn round_trip_preserves_items_and_order(params: SealParams) {
        let (ctx, sealed) = seal(&params);
        prop_assert_eq!(read_sealed(&ctx, &sealed).unwrap(), params.items);
    }

    #[test]
    fn chunk_count_is_min_of_parts_and_items(params: SealParams) {
        let (_, sealed) = seal(&params);
        prop_assert_eq!(sealed.chunk_count(), params.parts.min(params.items.len()));
    }

    #[test]
    fn first_chunk_is_genesis(params: SealParams) {
        let (_, sealed) = seal(&params);
        prop_assert!(sealed.chunks()[0].prev_hash.is_genesis());
        for (i, chunk) in sealed.chunks().iter().enumerate() {
            prop_assert_eq!(chunk.index as usize, i);
        }
    }

    #[test]
    fn untampered_documents_verify(params: SealParams) {
        let (ctx, sealed) = seal(&params);
        let report = verify(&ctx, &sealed);
        prop_assert_eq!(report.status, Verdict::Valid);
        prop_assert_eq!(report.per_chunk.len(), sealed.chunk_count());
    }

    #[test]
    fn second_finalize_is_rejected(params: SealParams) {
        let (ctx, _) = seal(&params);
        let mut doc: Document = DraftDocument::from_items(params.items.clone()).into();
        doc.finalize(&ctx, params.parts).unwrap();
        let chunks = doc.chunks().to_vec();

        let err = doc.finalize(&ctx, params.parts).unwrap_err();
        prop_assert!(matches!(err, FinalizeError::AlreadyFinalized));
        prop_assert_eq!(doc.chunks(), chunks.as_slice());
        prop_assert_eq!(read(&ctx, &doc).unwrap(), params.items);
    }

    #[test]
    fn cipher_text_tamper_is_localized(
        key in any::<[u8; 32]>(),
        items in questions(24),
        parts in 2usize..=8,
        target in any::<prop::sample::Index>(),
        position in any::<usize>(),
    ) {
        prop_assume!(items.len() >= 2);
        let params = SealParams { key, items, parts };
        let (ctx, sealed) = seal(&params);

        let k = target.index(sealed.chunk_count());
        let tampered = corrupt(sealed, k, flip_byte(position));
        let report = verify(&ctx, &tampered);

        prop_assert_eq!(report.status, Verdict::Compromised);
        prop_assert_eq!(report.compromised_indices(), vec![k]);
        for chunk in &report.per_chunk {
            prop_assert!(chunk.linkage.passed());
        }
        prop_assert!(matches!(
            report.per_chunk[k].content.reason(),
            Some(FailureReason::DecryptionFailed) | Some(FailureReason::HashMismatch)
        ));
    }

    #[test]
    fn hash_tamper_breaks_next_linkage(
        params: SealParams,
        target in any::<prop::sample::Index>(),
    ) {
        let (ctx, sealed) = seal(&params);
        prop_assume!(sealed.chunk_count() >= 2);

        let k = target.index(sealed.chunk_count() - 1);
        let report = verify(&ctx, &tamper_hash(sealed, k));

        prop_assert_eq!(report.per_chunk[k].content.reason(), Some(FailureReason::HashMismatch));
        prop_assert!(report.per_chunk[k].linkage.passed());
        prop_assert_eq!(
            report.per_chunk[k + 1].linkage.reason(),
            Some(FailureReason::PrevHashMismatch)
        );
    }

    #[test]
    fn non_genesis_first_chunk_is_flagged(params: SealParams, fake in chunk_hash()) {
        let (ctx, sealed) = seal(&params);
        let fake = PrevHash::Chunk(fake);
        let report = verify(&ctx, &tamper_prev_hash(sealed, 0, fake));

        prop_assert_eq!(report.per_chunk[0].linkage.reason(), Some(FailureReason::InvalidGenesis));
        // prevHash is part of the hashed payload, so content no longer matches either.
        prop_assert_eq!(report.per_chunk[0].content.reason(), Some(FailureReason::HashMismatch));
    }

    #[test]
    fn wrong_key_fails_every_chunk(params: SealParams, other in encryption_key()) {
        prop_assume!(other.as_bytes() != &params.key);
        let (_, sealed) = seal(&params);
        let wrong = CryptoContext::new(other);

        let report = verify(&wrong, &sealed);
        for chunk in &report.per_chunk {
            prop_assert!(chunk.linkage.passed());
            prop_assert_eq!(chunk.content.reason(), Some(FailureReason::DecryptionFailed));
        }
        prop_assert!(read_sealed::<chainseal_core::Question>(&wrong, &sealed).is_err());
    }

    #[test]
    fn forged_index_is_localized(
        params: SealParams,
        target in any::<prop::sample::Index>(),
        forged in any::<u32>(),
    ) {
        let (ctx, sealed) = seal(&params);
        let k = target.index(sealed.chunk_count());
        prop_assume!(forged as usize != k);

        let report = verify(&ctx, &rewrite_chunk(sealed, k, |chunk| chunk.index = forged));
        prop_assert_eq!(report.compromised_indices(), vec![k]);
        prop_assert_eq!(report.per_chunk[k].linkage.reason(), Some(FailureReason::IndexMismatch));
        prop_assert!(report.per_chunk[k].content.passed());
    }

    #[test]
    fn dropped_chunk_breaks_next_link(
        params: SealParams,
        target in any::<prop::sample::Index>(),
    ) {
        let (ctx, sealed) = seal(&params);
        prop_assume!(sealed.chunk_count() >= 2);

        // Dropping the last chunk is the untrusted-tail case; skip it.
        let k = target.index(sealed.chunk_count() - 1);
        let report = verify(&ctx, &rewrite_chain(sealed, |chunks| {
            chunks.remove(k);
        }));

        // Every later chunk now sits one position before its stored index.
        let remaining = report.per_chunk.len();
        prop_assert_eq!(report.status, Verdict::Compromised);
        prop_assert_eq!(report.compromised_indices(), (k..remaining).collect::<Vec<_>>());
        for chunk in &report.per_chunk[k + 1..] {
            prop_assert_eq!(chunk.linkage.reason(), Some(FailureReason::IndexMismatch));
        }
        let expected = if k == 0 {
            FailureReason::InvalidGenesis
        } else {
            FailureReason::PrevHashMismatch
        };
        prop_assert_eq!(report.per_chunk[k].linkage.reason(), Some(expected));
    }

    #[test]
    fn swapped_neighbours_are_both_flagged(
        params: SealParams,
        target in any::<prop::sample::Index>(),
    ) {
        let (ctx, sealed) = seal(&params);
        prop_assume!(sealed.chunk_count() >= 2);

        let k = target.index(sealed.chunk_count() - 1);
        let report = verify(&ctx, &rewrite_chain(sealed, |chunks| chunks.swap(k, k + 1)));

        let compromised = report.compromised_indices();
        prop_assert!(compromised.contains(&k));
        prop_assert!(compromised.contains(&(k + 1)));
    }
}
