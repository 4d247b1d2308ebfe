//! # Chainseal Testkit
//!
//! Testing utilities for Chainseal.
//!
//! ## Overview
//!
//! - **Fixtures**: a known key, a memory store and sample questions
//! - **Tamper**: out-of-band corruption of sealed chains (`corrupt`,
//!   `flip_byte`, `tamper_hash`, `tamper_prev_hash`)
//! - **Generators**: proptest strategies for items, keys and part counts
//! - **Golden vectors**: exact canonical payload bytes
//!
//! ## Tamper localization
//!
//! ```rust
//! use chainseal_core::{verify, FailureReason};
//! use chainseal_testkit::{corrupt, flip_byte, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let doc = corrupt(fixture.sealed(7, 5), 2, flip_byte(0));
//!
//! let report = verify(&fixture.ctx, &doc);
//! assert_eq!(report.compromised_indices(), vec![2]);
//! assert_eq!(report.per_chunk[2].reason(), Some(FailureReason::DecryptionFailed));
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use chainseal_testkit::generators::SealParams;
//!
//! proptest! {
//!     #[test]
//!     fn sealed_documents_verify(params: SealParams) {
//!         // ...
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod tamper;
pub mod vectors;

pub use fixtures::{sample_questions, TestFixture, FIXTURE_KEY};
pub use generators::SealParams;
pub use tamper::{
    corrupt, corrupt_document, flip_byte, rewrite_chain, rewrite_chunk, tamper_hash,
    tamper_prev_hash,
};
pub use vectors::{all_vectors, payload_for_vector, verify_all_vectors, GoldenVector};
