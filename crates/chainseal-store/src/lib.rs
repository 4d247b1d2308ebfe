//! # Chainseal Store
//!
//! Persistence for sealed documents. A sealed document is stored as its
//! ordered chunk chain behind the [`ChunkStore`] trait.
//!
//! ## Key Types
//!
//! - [`ChunkStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertResult`] - Result of inserting a chain
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chainseal_store::{ChunkStoreExt, SqliteStore};
//! # use chainseal_core::FinalizedDocument;
//!
//! async fn example(doc: &FinalizedDocument) {
//!     let store = SqliteStore::open("chainseal.db").unwrap();
//!     store.save_sealed(doc).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Write-once**: a second insert for a document returns `AlreadySealed`
//!   and leaves the stored chain untouched
//! - **Atomic**: a chain is stored in one transaction, never partially
//! - **Opaque**: the store never decrypts or verifies chunks

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ChunkStore, ChunkStoreExt, InsertResult};
