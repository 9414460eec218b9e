//! Hierarchical JSON document storage for lazyrest.
//!
//! Every document lives at a [`Key`] derived from a slash-separated request
//! path. Keys form a virtual tree: a key may hold a document, group other
//! documents, or both. Collections are never stored explicitly; they are the
//! documents exactly one segment below a key.
//!
//! # Storage Backends
//!
//! All backends implement the [`DocumentStore`] trait and behave identically
//! for the same sequence of operations:
//!
//! - [`InMemoryDocumentStore`] -- prefix tree behind a `RwLock`, for tests,
//!   embedding and ephemeral servers
//! - [`FsDocumentStore`] -- one `.json` file per document, one directory per
//!   branch
//!
//! # Design Rules
//!
//! 1. Key normalization is pure and never fails.
//! 2. Callers receive copies of documents, never references into the store.
//! 3. Mutations are serialized against readers within one store instance.
//! 4. Child enumeration returns immediate children only.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod key;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsDocumentStore;
pub use key::{is_valid_segment, to_collection_key, to_resource_key, Key, SEPARATOR};
pub use memory::InMemoryDocumentStore;
pub use traits::DocumentStore;

/// A stored JSON value. Objects keep their field order.
pub type Document = serde_json::Value;
