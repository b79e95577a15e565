//! pingu-store — persisted check history for pingu.
//!
//! Each monitored URL owns one JSON document holding its current episode and
//! the archived ones. Documents are addressed by a store id: the SHA-256 of
//! the URL, or an explicit name chosen by the user.
//!
//! # Architecture
//!
//! ```text
//! HistoryStore
//!   ├── History (in memory, folded by save())
//!   └── Backend
//!       ├── FileBackend   pingu-{store-id}-log.json, temp file + rename
//!       └── MemoryBackend shared map, for tests
//! ```
//!
//! The store assumes a single writer per URL. Nothing here locks the file.

pub mod backend;
pub mod error;
pub mod key;
pub mod store;

pub use backend::{Backend, FileBackend, MemoryBackend};
pub use error::{StoreError, StoreResult};
pub use key::{file_name, store_id};
pub use store::HistoryStore;
