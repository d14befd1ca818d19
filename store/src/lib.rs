//! Storage abstractions for the Modulr wallet.
//!
//! The wallet persists exactly two kinds of data: the sealed vault envelope
//! (durable) and the session unlock entry (scoped to one process). Both go
//! through the [`KeyValueStore`] trait; the rest of the codebase depends only
//! on the traits.
//!
//! Backends:
//! - [`DirStore`]: one file per key under a directory (durable)
//! - [`MemoryStore`]: a process-local map, the natural session store

pub mod dir;
pub mod error;
pub mod kv;
pub mod memory;

pub use dir::DirStore;
pub use error::StoreError;
pub use kv::{KeyValueStore, SessionStore};
pub use memory::MemoryStore;
