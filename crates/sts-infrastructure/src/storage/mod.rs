//! Durable key-value storage implementations.

mod atomic_file;
mod file_kv;
mod memory;

pub use atomic_file::{AtomicFileError, AtomicTextFile};
pub use file_kv::FileKeyValueStorage;
pub use memory::InMemoryKeyValueStorage;
