//! Implementations of the casting backend contract.

mod in_memory;

pub use in_memory::InMemoryCastingBackend;
