//! Infrastructure layer of the casting store.
//!
//! Storage media, the versioned state codec, load-time retention, config
//! loading and the in-process casting backend.

pub mod backend;
pub mod codec;
pub mod config_service;
pub mod dto;
pub mod paths;
pub mod persistence;
pub mod storage;
pub mod yaml;

pub use backend::InMemoryCastingBackend;
pub use codec::StateCodec;
pub use config_service::ConfigService;
pub use paths::StsPaths;
pub use persistence::{PersistenceLayer, RetentionPolicy};
pub use storage::{FileKeyValueStorage, InMemoryKeyValueStorage};
