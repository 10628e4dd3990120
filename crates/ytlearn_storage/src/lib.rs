#![forbid(unsafe_code)]

pub mod config;
pub mod kv;
pub mod repo;

pub use config::StoreConfig;
pub use kv::{
    FileKvBackend, KvBackend, KvError, KvStore, MemoryKvBackend, StorageChange, StorageChangeKind,
};
pub use repo::{CreationRepository, LocalCreationRepo};
