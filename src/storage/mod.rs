pub mod profile;
pub mod store;

pub use profile::ProfileStore;
pub use store::{FileStore, KeyValueStore, MemoryStore, StorageKey};
