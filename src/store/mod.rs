pub mod export;
pub mod kv;
pub mod schema;
pub mod stats;

pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use schema::{CharacterStat, StatsMap};
pub use stats::StatsStore;
