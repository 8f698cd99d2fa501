pub mod alchemy;
pub mod config;
pub mod eip1193;
pub mod in_memory;
pub mod indexer;

pub use alchemy::AlchemyAdapter;
pub use config::{ConfigError, IndexerConfig, RuntimeProfile};
pub use eip1193::Eip1193Adapter;
pub use in_memory::InMemoryIndexer;
pub use indexer::IndexerAdapter;
