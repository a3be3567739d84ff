// Port Layer - Interfaces for external dependencies

pub mod indexer;

// Re-exports
pub use indexer::{namespace_index_func, IndexError, IndexFunc, Indexer, NAMESPACE_INDEX};
