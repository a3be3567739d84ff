// Kube Arbitrator Infrastructure - In-Memory Adapter
// Implements: Indexer (thread-safe, namespace-indexed object cache)

mod memory_indexer;

pub use memory_indexer::{Indexers, MemoryIndexer};
