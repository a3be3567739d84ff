// Indexer Port (Interface)

use crate::domain::Resource;
use std::sync::Arc;
use thiserror::Error;

/// Name of the index that groups objects by namespace
pub const NAMESPACE_INDEX: &str = "namespace";

/// Failures reported by an indexer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("indexer lock poisoned")]
    Poisoned,

    #[error("index with name {0} does not exist")]
    UnknownIndex(String),

    #[error("unable to calculate index {index}: {reason}")]
    IndexFunc { index: String, reason: String },

    #[error("indexer conflict: {0}")]
    Conflict(String),

    #[error("cannot add indexers to a populated index")]
    Populated,

    #[error("indexer backend error: {0}")]
    Backend(String),
}

/// Computes the indexed values of an object for one named index
pub type IndexFunc<K> = Arc<dyn Fn(&K) -> Result<Vec<String>, IndexError> + Send + Sync>;

/// Index function keyed on the object's namespace
pub fn namespace_index_func<K: Resource>() -> IndexFunc<K> {
    Arc::new(|obj: &K| -> Result<Vec<String>, IndexError> {
        Ok(vec![obj.meta().namespace.clone()])
    })
}

/// Read side of a client-side object cache keyed by `namespace/name`
///
/// Implementations must be safe for concurrent reads while another party
/// mutates the cache.
pub trait Indexer<K>: Send + Sync {
    /// All stored objects
    fn list(&self) -> Result<Vec<Arc<K>>, IndexError>;

    /// All stored keys
    fn list_keys(&self) -> Result<Vec<String>, IndexError>;

    /// Point lookup; `Ok(None)` when nothing is stored under `key`
    fn get_by_key(&self, key: &str) -> Result<Option<Arc<K>>, IndexError>;

    /// Objects whose `index_name` index contains `indexed_value`
    ///
    /// Fails with `IndexError::UnknownIndex` when the index is not registered.
    fn by_index(&self, index_name: &str, indexed_value: &str) -> Result<Vec<Arc<K>>, IndexError>;
}
