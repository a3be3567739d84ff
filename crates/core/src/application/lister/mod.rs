// Typed read-only listers over an Indexer

pub mod queue;


pub use queue::{QueueLister, QueueNamespaceLister};

use super::cache::{list_all, list_all_by_namespace};
use crate::domain::{namespace_key, Resource, Selector};
use crate::error::{AppError, Result};
use crate::port::Indexer;
use std::sync::Arc;

/// Lists resources of kind `K` across all namespaces
///
/// The lister holds a shared handle to an externally populated indexer and
/// never mutates it.
pub struct Lister<K> {
    indexer: Arc<dyn Indexer<K>>,
}

impl<K> Clone for Lister<K> {
    fn clone(&self) -> Self {
        Self {
            indexer: Arc::clone(&self.indexer),
        }
    }
}

impl<K: Resource> Lister<K> {
    pub fn new(indexer: Arc<dyn Indexer<K>>) -> Self {
        Self { indexer }
    }

    /// List all objects in the indexer that match `selector`
    pub fn list(&self, selector: &Selector) -> Result<Vec<Arc<K>>> {
        let mut ret = Vec::new();
        list_all(self.indexer.as_ref(), selector, |obj| ret.push(obj))?;
        Ok(ret)
    }

    /// Lister restricted to one namespace (no validation of `namespace`)
    pub fn namespaced(&self, namespace: impl Into<String>) -> NamespaceLister<K> {
        NamespaceLister {
            indexer: Arc::clone(&self.indexer),
            namespace: namespace.into(),
        }
    }
}

/// Lists and gets resources of kind `K` within one namespace
pub struct NamespaceLister<K> {
    indexer: Arc<dyn Indexer<K>>,
    namespace: String,
}

impl<K> Clone for NamespaceLister<K> {
    fn clone(&self) -> Self {
        Self {
            indexer: Arc::clone(&self.indexer),
            namespace: self.namespace.clone(),
        }
    }
}

impl<K: Resource> NamespaceLister<K> {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// List all objects in this namespace that match `selector`
    pub fn list(&self, selector: &Selector) -> Result<Vec<Arc<K>>> {
        let mut ret = Vec::new();
        list_all_by_namespace(self.indexer.as_ref(), &self.namespace, selector, |obj| {
            ret.push(obj)
        })?;
        Ok(ret)
    }

    /// Get the object stored under `namespace/name`
    ///
    /// A cache miss becomes `AppError::NotFound`; indexer failures are
    /// returned as `AppError::Index`.
    pub fn get(&self, name: &str) -> Result<Arc<K>> {
        self.indexer
            .get_by_key(&namespace_key(&self.namespace, name))?
            .ok_or_else(|| AppError::not_found(K::group_resource(), name))
    }
}
