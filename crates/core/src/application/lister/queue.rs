// Queue Lister

use super::{Lister, NamespaceLister};
use crate::domain::Queue;
use crate::port::Indexer;
use std::sync::Arc;

/// Lists Queues across all namespaces
pub type QueueLister = Lister<Queue>;

/// Lists and gets Queues within one namespace
pub type QueueNamespaceLister = NamespaceLister<Queue>;

impl Lister<Queue> {
    /// Queues returns a lister that can list and get Queues in `namespace`
    pub fn queues(&self, namespace: impl Into<String>) -> QueueNamespaceLister {
        self.namespaced(namespace)
    }
}

/// Create a QueueLister over `indexer`
pub fn new_queue_lister(indexer: Arc<dyn Indexer<Queue>>) -> QueueLister {
    Lister::new(indexer)
}
