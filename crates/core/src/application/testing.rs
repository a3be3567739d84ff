// Test doubles for the Indexer port

use crate::domain::Queue;
use crate::port::{IndexError, Indexer};
use mockall::mock;
use std::sync::Arc;

mock! {
    pub QueueIndexer {}

    impl Indexer<Queue> for QueueIndexer {
        fn list(&self) -> Result<Vec<Arc<Queue>>, IndexError>;
        fn list_keys(&self) -> Result<Vec<String>, IndexError>;
        fn get_by_key(&self, key: &str) -> Result<Option<Arc<Queue>>, IndexError>;
        fn by_index(
            &self,
            index_name: &str,
            indexed_value: &str,
        ) -> Result<Vec<Arc<Queue>>, IndexError>;
    }
}

/// ns1/q1 (tier=gold), ns1/q3 (tier=silver), ns2/q2 (tier=gold)
pub fn sample_queues() -> Vec<Arc<Queue>> {
    vec![
        Arc::new(Queue::new("ns1", "q1", 1).with_label("tier", "gold")),
        Arc::new(Queue::new("ns1", "q3", 2).with_label("tier", "silver")),
        Arc::new(Queue::new("ns2", "q2", 1).with_label("tier", "gold")),
    ]
}

pub fn in_namespace(queues: &[Arc<Queue>], namespace: &str) -> Vec<Arc<Queue>> {
    queues
        .iter()
        .filter(|q| q.namespace() == namespace)
        .cloned()
        .collect()
}

pub fn names(queues: &[Arc<Queue>]) -> Vec<&str> {
    queues.iter().map(|q| q.name()).collect()
}
