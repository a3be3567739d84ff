// In-memory Indexer Implementation

use arbitrator_core::domain::{meta_namespace_key, Resource};
use arbitrator_core::port::{
    namespace_index_func, IndexError, IndexFunc, Indexer, NAMESPACE_INDEX,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Named index functions
pub type Indexers<K> = HashMap<String, IndexFunc<K>>;

/// indexed value -> keys of the objects carrying it
type Index = HashMap<String, BTreeSet<String>>;

struct State<K> {
    items: BTreeMap<String, Arc<K>>,
    indexers: Indexers<K>,
    indices: HashMap<String, Index>,
}

impl<K> State<K> {
    /// Indexed values of `obj` for every registered index
    fn index_values(&self, obj: &K) -> Result<Vec<(String, Vec<String>)>, IndexError> {
        self.indexers
            .iter()
            .map(|(name, func)| Ok((name.clone(), func(obj)?)))
            .collect()
    }

    fn unindex(&mut self, key: &str, old: &K) {
        // Index functions are pure; recomputing yields the values stored at insert time.
        let Ok(values) = self.index_values(old) else {
            for index in self.indices.values_mut() {
                index.retain(|_, keys| {
                    keys.remove(key);
                    !keys.is_empty()
                });
            }
            return;
        };

        for (name, indexed) in values {
            let Some(index) = self.indices.get_mut(&name) else {
                continue;
            };
            for value in indexed {
                if let Some(keys) = index.get_mut(&value) {
                    keys.remove(key);
                    if keys.is_empty() {
                        index.remove(&value);
                    }
                }
            }
        }
    }

    fn store(&mut self, key: String, obj: Arc<K>, values: Vec<(String, Vec<String>)>) {
        if let Some(old) = self.items.remove(&key) {
            self.unindex(&key, &old);
        }
        for (name, indexed) in values {
            let index = self.indices.entry(name).or_default();
            for value in indexed {
                index.entry(value).or_default().insert(key.clone());
            }
        }
        self.items.insert(key, obj);
    }
}

/// Thread-safe object cache keyed by `namespace/name`
///
/// Readers share the lock; mutations take it exclusively. Enumeration is in
/// key order.
pub struct MemoryIndexer<K> {
    state: RwLock<State<K>>,
}

impl<K: Resource> Default for MemoryIndexer<K> {
    fn default() -> Self {
        Self::new(Indexers::new())
    }
}

impl<K: Resource> MemoryIndexer<K> {
    pub fn new(indexers: Indexers<K>) -> Self {
        Self {
            state: RwLock::new(State {
                items: BTreeMap::new(),
                indexers,
                indices: HashMap::new(),
            }),
        }
    }

    /// Indexer with the namespace index registered
    pub fn with_namespace_index() -> Self {
        let mut indexers = Indexers::new();
        indexers.insert(NAMESPACE_INDEX.to_string(), namespace_index_func::<K>());
        Self::new(indexers)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State<K>>, IndexError> {
        self.state.read().map_err(|_| IndexError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State<K>>, IndexError> {
        self.state.write().map_err(|_| IndexError::Poisoned)
    }

    /// Register more index functions; only allowed while the cache is empty
    pub fn add_indexers(&self, new_indexers: Indexers<K>) -> Result<(), IndexError> {
        let mut state = self.write()?;
        if !state.items.is_empty() {
            return Err(IndexError::Populated);
        }
        if let Some(name) = new_indexers
            .keys()
            .find(|name| state.indexers.contains_key(*name))
        {
            return Err(IndexError::Conflict(name.clone()));
        }
        state.indexers.extend(new_indexers);
        Ok(())
    }

    /// Insert or replace an object
    ///
    /// Index values are computed before anything changes, so a failing index
    /// function leaves the cache untouched.
    pub fn add(&self, obj: impl Into<Arc<K>>) -> Result<(), IndexError> {
        let obj = obj.into();
        let key = meta_namespace_key(obj.as_ref());
        let mut state = self.write()?;
        let values = state.index_values(&obj)?;
        state.store(key.clone(), obj, values);
        debug!(key = %key, "Stored object");
        Ok(())
    }

    pub fn update(&self, obj: impl Into<Arc<K>>) -> Result<(), IndexError> {
        self.add(obj)
    }

    /// Remove the object stored under `obj`'s key, if any
    pub fn delete(&self, obj: &K) -> Result<(), IndexError> {
        self.delete_key(&meta_namespace_key(obj))
    }

    pub fn delete_key(&self, key: &str) -> Result<(), IndexError> {
        let mut state = self.write()?;
        if let Some(old) = state.items.remove(key) {
            state.unindex(key, &old);
            debug!(key = %key, "Deleted object");
        }
        Ok(())
    }

    /// Replace the whole content of the cache
    pub fn replace<I>(&self, objs: I) -> Result<(), IndexError>
    where
        I: IntoIterator,
        I::Item: Into<Arc<K>>,
    {
        let mut state = self.write()?;

        let mut staged = Vec::new();
        for obj in objs {
            let obj: Arc<K> = obj.into();
            let values = state.index_values(&obj)?;
            staged.push((meta_namespace_key(obj.as_ref()), obj, values));
        }

        state.items.clear();
        state.indices.clear();
        let count = staged.len();
        for (key, obj, values) in staged {
            state.store(key, obj, values);
        }
        debug!(count = count, "Replaced cache content");
        Ok(())
    }

    /// Object stored under the same key as `obj`
    pub fn get(&self, obj: &K) -> Result<Option<Arc<K>>, IndexError> {
        self.get_by_key(&meta_namespace_key(obj))
    }

    /// Keys of the objects whose `index_name` index contains `indexed_value`
    pub fn index_keys(
        &self,
        index_name: &str,
        indexed_value: &str,
    ) -> Result<Vec<String>, IndexError> {
        let state = self.read()?;
        if !state.indexers.contains_key(index_name) {
            return Err(IndexError::UnknownIndex(index_name.to_string()));
        }
        Ok(state
            .indices
            .get(index_name)
            .and_then(|index| index.get(indexed_value))
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Distinct values currently present in the `index_name` index
    pub fn list_indexed_values(&self, index_name: &str) -> Result<Vec<String>, IndexError> {
        let state = self.read()?;
        let mut values: Vec<String> = state
            .indices
            .get(index_name)
            .map(|index| index.keys().cloned().collect())
            .unwrap_or_default();
        values.sort();
        Ok(values)
    }

    pub fn len(&self) -> Result<usize, IndexError> {
        Ok(self.read()?.items.len())
    }

    pub fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.read()?.items.is_empty())
    }
}

impl<K: Resource> Indexer<K> for MemoryIndexer<K> {
    fn list(&self) -> Result<Vec<Arc<K>>, IndexError> {
        Ok(self.read()?.items.values().cloned().collect())
    }

    fn list_keys(&self) -> Result<Vec<String>, IndexError> {
        Ok(self.read()?.items.keys().cloned().collect())
    }

    fn get_by_key(&self, key: &str) -> Result<Option<Arc<K>>, IndexError> {
        Ok(self.read()?.items.get(key).cloned())
    }

    fn by_index(&self, index_name: &str, indexed_value: &str) -> Result<Vec<Arc<K>>, IndexError> {
        let state = self.read()?;
        if !state.indexers.contains_key(index_name) {
            return Err(IndexError::UnknownIndex(index_name.to_string()));
        }
        let Some(keys) = state
            .indices
            .get(index_name)
            .and_then(|index| index.get(indexed_value))
        else {
            return Ok(Vec::new());
        };
        Ok(keys
            .iter()
            .filter_map(|key| state.items.get(key).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbitrator_core::domain::Queue;

    fn tier_index() -> Indexers<Queue> {
        let func: IndexFunc<Queue> = Arc::new(|q: &Queue| -> Result<Vec<String>, IndexError> {
            Ok(q.metadata.labels.get("tier").cloned().into_iter().collect())
        });
        Indexers::from([("tier".to_string(), func)])
    }

    fn names(queues: &[Arc<Queue>]) -> Vec<&str> {
        queues.iter().map(|q| q.name()).collect()
    }

    #[test]
    fn test_add_and_get() {
        let indexer = MemoryIndexer::<Queue>::with_namespace_index();
        indexer.add(Queue::new("ns1", "q1", 1)).unwrap();

        let found = indexer.get_by_key("ns1/q1").unwrap().unwrap();
        assert_eq!(found.name(), "q1");
        assert!(indexer.get_by_key("ns1/q2").unwrap().is_none());
        assert!(indexer.get(&Queue::new("ns1", "q1", 0)).unwrap().is_some());
        assert_eq!(indexer.len().unwrap(), 1);
    }

    #[test]
    fn test_empty_namespace_key() {
        let indexer = MemoryIndexer::<Queue>::default();
        indexer.add(Queue::new("", "cluster-q", 1)).unwrap();
        assert_eq!(indexer.list_keys().unwrap(), vec!["/cluster-q"]);
    }

    #[test]
    fn test_list_in_key_order() {
        let indexer = MemoryIndexer::<Queue>::with_namespace_index();
        indexer.add(Queue::new("ns2", "b", 1)).unwrap();
        indexer.add(Queue::new("ns1", "z", 1)).unwrap();
        indexer.add(Queue::new("ns1", "a", 1)).unwrap();

        assert_eq!(
            indexer.list_keys().unwrap(),
            vec!["ns1/a", "ns1/z", "ns2/b"]
        );
        assert_eq!(names(&indexer.list().unwrap()), vec!["a", "z", "b"]);
    }

    #[test]
    fn test_namespace_index() {
        let indexer = MemoryIndexer::<Queue>::with_namespace_index();
        indexer.add(Queue::new("ns1", "q1", 1)).unwrap();
        indexer.add(Queue::new("ns1", "q3", 1)).unwrap();
        indexer.add(Queue::new("ns2", "q2", 1)).unwrap();

        assert_eq!(
            names(&indexer.by_index(NAMESPACE_INDEX, "ns1").unwrap()),
            vec!["q1", "q3"]
        );
        assert!(indexer.by_index(NAMESPACE_INDEX, "ns3").unwrap().is_empty());
        assert_eq!(
            indexer.list_indexed_values(NAMESPACE_INDEX).unwrap(),
            vec!["ns1", "ns2"]
        );
    }

    #[test]
    fn test_unknown_index() {
        let indexer = MemoryIndexer::<Queue>::default();
        indexer.add(Queue::new("ns1", "q1", 1)).unwrap();

        assert_eq!(
            indexer.by_index(NAMESPACE_INDEX, "ns1").unwrap_err(),
            IndexError::UnknownIndex(NAMESPACE_INDEX.to_string())
        );
        assert!(indexer.index_keys("tier", "gold").is_err());
    }

    #[test]
    fn test_update_reindexes() {
        let indexer = MemoryIndexer::new(tier_index());
        indexer
            .add(Queue::new("ns1", "q1", 1).with_label("tier", "gold"))
            .unwrap();
        assert_eq!(indexer.index_keys("tier", "gold").unwrap(), vec!["ns1/q1"]);

        indexer
            .update(Queue::new("ns1", "q1", 5).with_label("tier", "silver"))
            .unwrap();

        assert!(indexer.index_keys("tier", "gold").unwrap().is_empty());
        assert_eq!(indexer.index_keys("tier", "silver").unwrap(), vec!["ns1/q1"]);
        assert_eq!(indexer.get_by_key("ns1/q1").unwrap().unwrap().spec.weight, 5);
        assert_eq!(indexer.list_indexed_values("tier").unwrap(), vec!["silver"]);
    }

    #[test]
    fn test_delete() {
        let indexer = MemoryIndexer::<Queue>::with_namespace_index();
        let queue = Queue::new("ns1", "q1", 1);
        indexer.add(queue.clone()).unwrap();
        indexer.delete(&queue).unwrap();

        assert!(indexer.is_empty().unwrap());
        assert!(indexer.by_index(NAMESPACE_INDEX, "ns1").unwrap().is_empty());

        // deleting an absent key is a no-op
        indexer.delete_key("ns1/q1").unwrap();
    }

    #[test]
    fn test_replace() {
        let indexer = MemoryIndexer::<Queue>::with_namespace_index();
        indexer.add(Queue::new("old", "gone", 1)).unwrap();

        indexer
            .replace(vec![Queue::new("ns1", "q1", 1), Queue::new("ns2", "q2", 1)])
            .unwrap();

        assert_eq!(indexer.list_keys().unwrap(), vec!["ns1/q1", "ns2/q2"]);
        assert!(indexer.by_index(NAMESPACE_INDEX, "old").unwrap().is_empty());
    }

    #[test]
    fn test_add_indexers() {
        let indexer = MemoryIndexer::<Queue>::with_namespace_index();
        indexer.add_indexers(tier_index()).unwrap();

        let mut dup = Indexers::new();
        dup.insert(NAMESPACE_INDEX.to_string(), namespace_index_func::<Queue>());
        assert_eq!(
            indexer.add_indexers(dup).unwrap_err(),
            IndexError::Conflict(NAMESPACE_INDEX.to_string())
        );

        indexer.add(Queue::new("ns1", "q1", 1)).unwrap();
        let late = Indexers::from([("late".to_string(), namespace_index_func::<Queue>())]);
        assert_eq!(indexer.add_indexers(late).unwrap_err(), IndexError::Populated);
    }

    #[test]
    fn test_failing_index_func_leaves_cache_untouched() {
        let func: IndexFunc<Queue> = Arc::new(|q: &Queue| -> Result<Vec<String>, IndexError> {
            if q.spec.weight < 0 {
                Err(IndexError::IndexFunc {
                    index: "weight".to_string(),
                    reason: "negative weight".to_string(),
                })
            } else {
                Ok(vec![q.spec.weight.to_string()])
            }
        });
        let indexer = MemoryIndexer::new(Indexers::from([("weight".to_string(), func)]));
        indexer.add(Queue::new("ns1", "q1", 1)).unwrap();

        assert!(indexer.add(Queue::new("ns1", "q1", -1)).is_err());
        assert_eq!(indexer.get_by_key("ns1/q1").unwrap().unwrap().spec.weight, 1);
        assert_eq!(indexer.index_keys("weight", "1").unwrap(), vec!["ns1/q1"]);
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let indexer = Arc::new(MemoryIndexer::<Queue>::with_namespace_index());

        let writer = {
            let indexer = Arc::clone(&indexer);
            std::thread::spawn(move || {
                for i in 0..200 {
                    indexer.add(Queue::new("ns1", format!("q{i}"), 1)).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let indexer = Arc::clone(&indexer);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let all = indexer.list().unwrap();
                        let by_ns = indexer.by_index(NAMESPACE_INDEX, "ns1").unwrap();
                        assert!(all.iter().all(|q| q.namespace() == "ns1"));
                        assert!(by_ns.len() <= 200);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(indexer.len().unwrap(), 200);
    }
}
