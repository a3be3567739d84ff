// Selector-filtered traversal over an Indexer

use crate::domain::{Resource, Selector};
use crate::error::Result;
use crate::port::{IndexError, Indexer, NAMESPACE_INDEX};
use std::sync::Arc;
use tracing::warn;

/// Visit every stored object that matches `selector`
///
/// Enumeration order is whatever the indexer returns. Indexer failures are
/// propagated unchanged and nothing is visited.
pub fn list_all<K, I, F>(indexer: &I, selector: &Selector, mut visit: F) -> Result<()>
where
    K: Resource,
    I: Indexer<K> + ?Sized,
    F: FnMut(Arc<K>),
{
    let items = indexer.list()?;

    if selector.is_empty() {
        items.into_iter().for_each(visit);
        return Ok(());
    }

    for obj in items {
        if selector.matches(&obj.meta().labels) {
            visit(obj);
        }
    }
    Ok(())
}

/// Visit every object stored in `namespace` that matches `selector`
///
/// The empty namespace selects objects stored under the empty-namespace
/// prefix only. Uses the namespace index when the indexer has one, otherwise
/// scans everything and filters by namespace.
pub fn list_all_by_namespace<K, I, F>(
    indexer: &I,
    namespace: &str,
    selector: &Selector,
    mut visit: F,
) -> Result<()>
where
    K: Resource,
    I: Indexer<K> + ?Sized,
    F: FnMut(Arc<K>),
{
    let items = match indexer.by_index(NAMESPACE_INDEX, namespace) {
        Ok(items) => items,
        Err(IndexError::UnknownIndex(_)) => {
            warn!(
                namespace = %namespace,
                resource = %K::group_resource(),
                "Namespace index missing, falling back to full scan"
            );
            indexer
                .list()?
                .into_iter()
                .filter(|obj| obj.meta().namespace == namespace)
                .collect()
        }
        Err(e) => return Err(e.into()),
    };

    if selector.is_empty() {
        items.into_iter().for_each(visit);
        return Ok(());
    }

    for obj in items {
        if selector.matches(&obj.meta().labels) {
            visit(obj);
        }
    }
    Ok(())
}
