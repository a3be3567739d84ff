// Application Layer - Cache traversal and typed listers

pub mod cache;
pub mod lister;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use cache::{list_all, list_all_by_namespace};
pub use lister::{Lister, NamespaceLister, QueueLister, QueueNamespaceLister};
