// Domain Layer - Resource types and label selection

pub mod error;
pub mod labels;
pub mod meta;
pub mod queue;
pub mod selector;

// Re-exports
pub use error::DomainError;
pub use labels::{validate_label_key, validate_label_value, Labels};
pub use meta::{
    meta_namespace_key, namespace_key, GroupResource, ObjectMeta, Resource, TypeMeta,
};
pub use queue::{Queue, QueueSpec, QueueStatus, ResourceList};
pub use selector::{Operator, Requirement, Selector};
