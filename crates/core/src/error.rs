// Central Error Type for the Listers

use crate::domain::GroupResource;
use crate::port::IndexError;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Failure reported by the underlying indexer, passed through untouched
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Point lookup found no entry for the composed key
    #[error("{resource} \"{name}\" not found")]
    NotFound {
        resource: GroupResource,
        name: String,
    },

    /// Invalid selector or label handed to a listing call
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),
}

impl AppError {
    /// Build a not-found error for the given resource and name
    pub fn not_found(resource: GroupResource, name: impl Into<String>) -> Self {
        AppError::NotFound {
            resource,
            name: name.into(),
        }
    }

    /// True when the lookup succeeded but the resource is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound { .. })
    }

    /// True when the failure came from the indexer itself
    pub fn is_index_error(&self) -> bool {
        matches!(self, AppError::Index(_))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = AppError::not_found(
            GroupResource::new("arbitrator.incubator.k8s.io", "queue"),
            "q2",
        );
        assert!(err.is_not_found());
        assert!(!err.is_index_error());
        assert_eq!(
            err.to_string(),
            "queue.arbitrator.incubator.k8s.io \"q2\" not found"
        );
    }

    #[test]
    fn test_index_error_is_transparent() {
        let err: AppError = IndexError::Backend("disk on fire".to_string()).into();
        assert!(err.is_index_error());
        assert_eq!(err.to_string(), "indexer backend error: disk on fire");
    }

    #[test]
    fn test_domain_error_conversion() {
        let parse = || -> Result<crate::domain::Selector> {
            Ok(crate::domain::Selector::parse("tier in ()")?)
        };
        let err = parse().unwrap_err();
        assert!(matches!(err, AppError::Domain(_)));
        assert!(!err.is_not_found());
    }
}
