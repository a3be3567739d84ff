// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unable to parse selector {input:?}: {reason}")]
    InvalidSelector { input: String, reason: String },

    #[error("invalid label key {key:?}: {reason}")]
    InvalidLabelKey { key: String, reason: String },

    #[error("invalid label value {value:?}: {reason}")]
    InvalidLabelValue { value: String, reason: String },

    #[error("invalid requirement for {key:?}: {reason}")]
    InvalidRequirement { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
