// Label sets and label key/value validation

use super::error::{DomainError, Result};
use std::collections::BTreeMap;

/// Label set attached to a resource (ordered for stable rendering)
pub type Labels = BTreeMap<String, String>;

const QUALIFIED_NAME_MAX_LENGTH: usize = 63;
const LABEL_VALUE_MAX_LENGTH: usize = 63;
const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;

/// Validate a label key: `[prefix/]name`
///
/// The optional prefix must be a DNS-1123 subdomain; the name is at most 63
/// characters of alphanumerics, `-`, `_` and `.`, beginning and ending with
/// an alphanumeric character.
pub fn validate_label_key(key: &str) -> Result<()> {
    let invalid = |reason: String| DomainError::InvalidLabelKey {
        key: key.to_string(),
        reason,
    };

    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => {
            if name.contains('/') {
                return Err(invalid("must contain at most one '/'".to_string()));
            }
            (Some(prefix), name)
        }
        None => (None, key),
    };

    if let Some(prefix) = prefix {
        if prefix.is_empty() {
            return Err(invalid("prefix part must be non-empty".to_string()));
        }
        if let Err(reason) = check_dns1123_subdomain(prefix) {
            return Err(invalid(format!("prefix part {reason}")));
        }
    }

    if name.is_empty() {
        return Err(invalid("name part must be non-empty".to_string()));
    }
    if name.len() > QUALIFIED_NAME_MAX_LENGTH {
        return Err(invalid(format!(
            "name part must be no more than {QUALIFIED_NAME_MAX_LENGTH} characters"
        )));
    }
    if !is_qualified_token(name) {
        return Err(invalid(
            "name part must consist of alphanumeric characters, '-', '_' or '.', \
             and must start and end with an alphanumeric character"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate a label value (empty is allowed)
pub fn validate_label_value(value: &str) -> Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    if value.len() > LABEL_VALUE_MAX_LENGTH {
        return Err(DomainError::InvalidLabelValue {
            value: value.to_string(),
            reason: format!("must be no more than {LABEL_VALUE_MAX_LENGTH} characters"),
        });
    }
    if !is_qualified_token(value) {
        return Err(DomainError::InvalidLabelValue {
            value: value.to_string(),
            reason: "must consist of alphanumeric characters, '-', '_' or '.', \
                     and must start and end with an alphanumeric character"
                .to_string(),
        });
    }
    Ok(())
}

fn is_qualified_token(s: &str) -> bool {
    let bytes = s.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

fn check_dns1123_subdomain(s: &str) -> std::result::Result<(), String> {
    if s.len() > DNS1123_SUBDOMAIN_MAX_LENGTH {
        return Err(format!(
            "must be no more than {DNS1123_SUBDOMAIN_MAX_LENGTH} characters"
        ));
    }
    let valid_label = |label: &str| {
        let bytes = label.as_bytes();
        match (bytes.first(), bytes.last()) {
            (Some(first), Some(last)) => {
                (first.is_ascii_lowercase() || first.is_ascii_digit())
                    && (last.is_ascii_lowercase() || last.is_ascii_digit())
                    && bytes
                        .iter()
                        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
            }
            _ => false,
        }
    };
    if s.split('.').all(valid_label) {
        Ok(())
    } else {
        Err("must be a lowercase RFC 1123 subdomain".to_string())
    }
}
