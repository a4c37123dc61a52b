// ⚠️ Error taxonomy for the contestant registry
//
// Every public registry operation returns one of these as a value.
// Nothing here is fatal to the process.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to callers of the registry and the command layer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("Contestant already exists")]
    DuplicateName(String),

    #[error("Contestant not found")]
    NotFound(String),

    #[error("Invalid date of birth. Use YYYY-MM-DD format or date cannot be in future")]
    InvalidDate(String),

    /// Non-numeric (or non-finite) weight supplied by a caller
    #[error("{field} must be a valid number")]
    InvalidNumber { field: &'static str, input: String },

    #[error("Contestant name cannot be empty")]
    InvalidName,

    /// Caller-side validation failure (missing fields, empty edit)
    #[error("{0}")]
    MissingInput(&'static str),

    #[error("Contestant store unavailable: {0}")]
    StoreUnavailable(String),
}

impl RegistryError {
    /// Short machine-readable tag for logs and HTTP mapping
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::DuplicateName(_) => "duplicate_name",
            RegistryError::NotFound(_) => "not_found",
            RegistryError::InvalidDate(_) => "invalid_date",
            RegistryError::InvalidNumber { .. } => "invalid_number",
            RegistryError::InvalidName => "invalid_name",
            RegistryError::MissingInput(_) => "missing_input",
            RegistryError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

/// Failures inside the flat store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        RegistryError::StoreUnavailable(err.to_string())
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_response_contract() {
        assert_eq!(
            RegistryError::DuplicateName("Alice".into()).to_string(),
            "Contestant already exists"
        );
        assert_eq!(
            RegistryError::NotFound("Bob".into()).to_string(),
            "Contestant not found"
        );
        assert_eq!(
            RegistryError::InvalidNumber {
                field: "Weight",
                input: "heavy".into()
            }
            .to_string(),
            "Weight must be a valid number"
        );
    }

    #[test]
    fn test_store_error_converts_to_store_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: RegistryError = StoreError::Io {
            path: PathBuf::from("/tmp/x.json"),
            source: io,
        }
        .into();

        assert_eq!(err.kind(), "store_unavailable");
        assert!(err.to_string().contains("/tmp/x.json"));
    }
}
