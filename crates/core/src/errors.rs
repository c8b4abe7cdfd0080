use thiserror::Error;

/// A filter field failed its type, range, or cross-field check.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid filter field `{field}`: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self { field, reason: reason.into() }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{entity} `{id}` was not found")]
    NotFound { entity: &'static str, id: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("classification request failed: {0}")]
    Remote(String),
    #[error("classification payload was malformed: {0}")]
    Malformed(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("extraction request failed: {0}")]
    Remote(String),
    #[error("extraction payload was malformed: {0}")]
    Malformed(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("completion failure: {0}")]
    Completion(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => {
                "I couldn't find that car anymore. Ask me for a fresh list and pick again."
            }
            Self::ServiceUnavailable { .. } => {
                "I couldn't complete that search right now. Please try again in a moment."
            }
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::NotFound { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(error) => {
                Self::NotFound { message: error.to_string(), correlation_id }
            }
            ApplicationError::Storage(message) | ApplicationError::Completion(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError, ValidationError};

    #[test]
    fn validation_error_names_the_field() {
        let error = ValidationError::new("year_max", "must be >= year_min (2023)");
        assert_eq!(
            error.to_string(),
            "invalid filter field `year_max`: must be >= year_min (2023)"
        );
    }

    #[test]
    fn storage_error_has_user_safe_message() {
        let interface = ApplicationError::Storage("database is locked".to_owned())
            .into_interface("turn-2");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "I couldn't complete that search right now. Please try again in a moment."
        );
        assert!(!interface.user_message().contains("locked"));
    }

    #[test]
    fn not_found_is_distinct_from_empty_search() {
        let interface = ApplicationError::from(DomainError::NotFound {
            entity: "vehicle",
            id: "42".to_owned(),
        })
        .into_interface("turn-3");

        assert!(matches!(interface, InterfaceError::NotFound { .. }));
        assert_eq!(interface.correlation_id(), "turn-3");
        assert!(interface.user_message().contains("couldn't find that car"));
    }
}
