use thiserror::Error;

use crate::property::PropertyKind;

/// Failure to read or bind a single property.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PropertyError {
    #[error("Property not found: {0}")]
    Missing(String),

    #[error("Property {id} is declared as {expected}, got {found}")]
    TypeMismatch {
        id: String,
        expected: PropertyKind,
        found: PropertyKind,
    },
}

/// Errors accumulated into an [`OperationResult`](crate::OperationResult).
///
/// None of these abort the caller: operations record them and hand the
/// result back.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("{operation} operation is missing the {property} property")]
    MissingProperty { operation: String, property: String },

    #[error("{operation} operation expected {property} to be {expected}, got {found}")]
    TypeMismatch {
        operation: String,
        property: String,
        expected: PropertyKind,
        found: PropertyKind,
    },

    #[error("{context}: {source}")]
    Backend {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Could not resolve project: {0}")]
    Project(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{operation} operation was cancelled")]
    Cancelled { operation: String },

    #[error("Not found: {0}")]
    NotFound(String),
}

impl OperationError {
    /// Attribute a property lookup failure to the operation that made it.
    pub fn from_property(operation: impl Into<String>, err: PropertyError) -> Self {
        let operation = operation.into();
        match err {
            PropertyError::Missing(property) => Self::MissingProperty {
                operation,
                property,
            },
            PropertyError::TypeMismatch {
                id,
                expected,
                found,
            } => Self::TypeMismatch {
                operation,
                property: id,
                expected,
                found,
            },
        }
    }

    /// Wrap a backend failure with a human-readable context message.
    pub fn backend(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Backend {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn project(reason: impl Into<String>) -> Self {
        Self::Project(reason.into())
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn is_missing_property(&self) -> bool {
        matches!(self, Self::MissingProperty { .. })
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }

    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}
