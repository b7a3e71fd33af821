//! The operation contract.
//!
//! An operation is a stateless template composed of four capabilities:
//!
//! - [`Identifiable`] - id, documentation and [`Usage`]
//! - [`PropertyProvider`] - the property schema it accepts
//! - [`Validator`] - structural precondition check
//! - [`Executor`] - the actual work, given bound properties
//!
//! Anything implementing all four is an [`Operation`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::OperationError;
use crate::properties::Properties;
use crate::report::{Reporter, TracingReporter};
use crate::result::OperationResult;

/// Who may invoke an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Usage {
    /// Directly invokable by a human or CLI caller.
    External,
    /// Only used by other operations.
    Internal,
}

impl Usage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Internal => "internal",
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::External)
    }
}

pub trait Identifiable {
    fn id(&self) -> &str;

    fn label(&self) -> &str {
        self.id()
    }

    fn description(&self) -> &str {
        ""
    }

    fn help(&self) -> &str {
        ""
    }

    fn usage(&self) -> Usage;
}

pub trait PropertyProvider {
    /// Fresh copy of the schema, including any default values.
    fn properties(&self) -> Properties;

    /// Ids that must be declared in [`properties`](Self::properties).
    fn required_properties(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

pub trait Validator {
    fn validate(&self) -> OperationResult;
}

#[async_trait]
pub trait Executor {
    /// Run the operation against a bound property set.
    ///
    /// The returned result is always finished.
    async fn exec(&self, props: &mut Properties, ctx: &ExecContext) -> OperationResult;
}

pub trait Operation: Identifiable + PropertyProvider + Validator + Executor + Send + Sync {}

impl<T> Operation for T where
    T: Identifiable + PropertyProvider + Validator + Executor + Send + Sync
{
}

/// Check that every required property id is declared in the schema.
pub fn validate_schema<P: PropertyProvider + ?Sized>(provider: &P) -> OperationResult {
    let schema = provider.properties();
    let mut result = OperationResult::new();

    for id in provider.required_properties() {
        if !schema.contains(id) {
            result.add_error(OperationError::validation(format!(
                "required property {} is not declared",
                id
            )));
            result.mark_failed();
        }
    }

    result.mark_finished();
    result
}

/// Per-invocation context handed to [`Executor::exec`].
#[derive(Clone)]
pub struct ExecContext {
    invocation_id: Uuid,
    reporter: Arc<dyn Reporter>,
}

impl ExecContext {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            reporter,
        }
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::new(Arc::new(TracingReporter))
    }
}

impl std::fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecContext")
            .field("invocation_id", &self.invocation_id)
            .finish()
    }
}
