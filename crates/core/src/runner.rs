//! Drives one operation invocation from schema to finished result.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::operation::{ExecContext, Operation};
use crate::properties::Properties;
use crate::report::{Reporter, TracingReporter};
use crate::result::OperationResult;

/// Lifecycle of a single invocation.
///
/// The only valid path is `Created -> Validated -> Executing -> Finished`,
/// with a shortcut `Validated -> Finished` when validation failed. There is
/// no retry state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Created,
    Validated,
    Executing,
    Finished,
}

impl OperationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Validated => "validated",
            Self::Executing => "executing",
            Self::Finished => "finished",
        }
    }

    fn allowed_transitions(&self) -> &'static [OperationState] {
        match self {
            Self::Created => &[Self::Validated],
            Self::Validated => &[Self::Executing, Self::Finished],
            Self::Executing => &[Self::Finished],
            Self::Finished => &[],
        }
    }

    pub fn can_transition(&self, to: OperationState) -> bool {
        self.allowed_transitions().contains(&to)
    }
}

/// Outcome of [`OperationRunner::run`], with the bound properties handed back
/// so callers can read output properties.
#[derive(Debug)]
pub struct Invocation {
    pub result: OperationResult,
    pub properties: Properties,
    pub state: OperationState,
}

/// Runs operations with a shared reporter.
#[derive(Clone)]
pub struct OperationRunner {
    reporter: Arc<dyn Reporter>,
}

impl OperationRunner {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self { reporter }
    }

    /// Compose the operation's schema with `values`, validate, then execute.
    ///
    /// Execution is skipped when validation fails; the validation result is
    /// returned instead.
    pub async fn run(&self, operation: &dyn Operation, values: Properties) -> Invocation {
        let mut state = OperationState::Created;
        let started = Instant::now();

        let mut properties = operation.properties();
        properties.merge(values);
        debug!(
            operation = operation.id(),
            properties = ?properties.ids(),
            "Properties bound"
        );

        let validation = operation.validate();
        state = advance(state, OperationState::Validated);

        if !validation.success() {
            warn!(
                operation = operation.id(),
                errors = validation.errors().len(),
                "Validation failed, skipping execution"
            );
            let mut result = validation;
            result.mark_finished();
            return Invocation {
                result,
                properties,
                state: advance(state, OperationState::Finished),
            };
        }

        let ctx = ExecContext::new(self.reporter.clone());
        info!(
            operation = operation.id(),
            invocation_id = %ctx.invocation_id(),
            "Executing operation"
        );
        state = advance(state, OperationState::Executing);

        let mut result = operation.exec(&mut properties, &ctx).await;
        if !result.is_finished() {
            warn!(operation = operation.id(), "Operation returned an unfinished result");
            result.mark_finished();
        }

        info!(
            operation = operation.id(),
            invocation_id = %ctx.invocation_id(),
            success = result.success(),
            errors = result.errors().len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Operation finished"
        );

        Invocation {
            result,
            properties,
            state: advance(state, OperationState::Finished),
        }
    }
}

impl Default for OperationRunner {
    fn default() -> Self {
        Self::new(Arc::new(TracingReporter))
    }
}

fn advance(from: OperationState, to: OperationState) -> OperationState {
    debug_assert!(
        from.can_transition(to),
        "invalid transition {} -> {}",
        from.as_str(),
        to.as_str()
    );
    debug!(from = from.as_str(), to = to.as_str(), "Operation state");
    to
}
