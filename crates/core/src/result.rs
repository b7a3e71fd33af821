//! Outcome record of a single operation invocation.

use tracing::warn;

use crate::error::OperationError;

/// Success flag, finished flag and accumulated errors for one invocation.
///
/// A result starts out successful and unfinished. Errors may be recorded
/// without failing the result (warnings), so callers must look at both
/// [`success`](Self::success) and [`errors`](Self::errors). Once
/// [`mark_finished`](Self::mark_finished) has been called the result is
/// frozen and further mutations are ignored.
#[derive(Debug)]
pub struct OperationResult {
    succeeded: bool,
    finished: bool,
    errors: Vec<OperationError>,
}

impl OperationResult {
    pub fn new() -> Self {
        Self {
            succeeded: true,
            finished: false,
            errors: Vec::new(),
        }
    }

    /// An already finished, successful result.
    pub fn successful() -> Self {
        let mut result = Self::new();
        result.mark_finished();
        result
    }

    /// An already finished, failed result carrying `error`.
    pub fn failed(error: OperationError) -> Self {
        let mut result = Self::new();
        result.add_error(error);
        result.mark_failed();
        result.mark_finished();
        result
    }

    pub fn mark_failed(&mut self) {
        if self.finished {
            warn!("Ignoring mark_failed on a finished result");
            return;
        }
        self.succeeded = false;
    }

    /// Record an error. This does not fail the result by itself.
    pub fn add_error(&mut self, error: OperationError) {
        if self.finished {
            warn!(error = %error, "Ignoring error added to a finished result");
            return;
        }
        self.errors.push(error);
    }

    pub fn mark_finished(&mut self) {
        self.finished = true;
    }

    pub fn success(&self) -> bool {
        self.succeeded
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn errors(&self) -> &[OperationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<OperationError> {
        self.errors
    }

    /// True when a backend call reported that it was cancelled.
    pub fn was_cancelled(&self) -> bool {
        self.errors.iter().any(OperationError::is_cancelled)
    }
}

impl Default for OperationResult {
    fn default() -> Self {
        Self::new()
    }
}
