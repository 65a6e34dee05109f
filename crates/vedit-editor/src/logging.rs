//! Structured operation logging.

use tracing::{error, info, warn, Span};
use vedit_models::OperationKind;

/// Logs the lifecycle of one edit with its operation id and kind attached.
#[derive(Debug, Clone)]
pub struct OperationLogger {
    operation_id: String,
    operation: OperationKind,
}

impl OperationLogger {
    pub fn new(operation_id: impl Into<String>, operation: OperationKind) -> Self {
        Self {
            operation_id: operation_id.into(),
            operation,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            operation_id = %self.operation_id,
            operation = %self.operation,
            "Operation started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            operation_id = %self.operation_id,
            operation = %self.operation,
            "Operation progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            operation_id = %self.operation_id,
            operation = %self.operation,
            "Operation warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            operation_id = %self.operation_id,
            operation = %self.operation,
            "Operation failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            operation_id = %self.operation_id,
            operation = %self.operation,
            "Operation completed: {}", message
        );
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    /// Span covering the whole operation.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "edit",
            operation_id = %self.operation_id,
            operation = %self.operation
        )
    }
}
