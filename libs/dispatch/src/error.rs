use bcast_core::{AuditRecord, DispatchResult, ValidationError};
use thiserror::Error;

use crate::job::DispatchStatus;

/// Final outcome of a run that reached a terminal state.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub job_id: String,
    pub status: DispatchStatus,
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    pub results: Vec<DispatchResult>,
    pub audit: AuditRecord,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    /// Operator-facing one-liner; cancellations say how many sends finished
    /// before the stop.
    pub fn summary(&self) -> String {
        match self.status {
            DispatchStatus::Cancelled => format!(
                "cancelled: {} of {} sends completed before cancellation ({} delivered, {} failed)",
                self.attempted(),
                self.total,
                self.success,
                self.failure
            ),
            DispatchStatus::Error => format!(
                "aborted: {} of {} sends attempted ({} delivered, {} failed)",
                self.attempted(),
                self.total,
                self.success,
                self.failure
            ),
            _ => format!(
                "completed: {} delivered, {} failed of {}",
                self.success, self.failure, self.total
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatch rejected: {0}")]
    Validation(#[from] ValidationError),
    #[error("job {0} was already started")]
    AlreadyStarted(String),
    /// The run aborted; the partial report (with its `error` audit record)
    /// is attached.
    #[error("dispatch aborted: {message}")]
    Fatal {
        message: String,
        report: Box<DispatchReport>,
    },
    #[error("dispatch task failed: {0}")]
    Join(String),
}

impl DispatchError {
    pub fn report(&self) -> Option<&DispatchReport> {
        match self {
            DispatchError::Fatal { report, .. } => Some(report),
            _ => None,
        }
    }
}
