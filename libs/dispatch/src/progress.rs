use serde::{Deserialize, Serialize};

use crate::job::{DispatchJob, DispatchStatus};

/// Read-only view of a run for UI reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub job_id: String,
    pub status: DispatchStatus,
    /// Recipients processed so far (also the index of the next one).
    pub current_index: usize,
    pub total_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_recipient_label: Option<String>,
    pub success_count: usize,
    pub failure_count: usize,
}

impl ProgressSnapshot {
    pub fn of(job: &DispatchJob) -> Self {
        let last_recipient_label = job
            .cursor()
            .checked_sub(1)
            .and_then(|idx| job.recipients().get(idx))
            .map(|recipient| recipient.label().to_string());
        Self {
            job_id: job.id().to_string(),
            status: job.status(),
            current_index: job.cursor(),
            total_count: job.total(),
            last_recipient_label,
            success_count: job.results().success_count(),
            failure_count: job.results().failure_count(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.total_count.saturating_sub(self.current_index)
    }
}
