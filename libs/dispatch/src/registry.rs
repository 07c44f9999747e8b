use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::control::DispatchHandle;
use crate::controller::{DispatchController, RunningDispatch};
use crate::error::DispatchError;
use crate::progress::ProgressSnapshot;

/// Handles of in-flight jobs keyed by job id.
///
/// Entries are added when a job is launched and removed by the job's own task
/// once it reaches a terminal state.
#[derive(Clone, Default)]
pub struct DispatchRegistry {
    active: Arc<DashMap<String, DispatchHandle>>,
}

impl DispatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and spawns `controller`. A job id that is already running
    /// is rejected.
    pub fn launch(&self, controller: DispatchController) -> Result<RunningDispatch, DispatchError> {
        let handle = controller.handle();
        let job_id = handle.job_id().to_string();
        let run = match self.active.entry(job_id.clone()) {
            Entry::Occupied(_) => return Err(DispatchError::AlreadyStarted(job_id)),
            Entry::Vacant(slot) => {
                let run = controller.prepare()?;
                slot.insert(handle.clone());
                run
            }
        };

        let unregister = Unregister {
            active: Arc::clone(&self.active),
            job_id,
        };
        let task = tokio::spawn(async move {
            let _unregister = unregister;
            run.await
        });
        Ok(RunningDispatch::new(handle, task))
    }

    pub fn get(&self, job_id: &str) -> Option<DispatchHandle> {
        self.active.get(job_id).map(|entry| entry.value().clone())
    }

    pub fn progress(&self, job_id: &str) -> Option<ProgressSnapshot> {
        self.active.get(job_id).map(|entry| entry.progress())
    }

    pub fn pause(&self, job_id: &str) -> bool {
        self.get(job_id).is_some_and(|handle| handle.pause())
    }

    pub fn resume(&self, job_id: &str) -> bool {
        self.get(job_id).is_some_and(|handle| handle.resume())
    }

    pub fn cancel(&self, job_id: &str) -> bool {
        self.get(job_id).is_some_and(|handle| handle.cancel())
    }

    /// Requests cancellation of every running job; returns how many accepted.
    pub fn cancel_all(&self) -> usize {
        self.handles()
            .into_iter()
            .filter(|handle| handle.cancel())
            .count()
    }

    /// Progress of every registered job.
    pub fn active(&self) -> Vec<ProgressSnapshot> {
        self.active.iter().map(|entry| entry.progress()).collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    fn handles(&self) -> Vec<DispatchHandle> {
        self.active.iter().map(|entry| entry.value().clone()).collect()
    }
}

/// Drops the registry entry when the run's task ends, including by panic or
/// abort.
struct Unregister {
    active: Arc<DashMap<String, DispatchHandle>>,
    job_id: String,
}

impl Drop for Unregister {
    fn drop(&mut self) {
        self.active.remove(&self.job_id);
        debug!(job_id = %self.job_id, "dispatch unregistered");
    }
}
