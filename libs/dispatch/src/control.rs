use std::sync::Arc;

use tokio::sync::watch;

use crate::job::DispatchStatus;
use crate::progress::ProgressSnapshot;

/// Operator requests, written by handles and only read by the run loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ControlState {
    pub paused: bool,
    pub cancelled: bool,
}

/// Non-blocking remote control for one running dispatch job.
///
/// Commands set flags the run loop observes at its checkpoints; none of them
/// wait for the loop to react.
#[derive(Clone)]
pub struct DispatchHandle {
    job_id: Arc<str>,
    control: Arc<watch::Sender<ControlState>>,
    progress: watch::Receiver<ProgressSnapshot>,
}

impl std::fmt::Debug for DispatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchHandle")
            .field("job_id", &self.job_id)
            .field("control", &*self.control.borrow())
            .finish()
    }
}

impl DispatchHandle {
    pub(crate) fn new(
        job_id: &str,
        control: Arc<watch::Sender<ControlState>>,
        progress: watch::Receiver<ProgressSnapshot>,
    ) -> Self {
        Self {
            job_id: Arc::from(job_id),
            control,
            progress,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.borrow().clone()
    }

    pub fn status(&self) -> DispatchStatus {
        self.progress.borrow().status
    }

    /// Receiver notified on every progress change.
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress.clone()
    }

    /// Requests a pause. Returns false when the job is not running or a
    /// pause/cancel is already pending.
    ///
    /// Gated on the control state rather than the published status, which
    /// lags a `resume()` until the loop wakes.
    pub fn pause(&self) -> bool {
        if !self.status().is_active() {
            return false;
        }
        self.control.send_if_modified(|state| {
            if state.paused || state.cancelled {
                return false;
            }
            state.paused = true;
            true
        })
    }

    /// Clears a pause request. Returns false when nothing was paused.
    pub fn resume(&self) -> bool {
        if !self.status().is_active() {
            return false;
        }
        self.control.send_if_modified(|state| {
            if !state.paused || state.cancelled {
                return false;
            }
            state.paused = false;
            true
        })
    }

    /// Requests cancellation; idempotent. Also releases a paused loop.
    pub fn cancel(&self) -> bool {
        if !self.status().is_active() {
            return false;
        }
        self.control.send_if_modified(|state| {
            if state.cancelled {
                return false;
            }
            state.cancelled = true;
            true
        })
    }

    pub fn is_pause_requested(&self) -> bool {
        self.control.borrow().paused
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.control.borrow().cancelled
    }

    /// Waits until a snapshot matches `predicate`, or the run is gone, and
    /// returns the latest snapshot.
    pub async fn wait_until<F>(&self, mut predicate: F) -> ProgressSnapshot
    where
        F: FnMut(&ProgressSnapshot) -> bool,
    {
        let mut rx = self.progress.clone();
        if rx.wait_for(|snapshot| predicate(snapshot)).await.is_err() {
            tracing::debug!(job_id = %self.job_id, "progress channel closed");
        }
        rx.borrow().clone()
    }
}
