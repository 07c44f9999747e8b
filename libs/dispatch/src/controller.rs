//! The dispatch run loop.
//!
//! One controller drives one job: recipients are attempted strictly in order,
//! one at a time, with a paced wait between consecutive sends. Operator
//! commands arrive through a `watch` channel and are only read at the loop's
//! checkpoints (top of each iteration, and during the inter-send wait for
//! cancellation).

use std::future::Future;
use std::sync::Arc;

use bcast_core::{
    DelayScheduler, DeliveryError, DispatchResult, PacingScheduler, Recipient, SharedAuditLogger,
    SharedSender, SharedStore,
};
use bcast_telemetry::{TelemetryLabels, record_counter, record_histogram, with_common_fields};
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::DispatchConfig;
use crate::control::{ControlState, DispatchHandle};
use crate::error::{DispatchError, DispatchReport};
use crate::finalize::{audit_record, snapshot_payload};
use crate::job::{DispatchJob, DispatchStatus};
use crate::progress::ProgressSnapshot;

const SENT_COUNTER: &str = "bcast_messages_sent";
const FAILED_COUNTER: &str = "bcast_messages_failed";
const RUNS_COUNTER: &str = "bcast_runs_finished";
const SEND_LATENCY_HISTOGRAM: &str = "bcast_send_latency_ms";
const DELAY_HISTOGRAM: &str = "bcast_delay_ms";

enum Outcome {
    Finished,
    Cancelled,
    Fatal(DeliveryError),
}

pub struct DispatchController {
    job: DispatchJob,
    sender: SharedSender,
    audit: SharedAuditLogger,
    store: Option<SharedStore>,
    scheduler: Arc<dyn DelayScheduler>,
    config: DispatchConfig,
    control: watch::Receiver<ControlState>,
    progress: watch::Sender<ProgressSnapshot>,
    handle: DispatchHandle,
}

impl DispatchController {
    pub fn new(job: DispatchJob, sender: SharedSender, audit: SharedAuditLogger) -> Self {
        let (control_tx, control_rx) = watch::channel(ControlState::default());
        let (progress_tx, progress_rx) = watch::channel(ProgressSnapshot::of(&job));
        let handle = DispatchHandle::new(job.id(), Arc::new(control_tx), progress_rx);
        Self {
            job,
            sender,
            audit,
            store: None,
            scheduler: Arc::new(PacingScheduler::new()),
            config: DispatchConfig::default(),
            control: control_rx,
            progress: progress_tx,
            handle,
        }
    }

    /// Store used to materialize transient carousel images at finalize.
    pub fn with_store(mut self, store: SharedStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn DelayScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn handle(&self) -> DispatchHandle {
        self.handle.clone()
    }

    pub fn job(&self) -> &DispatchJob {
        &self.job
    }

    /// Validates the job and moves it to `Sending`; the returned future runs
    /// the loop to a terminal state. Nothing is sent until it is polled.
    pub fn prepare(
        mut self,
    ) -> Result<impl Future<Output = Result<DispatchReport, DispatchError>> + Send + 'static, DispatchError>
    {
        if self.job.status() != DispatchStatus::Idle {
            return Err(DispatchError::AlreadyStarted(self.job.id().to_string()));
        }
        self.job.validate()?;
        self.job.mark_started(OffsetDateTime::now_utc());
        self.publish();
        Ok(self.drive())
    }

    /// Validates synchronously, then runs the loop on a spawned task.
    pub fn start(self) -> Result<RunningDispatch, DispatchError> {
        let handle = self.handle();
        let run = self.prepare()?;
        Ok(RunningDispatch {
            handle,
            task: tokio::spawn(run),
        })
    }

    /// Validates and runs the loop on the current task.
    pub async fn run(self) -> Result<DispatchReport, DispatchError> {
        self.prepare()?.await
    }

    async fn drive(self) -> Result<DispatchReport, DispatchError> {
        let span = info_span!(
            "dispatch.run",
            tenant = tracing::field::Empty,
            job_id = tracing::field::Empty,
            payload_kind = self.job.payload().kind().as_str(),
            total = self.job.total()
        );
        with_common_fields(&span, self.job.tenant(), self.job.id());
        self.run_loop().instrument(span).await
    }

    async fn run_loop(mut self) -> Result<DispatchReport, DispatchError> {
        let labels = TelemetryLabels::new(self.job.tenant().map(str::to_string))
            .with_job(self.job.id())
            .with_payload_kind(self.job.payload().kind().as_str());
        info!(
            total = self.job.total(),
            policy = ?self.job.delay_policy(),
            exclude_admins = self.job.excludes_admins(),
            "dispatch started"
        );

        let outcome = loop {
            if let Some(outcome) = self.checkpoint().await {
                break outcome;
            }
            let Some(recipient) = self.job.current().cloned() else {
                break Outcome::Finished;
            };
            if let Err(fatal) = self.deliver(&recipient, &labels).await {
                break Outcome::Fatal(fatal);
            }
            if !self.job.has_remaining() {
                break Outcome::Finished;
            }
            if self.pace(&labels).await {
                break Outcome::Cancelled;
            }
        };

        self.finalize(outcome, labels).await
    }

    /// Returns an outcome when the run must stop; blocks while paused.
    async fn checkpoint(&mut self) -> Option<Outcome> {
        let state = *self.control.borrow_and_update();
        if state.cancelled {
            return Some(Outcome::Cancelled);
        }
        if !state.paused {
            return None;
        }

        self.job.set_status(DispatchStatus::Paused);
        self.publish();
        info!(processed = self.job.cursor(), "dispatch paused");

        if wait_while_paused(&mut self.control).await {
            return Some(Outcome::Cancelled);
        }
        self.job.set_status(DispatchStatus::Sending);
        self.publish();
        info!(processed = self.job.cursor(), "dispatch resumed");
        None
    }

    async fn deliver(
        &mut self,
        recipient: &Recipient,
        labels: &TelemetryLabels,
    ) -> Result<(), DeliveryError> {
        let span = info_span!(
            "dispatch.send",
            index = self.job.cursor() + 1,
            recipient = %recipient.identifier
        );
        let started = Instant::now();
        let outcome = self
            .sender
            .send(&recipient.identifier, self.job.payload())
            .instrument(span.clone())
            .await;
        record_histogram(
            SEND_LATENCY_HISTOGRAM,
            started.elapsed().as_secs_f64() * 1000.0,
            labels,
        );

        let fatal = match outcome {
            Ok(ack) => {
                debug!(parent: &span, message_id = ?ack.message_id, "delivered");
                record_counter(SENT_COUNTER, 1, labels);
                self.job
                    .record(DispatchResult::delivered(recipient.identifier.clone()));
                None
            }
            Err(err) => {
                warn!(parent: &span, error = %err, fatal = err.is_fatal(), "delivery failed");
                record_counter(FAILED_COUNTER, 1, labels);
                self.job.record(DispatchResult::failed(
                    recipient.identifier.clone(),
                    err.message(),
                ));
                err.is_fatal().then_some(err)
            }
        };
        self.publish();
        fatal.map_or(Ok(()), Err)
    }

    /// Waits out the inter-send gap. Returns true if cancelled meanwhile.
    async fn pace(&mut self, labels: &TelemetryLabels) -> bool {
        let delay = self.scheduler.next_delay(&self.job.delay_policy());
        record_histogram(DELAY_HISTOGRAM, delay.as_millis() as f64, labels);
        debug!(delay_ms = delay.as_millis() as u64, "waiting before next send");
        tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            _ = wait_for_cancel(&mut self.control) => true,
        }
    }

    async fn finalize(
        mut self,
        outcome: Outcome,
        labels: TelemetryLabels,
    ) -> Result<DispatchReport, DispatchError> {
        let (status, fatal) = match outcome {
            Outcome::Finished => (DispatchStatus::Success, None),
            Outcome::Cancelled => (DispatchStatus::Cancelled, None),
            Outcome::Fatal(err) => (DispatchStatus::Error, Some(err.message().to_string())),
        };
        self.job.finish(status, OffsetDateTime::now_utc());

        let store = if self.config.materialize_carousel {
            self.store.as_deref()
        } else {
            None
        };
        let snapshot = snapshot_payload(self.job.payload(), store, &labels).await;
        let audit_status = status.audit_status().unwrap_or(bcast_core::AuditStatus::Error);
        let record = audit_record(&self.job, audit_status, snapshot, fatal.clone());
        if let Err(err) = self.audit.append(&record).await {
            warn!(error = %err, audit_id = %record.id, "audit record not persisted");
        }
        record_counter(
            RUNS_COUNTER,
            1,
            &labels.with_extra("status", audit_status.as_str()),
        );
        self.publish();

        let results = self.job.results();
        info!(
            status = status.as_str(),
            attempted = results.len(),
            success = results.success_count(),
            failure = results.failure_count(),
            duration_ms = record.duration_ms,
            "dispatch finished"
        );
        let report = DispatchReport {
            job_id: self.job.id().to_string(),
            status,
            total: self.job.total(),
            success: results.success_count(),
            failure: results.failure_count(),
            results: results.results().to_vec(),
            audit: record,
        };
        match fatal {
            Some(message) => Err(DispatchError::Fatal {
                message,
                report: Box::new(report),
            }),
            None => Ok(report),
        }
    }

    fn publish(&self) {
        self.progress.send_replace(ProgressSnapshot::of(&self.job));
    }
}

/// Resolves with `true` if cancelled, `false` once resumed.
async fn wait_while_paused(control: &mut watch::Receiver<ControlState>) -> bool {
    match control.wait_for(|state| !state.paused || state.cancelled).await {
        Ok(state) => state.cancelled,
        Err(_) => true,
    }
}

/// Resolves once cancellation is requested; never resolves otherwise.
async fn wait_for_cancel(control: &mut watch::Receiver<ControlState>) {
    if control.wait_for(|state| state.cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// A job running on its own task.
pub struct RunningDispatch {
    handle: DispatchHandle,
    task: JoinHandle<Result<DispatchReport, DispatchError>>,
}

impl RunningDispatch {
    pub(crate) fn new(
        handle: DispatchHandle,
        task: JoinHandle<Result<DispatchReport, DispatchError>>,
    ) -> Self {
        Self { handle, task }
    }

    pub fn handle(&self) -> &DispatchHandle {
        &self.handle
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn wait(self) -> Result<DispatchReport, DispatchError> {
        self.task
            .await
            .map_err(|err| DispatchError::Join(err.to_string()))?
    }
}
