use std::collections::HashSet;

use bcast_core::{
    AuditStatus, DelayPolicy, DispatchResult, MessagePayload, Recipient, ValidationError,
    validate_payload, validate_recipients,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::aggregator::ResultAggregator;

/// Lifecycle of a dispatch job. `Paused` is a sub-state of `Sending`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Idle,
    Sending,
    Paused,
    Success,
    Error,
    Cancelled,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Idle => "idle",
            DispatchStatus::Sending => "sending",
            DispatchStatus::Paused => "paused",
            DispatchStatus::Success => "success",
            DispatchStatus::Error => "error",
            DispatchStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DispatchStatus::Success | DispatchStatus::Error | DispatchStatus::Cancelled
        )
    }

    pub fn is_active(&self) -> bool {
        matches!(self, DispatchStatus::Sending | DispatchStatus::Paused)
    }

    pub fn audit_status(&self) -> Option<AuditStatus> {
        match self {
            DispatchStatus::Success => Some(AuditStatus::Completed),
            DispatchStatus::Cancelled => Some(AuditStatus::Cancelled),
            DispatchStatus::Error => Some(AuditStatus::Error),
            _ => None,
        }
    }
}

/// One run of one payload over one ordered recipient list.
///
/// Built by the caller, then handed to a single `DispatchController` that
/// owns the run state until a terminal status is reached.
#[derive(Debug, Clone)]
pub struct DispatchJob {
    id: String,
    tenant: Option<String>,
    payload: MessagePayload,
    recipients: Vec<Recipient>,
    delay_policy: DelayPolicy,
    exclude_admins: bool,
    status: DispatchStatus,
    cursor: usize,
    results: ResultAggregator,
    started_at: Option<OffsetDateTime>,
    completed_at: Option<OffsetDateTime>,
}

impl DispatchJob {
    /// Validates payload, recipients and policy.
    ///
    /// ```
    /// use bcast_core::{DelayPolicy, MessagePayload, ValidationError};
    /// use bcast_dispatch::DispatchJob;
    ///
    /// let err = DispatchJob::new(MessagePayload::text("hi"), Vec::new(), DelayPolicy::default())
    ///     .unwrap_err();
    /// assert_eq!(err, ValidationError::NoRecipients);
    /// ```
    pub fn new(
        payload: MessagePayload,
        recipients: Vec<Recipient>,
        delay_policy: DelayPolicy,
    ) -> Result<Self, ValidationError> {
        let job = Self {
            id: Uuid::new_v4().to_string(),
            tenant: None,
            payload,
            results: ResultAggregator::with_capacity(recipients.len()),
            recipients,
            delay_policy,
            exclude_admins: false,
            status: DispatchStatus::Idle,
            cursor: 0,
            started_at: None,
            completed_at: None,
        };
        job.validate()?;
        Ok(job)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Records that recipients were resolved with admins excluded.
    pub fn with_exclude_admins(mut self, exclude: bool) -> Self {
        self.exclude_admins = exclude;
        self
    }

    /// Narrows the list to an operator's selection, keeping resolver order.
    pub fn retain_selected<I, S>(mut self, selected: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selected: HashSet<String> = selected
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect();
        self.recipients
            .retain(|recipient| selected.contains(&recipient.identifier));
        if self.recipients.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_payload(&self.payload)?;
        validate_recipients(&self.recipients)?;
        self.delay_policy.validate()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    pub fn payload(&self) -> &MessagePayload {
        &self.payload
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn delay_policy(&self) -> DelayPolicy {
        self.delay_policy
    }

    pub fn excludes_admins(&self) -> bool {
        self.exclude_admins
    }

    pub fn status(&self) -> DispatchStatus {
        self.status
    }

    /// Index of the next unprocessed recipient.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.recipients.len()
    }

    pub fn results(&self) -> &ResultAggregator {
        &self.results
    }

    pub fn started_at(&self) -> Option<OffsetDateTime> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<OffsetDateTime> {
        self.completed_at
    }

    pub(crate) fn current(&self) -> Option<&Recipient> {
        self.recipients.get(self.cursor)
    }

    pub(crate) fn has_remaining(&self) -> bool {
        self.cursor < self.recipients.len()
    }

    pub(crate) fn mark_started(&mut self, now: OffsetDateTime) {
        self.status = DispatchStatus::Sending;
        self.started_at = Some(now);
    }

    pub(crate) fn set_status(&mut self, status: DispatchStatus) {
        if !self.status.is_terminal() {
            self.status = status;
        }
    }

    /// Appends the outcome for the current recipient and advances the cursor.
    pub(crate) fn record(&mut self, result: DispatchResult) {
        self.results.record(result);
        self.cursor += 1;
    }

    pub(crate) fn finish(&mut self, status: DispatchStatus, now: OffsetDateTime) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        self.completed_at = Some(now);
    }
}
