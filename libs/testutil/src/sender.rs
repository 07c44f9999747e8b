use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bcast_core::{DeliveryAck, DeliveryError, MessagePayload, MessageSender};
use tokio::time::Instant;

type Hook = Box<dyn FnOnce() + Send>;

/// One observed `send` call.
#[derive(Debug, Clone)]
pub struct SendCall {
    /// 1-based call number.
    pub position: usize,
    pub recipient: String,
    pub payload: MessagePayload,
    pub started: Instant,
    pub finished: Instant,
}

/// Sender that records every call and answers from a script.
///
/// Failures and hooks are keyed by 1-based call number. Hooks run after the
/// simulated latency, just before the call returns.
#[derive(Default)]
pub struct RecordingSender {
    latency: Duration,
    failures: HashMap<usize, DeliveryError>,
    hooks: Mutex<HashMap<usize, Hook>>,
    calls: Mutex<Vec<SendCall>>,
    started: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_at(mut self, position: usize, error: DeliveryError) -> Self {
        self.failures.insert(position, error);
        self
    }

    pub fn recipient_failure_at(self, position: usize, message: &str) -> Self {
        self.failing_at(position, DeliveryError::recipient(message))
    }

    pub fn fatal_at(self, position: usize, message: &str) -> Self {
        self.failing_at(position, DeliveryError::fatal(message))
    }

    pub fn on_call<F>(self, position: usize, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.hooks
            .lock()
            .unwrap()
            .insert(position, Box::new(hook));
        self
    }

    pub fn calls(&self) -> Vec<SendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.recipient.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(
        &self,
        recipient: &str,
        payload: &MessagePayload,
    ) -> Result<DeliveryAck, DeliveryError> {
        let position = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let started = Instant::now();

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(SendCall {
            position,
            recipient: recipient.to_string(),
            payload: payload.clone(),
            started,
            finished: Instant::now(),
        });

        let hook = self.hooks.lock().unwrap().remove(&position);
        if let Some(hook) = hook {
            hook();
        }

        match self.failures.get(&position) {
            Some(err) => Err(err.clone()),
            None => Ok(DeliveryAck {
                message_id: Some(format!("mock-{position}")),
                raw: None,
            }),
        }
    }
}
