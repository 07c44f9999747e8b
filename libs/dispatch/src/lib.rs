//! Broadcast dispatch engine.
//!
//! A [`DispatchController`] takes one validated [`DispatchJob`] and sends its
//! payload to every recipient in order, waiting a paced delay between sends.
//! Callers steer the run through a [`DispatchHandle`] (pause, resume, cancel,
//! progress) and receive a [`DispatchReport`] whose audit record has already
//! been handed to the configured audit logger.

mod aggregator;
mod config;
mod control;
mod controller;
mod error;
mod finalize;
mod job;
mod progress;
mod registry;

pub use aggregator::ResultAggregator;
pub use config::DispatchConfig;
pub use control::DispatchHandle;
pub use controller::{DispatchController, RunningDispatch};
pub use error::{DispatchError, DispatchReport};
pub use finalize::snapshot_payload;
pub use job::{DispatchJob, DispatchStatus};
pub use progress::ProgressSnapshot;
pub use registry::DispatchRegistry;
