//! # Typed Queue Wrappers
//!
//! Newtype wrappers over the two `mpsc` queues the engine uses, so a trigger sender can never
//! be handed where the job sender is expected.
//!
//! - **Job queue**: bounded at `workers × job_queue_multiplier`; carries one cluster snapshot
//!   per job. Senders block when it is full.
//! - **Trigger queue**: small and debounced; producers use `try_send` and surface a full queue
//!   to the caller instead of waiting.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::models::ClusterSnapshot;

/// One unit of work: run every registered checker against this cluster
pub type ClusterJob = Arc<ClusterSnapshot>;

/// Why a cycle was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTrigger {
    /// Pushed once when the loop starts
    Initial,
    /// Requested by an operator or API call
    Manual,
}

impl CycleTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleTrigger::Initial => "initial",
            CycleTrigger::Manual => "manual",
        }
    }
}

// ============================================================================
// Job Channel Types
// ============================================================================

/// Producer side of the job queue, held by the dispatch loop and `trigger_for` callers
#[derive(Debug, Clone)]
pub struct JobSender(pub(crate) mpsc::Sender<ClusterJob>);

/// Consumer side of the job queue, shared by all workers
#[derive(Debug)]
pub struct JobReceiver(pub(crate) mpsc::Receiver<ClusterJob>);

impl JobSender {
    /// Send a job, waiting for queue space
    pub async fn send(&self, job: ClusterJob) -> Result<(), mpsc::error::SendError<ClusterJob>> {
        self.0.send(job).await
    }
}

impl JobReceiver {
    /// Next job, or `None` once every sender is dropped and the queue is drained
    pub async fn recv(&mut self) -> Option<ClusterJob> {
        self.0.recv().await
    }
}

// ============================================================================
// Trigger Channel Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct TriggerSender(pub(crate) mpsc::Sender<CycleTrigger>);

#[derive(Debug)]
pub struct TriggerReceiver(pub(crate) mpsc::Receiver<CycleTrigger>);

impl TriggerSender {
    /// Queue a trigger without waiting
    pub fn try_send(
        &self,
        trigger: CycleTrigger,
    ) -> Result<(), mpsc::error::TrySendError<CycleTrigger>> {
        self.0.try_send(trigger)
    }

    /// Number of triggers currently queued
    pub fn pending(&self) -> usize {
        self.0.max_capacity() - self.0.capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.0.max_capacity()
    }
}

impl TriggerReceiver {
    pub async fn recv(&mut self) -> Option<CycleTrigger> {
        self.0.recv().await
    }
}

/// Factory for the engine's channel pairs
#[derive(Debug)]
pub struct ChannelFactory;

impl ChannelFactory {
    /// Bounded job queue shared by the dispatch loop and the worker pool
    pub fn job_channel(capacity: usize) -> (JobSender, JobReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (JobSender(tx), JobReceiver(rx))
    }

    /// Debounced trigger queue for the scheduler or the janitor
    pub fn trigger_channel(capacity: usize) -> (TriggerSender, TriggerReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (TriggerSender(tx), TriggerReceiver(rx))
    }
}
