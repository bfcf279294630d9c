//! Run milestones reported as they happen.
//!
//! `dispatch` and the publisher call into a [`Progress`] at each stage, so an
//! operator sees how far a run got even when a later step fails.

use crate::queue::Envelope;

/// Receives run milestones in order: loaded → connected → queue ready → sending.
pub trait Progress: Send + Sync {
    /// The source document was read.
    fn loaded(&self, _envelope: &Envelope) {}

    /// The broker connection is open.
    fn connected(&self) {}

    /// The durable queue was declared.
    fn queue_ready(&self, _queue: &str) {}

    /// The serialized envelope is about to be sent.
    fn sending(&self, _body: &[u8]) {}
}

/// Ignores every milestone.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Progress for Silent {}
