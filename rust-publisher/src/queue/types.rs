//! Message types for the camera events queue.
//!
//! The wire payload is a single envelope, `{"events": [...]}`, holding the
//! records exactly as they were loaded.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Content type set on every published message.
pub const CONTENT_TYPE: &str = "application/json";

/// AMQP delivery mode for persistent messages.
pub const PERSISTENT_DELIVERY_MODE: u8 = 2;

/// One people-count reading from a camera zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Camera that produced the reading
    pub camera_id: String,
    /// Zone within the camera's field of view
    pub zone_id: String,
    /// Number of detections in the zone
    pub count: i64,
    /// Reading time, forwarded as-is
    pub timestamp: String,
    /// Any other fields on the record, carried through unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventRecord {
    pub fn new(
        camera_id: impl Into<String>,
        zone_id: impl Into<String>,
        count: i64,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            camera_id: camera_id.into(),
            zone_id: zone_id.into(),
            count,
            timestamp: timestamp.into(),
            extra: Map::new(),
        }
    }
}

/// Outbound payload wrapping the loaded events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub events: Vec<EventRecord>,
}

impl Envelope {
    pub fn new(events: Vec<EventRecord>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Encode the envelope as the message body.
    pub fn to_body(&self, pretty: bool) -> serde_json::Result<Vec<u8>> {
        if pretty {
            serde_json::to_vec_pretty(self)
        } else {
            serde_json::to_vec(self)
        }
    }
}

/// Result of handing the envelope to the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The broker accepted the message for delivery
    Accepted,
    /// The broker refused the message; it must not be assumed delivered
    Rejected,
}

impl SendOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, SendOutcome::Accepted)
    }
}
