//! Queue module for RabbitMQ operations.
//!
//! This module provides:
//! - Message types for the camera events envelope
//! - The broker traits and their lapin implementation
//! - The one-shot publisher
//!
//! ## Session
//!
//! ```text
//! connect → channel → (confirm select) → queue declare → publish → close channel → close connection
//! ```

pub mod broker;
pub mod publisher;
pub mod types;

pub use broker::{AmqpConnector, BrokerChannel, BrokerConnection, Connector};
pub use publisher::{
    ensure_queue, publish, teardown, PublishOptions, PublishReport, Published, Publisher,
    Teardown,
};
pub use types::{Envelope, EventRecord, SendOutcome, CONTENT_TYPE, PERSISTENT_DELIVERY_MODE};
