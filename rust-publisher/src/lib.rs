//! CamEvents - one-shot camera event publisher.
//!
//! Reads a JSON document holding an `events` array, wraps the records in an
//! envelope and publishes it as a single persistent message to a durable
//! RabbitMQ queue.
//!
//! ## Flow
//!
//! ```text
//! environment → Config → load_events() → Envelope → Publisher → queue
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod progress;
pub mod queue;
pub mod report;
pub mod source;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{dispatch, Dispatch};
pub use error::{ConfigError, LoadError, PublishError};
pub use progress::{Progress, Silent};
pub use queue::{AmqpConnector, Envelope, EventRecord, PublishReport, Publisher, SendOutcome};
pub use source::load_events;
