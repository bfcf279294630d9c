//! Whole-run orchestration.
//!
//! ```text
//! Config → load_events() → Envelope → Publisher::publish_envelope() → Dispatch
//! ```
//!
//! The source document is loaded before any connection is attempted, so a
//! missing or malformed file never touches the network.

use tracing::info;

use crate::config::Config;
use crate::error::PublishError;
use crate::progress::Progress;
use crate::queue::{Connector, Envelope, PublishReport, Publisher, SendOutcome};
use crate::source::load_events;

/// Exit code for an accepted envelope.
pub const EXIT_SUCCESS: u8 = 0;

/// Exit code for any configuration, load or broker error.
pub const EXIT_FAILURE: u8 = 1;

/// Exit code for a rejected envelope when rejections are fatal.
pub const EXIT_REJECTED: u8 = 2;

/// Everything the console report needs about a finished run.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub envelope: Envelope,
    pub report: PublishReport,
}

/// Load the configured source document and publish it as one envelope.
pub async fn dispatch<C: Connector>(
    config: &Config,
    connector: C,
    progress: &dyn Progress,
) -> Result<Dispatch, PublishError> {
    info!(
        events_file = %config.events_file.display(),
        queue = %config.queue_name,
        "dispatch_start"
    );

    let events = load_events(&config.events_file).await?;
    let envelope = Envelope::new(events);
    progress.loaded(&envelope);

    let publisher = Publisher::from_config(connector, config);
    let report = publisher.publish_envelope_with(&envelope, progress).await?;

    info!(
        queue = %report.queue,
        event_count = report.event_count,
        body_length = report.byte_length(),
        accepted = report.outcome.is_accepted(),
        "dispatch_complete"
    );

    Ok(Dispatch { envelope, report })
}

/// Process exit code for a run that reached the broker.
///
/// A rejected envelope exits cleanly unless `fail_on_reject` is set.
pub fn exit_code(outcome: SendOutcome, fail_on_reject: bool) -> u8 {
    match outcome {
        SendOutcome::Accepted => EXIT_SUCCESS,
        SendOutcome::Rejected if fail_on_reject => EXIT_REJECTED,
        SendOutcome::Rejected => EXIT_SUCCESS,
    }
}
