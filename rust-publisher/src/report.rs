//! Human-readable console report.
//!
//! Structured logs go to stderr through `tracing`; this is the operator view
//! printed on stdout. Each stage is printed when it happens through
//! [`ConsoleProgress`]; the summary follows once the session is closed. Every
//! render function returns the text so it can be tested.

use std::error::Error;

use crate::config::Config;
use crate::dispatch::Dispatch;
use crate::error::PublishError;
use crate::progress::Progress;
use crate::queue::{Envelope, SendOutcome};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Join lines into a block ending with a newline.
fn block(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Header printed before anything is loaded.
pub fn render_banner(config: &Config) -> String {
    block(vec![
        RULE.to_string(),
        "Publishing camera events to RabbitMQ".to_string(),
        RULE.to_string(),
        format!("Source: {}", config.events_file.display()),
        format!("Queue:  \"{}\"", config.queue_name),
    ])
}

pub fn render_loaded(envelope: &Envelope) -> String {
    format!("Source loaded ({} events)\n", envelope.len())
}

pub fn render_connected() -> String {
    "Connection established\n".to_string()
}

pub fn render_queue_ready(queue: &str) -> String {
    format!("Queue \"{}\" ready (durable)\n", queue)
}

/// The exact body about to be sent.
pub fn render_sending(body: &[u8]) -> String {
    block(vec![
        String::new(),
        "ENVELOPE SENT TO RABBITMQ:".to_string(),
        RULE.to_string(),
        String::from_utf8_lossy(body).into_owned(),
        RULE.to_string(),
        format!("Sending {} bytes", body.len()),
    ])
}

/// Outcome, statistics, per-event details and teardown of a finished run.
pub fn render_summary(run: &Dispatch) -> String {
    let report = &run.report;
    let mut lines = vec![String::new()];

    lines.push(match report.outcome {
        SendOutcome::Accepted => "Envelope accepted by the broker".to_string(),
        SendOutcome::Rejected => {
            "WARNING: the broker rejected the envelope; it was NOT delivered".to_string()
        }
    });

    lines.push(String::new());
    lines.push("INFORMATION:".to_string());
    lines.push(format!("   Events:       {}", report.event_count));
    lines.push(format!("   Message size: {} bytes", report.byte_length()));
    lines.push("   Format:       JSON with \"events\" array".to_string());
    lines.push(format!("   Queue:        {}", report.queue));

    if !run.envelope.is_empty() {
        lines.push(String::new());
        lines.push("EVENT DETAILS:".to_string());
        for (index, event) in run.envelope.events.iter().enumerate() {
            lines.push(String::new());
            lines.push(format!("   Event {}:", index + 1));
            lines.push(format!("   Camera:    {}", event.camera_id));
            lines.push(format!("   Zone:      {}", event.zone_id));
            lines.push(format!("   Count:     {}", event.count));
            lines.push(format!("   Timestamp: {}", event.timestamp));
        }
    }

    lines.push(String::new());
    lines.push(RULE.to_string());
    if !report.teardown.channel_closed {
        lines.push("WARNING: channel did not close cleanly".to_string());
    }
    lines.push(if report.teardown.connection_closed {
        "Connection closed".to_string()
    } else {
        "WARNING: connection did not close cleanly".to_string()
    });
    lines.push(match report.outcome {
        SendOutcome::Accepted => "Publish complete".to_string(),
        SendOutcome::Rejected => "Publish attempted; envelope rejected".to_string(),
    });
    lines.push(RULE.to_string());

    block(lines)
}

/// Error message with its cause chain, plus a hint for known failures.
pub fn render_failure<'a, I>(chain: I, root: Option<&PublishError>) -> String
where
    I: IntoIterator<Item = &'a (dyn Error + 'static)>,
{
    let mut chain = chain.into_iter();
    let mut lines = Vec::new();

    if let Some(top) = chain.next() {
        lines.push(format!("ERROR: {}", top));
    }
    lines.extend(chain.map(|cause| format!("   caused by: {}", cause)));

    if let Some(PublishError::Load(e)) = root {
        if e.is_not_found() {
            lines.push(
                "   The events file was not found; set EVENTS_FILE or create it.".to_string(),
            );
        }
    }

    block(lines)
}

/// Prints each milestone to stdout as it happens.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn loaded(&self, envelope: &Envelope) {
        print!("{}", render_loaded(envelope));
    }

    fn connected(&self) {
        print!("{}", render_connected());
    }

    fn queue_ready(&self, queue: &str) {
        print!("{}", render_queue_ready(queue));
    }

    fn sending(&self, body: &[u8]) {
        print!("{}", render_sending(body));
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::error::LoadError;
    use crate::queue::{EventRecord, PublishReport, Teardown};

    fn sample_run(outcome: SendOutcome) -> Dispatch {
        let envelope = Envelope::new(vec![
            EventRecord::new("A", "Z1", 2, "T1"),
            EventRecord::new("B", "Z2", 0, "T2"),
            EventRecord::new("C", "Z1", 5, "T3"),
        ]);
        let body = envelope.to_body(false).unwrap();
        Dispatch {
            report: PublishReport {
                queue: "camera-events".to_string(),
                event_count: envelope.len(),
                body,
                outcome,
                teardown: Teardown {
                    channel_closed: true,
                    connection_closed: true,
                },
            },
            envelope,
        }
    }

    #[test]
    fn test_banner_names_queue() {
        let config = Config {
            broker_url: "amqp://localhost".to_string(),
            queue_name: "camera-events".to_string(),
            events_file: PathBuf::from("camera-events.json"),
            broker_timeout_ms: 1_000,
            publish_confirms: true,
            pretty_payload: false,
            fail_on_reject: false,
        };

        let banner = render_banner(&config);
        assert!(banner.contains("Queue:  \"camera-events\""));
        assert!(banner.contains("Source: camera-events.json"));
        assert!(!banner.contains("amqp://"));
        assert!(banner.ends_with('\n'));
    }

    #[test]
    fn test_stage_lines() {
        let run = sample_run(SendOutcome::Accepted);

        assert_eq!(render_loaded(&run.envelope), "Source loaded (3 events)\n");
        assert_eq!(render_connected(), "Connection established\n");
        assert_eq!(
            render_queue_ready("camera-events"),
            "Queue \"camera-events\" ready (durable)\n"
        );

        let sending = render_sending(&run.report.body);
        assert!(sending.contains(r#"{"events":[{"camera_id":"A""#));
        assert!(sending.contains(&format!("Sending {} bytes", run.report.body.len())));
    }

    #[test]
    fn test_accepted_summary() {
        let run = sample_run(SendOutcome::Accepted);
        let text = render_summary(&run);

        assert!(text.contains("Envelope accepted by the broker"));
        assert!(text.contains("Events:       3"));
        assert!(text.contains(&format!("Message size: {} bytes", run.report.body.len())));
        assert!(text.contains("Queue:        camera-events"));
        assert!(text.contains("Event 3:"));
        assert!(text.contains("Camera:    C"));
        assert!(text.contains("Connection closed"));
        assert!(text.contains("Publish complete"));
        assert!(!text.contains("WARNING"));
    }

    #[test]
    fn test_rejected_summary_does_not_claim_delivery() {
        let text = render_summary(&sample_run(SendOutcome::Rejected));

        assert!(text.contains("NOT delivered"));
        assert!(!text.contains("accepted by the broker"));
        assert!(!text.contains("Publish complete"));
    }

    #[test]
    fn test_teardown_warning() {
        let mut run = sample_run(SendOutcome::Accepted);
        run.report.teardown.connection_closed = false;

        let text = render_summary(&run);
        assert!(text.contains("WARNING: connection did not close cleanly"));
    }

    #[test]
    fn test_failure_includes_hint() {
        let err = PublishError::Load(LoadError::NotFound {
            path: PathBuf::from("camera-events.json"),
        });
        let text = render_failure([&err as &(dyn Error + 'static)], Some(&err));

        assert!(text.starts_with("ERROR: source file not found: camera-events.json"));
        assert!(text.contains("EVENTS_FILE"));
    }

    #[test]
    fn test_failure_lists_causes() {
        let err = PublishError::Send {
            queue: "camera-events".to_string(),
            source: "channel closed".into(),
        };
        let source = std::error::Error::source(&err).unwrap();
        let text = render_failure([&err as &(dyn Error + 'static), source], Some(&err));

        assert!(text.contains("ERROR: failed to send message to queue 'camera-events'"));
        assert!(text.contains("caused by: channel closed"));
    }
}
