//! CamEvents Publisher - sends the current camera events file to RabbitMQ.
//!
//! Exit codes: 0 on success, 1 on any error, 2 when the broker rejected the
//! envelope and `FAIL_ON_REJECT` is set.

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use camevents::dispatch::{exit_code, EXIT_FAILURE};
use camevents::report::{self, ConsoleProgress};
use camevents::{dispatch, AmqpConnector, Config, PublishError, SendOutcome};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize structured JSON logging on stderr; stdout carries the report
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_writer(std::io::stderr),
        )
        .init();

    info!("publisher_starting");

    match run().await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{:#}", e), "publisher_failed");
            eprint!(
                "{}",
                report::render_failure(e.chain(), e.downcast_ref::<PublishError>())
            );
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run() -> Result<ExitCode> {
    // Resolve configuration before any I/O
    let config = Config::from_env()
        .map_err(PublishError::from)
        .context("Failed to resolve configuration")?;

    info!(
        broker_url_length = config.broker_url.len(),
        queue = %config.queue_name,
        events_file = %config.events_file.display(),
        broker_timeout_ms = config.broker_timeout_ms,
        publish_confirms = config.publish_confirms,
        "config_loaded"
    );

    print!("{}", report::render_banner(&config));

    let run = dispatch(&config, AmqpConnector, &ConsoleProgress)
        .await
        .context("Failed to publish camera events")?;

    print!("{}", report::render_summary(&run));

    let code = exit_code(run.report.outcome, config.fail_on_reject);
    if run.report.outcome == SendOutcome::Rejected {
        warn!(
            queue = %run.report.queue,
            fail_on_reject = config.fail_on_reject,
            exit_code = code,
            "publisher_rejected"
        );
    }

    Ok(ExitCode::from(code))
}
