//! Source document loading.
//!
//! The document is read from disk on every call. Nothing is memoized, so a
//! run always sees the file's current content.

use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::LoadError;
use crate::queue::EventRecord;

/// On-disk layout: any JSON object with an `events` array.
#[derive(Deserialize)]
struct SourceDocument {
    events: Vec<EventRecord>,
}

/// Read and parse the event records in `path`.
pub async fn load_events(path: &Path) -> Result<Vec<EventRecord>, LoadError> {
    info!(path = %path.display(), "source_loading");

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let document: SourceDocument =
        serde_json::from_slice(&bytes).map_err(|e| LoadError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    info!(
        path = %path.display(),
        byte_length = bytes.len(),
        event_count = document.events.len(),
        "source_loaded"
    );

    Ok(document.events)
}
