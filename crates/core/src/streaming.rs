//! Progress Streaming
//!
//! Transient notifications emitted while a run is in flight. Progress is
//! derived only from real process output, never from elapsed time.

use serde::{Deserialize, Serialize};

/// One progress notification for the UI collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Short status line ("Starting analysis...", "Analyzing...")
    pub message: String,
    /// Raw output chunk from the tool, when the event carries one.
    /// Sent as `data`, the name the renderer listens for.
    #[serde(rename = "data", skip_serializing_if = "Option::is_none")]
    pub raw_chunk: Option<String>,
}

impl ProgressEvent {
    /// A status-only event
    pub fn status(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raw_chunk: None,
        }
    }

    /// An event carrying one chunk of tool output
    pub fn chunk(message: impl Into<String>, raw_chunk: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raw_chunk: Some(raw_chunk.into()),
        }
    }
}

/// Receiver of progress events for one run.
///
/// `emit` must not block: implementations hand the event off (channel,
/// window event, buffer) and return. An observer that has gone away simply
/// drops events; the run is unaffected.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Sink that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn emit(&self, _event: ProgressEvent) {}
}
