//! Progress sinks backed by tokio channels

use tokio::sync::mpsc;

use slim_leaderboard_core::{ProgressEvent, ProgressSink};

/// Status line sent when the tool process is launched
pub const STATUS_STARTING: &str = "Starting analysis...";
/// Status line attached to every forwarded output chunk
pub const STATUS_ANALYZING: &str = "Analyzing...";
pub const STATUS_COMPLETE: &str = "Analysis complete";
pub const STATUS_FAILED: &str = "Analysis failed";
pub const STATUS_INSTALLING: &str = "Installing SLIM Leaderboard dependencies...";
pub const STATUS_INSTALLED: &str = "Dependencies installed";

/// Sink that forwards events into an unbounded channel.
///
/// Sending never blocks; once the receiver is dropped events are discarded.
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

/// Forward every output chunk to the sink until the channel closes
pub(crate) async fn forward_chunks(
    mut chunks: mpsc::UnboundedReceiver<String>,
    sink: &dyn ProgressSink,
    message: &str,
) -> usize {
    let mut forwarded = 0;
    while let Some(chunk) = chunks.recv().await {
        sink.emit(ProgressEvent::chunk(message, chunk));
        forwarded += 1;
    }
    forwarded
}
