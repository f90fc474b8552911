use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use log::{debug, error, info, warn};
use tokio::io::AsyncRead;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tokio_util::sync::CancellationToken;

use super::extract::extract_structured;
use super::sender::LogSender;

/// Longest line accepted, without its newline. A longer line ends the stream.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// What happened to the lines of one stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub lines: u64,
    pub forwarded: u64,
    pub discarded: u64,
    pub failed: u64,
}

impl fmt::Display for StreamSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} lines forwarded, {} discarded, {} failed",
            self.forwarded, self.lines, self.discarded, self.failed
        )
    }
}

/// Reads `reader` line by line and forwards every structured line.
///
/// Runs until the reader is exhausted, a read fails or `cancel` fires. A line
/// longer than [`MAX_LINE_LENGTH`] counts as a failed read. A failed send only
/// drops that one line.
pub async fn process_log_stream<R>(
    reader: R,
    stream_name: &str,
    sender: Arc<dyn LogSender>,
    cancel: CancellationToken,
) -> StreamSummary
where
    R: AsyncRead + Unpin,
{
    let mut summary = StreamSummary::default();
    let codec =
        AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), MAX_LINE_LENGTH);
    let mut lines = FramedRead::new(reader, codec);

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Cancelled {stream_name} stream processing, stopping");
                break;
            }
            next = lines.next() => next,
        };

        let mut line = match next {
            Some(Ok(line)) => line,
            None => break,
            Some(Err(e)) => {
                warn!("Error reading from {stream_name} stream: {e}");
                break;
            }
        };
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        if line.is_empty() {
            continue;
        }
        summary.lines += 1;

        let payload = match extract_structured(&line) {
            Some(payload) => line.slice_ref(payload),
            None => {
                debug!("Discarding non-JSON {stream_name} line");
                summary.discarded += 1;
                continue;
            }
        };

        match sender.send(payload).await {
            Ok(()) => summary.forwarded += 1,
            Err(e) => {
                error!("Error sending {stream_name} log to logger service: {e}");
                summary.failed += 1;
            }
        }
    }

    summary
}
