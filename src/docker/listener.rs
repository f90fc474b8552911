use std::fmt;
use std::sync::Arc;

use log::{info, warn};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::demux::demultiplex;
use super::{Channel, ContainerDescriptor, ContainerEngine, LogStreamOptions};
use crate::logs::LogSender;
use crate::logs::processor::{StreamSummary, process_log_stream};

/// Buffer size of the pipes between the demultiplexer and the processors.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Everything a listener needs besides the container itself.
#[derive(Clone)]
pub struct ListenerContext {
    pub engine: Arc<dyn ContainerEngine>,
    pub sender: Arc<dyn LogSender>,
    pub cancel: CancellationToken,
}

/// Why a listener finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerOutcome {
    /// The log stream could not be opened.
    OpenFailed,
    /// Cancelled before the stream was opened.
    Cancelled,
    Finished {
        stdout: StreamSummary,
        stderr: StreamSummary,
    },
}

impl fmt::Display for ListenerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerOutcome::OpenFailed => f.write_str("stream could not be opened"),
            ListenerOutcome::Cancelled => f.write_str("cancelled before opening"),
            ListenerOutcome::Finished { stdout, stderr } => {
                write!(f, "stdout: {stdout}; stderr: {stderr}")
            }
        }
    }
}

enum Part {
    Demux,
    Processor(Channel, StreamSummary),
}

/// Streams the logs of one container until its stream ends or `cancel` fires.
///
/// `tail` is the number of historical lines to replay first.
pub async fn listen_for_container_logs(
    ctx: ListenerContext,
    container: ContainerDescriptor,
    tail: Option<String>,
) -> ListenerOutcome {
    let name = container.display_name();
    let short_id = container.short_id().to_string();
    info!("Starting log stream for container: {name} ({short_id})");

    let options = LogStreamOptions::follow_with_tail(tail);
    let opened = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => return ListenerOutcome::Cancelled,
        opened = ctx.engine.open_log_stream(&container.id, &options) => opened,
    };
    let frames = match opened {
        Ok(frames) => frames,
        Err(e) => {
            warn!("Failed to get container logs for {name} ({short_id}): {e}");
            return ListenerOutcome::OpenFailed;
        }
    };

    let (stdout_writer, stdout_reader) = tokio::io::duplex(PIPE_CAPACITY);
    let (stderr_writer, stderr_reader) = tokio::io::duplex(PIPE_CAPACITY);

    let mut parts = JoinSet::new();
    {
        let cancel = ctx.cancel.clone();
        let name = name.clone();
        let short_id = short_id.clone();
        parts.spawn(async move {
            if let Err(e) = demultiplex(frames, stdout_writer, stderr_writer, cancel).await {
                warn!("Error demultiplexing Docker logs for {name} ({short_id}): {e}");
            }
            Part::Demux
        });
    }
    for (channel, reader) in [
        (Channel::Stdout, stdout_reader),
        (Channel::Stderr, stderr_reader),
    ] {
        let stream_name = format!("{name}-{channel}");
        let sender = Arc::clone(&ctx.sender);
        let cancel = ctx.cancel.clone();
        parts.spawn(async move {
            let summary = process_log_stream(reader, &stream_name, sender, cancel).await;
            Part::Processor(channel, summary)
        });
    }

    let mut stdout = StreamSummary::default();
    let mut stderr = StreamSummary::default();
    while let Some(part) = parts.join_next().await {
        match part {
            Ok(Part::Processor(Channel::Stdout, summary)) => stdout = summary,
            Ok(Part::Processor(Channel::Stderr, summary)) => stderr = summary,
            Ok(Part::Demux) => {}
            Err(e) => warn!("Log task for {name} ({short_id}) failed: {e}"),
        }
    }

    let outcome = ListenerOutcome::Finished { stdout, stderr };
    info!("Log streaming finished for container: {name} ({short_id}), {outcome}");
    outcome
}
