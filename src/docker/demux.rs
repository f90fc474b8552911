//! Splits a multiplexed container log stream into its stdout and stderr bytes.

use futures::StreamExt;
use log::warn;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use super::{Channel, EngineError, FrameStream};

#[derive(Error, Debug)]
pub enum DemuxError {
    #[error("log stream broke off: {0}")]
    Stream(#[from] EngineError),
    #[error("both consumers went away")]
    SinksClosed,
}

/// Copies every frame's payload into the sink of its channel.
///
/// Returns when the frame stream ends, fails, both sinks stop accepting data
/// or `cancel` fires. Frames for a sink that stopped accepting data are
/// dropped while the other sink keeps being fed. Both sinks are consumed, so
/// their readers see end of stream on every exit path.
pub async fn demultiplex<O, E>(
    mut frames: FrameStream,
    mut stdout: O,
    mut stderr: E,
    cancel: CancellationToken,
) -> Result<(), DemuxError>
where
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    let mut stdout_open = true;
    let mut stderr_open = true;

    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            frame = frames.next() => frame,
        };
        let frame = match frame {
            Some(frame) => frame?,
            None => return Ok(()),
        };
        let open = match frame.channel {
            Channel::Stdout => stdout_open,
            Channel::Stderr => stderr_open,
        };
        if !open {
            continue;
        }

        let write = async {
            match frame.channel {
                Channel::Stdout => stdout.write_all(&frame.payload).await,
                Channel::Stderr => stderr.write_all(&frame.payload).await,
            }
        };
        let written = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            written = write => written,
        };
        if let Err(e) = written {
            warn!("{} consumer went away, dropping its frames: {e}", frame.channel);
            match frame.channel {
                Channel::Stdout => stdout_open = false,
                Channel::Stderr => stderr_open = false,
            }
            if !stdout_open && !stderr_open {
                return Err(DemuxError::SinksClosed);
            }
        }
    }
}
