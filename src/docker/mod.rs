//! Container engine capability and the per-container log machinery built on it.
//!
//! The rest of the crate only talks to the engine through [`ContainerEngine`],
//! so the listener and the monitor can be driven by an in-memory engine in tests.

pub mod client;
pub mod demux;
pub mod filter;
pub mod listener;
pub mod monitor;

#[cfg(test)]
pub mod testing;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Docker API error: {0}")]
    DockerApi(#[from] bollard::errors::Error),
}

/// Snapshot of one running container as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDescriptor {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
}

impl ContainerDescriptor {
    /// First 12 characters of the engine ID, the way `docker ps` shows it.
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    /// First reported name without its leading `/`, or the short ID for
    /// unnamed containers.
    pub fn display_name(&self) -> String {
        match self.names.first() {
            Some(name) => name.strip_prefix('/').unwrap_or(name).to_string(),
            None => self.short_id().to_string(),
        }
    }
}

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(12) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Which side of the multiplexed log stream a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Stdout,
    Stderr,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Stdout => f.write_str("STDOUT"),
            Channel::Stderr => f.write_str("STDERR"),
        }
    }
}

/// One decoded frame of a multiplexed log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFrame {
    pub channel: Channel,
    pub payload: Bytes,
}

impl LogFrame {
    pub fn new(channel: Channel, payload: impl Into<Bytes>) -> Self {
        Self {
            channel,
            payload: payload.into(),
        }
    }
}

pub type FrameStream = BoxStream<'static, Result<LogFrame, EngineError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStreamOptions {
    pub stdout: bool,
    pub stderr: bool,
    pub follow: bool,
    pub timestamps: bool,
    /// Number of historical lines to replay. `None` follows from now on.
    pub tail: Option<String>,
}

impl LogStreamOptions {
    /// Both channels, follow mode and timestamps, replaying `tail` lines first.
    pub fn follow_with_tail(tail: Option<String>) -> Self {
        Self {
            stdout: true,
            stderr: true,
            follow: true,
            timestamps: true,
            tail,
        }
    }
}

#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Lists the currently running containers.
    async fn list_containers(&self) -> Result<Vec<ContainerDescriptor>, EngineError>;

    /// Opens the multiplexed log stream of a container.
    ///
    /// Errors returned here mean the stream could not be opened at all.
    /// Errors yielded by the stream itself mean it broke off midway.
    async fn open_log_stream(
        &self,
        container_id: &str,
        options: &LogStreamOptions,
    ) -> Result<FrameStream, EngineError>;
}
