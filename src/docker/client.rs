//! Docker client module using bollard.
//!
//! [`DockerEngine`] wraps a bollard connection and exposes it as a
//! [`ContainerEngine`].

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::LogOutput;
use bollard::query_parameters::{
    ListContainersOptions, ListContainersOptionsBuilder, LogsOptions, LogsOptionsBuilder,
};
use futures::stream::{self, StreamExt};

use super::{
    Channel, ContainerDescriptor, ContainerEngine, EngineError, FrameStream, LogFrame,
    LogStreamOptions,
};

/// Tail value that replays no history.
const NO_REPLAY_TAIL: &str = "0";

#[derive(Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connects using the default method (Unix socket on Linux/macOS, named
    /// pipe on Windows).
    pub fn connect() -> Result<Self, EngineError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }
}

fn frame_from_output(output: LogOutput) -> Option<LogFrame> {
    match output {
        LogOutput::StdOut { message } | LogOutput::Console { message } => {
            Some(LogFrame::new(Channel::Stdout, message))
        }
        LogOutput::StdErr { message } => Some(LogFrame::new(Channel::Stderr, message)),
        LogOutput::StdIn { .. } => None,
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn list_containers(&self) -> Result<Vec<ContainerDescriptor>, EngineError> {
        let options: ListContainersOptions = ListContainersOptionsBuilder::new().all(false).build();

        let summaries = self.docker.list_containers(Some(options)).await?;

        Ok(summaries
            .into_iter()
            .filter_map(|summary| {
                Some(ContainerDescriptor {
                    id: summary.id?,
                    names: summary.names.unwrap_or_default(),
                    image: summary.image.unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn open_log_stream(
        &self,
        container_id: &str,
        options: &LogStreamOptions,
    ) -> Result<FrameStream, EngineError> {
        let tail = options.tail.as_deref().unwrap_or(NO_REPLAY_TAIL);
        let logs_options: LogsOptions = LogsOptionsBuilder::new()
            .stdout(options.stdout)
            .stderr(options.stderr)
            .follow(options.follow)
            .timestamps(options.timestamps)
            .tail(tail)
            .build();

        let mut frames = self
            .docker
            .logs(container_id, Some(logs_options))
            .filter_map(|item| async move {
                match item {
                    Ok(output) => frame_from_output(output).map(Ok),
                    Err(e) => Some(Err(EngineError::from(e))),
                }
            })
            .boxed();

        // The request is only sent on the first poll, so an engine refusal
        // shows up as the first item.
        match frames.next().await {
            Some(Err(e)) => Err(e),
            Some(Ok(first)) => Ok(stream::once(async move { Ok(first) })
                .chain(frames)
                .boxed()),
            None => Ok(stream::empty().boxed()),
        }
    }
}
