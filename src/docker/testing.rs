//! In-memory [`ContainerEngine`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use super::{
    ContainerDescriptor, ContainerEngine, EngineError, FrameStream, LogFrame, LogStreamOptions,
};

pub fn container(id: &str, name: &str) -> ContainerDescriptor {
    ContainerDescriptor {
        id: id.to_string(),
        names: vec![name.to_string()],
        image: "example/app:latest".to_string(),
    }
}

pub fn server_error(status_code: u16, message: &str) -> EngineError {
    EngineError::DockerApi(bollard::errors::Error::DockerResponseServerError {
        status_code,
        message: message.to_string(),
    })
}

/// How the log stream of a fake container behaves.
#[derive(Debug, Clone)]
pub enum LogScript {
    /// Yields the frames, then ends like a stopped container.
    Frames(Vec<LogFrame>),
    /// Yields the frames, then fails.
    FramesThenError(Vec<LogFrame>),
    /// Yields the frames, then waits forever like a quiet running container.
    FramesThenPending(Vec<LogFrame>),
    OpenError,
}

#[derive(Default)]
pub struct FakeEngine {
    containers: Mutex<Vec<ContainerDescriptor>>,
    logs: Mutex<HashMap<String, LogScript>>,
    failing_lists: AtomicUsize,
    list_calls: AtomicUsize,
    opened: Mutex<Vec<(String, LogStreamOptions)>>,
}

impl FakeEngine {
    pub fn with_containers(containers: Vec<ContainerDescriptor>) -> Self {
        let engine = Self::default();
        engine.set_containers(containers);
        engine
    }

    pub fn set_containers(&self, containers: Vec<ContainerDescriptor>) {
        *self.containers.lock().unwrap() = containers;
    }

    pub fn set_logs(&self, id: &str, script: LogScript) {
        self.logs.lock().unwrap().insert(id.to_string(), script);
    }

    /// Makes the next `count` listings fail.
    pub fn fail_next_lists(&self, count: usize) {
        self.failing_lists.store(count, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Every `open_log_stream` call, in order.
    pub fn opened(&self) -> Vec<(String, LogStreamOptions)> {
        self.opened.lock().unwrap().clone()
    }

    pub fn opened_ids(&self) -> Vec<String> {
        self.opened().into_iter().map(|(id, _)| id).collect()
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn list_containers(&self) -> Result<Vec<ContainerDescriptor>, EngineError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_lists
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(server_error(500, "engine unavailable"));
        }
        Ok(self.containers.lock().unwrap().clone())
    }

    async fn open_log_stream(
        &self,
        container_id: &str,
        options: &LogStreamOptions,
    ) -> Result<FrameStream, EngineError> {
        self.opened
            .lock()
            .unwrap()
            .push((container_id.to_string(), options.clone()));

        let script = self
            .logs
            .lock()
            .unwrap()
            .get(container_id)
            .cloned()
            .unwrap_or(LogScript::FramesThenPending(Vec::new()));

        let stream: FrameStream = match script {
            LogScript::Frames(frames) => stream::iter(frames.into_iter().map(Ok)).boxed(),
            LogScript::FramesThenError(frames) => stream::iter(frames.into_iter().map(Ok))
                .chain(stream::once(async {
                    Err(server_error(500, "unexpected EOF"))
                }))
                .boxed(),
            LogScript::FramesThenPending(frames) => stream::iter(frames.into_iter().map(Ok))
                .chain(stream::pending())
                .boxed(),
            LogScript::OpenError => {
                return Err(server_error(
                    404,
                    &format!("No such container: {container_id}"),
                ));
            }
        };
        Ok(stream)
    }
}
