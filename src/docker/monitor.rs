use std::collections::HashSet;
use std::time::Duration;

use log::{error, info};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::task::TaskTracker;

use super::ContainerDescriptor;
use super::filter::matches_name_filter;
use super::listener::{ListenerContext, listen_for_container_logs};

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Periodically lists containers and starts a listener for every new match.
///
/// A container ID gets at most one listener over the lifetime of the monitor.
/// IDs stay registered after their listener ends, so a container that keeps
/// its ID across a restart is not picked up again.
pub struct Monitor {
    ctx: ListenerContext,
    filters: Vec<String>,
    tracker: TaskTracker,
    active: Mutex<HashSet<String>>,
}

impl Monitor {
    pub fn new(ctx: ListenerContext, filters: Vec<String>, tracker: TaskTracker) -> Self {
        Self {
            ctx,
            filters,
            tracker,
            active: Mutex::new(HashSet::new()),
        }
    }

    /// Registers a container whose listener was started elsewhere.
    pub async fn mark_active(&self, id: &str) {
        self.active.lock().await.insert(id.to_string());
    }

    /// Starts listeners for the matching containers that have none yet and
    /// returns how many were started.
    pub async fn reconcile(&self, containers: &[ContainerDescriptor]) -> usize {
        let discovered: Vec<&ContainerDescriptor> = {
            let mut active = self.active.lock().await;
            containers
                .iter()
                .filter(|c| matches_name_filter(&c.names, &self.filters))
                .filter(|c| active.insert(c.id.clone()))
                .collect()
        };

        for container in &discovered {
            info!(
                "Discovered new container matching filter: {} ({})",
                container.display_name(),
                container.short_id()
            );
            self.tracker.spawn(listen_for_container_logs(
                self.ctx.clone(),
                (*container).clone(),
                None,
            ));
        }
        discovered.len()
    }

    pub async fn run(self) {
        let cancel = self.ctx.cancel.clone();
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let listed = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                listed = self.ctx.engine.list_containers() => listed,
            };
            match listed {
                Ok(containers) => {
                    self.reconcile(&containers).await;
                }
                Err(e) => error!("Error listing containers during monitoring: {e}"),
            }
        }
        info!("Container monitoring stopped.");
    }
}
