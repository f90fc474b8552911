use std::time::Duration;

use log::info;
use thiserror::Error;
use tokio_util::task::TaskTracker;

use crate::config::Config;
use crate::docker::filter::matches_name_filter;
use crate::docker::listener::{ListenerContext, listen_for_container_logs};
use crate::docker::monitor::Monitor;
use crate::docker::{ContainerDescriptor, EngineError};

/// How long to linger before exiting when there is nothing to follow.
const NOTHING_TO_DO_GRACE: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("failed to list containers: {0}")]
    InitialListing(#[from] EngineError),
}

/// Starts listeners for the containers running now and, when following all
/// of them, the monitor for the ones started later. Returns once every task
/// has finished.
pub async fn run(ctx: ListenerContext, config: &Config) -> Result<(), DispatchError> {
    let listed = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => return Ok(()),
        listed = ctx.engine.list_containers() => listed?,
    };
    let matching: Vec<ContainerDescriptor> = listed
        .into_iter()
        .filter(|c| matches_name_filter(&c.names, &config.container_name_filters))
        .collect();

    if matching.is_empty() {
        info!("No running containers matching the name filters found initially.");
        if !config.listen_all {
            info!(
                "LISTEN_ALL_CONTAINERS is false. Exiting in {} seconds as no initial matching containers were found.",
                NOTHING_TO_DO_GRACE.as_secs()
            );
            tokio::select! {
                _ = ctx.cancel.cancelled() => {}
                _ = tokio::time::sleep(NOTHING_TO_DO_GRACE) => {}
            }
            return Ok(());
        }
        info!("Will monitor for new containers.");
    } else {
        info!(
            "Found {} running container(s) matching filters:",
            matching.len()
        );
        for c in &matching {
            info!(
                "  ID: {}, Name(s): {:?}, Image: {}",
                c.short_id(),
                c.names,
                c.image
            );
        }
    }

    let tracker = TaskTracker::new();
    if config.listen_all {
        let monitor = Monitor::new(
            ctx.clone(),
            config.container_name_filters.clone(),
            tracker.clone(),
        );
        for container in matching {
            monitor.mark_active(&container.id).await;
            tracker.spawn(listen_for_container_logs(
                ctx.clone(),
                container,
                config.log_tail_count.clone(),
            ));
        }
        tracker.spawn(monitor.run());
    } else if let Some(target) = matching.into_iter().next() {
        tracker.spawn(listen_for_container_logs(
            ctx.clone(),
            target,
            config.log_tail_count.clone(),
        ));
    }

    tracker.close();
    tracker.wait().await;
    info!("Program finished.");
    Ok(())
}
