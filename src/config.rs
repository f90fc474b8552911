use std::time::Duration;

use crate::cli::Args;

/// Settings of one run, resolved from the command line and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub logger_service_url: String,
    pub logger_auth_header_name: String,
    pub logger_auth_header_value: String,
    pub http_client_timeout: Duration,
    /// Lines replayed for containers found at startup. `None` replays nothing.
    pub log_tail_count: Option<String>,
    pub listen_all: bool,
    pub container_name_filters: Vec<String>,
}

impl Config {
    pub fn from_args(args: &Args) -> Self {
        let tail = args.log_tail_count.trim();
        Self {
            logger_service_url: args.logger_service_url.clone(),
            logger_auth_header_name: args.logger_auth_header_name.clone(),
            logger_auth_header_value: args.logger_auth_header_value.clone(),
            http_client_timeout: Duration::from_secs(args.http_client_timeout_seconds),
            log_tail_count: (!tail.is_empty()).then(|| tail.to_string()),
            listen_all: args.listen_all_containers,
            container_name_filters: parse_filters(&args.container_name_filters),
        }
    }

    /// The auth header to send, if a value was configured.
    pub fn auth_header(&self) -> Option<(&str, &str)> {
        if self.logger_auth_header_value.is_empty() {
            return None;
        }
        Some((
            self.logger_auth_header_name.as_str(),
            self.logger_auth_header_value.as_str(),
        ))
    }

    pub fn log_summary(&self) {
        log::info!("Logger Service URL: {}", self.logger_service_url);
        match self.auth_header() {
            Some((name, _)) => log::info!("Logger Auth Header: {name} (value hidden)"),
            None => log::info!("Logger Auth Header: none"),
        }
        log::info!("HTTP Client Timeout: {:?}", self.http_client_timeout);
        log::info!(
            "Log Tail Count: {}",
            self.log_tail_count.as_deref().unwrap_or("none")
        );
        log::info!("Listen to All Containers: {}", self.listen_all);
        log::info!("Container Name Filters: {:?}", self.container_name_filters);
    }
}

/// Splits a comma separated filter list, trimming every entry.
pub fn parse_filters(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|f| f.trim().to_string()).collect()
}
