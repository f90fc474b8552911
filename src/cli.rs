use std::sync::OnceLock;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

/// Forwards structured container logs to a remote logger service.
///
/// Every option can also be set through the environment variable named in
/// its help text.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// URL every structured log line is posted to.
    #[arg(long, env = "LOGGER_SERVICE_URL", default_value = "http://127.0.0.1")]
    pub logger_service_url: String,

    /// Name of the header carrying the logger service credentials.
    #[arg(long, env = "LOGGER_AUTH_HEADER_NAME", default_value = "Authorization")]
    pub logger_auth_header_name: String,

    /// Value of the auth header. The header is omitted when empty.
    #[arg(
        long,
        env = "LOGGER_AUTH_HEADER_VALUE",
        default_value = "",
        hide_env_values = true
    )]
    pub logger_auth_header_value: String,

    /// Timeout of a single request to the logger service, in seconds.
    #[arg(long, env = "HTTP_CLIENT_TIMEOUT_SECONDS", default_value_t = 10)]
    pub http_client_timeout_seconds: u64,

    /// Historical lines replayed for containers found at startup.
    #[arg(long, env = "LOG_TAIL_COUNT", default_value = "10")]
    pub log_tail_count: String,

    /// Keep watching for new matching containers instead of following only
    /// the first one found at startup.
    #[arg(
        long,
        env = "LISTEN_ALL_CONTAINERS",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub listen_all_containers: bool,

    /// Comma separated container name prefixes. Empty matches every container.
    #[arg(long, env = "CONTAINER_NAME_FILTERS", default_value = "app,application")]
    pub container_name_filters: String,
}

static ARGS: OnceLock<Args> = OnceLock::new();

pub fn get_cli_args() -> &'static Args {
    ARGS.get_or_init(Args::parse)
}
