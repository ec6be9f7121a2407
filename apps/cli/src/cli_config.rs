use std::path::PathBuf;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Parser)]
#[command(name = "authconsole")]
#[command(about = "Edit authentication settings forms and delete list page rows")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Answer given to every confirmation prompt
    #[arg(
        long,
        env = "AUTHCONSOLE_CONFIRM",
        default_value = "true",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub confirm: bool,

    #[command(flatten)]
    pub http: HttpArgs,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Load the authentication page, replay an edit script, and submit
    Form(FormArgs),
    /// Delete selected actions of one event source
    DeleteActions {
        #[command(flatten)]
        server: ServerArgs,
        /// Event source of the action list
        eventsource: String,
        /// Action identifiers
        #[arg(required = true)]
        actionids: Vec<String>,
    },
    /// Delete selected hosts
    DeleteHosts {
        #[command(flatten)]
        server: ServerArgs,
        /// Host identifiers
        #[arg(required = true)]
        hostids: Vec<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct FormArgs {
    /// JSON page data the form is opened with
    #[arg(long, env = "AUTHCONSOLE_PAGE_DATA")]
    pub page_data: PathBuf,

    /// JSON edit script replayed against the form
    #[arg(long, env = "AUTHCONSOLE_EDIT_SCRIPT")]
    pub edit_script: Option<PathBuf>,

    /// Print the rendered table rows before the submitted body
    #[arg(
        long,
        env = "AUTHCONSOLE_RENDER_HTML",
        default_value = "false",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub render_html: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    /// Console entry point, e.g. https://monitor.example.com/zabbix.php
    #[arg(long, env = "AUTHCONSOLE_SERVER_URL")]
    pub server_url: Url,
}

#[derive(Debug, Clone, Args)]
pub struct HttpArgs {
    /// Request timeout in milliseconds
    #[arg(long, env = "AUTHCONSOLE_HTTP_TIMEOUT_MS", default_value_t = 10_000)]
    pub http_timeout_ms: u64,

    /// Attempts per request; transient failures are retried
    #[arg(long, env = "AUTHCONSOLE_HTTP_MAX_ATTEMPTS", default_value_t = 1)]
    pub http_max_attempts: u8,

    /// Linear retry backoff in milliseconds
    #[arg(long, env = "AUTHCONSOLE_HTTP_RETRY_BACKOFF_MS", default_value_t = 250)]
    pub http_retry_backoff_ms: u64,
}

impl HttpArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
