//! Argument parsing, collaborator wiring, and the process entry point.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use clap::{Parser, ValueEnum};
use magnetq_config::ConnectionConfig;
use magnetq_core::{Backoff, PollPolicy, ReleaseMode};
use magnetq_qbit::{Credentials, QbClient};
use magnetq_scrape::PageScraper;
use magnetq_telemetry::{LogFormat, LoggingConfig, init_logging};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, render_summary};
use crate::pipeline::{BatchRequest, run_batch};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ITEM_POLL_SECS: u64 = 10;
const DEFAULT_COMPLETION_POLL_SECS: u64 = 30;
const DEFAULT_MAX_BACKOFF_SECS: u64 = 300;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Parses arguments, runs the batch, and reports the outcome. Returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let run_id = Uuid::new_v4().to_string();

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.map_or_else(LogFormat::infer, LogFormat::from),
        run_id: &run_id,
    };
    if let Err(err) = init_logging(&logging) {
        let err = CliError::failure(anyhow!("{err}"));
        eprintln!("error: {}", err.display_message());
        return err.exit_code();
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; stopping");
            interrupt.cancel();
        }
    });

    let span = info_span!("magnetq.run", run_id = magnetq_telemetry::run_id());
    match execute(cli, cancel).instrument(span).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli, cancel: CancellationToken) -> CliResult<()> {
    let request = cli.batch_request()?;
    let config = magnetq_config::load(&cli.config)
        .map_err(|err| CliError::validation(err.describe()))?;
    let http_timeout = Duration::from_secs(cli.http_timeout);
    let client = daemon_client(&config, http_timeout)?;
    let scraper = PageScraper::new(http_timeout).map_err(CliError::failure)?;

    info!(url = %request.url, save_path = %request.save_path, "starting batch");
    let summary = run_batch(&scraper, &client, &request, cancel).await?;
    render_summary(&summary, cli.output)
}

fn daemon_client(config: &ConnectionConfig, timeout: Duration) -> CliResult<QbClient> {
    let base_url = config
        .base_url()
        .map_err(|err| CliError::validation(err.describe()))?;
    QbClient::new(
        base_url,
        Credentials {
            username: config.username.clone(),
            password: config.password.clone(),
        },
        timeout,
    )
    .map_err(CliError::failure)
}

#[derive(Parser, Debug)]
#[command(
    name = "magnetq",
    version,
    about = "Send every magnet link on a web page to a qBittorrent daemon"
)]
pub(crate) struct Cli {
    /// Page to scan for magnet links.
    url: String,
    /// Directory on the daemon host that receives the downloads.
    save_path: String,
    /// Download one torrent at a time, waiting for each to finish.
    #[arg(short = 'o', long = "one-by-one")]
    one_by_one: bool,
    /// Remove the torrents from the daemon once all are complete. Files are kept.
    #[arg(short = 'r', long = "remove")]
    remove: bool,
    /// Connection configuration file.
    #[arg(long, env = "MAGNETQ_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Category to leave on the added torrents.
    #[arg(long, env = "MAGNETQ_CATEGORY")]
    category: Option<String>,
    /// Seconds to wait for the daemon login before giving up.
    #[arg(long, env = "MAGNETQ_LOGIN_TIMEOUT_SECS", default_value_t = DEFAULT_LOGIN_TIMEOUT_SECS)]
    login_timeout: u64,
    /// Seconds between state checks while downloading one by one.
    #[arg(long, env = "MAGNETQ_ITEM_POLL_SECS", default_value_t = DEFAULT_ITEM_POLL_SECS)]
    item_poll_interval: u64,
    /// Seconds between completion checks before removal.
    #[arg(long, env = "MAGNETQ_COMPLETION_POLL_SECS", default_value_t = DEFAULT_COMPLETION_POLL_SECS)]
    completion_poll_interval: u64,
    /// Give up waiting once this many seconds have passed since the run
    /// started. One budget covers every per-item wait and the completion
    /// wait. Waits forever when absent.
    #[arg(long, env = "MAGNETQ_DEADLINE_SECS")]
    deadline: Option<u64>,
    /// Growth of the delay between polls.
    #[arg(long, env = "MAGNETQ_BACKOFF", value_enum, default_value_t = BackoffMode::Fixed)]
    backoff: BackoffMode,
    /// Largest delay in seconds when backing off exponentially.
    #[arg(long, env = "MAGNETQ_MAX_BACKOFF_SECS", default_value_t = DEFAULT_MAX_BACKOFF_SECS)]
    max_backoff: u64,
    /// Per-request timeout in seconds for the page fetch and daemon calls.
    #[arg(long, env = "MAGNETQ_HTTP_TIMEOUT_SECS", default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    http_timeout: u64,
    /// Summary format written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, env = "MAGNETQ_LOG_LEVEL", default_value = magnetq_telemetry::DEFAULT_LOG_LEVEL)]
    log_level: String,
    /// Log output format; pretty for debug builds, JSON otherwise.
    #[arg(long, env = "MAGNETQ_LOG_FORMAT", value_enum)]
    log_format: Option<LogFormatArg>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum BackoffMode {
    #[default]
    Fixed,
    Exponential,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

impl Cli {
    fn batch_request(&self) -> CliResult<BatchRequest> {
        let url = parse_page_url(&self.url)?;
        if self.save_path.trim().is_empty() {
            return Err(CliError::validation("save path must not be empty"));
        }
        let login_timeout = positive_secs("--login-timeout", self.login_timeout)?;
        let item_interval = positive_secs("--item-poll-interval", self.item_poll_interval)?;
        let completion_interval =
            positive_secs("--completion-poll-interval", self.completion_poll_interval)?;
        let deadline = self
            .deadline
            .map(|secs| positive_secs("--deadline", secs))
            .transpose()?;
        let backoff = match self.backoff {
            BackoffMode::Fixed => Backoff::Fixed,
            BackoffMode::Exponential => Backoff::Exponential {
                max: positive_secs("--max-backoff", self.max_backoff)?,
            },
        };
        let policy = |interval| PollPolicy::every(interval).with_backoff(backoff);

        let mut request = BatchRequest::new(url.to_string(), self.save_path.clone())
            .with_mode(ReleaseMode::from_sequential(self.one_by_one))
            .with_removal(self.remove)
            .with_deadline(deadline);
        request.category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .map(str::to_string);
        request.login_timeout = login_timeout;
        request.item_poll = policy(item_interval);
        request.completion_poll = policy(completion_interval);
        Ok(request)
    }
}

fn parse_page_url(raw: &str) -> CliResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|err| CliError::validation(format!("invalid URL '{raw}': {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(CliError::validation(format!(
            "unsupported URL scheme '{scheme}'; expected http or https"
        ))),
    }
}

fn positive_secs(flag: &str, secs: u64) -> CliResult<Duration> {
    if secs == 0 {
        return Err(CliError::validation(format!("{flag} must be at least 1 second")));
    }
    Ok(Duration::from_secs(secs))
}
