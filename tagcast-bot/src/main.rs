//! tagcast-bot - Republish newly tagged questions as status updates
//!
//! Polls the Stack Exchange search API and posts every new question to
//! Twitter exactly once, restarting the loop if it ever crashes.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use libtagcast::config::Config;
use libtagcast::logging::{LogFormat, LoggingConfig};
use libtagcast::platforms::twitter::TwitterClient;
use libtagcast::publisher::{LoopSettings, PublisherLoop};
use libtagcast::sources::stackexchange::StackExchangeSource;
use libtagcast::{Credentials, DeliveryMode, TagcastError, Watermark};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "tagcast-bot")]
#[command(version)]
#[command(about = "Republish newly tagged Stack Exchange questions to Twitter")]
#[command(long_about = "\
tagcast-bot - Republish newly tagged Stack Exchange questions to Twitter

DESCRIPTION:
    tagcast-bot searches a Stack Exchange site for questions carrying the
    configured tags and posts each new one as a status update of the form

        \"<question title>\" #<hashtag> <link>

    Every question is posted at most once per process. If the loop crashes
    it is restarted with fresh state after the supervisor delay.

USAGE:
    tagcast-bot --consumerkey KEY --consumersecret SECRET \\
                --accesstoken TOKEN --accesstokensecret TOKEN_SECRET

CONFIGURATION:
    Configuration file: ~/.config/tagcast/config.toml (optional)

    [search]
    site = \"stackoverflow\"
    tags = [\"neo4j\", \"cypher\"]
    hashtag = \"neo4j\"

    [publish]
    post_delay_secs = 10
    poll_interval_secs = 300
    delivery = \"at_most_once\"   # or \"retry_on_failure\"

    [log]
    level = \"info\"
    format = \"text\"             # text, json or pretty

EXIT CODES:
    0 - Clean exit (--once)
    1 - Missing credentials or configuration error
")]
struct Cli {
    /// Consumer key from Twitter. See: https://dev.twitter.com/apps/new
    #[arg(
        long = "consumerkey",
        env = "TAGCAST_CONSUMER_KEY",
        default_value = "",
        hide_env_values = true
    )]
    consumer_key: String,

    /// Consumer secret from Twitter. See: https://dev.twitter.com/apps/new
    #[arg(
        long = "consumersecret",
        env = "TAGCAST_CONSUMER_SECRET",
        default_value = "",
        hide_env_values = true
    )]
    consumer_secret: String,

    /// Access token from Twitter
    #[arg(
        long = "accesstoken",
        env = "TAGCAST_ACCESS_TOKEN",
        default_value = "",
        hide_env_values = true
    )]
    access_token: String,

    /// Access token secret from Twitter
    #[arg(
        long = "accesstokensecret",
        env = "TAGCAST_ACCESS_TOKEN_SECRET",
        default_value = "",
        hide_env_values = true
    )]
    access_token_secret: String,

    /// Path to config file (default: ~/.config/tagcast/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Time between search rounds, e.g. "5m" (overrides config)
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    poll_interval: Option<Duration>,

    /// Pause after each post, e.g. "10s" (overrides config)
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    post_delay: Option<Duration>,

    /// Retry failed posts on the next round instead of dropping them
    #[arg(long)]
    retry_failed: bool,

    /// Log output format: text, json or pretty (overrides config)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Run one search round and exit (for testing)
    #[arg(long, hide = true)]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let credentials = Credentials::new(
        cli.consumer_key.clone(),
        cli.consumer_secret.clone(),
        cli.access_token.clone(),
        cli.access_token_secret.clone(),
    );

    if let Err(e) = credentials.validate() {
        println!("You must set the --consumerkey and --consumersecret flags.");
        println!("---");
        println!("{}", Cli::command().render_usage());
        std::process::exit(e.exit_code());
    }

    if let Err(e) = run(cli, credentials).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<TagcastError>()
            .map(TagcastError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli, credentials: Credentials) -> anyhow::Result<()> {
    let mut config =
        Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, &cli);

    LoggingConfig::resolve(cli.log_format, cli.verbose, &config.log).init();

    let credentials = Arc::new(credentials);

    if cli.once {
        let mut publisher = build_loop(&config, credentials)?;
        let report = publisher.run_cycle().await;
        info!(
            "Processed one round: {} fetched, {} published, {} failed, {} skipped",
            report.fetched, report.published, report.failed, report.skipped
        );
        return Ok(());
    }

    supervise(config, credentials).await
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(interval) = cli.poll_interval {
        config.publish.poll_interval_secs = interval.as_secs();
    }
    if let Some(delay) = cli.post_delay {
        config.publish.post_delay_secs = delay.as_secs();
    }
    if cli.retry_failed {
        config.publish.delivery = DeliveryMode::RetryOnFailure;
    }
}

/// Build a loop with fresh state: empty posted set, watermark from now
fn build_loop(
    config: &Config,
    credentials: Arc<Credentials>,
) -> libtagcast::Result<PublisherLoop> {
    let source = StackExchangeSource::new(config.search.clone())?;
    let platform = TwitterClient::new(credentials, config.publish.endpoint.clone())?;
    let watermark = Watermark::at_start(
        chrono::Utc::now().timestamp(),
        config.search.lookback_secs,
    );

    Ok(PublisherLoop::new(
        Box::new(source),
        Box::new(platform),
        LoopSettings::from(config),
        watermark,
    ))
}

/// Keep a publisher loop running, restarting it after a crash
///
/// Each restart builds a brand new loop, so nothing from the crashed one
/// (posted set, watermark) carries over.
async fn supervise(config: Config, credentials: Arc<Credentials>) -> anyhow::Result<()> {
    let restart_delay = config.supervisor.restart_delay();

    loop {
        let mut publisher = build_loop(&config, credentials.clone())?;
        let handle = tokio::spawn(async move { publisher.run().await });

        match handle.await {
            Ok(()) => warn!("Publisher loop exited unexpectedly"),
            Err(e) if e.is_panic() => error!("Publisher loop panicked: {}", e),
            Err(e) => error!("Publisher loop stopped: {}", e),
        }

        info!("Restarting publisher loop in {:?}", restart_delay);
        sleep(restart_delay).await;
    }
}
