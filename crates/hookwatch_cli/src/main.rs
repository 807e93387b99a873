//! hookwatch - service binary polling GitHub pull requests into Elasticsearch.

mod config;
mod logging;
mod server;
mod shutdown;

use clap::Parser;

use hookwatch::{Crawler, GitHubClient, RateLimitTracker, Scheduler, SearchClient};

use crate::config::Config;
use crate::logging::LogFormat;
use crate::server::AppState;

#[derive(Parser)]
#[command(name = "hookwatch")]
#[command(version)]
#[command(about = "Index GitHub pull requests into Elasticsearch")]
#[command(
    long_about = "hookwatch walks every repository visible to a GitHub token, one repository \
per poll interval. Pull requests are written to an Elasticsearch index under a deterministic \
ID so that each state is stored once, and a pull_request webhook pointing at this service is \
registered on repositories that lack one."
)]
#[command(after_long_help = r#"EXAMPLES
    Run with ./config.yaml or /app/config.yaml:
        $ hookwatch

    Run with a different config file name:
        $ hookwatch --config staging

    Override settings from the environment:
        $ HOOK_GITHUB_TOKEN=ghp_... HOOK_GITHUB__POLL_INTERVAL_SECS=60 hookwatch
"#)]
struct Cli {
    /// Config file name without extension, looked up in /app and the working directory
    #[arg(long, default_value = "config")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration (config file -> env vars -> defaults)
    let (config, load_error) = match Config::load(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    logging::init(
        &config.logging.level,
        LogFormat::parse(&config.logging.format),
    );

    if let Some(e) = load_error {
        tracing::warn!(error = %e, "failed to load configuration, using defaults");
    }

    let Some(token) = config.github.token.as_deref().filter(|t| !t.is_empty()) else {
        tracing::error!("github.token is not set");
        return Err("github.token is not set".into());
    };

    let search = match SearchClient::connect(&config.search_settings()).await {
        Ok(search) => search,
        Err(e) => {
            tracing::error!(index = %config.elastic.index, error = %e, "search engine unavailable");
            return Err(e.into());
        }
    };

    let rate_limit = RateLimitTracker::new();
    let github = GitHubClient::new(
        &config.github.api_url,
        token,
        rate_limit.clone(),
        config.request_timeout(),
    )?
    .with_pr_page_size(config.github.pr_page_size)
    .with_webhook_page_size(config.github.webhook_page_size);

    let webhook_target = config.webhook_target();
    match &webhook_target {
        Some(url) => tracing::info!(%url, "webhook target"),
        None => tracing::warn!("github.public_address is not set, webhooks will not be managed"),
    }

    let mut scheduler = Scheduler::start(
        Crawler::new(github, search, webhook_target),
        config.poll_interval(),
    );

    let (trigger, shutdown) = shutdown::channel();
    let router = server::build_router(AppState { rate_limit }, config.metrics_path().as_deref());
    let mut server = tokio::spawn(server::serve(config.port, router, shutdown.wait()));

    let mut server_result = None;
    tokio::select! {
        _ = shutdown::ctrl_c() => {}
        _ = scheduler.finished() => {}
        result = &mut server => server_result = Some(result),
    }

    trigger.trigger();
    let exit = scheduler.stop().await?;
    let server_result = match server_result {
        Some(result) => result,
        None => server.await,
    };

    if let Err(e) = server_result? {
        tracing::error!(error = %e, "http server failed");
        return Err(e.into());
    }

    if let Some(e) = exit.error {
        return Err(e.into());
    }

    tracing::info!(ticks = exit.ticks, "stopped");
    Ok(())
}
