use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use walg_pruner::shutdown::install_signal_handlers;
use walg_pruner::{Config, EnvDir, PostgresProbe, PruneScheduler, Shutdown, TokioCommandRunner};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.validate().context("Invalid configuration")?;

    let level = config.tracing_level()?.as_str().to_ascii_lowercase();
    let env_filter = EnvFilter::from_default_env()
        .add_directive(format!("walg_pruner={}", level).parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting WAL-G backup pruner");

    let shutdown = Shutdown::new();
    install_signal_handlers(shutdown.clone())
        .context("Failed to install signal handlers")?;

    let envdir = EnvDir::new(&config.envdir);
    info!("Reading environment variables from {}", envdir.path().display());
    let vars = envdir.refresh().await?;
    debug!("Loaded {} variable(s) from envdir", vars.len());

    let settings = config.cycle_settings();
    debug!("Using interval: {}s", settings.interval.as_secs());
    debug!("Retain count: {}", settings.retain);
    debug!("After timestamp: {:?}", settings.after);
    debug!("Database settings: {:?}", config.database_settings());

    let probe = Arc::new(PostgresProbe::new(
        config.database_settings(),
        Some(envdir.clone()),
    ));
    let runner = TokioCommandRunner::new(Some(envdir));

    let scheduler = PruneScheduler::new(settings, probe, runner, shutdown);
    scheduler.run().await;

    info!("WAL-G backup pruner stopped");
    Ok(())
}
