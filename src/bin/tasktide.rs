//! Tasktide server: runs the lifecycle engine and serves the task API.

use camino::Utf8PathBuf;
use clap::Parser;
use eyre::WrapErr;
use mockable::DefaultClock;
use std::sync::Arc;
use tasktide::api::{ApiServer, TaskApi};
use tasktide::config::AppConfig;
use tasktide::task::adapters::file::JsonFileTaskStore;
use tasktide::task::adapters::runtime::{TokioScheduler, TracingNotifier};
use tasktide::task::services::LifecycleEngine;
use tasktide::telemetry;
use tracing::{info, warn};

/// Personal task tracker with timer-driven status transitions.
#[derive(Debug, Parser)]
#[command(name = "tasktide", version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<Utf8PathBuf>,

    /// JSON file holding the task collection.
    #[arg(long)]
    data_file: Option<Utf8PathBuf>,

    /// Interface to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind.
    #[arg(short, long)]
    port: Option<u16>,
}

impl Cli {
    fn resolve_config(&self) -> eyre::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        config.apply_process_env()?;
        if let Some(data_file) = &self.data_file {
            config.storage.data_file.clone_from(data_file);
        }
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    telemetry::init_tracing(&config.logging.filter)?;

    let store = Arc::new(
        JsonFileTaskStore::open(&config.storage.data_file)
            .wrap_err_with(|| format!("opening {}", config.storage.data_file))?,
    );
    if store.initialise()? {
        info!(path = %store.path(), "created empty task data file");
    }

    let clock = Arc::new(DefaultClock);
    let engine = LifecycleEngine::new(
        Arc::clone(&store),
        Arc::new(TokioScheduler::current()?),
        Arc::new(TracingNotifier::new(config.notifications.desktop)),
        Arc::clone(&clock),
        config.lifecycle_policy(),
    );
    let report = tokio::task::spawn_blocking({
        let engine = engine.clone();
        move || engine.start()
    })
    .await??;
    if let Some(warning) = report.warning {
        warn!(error = %warning, "started with an empty task list");
    }

    let reload_engine = engine.clone();
    let api = TaskApi::new(Arc::clone(&store), clock).with_change_hook(Arc::new(move || {
        if let Err(err) = reload_engine.reload() {
            warn!(error = %err, "engine reload after API write failed");
        }
    }));
    let server = ApiServer::start(Arc::new(api), &config.server.host, config.server.port).await?;
    info!(addr = %server.addr(), "tasktide running; press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .wrap_err("waiting for Ctrl-C")?;

    server.shutdown();
    engine.shutdown();
    info!("tasktide stopped");
    Ok(())
}
