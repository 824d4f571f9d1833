//! CLI entrypoint for polyquorum
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use polyquorum_application::{CycleJournal, NoStatus, QuorumEngine, StatusObserver};
use polyquorum_infrastructure::{
    ConfigLoader, FileConfig, JsonlCycleJournal, Scenario, ScenarioPlayer, ScriptedSurface,
};
use polyquorum_presentation::{Cli, ConsoleFormatter, ConsoleStatus, OutputFormatter, SimpleStatus};
use std::io::IsTerminal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&cli);

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    info!("Starting polyquorum");

    // === Configuration ===
    let mut file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    apply_cli_overrides(&mut file_config, &cli);

    let engine_config = file_config
        .to_engine_config()
        .context("Invalid configuration")?;

    if !file_config.output.color {
        colored::control::set_override(false);
    }

    // === Scenario ===
    let scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::demo(),
    };
    let scenario = match &cli.question {
        Some(question) => scenario.with_question(question),
        None => scenario,
    };

    // === Dependency Injection ===
    let surface = Arc::new(ScriptedSurface::new());
    let (mut engine, handle) =
        QuorumEngine::new(engine_config, surface.clone(), surface.clone());

    let status: Arc<dyn StatusObserver> = if cli.quiet || !file_config.output.show_progress {
        Arc::new(NoStatus)
    } else if std::io::stderr().is_terminal() {
        Arc::new(ConsoleStatus::new())
    } else {
        Arc::new(SimpleStatus)
    };
    engine = engine.with_status(status);

    if let Some(path) = cli.journal.as_ref().or(file_config.output.journal.as_ref()) {
        match JsonlCycleJournal::open(path) {
            Some(journal) => {
                let journal: Arc<dyn CycleJournal> = Arc::new(journal);
                engine = engine.with_journal(journal);
            }
            None => warn!("Continuing without a cycle journal"),
        }
    }

    let cancellation = CancellationToken::new();
    let interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let engine_task = tokio::spawn(engine.run(cancellation.clone()));

    // === Run ===
    let player = ScenarioPlayer::new(surface, handle.clone());
    tokio::select! {
        result = player.play(&scenario) => result?,
        _ = cancellation.cancelled() => warn!("Interrupted, stopping early"),
    }

    if let Err(e) = handle.shutdown().await {
        debug!("Engine already stopped: {}", e);
    }
    let report = engine_task.await.context("Engine task failed")?;

    let format = cli.format.or(file_config.output.format).unwrap_or_default();
    println!("{}", ConsoleFormatter.render(format, &report));

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let (file_layer, guard) = match &cli.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "polyquorum.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    guard
}

/// Command-line flags win over every configuration source
fn apply_cli_overrides(config: &mut FileConfig, cli: &Cli) {
    if cli.aggregate {
        config.merge.aggregation = true;
    }
    if let Some(sink) = cli.sink {
        config.merge.sink = sink.as_str().to_string();
    }
    if let Some(timeout) = cli.timeout {
        config.merge.timeout_seconds = timeout;
    }
    if cli.manual {
        config.merge.auto_merge = false;
    }
}
