//! vloop sequencer - main entry point
//!
//! Runs the playback sequencer against the simulated player runtime and
//! takes intents from a console on stdin (or a script file).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vloop_common::events::{EventBus, VloopEvent};
use vloop_common::SystemClock;
use vloop_seq::config::Config;
use vloop_seq::console;
use vloop_seq::playback::{self, PlaybackEngine, Sequencer};
use vloop_seq::player::SimulatedPlayerFactory;

const EVENT_BUS_CAPACITY: usize = 256;

/// Command-line arguments for vloop-seq
#[derive(Parser, Debug)]
#[command(name = "vloop-seq")]
#[command(about = "Looping playlist sequencer for embedded video players")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "VLOOP_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "vloop_seq=info,vloop_common=info", env = "VLOOP_LOG")]
    log_level: String,

    /// Length of every simulated clip
    #[arg(long, default_value = "20", env = "VLOOP_SIMULATED_DURATION_SECS")]
    simulated_duration_secs: u64,

    /// Read console commands from this file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting vloop sequencer");

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Engine channel first: the simulated runtime reports into it
    let (handle, inbox) = playback::channel();
    let factory = SimulatedPlayerFactory::new(
        handle.adapter_sink(),
        Duration::from_secs(args.simulated_duration_secs),
    );
    let sequencer = Sequencer::new(
        config.entries,
        config.schedule,
        Box::new(factory),
        Arc::new(SystemClock),
        config.settings,
    );

    let events = EventBus::new(EVENT_BUS_CAPACITY);
    let mut status_rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match status_rx.recv().await {
                Ok(VloopEvent::StatusChanged { status, .. }) => println!("> {}", status),
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Status printer lagged, {} events dropped", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let engine = tokio::spawn(PlaybackEngine::new(sequencer, inbox, events).run());
    handle
        .runtime_ready()
        .context("Playback engine is not running")?;
    info!("Playback engine initialized");
    println!("{}", console::HELP);

    let console_result = tokio::select! {
        result = run_console(&handle, args.script) => result,
        _ = shutdown_signal() => Ok(()),
    };

    handle.shutdown().await.context("Failed to stop playback engine")?;
    engine.await.context("Playback engine task failed")?;
    info!("Shutdown complete");
    console_result
}

async fn run_console(handle: &playback::EngineHandle, script: Option<PathBuf>) -> Result<()> {
    match script {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Failed to open script {}", path.display()))?;
            console::run(handle, BufReader::new(file)).await?;
            // A script only sets things up; keep playing until interrupted
            std::future::pending::<()>().await;
            Ok(())
        }
        None => {
            console::run(handle, BufReader::new(tokio::io::stdin())).await?;
            Ok(())
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
