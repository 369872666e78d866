//! Huddle: a console chat relay over an in-memory session.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use huddle_core::participant::ParticipantDirectory;
use huddle_core::{DeliveryRouter, RelayConfig, job_queue};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod console;
mod session;

use session::DemoSession;

const CONFIG_PATH: &str = "config/huddle.json5";
/// How often the job pump checks for shutdown while idle.
const PUMP_POLL: Duration = Duration::from_millis(50);

fn init_logging() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = RelayConfig::load_or_create(Path::new(CONFIG_PATH))?;
    log::info!("Loaded config from {CONFIG_PATH}");

    let session = Arc::new(DemoSession::new("You"));
    let (guard, pump) = job_queue(config.job_queue_capacity);
    let router = Arc::new(DeliveryRouter::new(session.collaborators(), guard, &config));
    for participant in session.connected() {
        router.participant_joined(&participant);
    }

    // The pump thread is the privileged context: every render runs there.
    let shutdown = CancellationToken::new();
    let pump_task = {
        let shutdown = shutdown.clone();
        tokio::task::spawn_blocking(move || pump.run(PUMP_POLL, || !shutdown.is_cancelled()))
    };

    let lines = console::spawn_line_reader(|| io::stdin().lock())?;
    tokio::select! {
        result = console::run(router, session, lines, shutdown.clone()) => result?,
        result = tokio::signal::ctrl_c() => {
            result?;
            log::info!("Shutdown signal received");
        }
    }

    shutdown.cancel();
    pump_task.await?;
    log::info!("Stopped");
    Ok(())
}
