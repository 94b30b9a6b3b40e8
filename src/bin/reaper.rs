//! Runs entities through their countdowns from the command line.
//!
//! Usage:
//!
//! ```text
//! reaper [--config PATH] simulate --name NAME --age AGE [--cause TEXT]
//!        [--details TEXT] [--event-delay-ms MS] [--short-delay-ms MS]
//!        [--long-delay-ms MS]
//! reaper [--config PATH] config
//! ```
//!
//! `simulate` creates one entity on an in-memory repository, applies the
//! optional cause and details (each after `--event-delay-ms`), waits for the
//! terminal transition and writes the final entity to stdout as JSON.
//! `config` writes the effective configuration. Diagnostics go to stderr.

use clap::{Args, Parser, Subcommand};
use mockable::DefaultClock;
use reaper::config::ReaperConfig;
use reaper::lifecycle::{
    adapters::memory::InMemoryEntityRepository,
    domain::{Entity, EntityId},
    services::{CreateEntityRequest, LifecycleService, LifecycleSettings},
};
use reaper::scheduler::{SchedulerOptions, TaskActionError, TaskFailure};
use reaper::telemetry::init_tracing;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const WAIT_MARGIN: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
#[command(name = "reaper", version, about = "Timed terminal transitions for entities")]
struct Cli {
    /// JSON configuration file; missing files fall back to defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs one entity through its lifecycle and prints the final record.
    Simulate(SimulateArgs),
    /// Prints the effective configuration.
    Config,
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Entity name.
    #[arg(long)]
    name: String,

    /// Entity age in years.
    #[arg(long)]
    age: u32,

    /// Cause recorded before the automatic countdown elapses.
    #[arg(long)]
    cause: Option<String>,

    /// Details recorded after the cause.
    #[arg(long, requires = "cause")]
    details: Option<String>,

    /// Pause before each event, in milliseconds.
    #[arg(long, default_value_t = 0)]
    event_delay_ms: u64,

    /// Overrides the configured short countdown, in milliseconds.
    #[arg(long)]
    short_delay_ms: Option<u64>,

    /// Overrides the configured long countdown, in milliseconds.
    #[arg(long)]
    long_delay_ms: Option<u64>,
}

#[derive(Debug, Error)]
enum SimulationError {
    #[error("terminal transition for entity {entity_id} failed: {error}")]
    ActionFailed {
        entity_id: EntityId,
        error: TaskActionError,
    },

    #[error("entity {entity_id} did not die within {limit:?}")]
    TimedOut { entity_id: EntityId, limit: Duration },
}

impl SimulateArgs {
    fn apply_delays(&self, settings: &mut LifecycleSettings) {
        if let Some(ms) = self.short_delay_ms {
            settings.short_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.long_delay_ms {
            settings.long_delay = Duration::from_millis(ms);
        }
    }

    /// Upper bound on how long the simulated entity can stay alive.
    fn wait_limit(&self, settings: &LifecycleSettings) -> Duration {
        let events = Duration::from_millis(self.event_delay_ms).saturating_mul(2);
        settings
            .short_delay
            .saturating_add(settings.long_delay)
            .saturating_add(events)
            .saturating_add(WAIT_MARGIN)
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config = ReaperConfig::load(cli.config.as_deref())?;
    init_tracing(&config.log_filter)?;

    match cli.command {
        Command::Simulate(args) => {
            let entity = simulate(&config, &args).await?;
            write_json(&entity)
        }
        Command::Config => write_json(&config),
    }
}

async fn simulate(config: &ReaperConfig, args: &SimulateArgs) -> Result<Entity, BoxError> {
    let mut settings = config.lifecycle_settings()?;
    args.apply_delays(&mut settings);
    let limit = args.wait_limit(&settings);

    let (failures_tx, mut failures) = mpsc::unbounded_channel();
    let service = LifecycleService::with_scheduler_options(
        Arc::new(InMemoryEntityRepository::new()),
        Arc::new(DefaultClock),
        settings,
        SchedulerOptions::new().with_failure_sink(failures_tx),
    )?;

    let entity = service
        .create(CreateEntityRequest::new(args.name.as_str(), args.age))
        .await?;
    let entity_id = entity.id();
    let event_delay = Duration::from_millis(args.event_delay_ms);
    if let Some(cause) = &args.cause {
        sleep(event_delay).await;
        service.add_cause(entity_id, cause.as_str()).await?;
    }
    if let Some(details) = &args.details {
        sleep(event_delay).await;
        service.add_details(entity_id, details.as_str()).await?;
    }

    let deadline = Instant::now().checked_add(limit);
    loop {
        if let Ok(failure) = failures.try_recv() {
            return Err(action_failed(failure).into());
        }
        let current = service.status(entity_id).await?;
        if current.is_dead() {
            info!(entity_id = %entity_id, "simulation finished");
            service.shutdown();
            return Ok(current);
        }
        if deadline.is_some_and(|at| Instant::now() >= at) {
            service.shutdown();
            return Err(SimulationError::TimedOut { entity_id, limit }.into());
        }
        debug!(entity_id = %entity_id, state = %current.state(), "waiting for countdown");
        sleep(POLL_INTERVAL).await;
    }
}

fn action_failed(failure: TaskFailure<EntityId>) -> SimulationError {
    SimulationError::ActionFailed {
        entity_id: failure.key,
        error: failure.error,
    }
}

fn write_json(value: &impl serde::Serialize) -> Result<(), BoxError> {
    let json = serde_json::to_string_pretty(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}
