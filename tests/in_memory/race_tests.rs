//! Events racing countdown expiry on a multi-threaded runtime.

use super::helpers::{CountingRepository, TerminalWrite, repository, start_service};
use reaper::lifecycle::{
    domain::{LifecycleDomainError, LifecycleState},
    services::{CreateEntityRequest, LifecycleError, LifecycleSettings},
};
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const ENTITIES: usize = 64;

/// Event delays in milliseconds, straddling the 20ms automatic countdown.
const JITTER_MS: [u64; 5] = [15, 17, 19, 21, 23];

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_cause_and_countdown_write_exactly_once(
    repository: Arc<CountingRepository>,
) -> eyre::Result<()> {
    let settings = LifecycleSettings::new(Duration::from_millis(20), Duration::from_millis(40));
    let service = Arc::new(start_service(&repository, settings));

    let mut racers = Vec::new();
    for (index, jitter) in JITTER_MS.iter().copied().cycle().take(ENTITIES).enumerate() {
        let entity = service
            .create(CreateEntityRequest::new(format!("entity-{index}"), 20))
            .await?;
        let racing = Arc::clone(&service);
        racers.push(tokio::spawn(async move {
            sleep(Duration::from_millis(jitter)).await;
            (entity.id(), racing.add_cause(entity.id(), "raced").await)
        }));
    }

    let mut outcomes = Vec::new();
    for racer in racers {
        outcomes.push(racer.await?);
    }
    sleep(Duration::from_millis(300)).await;

    for (id, outcome) in outcomes {
        let entity = service.status(id).await?;
        eyre::ensure!(entity.state() == LifecycleState::Dead, "entity {id} still alive");
        let writes = repository.terminal_writes(id);
        match outcome {
            Ok(_) => {
                eyre::ensure!(writes == vec![TerminalWrite::Final], "entity {id}: {writes:?}");
                eyre::ensure!(entity.cause().map(|cause| cause.as_str()) == Some("raced"));
            }
            Err(
                LifecycleError::CountdownElapsed(_)
                | LifecycleError::Domain(LifecycleDomainError::InvalidTransition { .. }),
            ) => {
                eyre::ensure!(
                    writes == vec![TerminalWrite::Automatic],
                    "entity {id}: {writes:?}"
                );
                eyre::ensure!(entity.cause().map(|cause| cause.as_str()) == Some("heart attack"));
            }
            Err(other) => eyre::bail!("unexpected failure for entity {id}: {other}"),
        }
    }
    eyre::ensure!(service.pending_countdowns() == 0);
    Ok(())
}
