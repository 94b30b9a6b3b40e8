//! Concurrent events on one entity, interleaved through repository yields.
//!
//! The repository yields between reading and writing, so both events act on
//! the same snapshot and only the scheduler decides which one wins.

use super::helpers::{CountingRepository, LONG, SHORT, TerminalWrite, settings, start_service};
use reaper::lifecycle::{
    domain::{CauseText, DetailsText, LifecycleState},
    ports::EntityRepositoryError,
    services::{CreateEntityRequest, LifecycleError, LifecycleSettings},
};
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const MARGIN: Duration = Duration::from_secs(1);

#[rstest]
#[tokio::test(start_paused = true)]
async fn competing_causes_leave_one_winner_and_a_live_countdown(
    settings: LifecycleSettings,
) -> eyre::Result<()> {
    let repository = Arc::new(CountingRepository::default().yielding_after_lookup());
    let service = start_service(&repository, settings);
    let entity = service
        .create(CreateEntityRequest::new("Light", 17))
        .await?;
    let id = entity.id();

    let (first, second) = tokio::join!(
        service.add_cause(id, "first"),
        service.add_cause(id, "second"),
    );

    let (winner, loser) = match (first, second) {
        (Ok(_), loser) => ("first", loser),
        (loser, Ok(_)) => ("second", loser),
        (lost_first, lost_second) => {
            eyre::bail!("no event won: {lost_first:?}, {lost_second:?}")
        }
    };
    eyre::ensure!(
        matches!(loser, Err(LifecycleError::CountdownElapsed(lost)) if lost == id),
        "losing event should see its countdown gone: {loser:?}"
    );
    eyre::ensure!(service.has_pending_countdown(id));

    sleep(LONG + MARGIN).await;

    let dead = service.status(id).await?;
    eyre::ensure!(dead.state() == LifecycleState::Dead, "entity never died");
    eyre::ensure!(dead.cause().map(CauseText::as_str) == Some(winner));
    eyre::ensure!(repository.terminal_writes(id) == vec![TerminalWrite::Final]);
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn repeated_details_both_land_and_die_once(
    settings: LifecycleSettings,
) -> eyre::Result<()> {
    let repository = Arc::new(CountingRepository::default().yielding_after_lookup());
    let service = start_service(&repository, settings);
    let entity = service
        .create(CreateEntityRequest::new("Near", 13))
        .await?;
    let id = entity.id();
    service.add_cause(id, "cardiac arrest").await?;

    let (first, second) = tokio::join!(
        service.add_details(id, "first"),
        service.add_details(id, "second"),
    );
    first?;
    second?;

    sleep(SHORT + MARGIN).await;

    let dead = service.status(id).await?;
    eyre::ensure!(dead.is_dead());
    eyre::ensure!(matches!(
        dead.details().map(DetailsText::as_str),
        Some("first" | "second")
    ));
    eyre::ensure!(repository.terminal_writes(id) == vec![TerminalWrite::Final]);
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn cause_racing_delete_arms_nothing(settings: LifecycleSettings) -> eyre::Result<()> {
    let repository = Arc::new(CountingRepository::default().yielding_before_write());
    let service = start_service(&repository, settings);
    let entity = service
        .create(CreateEntityRequest::new("Mello", 15))
        .await?;
    let id = entity.id();

    let (cause, deleted) = tokio::join!(service.add_cause(id, "explosion"), service.delete(id));

    eyre::ensure!(deleted?);
    eyre::ensure!(
        matches!(
            cause,
            Err(
                LifecycleError::NotFound(_)
                    | LifecycleError::Repository(EntityRepositoryError::NotFound(_))
            )
        ),
        "cause on a deleted entity should fail: {cause:?}"
    );
    eyre::ensure!(service.pending_countdowns() == 0);

    sleep(LONG + MARGIN).await;
    eyre::ensure!(repository.terminal_writes(id).is_empty());
    eyre::ensure!(service.list().await?.is_empty());
    Ok(())
}
