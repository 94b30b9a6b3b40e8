//! Countdown scenarios verified against terminal write counts.

use super::helpers::{
    CountingRepository, LONG, SHORT, TerminalWrite, repository, settings, start_service,
};
use reaper::lifecycle::{
    domain::LifecycleState,
    services::{CreateEntityRequest, LifecycleSettings},
};
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const MARGIN: Duration = Duration::from_secs(1);

#[rstest]
#[tokio::test(start_paused = true)]
async fn cause_before_automatic_deadline_leads_to_single_final_death(
    repository: Arc<CountingRepository>,
    settings: LifecycleSettings,
) -> eyre::Result<()> {
    let service = start_service(&repository, settings);
    let entity = service
        .create(CreateEntityRequest::new("Halle", 28))
        .await?;
    eyre::ensure!(entity.state() == LifecycleState::PendingAutomatic);

    sleep(SHORT - MARGIN).await;
    let with_cause = service.add_cause(entity.id(), "x").await?;
    eyre::ensure!(with_cause.state() == LifecycleState::CausePendingDeath);

    sleep(SHORT + MARGIN).await;
    eyre::ensure!(repository.terminal_writes(entity.id()).is_empty());

    sleep(LONG).await;
    let dead = service.status(entity.id()).await?;
    eyre::ensure!(dead.state() == LifecycleState::Dead);
    eyre::ensure!(dead.cause().map(|cause| cause.as_str()) == Some("x"));
    eyre::ensure!(repository.terminal_writes(entity.id()) == vec![TerminalWrite::Final]);
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn cause_then_details_writes_once_on_details_deadline(
    repository: Arc<CountingRepository>,
    settings: LifecycleSettings,
) -> eyre::Result<()> {
    let service = start_service(&repository, settings);
    let entity = service
        .create(CreateEntityRequest::new("Stephen", 40))
        .await?;

    service.add_cause(entity.id(), "bus crash").await?;
    service
        .add_details(entity.id(), "boarded the wrong bus")
        .await?;
    eyre::ensure!(service.pending_countdowns() == 1);

    sleep(SHORT - MARGIN).await;
    eyre::ensure!(!service.status(entity.id()).await?.is_dead());

    sleep(MARGIN * 2).await;
    eyre::ensure!(service.status(entity.id()).await?.is_dead());

    sleep(LONG).await;
    eyre::ensure!(repository.terminal_writes(entity.id()) == vec![TerminalWrite::Final]);
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn repeated_details_restart_the_short_countdown(
    repository: Arc<CountingRepository>,
    settings: LifecycleSettings,
) -> eyre::Result<()> {
    let service = start_service(&repository, settings);
    let entity = service
        .create(CreateEntityRequest::new("Penber", 29))
        .await?;
    service.add_cause(entity.id(), "train").await?;
    service.add_details(entity.id(), "first draft").await?;

    sleep(SHORT - MARGIN).await;
    let revised = service.add_details(entity.id(), "second draft").await?;
    eyre::ensure!(revised.state() == LifecycleState::DetailsPendingDeath);

    sleep(SHORT - MARGIN).await;
    eyre::ensure!(!service.status(entity.id()).await?.is_dead());

    sleep(MARGIN * 2).await;
    let dead = service.status(entity.id()).await?;
    eyre::ensure!(dead.details().map(|details| details.as_str()) == Some("second draft"));
    eyre::ensure!(repository.terminal_writes(entity.id()) == vec![TerminalWrite::Final]);
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn entities_count_down_independently(
    repository: Arc<CountingRepository>,
    settings: LifecycleSettings,
) -> eyre::Result<()> {
    let service = start_service(&repository, settings);
    let unattended = service
        .create(CreateEntityRequest::new("Lind", 30))
        .await?;
    let described = service
        .create(CreateEntityRequest::new("Kitamura", 48))
        .await?;
    service.add_cause(described.id(), "overwork").await?;

    sleep(SHORT + MARGIN).await;
    eyre::ensure!(service.status(unattended.id()).await?.is_dead());
    eyre::ensure!(!service.status(described.id()).await?.is_dead());
    eyre::ensure!(repository.terminal_writes(unattended.id()) == vec![TerminalWrite::Automatic]);

    sleep(LONG).await;
    eyre::ensure!(service.status(described.id()).await?.is_dead());
    let listed = service.list().await?;
    eyre::ensure!(listed.iter().all(|entity| entity.is_dead()));
    eyre::ensure!(listed.len() == 2);
    Ok(())
}
