//! Scheduler firing and cancellation measured in real time.

use async_trait::async_trait;
use reaper::scheduler::{TaskActionResult, TaskHandler, TaskScheduler};
use rstest::{fixture, rstest};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Records the instant each key fired.
#[derive(Debug, Default)]
struct Stopwatch {
    fired: Mutex<Vec<(u32, Instant)>>,
}

impl Stopwatch {
    fn fired(&self) -> Vec<(u32, Instant)> {
        self.fired.lock().expect("fired lock").clone()
    }
}

#[async_trait]
impl TaskHandler for Stopwatch {
    type Key = u32;
    type Action = ();
    type Payload = ();

    async fn fire(&self, key: u32, _action: (), _payload: Option<()>) -> TaskActionResult {
        self.fired
            .lock()
            .expect("fired lock")
            .push((key, Instant::now()));
        Ok(())
    }
}

#[fixture]
fn stopwatch() -> Arc<Stopwatch> {
    Arc::new(Stopwatch::default())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_fires_after_its_delay(stopwatch: Arc<Stopwatch>) -> eyre::Result<()> {
    let scheduler = TaskScheduler::new(Arc::clone(&stopwatch))?;
    let started = Instant::now();

    scheduler.start_task(1, Duration::from_millis(10), (), None);
    sleep(Duration::from_millis(25)).await;

    let fired = stopwatch.fired();
    eyre::ensure!(fired.len() == 1, "fired {} times", fired.len());
    let at = fired.first().map(|(_, at)| *at).unwrap_or(started);
    eyre::ensure!(at.duration_since(started) >= Duration::from_millis(10));
    eyre::ensure!(!scheduler.is_pending(1));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_task_never_fires(stopwatch: Arc<Stopwatch>) -> eyre::Result<()> {
    let scheduler = TaskScheduler::new(Arc::clone(&stopwatch))?;

    scheduler.start_task(2, Duration::from_millis(100), (), None);
    eyre::ensure!(scheduler.cancel_task(2));
    sleep(Duration::from_millis(150)).await;

    eyre::ensure!(stopwatch.fired().is_empty());
    eyre::ensure!(!scheduler.cancel_task(2));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn superseding_task_replaces_the_first(stopwatch: Arc<Stopwatch>) -> eyre::Result<()> {
    let scheduler = TaskScheduler::new(Arc::clone(&stopwatch))?;
    let started = Instant::now();

    scheduler.start_task(3, Duration::from_millis(10), (), None);
    scheduler.start_task(3, Duration::from_millis(60), (), None);
    sleep(Duration::from_millis(120)).await;

    let fired = stopwatch.fired();
    eyre::ensure!(fired.len() == 1, "fired {} times", fired.len());
    let at = fired.first().map(|(_, at)| *at).unwrap_or(started);
    eyre::ensure!(at.duration_since(started) >= Duration::from_millis(60));
    Ok(())
}
