use anyhow::Result;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info};

/// Async job run on every tick.
pub type Job = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send + Sync>;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Runs a job at a fixed interval on a background task. The first run
/// happens one interval after `start`. A failing or panicking run is logged
/// and the schedule continues.
pub struct PeriodicTask {
    name: String,
    job: Job,
    interval: Mutex<Duration>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PeriodicTask {
    pub fn new(name: impl Into<String>, interval: Duration, job: Job) -> Self {
        Self {
            name: name.into(),
            job,
            interval: Mutex::new(interval.max(MIN_INTERVAL)),
            handle: Mutex::new(None),
        }
    }

    pub async fn interval(&self) -> Duration {
        *self.interval.lock().await
    }

    pub async fn is_running(&self) -> bool {
        self.handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Start the schedule. Does nothing if it is already running.
    pub async fn start(&self) {
        let mut handle = self.handle.lock().await;
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let interval = *self.interval.lock().await;
        let job = self.job.clone();
        let name = self.name.clone();

        *handle = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let run = tokio::spawn(job());
                let _abort = AbortOnDrop(run.abort_handle());
                match run.await {
                    Ok(Ok(())) => debug!("{} run completed", name),
                    Ok(Err(e)) => error!("{} run failed: {}", name, e),
                    Err(e) if e.is_panic() => error!("{} run panicked", name),
                    Err(_) => break,
                }
            }
        }));
        info!("{} started (every {}ms)", self.name, interval.as_millis());
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            handle.abort();
            info!("{} stopped", self.name);
        }
    }

    /// Change the interval, restarting the schedule if it is running.
    pub async fn set_interval(&self, interval: Duration) {
        *self.interval.lock().await = interval.max(MIN_INTERVAL);
        if self.is_running().await {
            self.stop().await;
            self.start().await;
        }
    }
}

/// Aborts an in-flight run when the loop itself is aborted.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}
