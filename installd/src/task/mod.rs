//! Background tasks with an observable outcome.
//!
//! [`spawn`] runs a [`Task`] on the tokio runtime and hands back a
//! [`TaskHandle`]. The handle is the only way to reach the task: it reports
//! whether the task is still running, waits for it with a bound, and returns
//! the stored result any number of times once the task finished.
//!
//! The outcome is written exactly once by a supervisor that awaits the
//! worker, so a finished state is never observed without its result.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error};

#[async_trait]
pub trait Task: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;

    fn name(&self) -> &str;

    async fn run(&self) -> anyhow::Result<Self::Output>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("task '{0}' is still running")]
    Running(String),
    #[error("task '{0}' finished without a result")]
    NoResult(String),
}

/// How a bounded [`TaskHandle::wait`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    Finished,
    TimedOut,
    /// The task is marked running but nothing will ever finish it.
    Lost,
}

#[derive(Debug, Clone)]
enum Slot<T> {
    Running,
    Finished(Option<T>),
}

impl<T> Slot<T> {
    fn is_running(&self) -> bool {
        matches!(self, Slot::Running)
    }
}

#[derive(Debug, Clone)]
pub struct TaskHandle<T> {
    name: Arc<str>,
    slot: watch::Receiver<Slot<T>>,
}

pub fn spawn<K: Task>(task: K) -> TaskHandle<K::Output> {
    let name: Arc<str> = Arc::from(task.name());
    let (sender, slot) = watch::channel(Slot::Running);

    debug!("Task '{name}' starting");
    let worker = tokio::spawn(async move { task.run().await });

    let supervised = name.clone();
    tokio::spawn(async move {
        let outcome = match worker.await {
            Ok(Ok(output)) => Some(output),
            Ok(Err(err)) => {
                error!("Task '{supervised}' failed: {err:#}");
                None
            }
            Err(err) => {
                error!("Task '{supervised}' was aborted: {err}");
                None
            }
        };
        debug!("Task '{supervised}' finished");
        sender.send_replace(Slot::Finished(outcome));
    });

    TaskHandle { name, slot }
}

impl<T: Clone> TaskHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.slot.borrow().is_running()
    }

    pub fn result(&self) -> Result<T, TaskError> {
        match &*self.slot.borrow() {
            Slot::Running => Err(TaskError::Running(self.name.to_string())),
            Slot::Finished(Some(output)) => Ok(output.clone()),
            Slot::Finished(None) => Err(TaskError::NoResult(self.name.to_string())),
        }
    }

    /// Waits up to `timeout` for the task to finish. Never cancels it.
    pub async fn wait(&self, timeout: Duration) -> WaitStatus {
        let mut slot = self.slot.clone();
        let waited = tokio::time::timeout(timeout, async move {
            slot.wait_for(|slot| !slot.is_running())
                .await
                .map(|_| ())
        })
        .await;

        match waited {
            Ok(Ok(())) => WaitStatus::Finished,
            Ok(Err(_)) => WaitStatus::Lost,
            Err(_) => WaitStatus::TimedOut,
        }
    }

    /// A handle whose supervisor is already gone.
    #[cfg(test)]
    pub(crate) fn lost(name: &str) -> Self {
        let (_, slot) = watch::channel(Slot::Running);
        Self {
            name: Arc::from(name),
            slot,
        }
    }
}
