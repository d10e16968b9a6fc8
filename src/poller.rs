//! Waiting for a run to finish.
//!
//! There is no built-in deadline: a run that never reaches `ready` or
//! `error` is polled until the cancellation token fires.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::backend::TaskBackend;
use crate::error::RelayError;
use crate::task::{RunId, TaskRun};

/// Source of delays between polls. Tests swap in one that does not sleep.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real time, via tokio.
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

enum PollState {
    Polling { attempt: u32 },
    Terminal(TaskRun),
}

/// Polls a backend at a fixed interval until the run is terminal.
pub struct Poller {
    backend: Arc<dyn TaskBackend>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl Poller {
    pub fn new(backend: Arc<dyn TaskBackend>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            backend,
            clock,
            interval,
        }
    }

    /// Poll `run_id` until it is `ready` or `error`.
    ///
    /// The first failed status call ends polling. No call is made after
    /// a terminal status is seen.
    pub async fn poll(
        &self,
        run_id: &RunId,
        cancel: &CancellationToken,
    ) -> Result<TaskRun, RelayError> {
        let mut state = PollState::Polling { attempt: 1 };

        loop {
            state = match state {
                PollState::Terminal(run) => {
                    info!(run_id = %run_id, status = %run.status, "run finished");
                    return Ok(run);
                }
                PollState::Polling { attempt } => {
                    let run = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(RelayError::Cancelled),
                        run = self.backend.fetch_run(run_id) => run?,
                    };

                    if run.status.is_terminal() {
                        PollState::Terminal(run)
                    } else {
                        debug!(run_id = %run_id, attempt, status = %run.status, "run in flight");
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => return Err(RelayError::Cancelled),
                            _ = self.clock.sleep(self.interval) => {}
                        }
                        PollState::Polling {
                            attempt: attempt + 1,
                        }
                    }
                }
            };
        }
    }
}
