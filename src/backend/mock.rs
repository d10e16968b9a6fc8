use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{TaskBackend, TriggerAck};
use crate::error::RelayError;
use crate::task::{RunId, RunStatus, TaskParameters, TaskRun};

/// One scripted answer to a status fetch.
#[derive(Debug, Clone)]
pub enum MockPoll {
    Run(TaskRun),
    /// Non-success status with a body.
    Fail(u16, String),
}

impl MockPoll {
    /// A run with the given status and no results.
    pub fn status(status: RunStatus) -> Self {
        MockPoll::Run(TaskRun {
            status,
            ..TaskRun::default()
        })
    }
}

/// A scripted backend for tests. Answers polls in order and records
/// every call it receives.
pub struct MockBackend {
    trigger_failure: Option<(u16, String)>,
    polls: Vec<MockPoll>,
    trigger_calls: AtomicUsize,
    poll_calls: AtomicUsize,
    triggered: Mutex<Vec<(TaskParameters, RunId)>>,
    polled: Mutex<Vec<RunId>>,
}

impl MockBackend {
    pub fn new(polls: Vec<MockPoll>) -> Self {
        Self {
            trigger_failure: None,
            polls,
            trigger_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            triggered: Mutex::new(Vec::new()),
            polled: Mutex::new(Vec::new()),
        }
    }

    /// Make every trigger call fail with this status and body.
    pub fn failing_trigger(mut self, status: u16, body: &str) -> Self {
        self.trigger_failure = Some((status, body.to_string()));
        self
    }

    pub fn trigger_calls(&self) -> usize {
        self.trigger_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    /// Parameters and run id of every trigger call, in order.
    pub fn triggered(&self) -> Vec<(TaskParameters, RunId)> {
        self.triggered
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Run ids of every poll call, in order.
    pub fn polled(&self) -> Vec<RunId> {
        self.polled
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TaskBackend for MockBackend {
    async fn trigger(
        &self,
        params: &TaskParameters,
        run_id: &RunId,
    ) -> Result<TriggerAck, RelayError> {
        self.trigger_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.triggered.lock() {
            calls.push((params.clone(), run_id.clone()));
        }

        match &self.trigger_failure {
            Some((status, body)) => Err(RelayError::Trigger {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(TriggerAck {
                status: 200,
                body: serde_json::json!({ "ok": true }),
            }),
        }
    }

    async fn fetch_run(&self, run_id: &RunId) -> Result<TaskRun, RelayError> {
        let i = self.poll_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.polled.lock() {
            calls.push(run_id.clone());
        }

        match self.polls.get(i) {
            Some(MockPoll::Run(run)) => Ok(run.clone()),
            Some(MockPoll::Fail(status, body)) => Err(RelayError::Poll {
                status: *status,
                body: body.clone(),
            }),
            None => Err(RelayError::Transport(format!(
                "MockBackend: no more runs (called {} times)",
                i + 1
            ))),
        }
    }
}
