pub mod http;
pub mod mock;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RelayError;
use crate::task::{RunId, TaskParameters, TaskRun};

/// What the work-intake endpoint said when it accepted a run.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerAck {
    pub status: u16,
    /// Response body, as JSON when it parses and as a string otherwise.
    pub body: Value,
}

/// The task runner this service drives. Could be the real HTTP API or a
/// scripted stand-in.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Start a run. Called exactly once per request; never retried.
    async fn trigger(
        &self,
        params: &TaskParameters,
        run_id: &RunId,
    ) -> Result<TriggerAck, RelayError>;

    /// Fetch the current snapshot of a run.
    async fn fetch_run(&self, run_id: &RunId) -> Result<TaskRun, RelayError>;
}
