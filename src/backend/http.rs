use async_trait::async_trait;
use reqwest::header::COOKIE;
use tracing::{debug, warn};

use super::{TaskBackend, TriggerAck};
use crate::error::RelayError;
use crate::task::{RunId, TaskParameters, TaskRun};

/// Header carrying the run identifier on trigger calls.
pub const RUN_ID_HEADER: &str = "run-id";

/// Where the task runner lives and who we are to it.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Signed work-intake URL. Posted to as is.
    pub trigger_url: String,
    /// Root of the status API.
    pub base_url: String,
    pub profile: String,
    pub task_name: String,
    /// Sent as `Cookie: sessionId=...` on polls when present.
    pub session_token: Option<String>,
}

/// A [`TaskBackend`] talking to the task runner over HTTP.
pub struct HttpBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// `<base>/api/runs/~/<profile>/<task>/<run id>`
    pub fn run_url(&self, run_id: &RunId) -> String {
        format!(
            "{}/api/runs/~/{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            self.config.task_name,
            run_id
        )
    }
}

#[async_trait]
impl TaskBackend for HttpBackend {
    async fn trigger(
        &self,
        params: &TaskParameters,
        run_id: &RunId,
    ) -> Result<TriggerAck, RelayError> {
        debug!(run_id = %run_id, route = params.route(), "triggering task");

        let resp = self
            .client
            .post(&self.config.trigger_url)
            .header(RUN_ID_HEADER, run_id.as_str())
            .json(params)
            .send()
            .await
            .map_err(|e| RelayError::Trigger {
                status: 0,
                body: e.to_string(),
            })?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(run_id = %run_id, status = status.as_u16(), "trigger rejected");
            return Err(RelayError::Trigger {
                status: status.as_u16(),
                body: text,
            });
        }

        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
        Ok(TriggerAck {
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch_run(&self, run_id: &RunId) -> Result<TaskRun, RelayError> {
        let mut req = self.client.get(self.run_url(run_id));
        if let Some(token) = &self.config.session_token {
            req = req.header(COOKIE, format!("sessionId={token}"));
        }

        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(RelayError::Poll { status, body });
        }

        let run: TaskRun = resp.json().await?;
        Ok(run)
    }
}
