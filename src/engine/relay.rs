use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{Engine, InboundRequest, Rendered};
use crate::backend::TaskBackend;
use crate::consts::{DEFAULT_POLL_INTERVAL_MS, FALLBACK_MESSAGE};
use crate::error::RelayError;
use crate::extract::{MediaType, classify, normalize, select_content};
use crate::poller::{Clock, Poller, TokioClock};
use crate::task::{Content, RunId, TaskRun};

pub struct RelayConfig {
    pub poll_interval: Duration,
    /// Give up on a run after this long. `None` polls forever.
    pub poll_timeout: Option<Duration>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            poll_timeout: None,
        }
    }
}

/// Trigger, poll, extract. One run per request, nothing shared between
/// requests.
pub struct RelayEngine {
    backend: Arc<dyn TaskBackend>,
    poller: Poller,
    poll_timeout: Option<Duration>,
}

impl RelayEngine {
    pub fn new(backend: Arc<dyn TaskBackend>, config: RelayConfig) -> Self {
        Self::with_clock(backend, Arc::new(TokioClock), config)
    }

    pub fn with_clock(
        backend: Arc<dyn TaskBackend>,
        clock: Arc<dyn Clock>,
        config: RelayConfig,
    ) -> Self {
        Self {
            poller: Poller::new(Arc::clone(&backend), clock, config.poll_interval),
            backend,
            poll_timeout: config.poll_timeout,
        }
    }

    async fn wait_for(
        &self,
        run_id: &RunId,
        cancel: &CancellationToken,
    ) -> Result<TaskRun, RelayError> {
        match self.poll_timeout {
            Some(limit) => tokio::time::timeout(limit, self.poller.poll(run_id, cancel))
                .await
                .map_err(|_| RelayError::Cancelled)?,
            None => self.poller.poll(run_id, cancel).await,
        }
    }
}

#[async_trait]
impl Engine for RelayEngine {
    async fn handle(
        &self,
        request: &InboundRequest,
        cancel: &CancellationToken,
    ) -> Result<Rendered, RelayError> {
        let params = request.to_parameters();
        let run_id = RunId::generate();

        info!(run_id = %run_id, method = %request.method, route = %request.path, "starting run");
        self.backend.trigger(&params, &run_id).await?;

        let run = self.wait_for(&run_id, cancel).await?;
        let rendered = render(&run);

        info!(
            run_id = %run_id,
            media_type = %rendered.media_type,
            bytes = rendered.body.len(),
            "run rendered"
        );
        Ok(rendered)
    }
}

/// Extract and classify the payload of a finished run.
pub fn render(run: &TaskRun) -> Rendered {
    let content = select_content(run);
    let text = renormalize(normalize(&content));

    if text.trim().is_empty() {
        return Rendered {
            media_type: MediaType::PlainText,
            body: FALLBACK_MESSAGE.to_string(),
        };
    }

    Rendered {
        media_type: classify(&text),
        body: text,
    }
}

/// Second pass for payloads that were JSON-encoded twice. Only text-object
/// shapes are unwrapped; any other text, JSON or not, is kept as is.
fn renormalize(text: String) -> String {
    let trimmed = text.trim_start();
    if !(trimmed.starts_with("[{") || text.contains("\"text\"")) {
        return text;
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
        return text;
    };
    match Content::from(value) {
        content @ (Content::TextObjectArray(_) | Content::TextObject(_)) => {
            debug!("re-normalizing double-encoded content");
            normalize(&content)
        }
        _ => text,
    }
}
