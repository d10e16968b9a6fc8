pub mod relay;

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

use crate::error::RelayError;
use crate::extract::MediaType;
use crate::task::TaskParameters;

/// The parts of an inbound HTTP request the pipeline cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundRequest {
    pub method: String,
    pub path: String,
    pub query: BTreeMap<String, String>,
    /// Country-ish signal from the edge, empty when unknown.
    pub geo: String,
    /// Raw body text, unparsed.
    pub body: String,
}

impl InboundRequest {
    pub fn to_parameters(&self) -> TaskParameters {
        TaskParameters::new(
            self.path.as_str(),
            self.method.as_str(),
            self.geo.as_str(),
            self.body.as_str(),
            &self.query,
        )
    }
}

/// What goes back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub media_type: MediaType,
    pub body: String,
}

/// The outermost boundary. The HTTP server only knows this trait.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn handle(
        &self,
        request: &InboundRequest,
        cancel: &CancellationToken,
    ) -> Result<Rendered, RelayError>;
}
