//! Fire-and-forget delivery of reports to the telemetry endpoint.

use ff_core::{Report, TelemetrySink};
use tokio::runtime::Handle;

use crate::{ApiError, Client};

/// Sends each report on its own detached task.
///
/// The coordinator never waits on the network: a slow or hung request only
/// holds up its own task. Responses are logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct HttpTelemetry {
    client: Client,
    runtime: Handle,
}

impl HttpTelemetry {
    /// Binds to the runtime of the calling context.
    pub fn new(client: Client) -> Result<Self, ApiError> {
        let runtime = Handle::try_current().map_err(|_| ApiError::NoRuntime)?;
        Ok(Self { client, runtime })
    }
}

impl TelemetrySink for HttpTelemetry {
    fn submit(&self, report: Report) {
        let client = self.client.clone();
        self.runtime.spawn(async move {
            match client.send_report(&report).await {
                Ok(body) => {
                    tracing::debug!(is_idle = report.is_idle, body = %body, "telemetry response");
                }
                Err(err) => {
                    tracing::warn!(is_idle = report.is_idle, error = %err, "telemetry request failed");
                }
            }
        });
    }
}
