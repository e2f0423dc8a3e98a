// ── Multi-device poller ──
//
// Polls each target on its own tokio task, at most `concurrency` at a
// time. Devices share nothing; a failed device is reported in its outcome
// and never affects the others. Outcomes come back in input order.

use std::future::Future;

use futures_util::StreamExt;
use futures_util::stream;
use tracing::{Instrument, info, info_span, warn};

use crate::config::DeviceConfig;
use crate::device::Device;
use crate::error::CoreError;
use crate::snapshot::DeviceSnapshot;

/// Result of polling one target.
#[derive(Debug)]
pub struct PollOutcome {
    pub target: String,
    pub result: Result<DeviceSnapshot, CoreError>,
}

impl PollOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Connect to and snapshot every target through the gateway.
pub async fn poll_all(configs: Vec<DeviceConfig>, concurrency: usize) -> Vec<PollOutcome> {
    poll_with(configs, concurrency, poll_device).await
}

async fn poll_device(config: DeviceConfig) -> Result<DeviceSnapshot, CoreError> {
    let device = Device::connect(config).await?;
    device.snapshot().await
}

/// Run `poll` for every config with bounded concurrency.
///
/// A `concurrency` of zero is treated as one.
pub async fn poll_with<F, Fut>(
    configs: Vec<DeviceConfig>,
    concurrency: usize,
    poll: F,
) -> Vec<PollOutcome>
where
    F: Fn(DeviceConfig) -> Fut,
    Fut: Future<Output = Result<DeviceSnapshot, CoreError>> + Send + 'static,
{
    let limit = concurrency.max(1);

    stream::iter(configs)
        .map(|config| {
            let target = config.target.clone();
            let span = info_span!("device", device = %target);
            let handle = tokio::spawn(poll(config).instrument(span));
            async move {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(CoreError::Internal(format!("poll task failed: {e}"))),
                };
                match &result {
                    Ok(snapshot) => info!(
                        device = %target,
                        records = snapshot.record_count(),
                        "device polled"
                    ),
                    Err(e) => warn!(device = %target, error = %e, "device poll failed"),
                }
                PollOutcome { target, result }
            }
        })
        .buffered(limit)
        .collect()
        .await
}
