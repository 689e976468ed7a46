//! Change signals for the requester's tracked collections.

use crate::service::new_request_id;
use crate::signal::{SignalResult, UpdateSignalCoordinator, UpdateSignals, UpdateTarget};
use log::{info, warn};
use std::time::Instant;

pub struct SystemUpdatesService {
    coordinator: UpdateSignalCoordinator,
}

impl SystemUpdatesService {
    pub fn new(coordinator: UpdateSignalCoordinator) -> Self {
        Self { coordinator }
    }

    /// Computes the signals named in `targets` (comma separated; all when
    /// absent or blank).
    ///
    /// Unknown names fail with `UnsupportedTarget` before any fetch.
    pub fn system_updates(&self, requester: &str, targets: Option<&str>) -> SignalResult<UpdateSignals> {
        let request_id = new_request_id();
        let started_at = Instant::now();
        info!("event=system_updates module=service status=start request_id={request_id}");

        let result = UpdateTarget::parse_list(targets)
            .and_then(|selected| self.coordinator.compute_updates(requester, &selected));
        match &result {
            Ok(signals) => info!(
                "event=system_updates module=service status=ok request_id={request_id} targets={} duration_ms={}",
                signals.targets().len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=system_updates module=service status=error request_id={request_id} error_code={} duration_ms={}",
                err.code(),
                started_at.elapsed().as_millis()
            ),
        }
        result
    }
}
