use checkout_engine::{DispatchSummary, OutboxApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

use crate::integrations::downstream::DownstreamClient;

/// Starts the outbox worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_outbox_worker(api: OutboxApi<SqliteDatabase, DownstreamClient>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(api.config().interval);
        info!("📮️ Outbox worker started. Sweeping every {}s", api.config().interval.as_secs());
        loop {
            timer.tick().await;
            trace!("📮️ Running outbox sweep");
            match api.dispatch_pending().await {
                Ok(summary) => log_summary(&summary),
                Err(e) => error!("📮️ Error running outbox sweep: {e}"),
            }
        }
    })
}

fn log_summary(summary: &DispatchSummary) {
    if summary.is_empty() {
        return;
    }
    info!(
        "📮️ Outbox sweep: {} delivered, {} rescheduled, {} dead, {} skipped",
        summary.delivered, summary.retried, summary.dead, summary.skipped
    );
    if summary.dead > 0 {
        warn!("📮️ {} notifications have been given up on and need manual attention", summary.dead);
    }
}
