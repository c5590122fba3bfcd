//! Background reconciliation poller.

use std::sync::Arc;
use std::time::Duration;

use simtrack_service::ReconcileService;

/// How many poll ticks pass between retired-number cleanup sweeps.
const CLEANUP_EVERY_TICKS: u64 = 100;

/// Spawns the background task that runs a reconciliation cycle on every
/// tick and a retired-number cleanup sweep every [`CLEANUP_EVERY_TICKS`]
/// ticks.
///
/// Errors are logged but do not stop the loop; the engine's own
/// single-flight guard turns an overlapping manual trigger into a skipped
/// cycle rather than a second concurrent run.
pub fn start_reconcile_poller(reconcile: Arc<ReconcileService>, poll_interval: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut ticks = 0u64;
        loop {
            interval.tick().await;
            ticks = ticks.wrapping_add(1);

            match reconcile.run_cycle().await {
                Ok(report) if report.skipped => {
                    tracing::debug!("reconcile cycle still in flight, tick skipped");
                },
                Ok(report) => {
                    if report.checked > 0 || report.ingest.inserted > 0 {
                        tracing::info!(
                            ingested = report.ingest.inserted,
                            checked = report.checked,
                            delivered = report.delivered,
                            failures = report.failures,
                            "reconcile cycle finished"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "reconcile cycle failed");
                },
            }

            if ticks % CLEANUP_EVERY_TICKS == 0 {
                match reconcile.cleanup_retired().await {
                    Ok(report) => {
                        if report.deleted > 0 || report.page_errors > 0 {
                            tracing::info!(
                                deleted = report.deleted,
                                page_errors = report.page_errors,
                                "retired-number cleanup finished"
                            );
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "retired-number cleanup failed");
                    },
                }
            }
        }
    });
}
