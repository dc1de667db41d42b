use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::shutdown::ShutdownSender;

use super::types::{RequestOutcome, RunSnapshot, RunStats};

pub(crate) const OUTCOME_CHANNEL_CAPACITY: usize = 1024;

const SNAPSHOT_PUBLISH_INTERVAL: Duration = Duration::from_millis(100);
/// How long the cancellation path keeps picking up outcomes that already
/// landed in the channel before the report is produced.
const CANCEL_DRAIN_WINDOW: Duration = Duration::from_millis(200);

/// Spawn the aggregation task that exclusively owns `RunStats`.
///
/// All workers funnel outcomes through the mpsc channel, so updates are
/// linearizable without shared mutable state. The task resolves with the
/// final stats either when the channel closes (the worker pool has fully
/// drained after the deadline) or when the shutdown broadcast fires
/// (external cancellation; in-flight requests are abandoned).
pub(crate) fn setup_stats_collector(
    shutdown_tx: &ShutdownSender,
    mut outcome_rx: mpsc::Receiver<RequestOutcome>,
    snapshot_tx: watch::Sender<RunSnapshot>,
) -> JoinHandle<RunStats> {
    let shutdown_tx = shutdown_tx.clone();

    tokio::spawn(async move {
        let mut stats = RunStats::new();
        let mut shutdown_rx = shutdown_tx.subscribe();
        let mut snapshot_interval = tokio::time::interval(SNAPSHOT_PUBLISH_INTERVAL);
        snapshot_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cancelled = false;

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    cancelled = true;
                    break;
                }
                maybe_outcome = outcome_rx.recv() => {
                    match maybe_outcome {
                        Some(outcome) => stats.record(&outcome),
                        None => break,
                    }
                }
                _ = snapshot_interval.tick() => {
                    drop(snapshot_tx.send(stats.snapshot()));
                }
            }
        }

        if cancelled {
            drain_pending(&mut outcome_rx, &mut stats);
        }

        debug!(
            "Collector finished: {} outcomes recorded",
            stats.total_requests
        );
        stats
    })
}

fn drain_pending(outcome_rx: &mut mpsc::Receiver<RequestOutcome>, stats: &mut RunStats) {
    let drain_deadline = Instant::now()
        .checked_add(CANCEL_DRAIN_WINDOW)
        .unwrap_or_else(Instant::now);
    loop {
        if Instant::now() > drain_deadline {
            break;
        }
        match outcome_rx.try_recv() {
            Ok(outcome) => stats.record(&outcome),
            Err(mpsc::error::TryRecvError::Empty | mpsc::error::TryRecvError::Disconnected) => {
                break;
            }
        }
    }
}
