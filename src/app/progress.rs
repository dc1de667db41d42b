use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::metrics::RunSnapshot;
use crate::shutdown::ShutdownSender;

const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

/// Emit a progress line to stderr every 2 seconds while the run is active.
/// The task stops on the shutdown broadcast; the runner joins it before
/// printing the final report so the two never interleave.
pub(crate) fn setup_progress_reporter(
    run_start: Instant,
    duration_secs: u64,
    shutdown_tx: &ShutdownSender,
    snapshot_rx: watch::Receiver<RunSnapshot>,
) -> tokio::task::JoinHandle<()> {
    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::spawn(async move {
        let first_tick = run_start
            .checked_add(PROGRESS_INTERVAL)
            .unwrap_or_else(Instant::now);
        let mut ticker = tokio::time::interval_at(first_tick, PROGRESS_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = ticker.tick() => {
                    let snapshot = *snapshot_rx.borrow();
                    let elapsed_secs = run_start.elapsed().as_secs().min(duration_secs);
                    eprintln!(
                        "{}",
                        progress_line(&snapshot, elapsed_secs, duration_secs)
                    );
                }
            }
        }
    })
}

fn progress_line(snapshot: &RunSnapshot, elapsed_secs: u64, duration_secs: u64) -> String {
    let (qps_x100, success_rate_x100) = compute_running_rates(
        snapshot.total_requests,
        snapshot.total_successes,
        elapsed_secs,
    );
    format!(
        "[{}s/{}s] requests={} qps={}.{:02} success={}.{:02}%",
        elapsed_secs,
        duration_secs,
        snapshot.total_requests,
        qps_x100.checked_div(100).unwrap_or(0),
        qps_x100.checked_rem(100).unwrap_or(0),
        success_rate_x100.checked_div(100).unwrap_or(0),
        success_rate_x100.checked_rem(100).unwrap_or(0),
    )
}

/// Running aggregate QPS and success rate, both x100 fixed-point.
fn compute_running_rates(total: u64, successes: u64, elapsed_secs: u64) -> (u64, u64) {
    let qps_x100 = u128::from(total)
        .saturating_mul(100)
        .checked_div(u128::from(elapsed_secs.max(1)))
        .and_then(|value| u64::try_from(value).ok())
        .unwrap_or(u64::MAX);

    let success_rate_x100 = if total > 0 {
        u128::from(successes)
            .saturating_mul(10_000)
            .checked_div(u128::from(total))
            .and_then(|value| u64::try_from(value).ok())
            .unwrap_or(u64::MAX)
    } else {
        0
    };

    (qps_x100, success_rate_x100)
}
