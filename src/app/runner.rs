use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::info;

use crate::args::RunConfig;
use crate::error::AppResult;
use crate::http::{TargetUrls, build_client, setup_request_workers};
use crate::metrics::{OUTCOME_CHANNEL_CAPACITY, RunSnapshot, setup_stats_collector};
use crate::shutdown::{setup_signal_shutdown_handler, shutdown_channel};

use super::progress::setup_progress_reporter;
use super::summary::{compute_summary_stats, print_summary};

/// Execute one full load run: spawn the collector, the progress reporter,
/// and the worker pool, then finalize exactly once.
///
/// The collector `JoinHandle` is the single finalize point. It resolves when
/// the pool has drained after the deadline or when cancellation fires,
/// whichever comes first, so racing triggers still produce one report.
pub(crate) async fn run(config: RunConfig) -> AppResult<()> {
    let run_start = Instant::now();

    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let client = build_client()?;
    let targets = TargetUrls::from_base(&config.target)?;

    let (outcome_tx, outcome_rx) = mpsc::channel(OUTCOME_CHANNEL_CAPACITY);
    let (snapshot_tx, snapshot_rx) = watch::channel(RunSnapshot::default());

    let collector_handle = setup_stats_collector(&shutdown_tx, outcome_rx, snapshot_tx);
    let progress_handle = setup_progress_reporter(
        run_start,
        config.duration_secs,
        &shutdown_tx,
        snapshot_rx,
    );
    let sender_handle =
        setup_request_workers(&config, &shutdown_tx, &outcome_tx, client, targets);

    // The workers hold their own clones; dropping this one lets the channel
    // close once the pool drains.
    drop(outcome_tx);

    info!(
        "Starting run against {}: {} workers, {} qps target, {}s, strategy {}",
        config.target,
        config.concurrency,
        config.qps,
        config.duration_secs,
        config.strategy.as_str()
    );

    let stats = collector_handle.await?;

    // Stop the reporter and the signal bridge; harmless if cancellation
    // already fired.
    drop(shutdown_tx.send(()));
    progress_handle.await?;
    sender_handle.await?;
    signal_handle.await?;

    let summary = compute_summary_stats(&stats, config.duration_secs);
    print_summary(&stats, &summary, config.duration_secs);

    Ok(())
}
