use std::time::Duration;

use reqwest::Client;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

use crate::args::RunConfig;
use crate::metrics::RequestOutcome;
use crate::shutdown::ShutdownSender;

use super::endpoint::{TargetUrls, plan_request};
use super::executor::execute_request;

/// Per-worker pause between completing one request and issuing the next:
/// `floor(1000 * concurrency / qps)` milliseconds, dividing the aggregate
/// interval evenly across the pool. The delay is not latency-compensated:
/// when request latency approaches or exceeds it, the achieved aggregate
/// QPS falls below the target.
pub(crate) fn throttle_delay(concurrency: u64, qps: u64) -> Duration {
    let millis = concurrency
        .saturating_mul(1000)
        .checked_div(qps)
        .unwrap_or(0);
    Duration::from_millis(millis)
}

/// Spawn the worker pool. Each worker loops {select endpoint -> execute ->
/// record -> throttle} until the shared deadline passes or shutdown fires.
/// The returned task resolves once every worker has exited; dropping the
/// last outcome sender then closes the channel, which is how the collector
/// learns the pool is drained.
pub(crate) fn setup_request_workers(
    config: &RunConfig,
    shutdown_tx: &ShutdownSender,
    outcome_tx: &mpsc::Sender<RequestOutcome>,
    client: Client,
    targets: TargetUrls,
) -> tokio::task::JoinHandle<()> {
    let shutdown_tx = shutdown_tx.clone();
    let outcome_tx = outcome_tx.clone();
    let concurrency = config.concurrency;
    let strategy = config.strategy;
    let throttle = throttle_delay(concurrency, config.qps);
    let deadline = Instant::now()
        .checked_add(config.duration())
        .unwrap_or_else(Instant::now);

    tokio::spawn(async move {
        let worker_count = usize::try_from(concurrency).unwrap_or(usize::MAX);
        let mut worker_handles = Vec::with_capacity(worker_count);

        for worker_id in 0..concurrency {
            let shutdown_tx = shutdown_tx.clone();
            let outcome_tx = outcome_tx.clone();
            let client = client.clone();
            let targets = targets.clone();

            let handle = tokio::spawn(async move {
                let mut shutdown_rx = shutdown_tx.subscribe();

                loop {
                    if Instant::now() >= deadline {
                        break;
                    }

                    let plan = plan_request(strategy, &mut rand::thread_rng());
                    let outcome = tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        outcome = execute_request(&client, &targets, &plan) => outcome,
                    };

                    if outcome_tx.send(outcome).await.is_err() {
                        // Collector is gone; the run is over.
                        break;
                    }

                    let wake = Instant::now()
                        .checked_add(throttle)
                        .unwrap_or(deadline)
                        .min(deadline);
                    tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        () = sleep_until(wake) => {}
                    }
                }

                debug!("Worker {} exited", worker_id);
            });

            worker_handles.push(handle);
        }

        for handle in worker_handles {
            if handle.await.is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};

    #[test]
    fn throttle_delay_divides_aggregate_interval_across_workers() -> AppResult<()> {
        let cases = [
            (10, 20, 500),
            (1, 1, 1000),
            (1, 20, 50),
            (3, 7, 428),
            (4, 2, 2000),
        ];

        for (concurrency, qps, expected_ms) in cases {
            let delay = throttle_delay(concurrency, qps);
            if delay != Duration::from_millis(expected_ms) {
                return Err(AppError::validation(format!(
                    "throttle_delay({}, {}) = {:?}, expected {}ms",
                    concurrency, qps, delay, expected_ms
                )));
            }
        }

        Ok(())
    }
}
