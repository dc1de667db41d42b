use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::time::Instant;
use tracing::debug;

use crate::metrics::RequestOutcome;

use super::endpoint::{RequestPlan, TargetUrls};

/// Per-request timeout; a request past this bound is abandoned and counted
/// as an error.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the shared pooled client used by every worker.
///
/// # Errors
///
/// Returns an error if the TLS backend or connection pool cannot be
/// initialized.
pub(crate) fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder().timeout(REQUEST_TIMEOUT).build()
}

/// Execute exactly one request. Failures of any kind come back as data in
/// the outcome, never as an error to the caller; latency covers dispatch to
/// outcome, including the timeout bound for requests that never complete.
pub(crate) async fn execute_request(
    client: &Client,
    targets: &TargetUrls,
    plan: &RequestPlan,
) -> RequestOutcome {
    let route = plan.route();
    let start = Instant::now();
    let result = dispatch(client, targets, plan).await;
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(status) => RequestOutcome::from_response(route, status, latency_ms),
        Err(err) => {
            debug!("Request to {} failed: {}", route.as_str(), err);
            RequestOutcome::from_transport_failure(route, latency_ms)
        }
    }
}

async fn dispatch(
    client: &Client,
    targets: &TargetUrls,
    plan: &RequestPlan,
) -> Result<u16, reqwest::Error> {
    let response = match plan {
        RequestPlan::Health => {
            client
                .get(targets.url_for(plan.route()).clone())
                .send()
                .await?
        }
        RequestPlan::Order(payload) => {
            client
                .post(targets.url_for(plan.route()).clone())
                .json(payload)
                .send()
                .await?
        }
    };

    let status = response.status().as_u16();
    drain_response_body(response).await?;
    Ok(status)
}

async fn drain_response_body(response: reqwest::Response) -> Result<(), reqwest::Error> {
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let _chunk = chunk?;
    }
    Ok(())
}
