use std::collections::BTreeMap;

use crate::http::Route;

/// Status label recorded for timeouts and transport-level failures.
pub(crate) const ERROR_STATUS_LABEL: &str = "error";

/// The recorded result of one request attempt.
#[derive(Debug, Clone)]
pub(crate) struct RequestOutcome {
    pub(crate) route: Route,
    /// Actual status code, or `None` for a timeout/transport failure.
    pub(crate) status: Option<u16>,
    pub(crate) latency_ms: u64,
    pub(crate) succeeded: bool,
}

impl RequestOutcome {
    pub(crate) fn from_response(route: Route, status: u16, latency_ms: u64) -> Self {
        Self {
            route,
            status: Some(status),
            latency_ms,
            succeeded: (200..300).contains(&status),
        }
    }

    pub(crate) const fn from_transport_failure(route: Route, latency_ms: u64) -> Self {
        Self {
            route,
            status: None,
            latency_ms,
            succeeded: false,
        }
    }

    pub(crate) fn status_label(&self) -> String {
        self.status
            .map_or_else(|| ERROR_STATUS_LABEL.to_owned(), |code| code.to_string())
    }
}

/// Run-wide counters, owned exclusively by the collector task.
#[derive(Debug, Clone)]
pub(crate) struct RunStats {
    pub(crate) total_requests: u64,
    pub(crate) total_successes: u64,
    pub(crate) total_errors: u64,
    pub(crate) health_count: u64,
    pub(crate) order_count: u64,
    pub(crate) latency_sum_ms: u128,
    pub(crate) min_latency_ms: u64,
    pub(crate) max_latency_ms: u64,
    pub(crate) status_histogram: BTreeMap<String, u64>,
}

impl RunStats {
    pub(crate) fn new() -> Self {
        Self {
            total_requests: 0,
            total_successes: 0,
            total_errors: 0,
            health_count: 0,
            order_count: 0,
            latency_sum_ms: 0,
            min_latency_ms: u64::MAX,
            max_latency_ms: 0,
            status_histogram: BTreeMap::new(),
        }
    }

    pub(crate) fn record(&mut self, outcome: &RequestOutcome) {
        self.total_requests = self.total_requests.saturating_add(1);
        if outcome.succeeded {
            self.total_successes = self.total_successes.saturating_add(1);
        } else {
            self.total_errors = self.total_errors.saturating_add(1);
        }

        match outcome.route {
            Route::Health => self.health_count = self.health_count.saturating_add(1),
            Route::Order => self.order_count = self.order_count.saturating_add(1),
        }

        self.latency_sum_ms = self
            .latency_sum_ms
            .saturating_add(u128::from(outcome.latency_ms));
        if outcome.latency_ms < self.min_latency_ms {
            self.min_latency_ms = outcome.latency_ms;
        }
        if outcome.latency_ms > self.max_latency_ms {
            self.max_latency_ms = outcome.latency_ms;
        }

        let count = self
            .status_histogram
            .entry(outcome.status_label())
            .or_insert(0);
        *count = count.saturating_add(1);
    }

    pub(crate) fn avg_latency_ms(&self) -> u64 {
        if self.total_requests == 0 {
            return 0;
        }
        let avg = self
            .latency_sum_ms
            .checked_div(u128::from(self.total_requests))
            .unwrap_or(0);
        u64::try_from(avg).unwrap_or(u64::MAX)
    }

    pub(crate) const fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            total_requests: self.total_requests,
            total_successes: self.total_successes,
        }
    }
}

/// Internally consistent view of the counters, published for the progress
/// reporter.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RunSnapshot {
    pub(crate) total_requests: u64,
    pub(crate) total_successes: u64,
}
