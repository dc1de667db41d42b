//! Request outcomes and the single-owner stats aggregation task.
mod collector;
mod types;


pub(crate) use collector::{OUTCOME_CHANNEL_CAPACITY, setup_stats_collector};
pub(crate) use types::{RequestOutcome, RunSnapshot, RunStats};

#[cfg(test)]
pub(crate) use types::ERROR_STATUS_LABEL;
