//! Endpoint selection, request execution, and the worker pool.
mod endpoint;
mod executor;
mod sender;

pub(crate) use endpoint::{Route, TargetUrls};
pub(crate) use executor::build_client;
pub(crate) use sender::setup_request_workers;
