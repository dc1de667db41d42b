//! Run orchestration, live progress, and the final report.
pub(crate) mod progress;
pub(crate) mod runner;
pub(crate) mod summary;
