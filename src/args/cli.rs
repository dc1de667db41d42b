use clap::Parser;

use super::parsers::parse_positive_u64;
use super::types::{EndpointStrategy, PositiveU64};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Concurrent, rate-controlled HTTP load generator - drives traffic against a target service and reports latency, throughput, and error statistics."
)]
pub struct LoadArgs {
    /// Base URL of the target service (e.g. http://127.0.0.1:8080)
    pub url: String,

    /// Number of concurrent request workers
    #[arg(long, default_value = "10", value_parser = parse_positive_u64)]
    pub concurrency: PositiveU64,

    /// Target aggregate requests per second across all workers
    #[arg(long, default_value = "20", value_parser = parse_positive_u64)]
    pub qps: PositiveU64,

    /// Duration of the run (seconds)
    #[arg(long, default_value = "60", value_parser = parse_positive_u64)]
    pub duration: PositiveU64,

    /// Endpoint selection strategy
    #[arg(long, default_value = "mixed", value_enum)]
    pub endpoint: EndpointStrategy,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
