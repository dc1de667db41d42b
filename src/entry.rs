use clap::Parser;

use crate::app::runner;
use crate::args::{LoadArgs, RunConfig};
use crate::error::AppResult;

pub(crate) fn run() -> AppResult<()> {
    let args = LoadArgs::parse();

    crate::logger::init_logging(args.verbose);

    // All validation happens here; no worker is spawned for invalid input.
    let config = RunConfig::from_args(&args)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(runner::run(config))
}
