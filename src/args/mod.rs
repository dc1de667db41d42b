mod cli;
mod parsers;
mod types;

#[cfg(test)]
mod test_support;

pub use cli::LoadArgs;
pub use types::{EndpointStrategy, PositiveU64, RunConfig};
