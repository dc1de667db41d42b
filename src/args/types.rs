use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use std::time::Duration;
use url::Url;

use crate::error::{AppResult, ValidationError};

use super::cli::LoadArgs;

/// Policy governing which logical route a given request targets.
#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStrategy {
    Health,
    Order,
    Mixed,
}

impl EndpointStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EndpointStrategy::Health => "health",
            EndpointStrategy::Order => "order",
            EndpointStrategy::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositiveU64(NonZeroU64);

impl PositiveU64 {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl TryFrom<u64> for PositiveU64 {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        NonZeroU64::new(value)
            .map(PositiveU64)
            .ok_or_else(|| ValidationError::ValueTooSmall { min: 1 })
    }
}

impl std::str::FromStr for PositiveU64 {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u64 = s
            .parse()
            .map_err(|err| ValidationError::InvalidNumber { source: err })?;
        PositiveU64::try_from(value)
    }
}

impl From<PositiveU64> for u64 {
    fn from(value: PositiveU64) -> Self {
        value.get()
    }
}

/// Validated run parameters, constructed once before any worker starts.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target: Url,
    pub concurrency: u64,
    pub qps: u64,
    pub duration_secs: u64,
    pub strategy: EndpointStrategy,
}

impl RunConfig {
    /// Validate the CLI surface into an immutable run configuration.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the target URL is not an absolute
    /// http(s) URL with a host.
    pub fn from_args(args: &LoadArgs) -> AppResult<Self> {
        let target = Url::parse(&args.url).map_err(|err| ValidationError::InvalidUrl {
            url: args.url.clone(),
            source: err,
        })?;

        match target.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ValidationError::UnsupportedUrlScheme {
                    scheme: scheme.to_owned(),
                }
                .into());
            }
        }
        if target.host_str().is_none() {
            return Err(ValidationError::UrlMissingHost.into());
        }

        Ok(Self {
            target,
            concurrency: args.concurrency.get(),
            qps: args.qps.get(),
            duration_secs: args.duration.get(),
            strategy: args.endpoint,
        })
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}
