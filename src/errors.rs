use polars::prelude::PolarsError;
use thiserror::Error;

/// Raised while setting up a simulation, before the agent takes any step.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("bandit requires at least one arm")]
    NoArms,
    #[error("exploration sweep must contain at least one value")]
    EmptySweep,
    #[error("number of iterations must be positive")]
    NoIterations,
    #[error("exploration strength must be non-negative and finite, got {0}")]
    InvalidExploration(f64),
    #[error("arm mean must be finite, got {0}")]
    InvalidMean(f64),
    #[error("arm spread must be non-negative and finite, got {0}")]
    InvalidSpread(f64),
    #[error("invalid {name} range [{start}, {end}]")]
    InvalidRange {
        name: &'static str,
        start: f64,
        end: f64,
    },
}

/// Raised by a reporter while persisting sweep results.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("reporting failed: {0}")]
    Report(#[from] ReportError),
}
