use std::ops::RangeInclusive;

use rand::Rng;
use rand_distr::{ Distribution, StandardNormal };

use crate::errors::ConfigurationError;

/// Checks that the range is non-empty and that both its bounds and its width are finite.
pub fn validate_range(
    name: &'static str,
    range: &RangeInclusive<f64>
) -> Result<(), ConfigurationError> {
    let (start, end) = (*range.start(), *range.end());
    if !start.is_finite() || !end.is_finite() || start > end || !(end - start).is_finite() {
        return Err(ConfigurationError::InvalidRange { name, start, end });
    }
    Ok(())
}

/// Checks a range that arm spreads are drawn from. Spreads are standard deviations,
/// so the lower bound cannot be negative.
pub fn validate_spread_range(range: &RangeInclusive<f64>) -> Result<(), ConfigurationError> {
    validate_range("spread", range)?;
    if *range.start() < 0.0 {
        return Err(ConfigurationError::InvalidRange {
            name: "spread",
            start: *range.start(),
            end: *range.end(),
        });
    }
    Ok(())
}

/// GaussianArmEnvironment represents one arm of the slot machine.
/// Rewards are normally distributed around a mean that is constant and does
/// not change over time. The mean is not known to the agent beforehand.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct GaussianArmEnvironment {
    mean: f64,
    /// Standard deviation of the reward. Larger spread gives noisier rewards.
    spread: f64,
}

impl GaussianArmEnvironment {
    /// Creates an arm with a custom mean and spread.
    pub fn new(mean: f64, spread: f64) -> Result<Self, ConfigurationError> {
        if !mean.is_finite() {
            return Err(ConfigurationError::InvalidMean(mean));
        }
        if !spread.is_finite() || spread < 0.0 {
            return Err(ConfigurationError::InvalidSpread(spread));
        }
        log::trace!("# Creating Gaussian arm with mean: {mean} and spread: {spread} #");
        Ok(GaussianArmEnvironment { mean, spread })
    }

    /// Creates an arm with mean and spread drawn uniformly from the given ranges.
    pub fn new_random<R: Rng>(
        mean_range: &RangeInclusive<f64>,
        spread_range: &RangeInclusive<f64>,
        rng: &mut R
    ) -> Result<Self, ConfigurationError> {
        validate_range("mean", mean_range)?;
        validate_spread_range(spread_range)?;
        let mean = rng.gen_range(mean_range.clone());
        let spread = rng.gen_range(spread_range.clone());
        GaussianArmEnvironment::new(mean, spread)
    }

    /// Generates the specified number of random arms and returns them as vector.
    pub fn new_as_vector<R: Rng>(
        number_of_arms: usize,
        mean_range: &RangeInclusive<f64>,
        spread_range: &RangeInclusive<f64>,
        rng: &mut R
    ) -> Result<Vec<GaussianArmEnvironment>, ConfigurationError> {
        (0..number_of_arms)
            .map(|_| GaussianArmEnvironment::new_random(mean_range, spread_range, rng))
            .collect()
    }

    /// Each pull of the leaver returns a reward drawn from N(mean, spread^2).
    pub fn step<R: Rng>(&self, rng: &mut R) -> f64 {
        let z: f64 = StandardNormal.sample(rng);
        self.mean + self.spread * z
    }

    /// True mean of the arm. Used only for statistics, the agent never looks at it.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn spread(&self) -> f64 {
        self.spread
    }
}
