use std::ops::RangeInclusive;
use std::time::Instant;

use rand::{ rngs::StdRng, Rng, SeedableRng };
use rayon::prelude::*;

use crate::constants::{
    EXPLORATION_SWEEP_LEN,
    EXPLORATION_SWEEP_START,
    EXPLORATION_SWEEP_STEP,
    MAX_ARM_MEAN,
    MAX_ARM_SPREAD,
    MIN_ARM_MEAN,
    MIN_ARM_SPREAD,
    NUM_OF_ARMS,
    NUM_OF_ITERATIONS,
    RUN_SWEEP_IN_PARALLEL,
    SEED,
};
use crate::environments::gaussian_arm::{ validate_range, validate_spread_range };
use crate::errors::{ ConfigurationError, SimulationError };
use crate::statistics_calculator::SweepReporter;
use crate::ucb_agent::UcbLearningAgent;

/// Parameters of one sweep over exploration strengths.
#[derive(PartialEq, Debug, Clone)]
pub struct SweepConfig {
    pub num_of_arms: usize,
    pub mean_range: RangeInclusive<f64>,
    pub spread_range: RangeInclusive<f64>,
    /// Number of turns played for every exploration value.
    pub num_of_iterations: usize,
    pub exploration_values: Vec<f64>,
    pub seed: Option<u64>,
    pub run_in_parallel: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            num_of_arms: NUM_OF_ARMS,
            mean_range: MIN_ARM_MEAN..=MAX_ARM_MEAN,
            spread_range: MIN_ARM_SPREAD..=MAX_ARM_SPREAD,
            num_of_iterations: NUM_OF_ITERATIONS,
            exploration_values: SweepConfig::linear_exploration_range(
                EXPLORATION_SWEEP_START,
                EXPLORATION_SWEEP_STEP,
                EXPLORATION_SWEEP_LEN
            ),
            seed: SEED,
            run_in_parallel: RUN_SWEEP_IN_PARALLEL,
        }
    }
}

impl SweepConfig {
    /// Generates `count` evenly spaced exploration values: start, start + step, ...
    pub fn linear_exploration_range(start: f64, step: f64, count: usize) -> Vec<f64> {
        (0..count).map(|index| start + step * (index as f64)).collect()
    }

    /// Fails fast on configurations that cannot be simulated.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.num_of_arms == 0 {
            return Err(ConfigurationError::NoArms);
        }
        if self.num_of_iterations == 0 {
            return Err(ConfigurationError::NoIterations);
        }
        if self.exploration_values.is_empty() {
            return Err(ConfigurationError::EmptySweep);
        }
        if
            let Some(&invalid) = self.exploration_values
                .iter()
                .find(|value| !value.is_finite() || **value < 0.0)
        {
            return Err(ConfigurationError::InvalidExploration(invalid));
        }
        validate_range("mean", &self.mean_range)?;
        validate_spread_range(&self.spread_range)
    }
}

/// Result of playing the environment with one exploration value. The iteration
/// numbers and running averages are equal length and line up index by index.
#[derive(PartialEq, Debug, Clone)]
pub struct SweepSeries {
    pub exploration: f64,
    pub label: String,
    pub iterations: Vec<usize>,
    /// Average reward per turn after each turn.
    pub running_averages: Vec<f64>,
    /// Arm with the largest true mean and that mean.
    pub best_arm: usize,
    pub best_arm_mean: f64,
    /// True mean of every arm, to compare against what was learned.
    pub actual_means: Vec<f64>,
    /// Learned values and pull counts at the end of the run.
    pub q_values: Vec<f64>,
    pub visit_counts: Vec<u64>,
}

impl SweepSeries {
    /// Number of times the arm with the largest true mean was pulled.
    pub fn best_arm_pulls(&self) -> u64 {
        self.visit_counts[self.best_arm]
    }

    pub fn final_average(&self) -> f64 {
        self.running_averages.last().copied().unwrap_or(0.0)
    }
}

/// Resets the agent and plays `num_of_iterations` turns with the given exploration.
pub fn simulate_sweep_point<R: Rng>(
    agent: &mut UcbLearningAgent,
    exploration: f64,
    num_of_iterations: usize,
    rng: &mut R
) -> Result<SweepSeries, ConfigurationError> {
    agent.reset();
    agent.set_exploration(exploration)?;

    let mut iterations = Vec::with_capacity(num_of_iterations);
    let mut running_averages = Vec::with_capacity(num_of_iterations);
    for iteration in 0..num_of_iterations {
        agent.step(rng);
        iterations.push(iteration);
        running_averages.push(agent.average_reward());
    }

    let series = SweepSeries {
        exploration,
        label: format!("Exploration: {:.6}", exploration),
        iterations,
        running_averages,
        best_arm: agent.best_arm(),
        best_arm_mean: agent.best_arm_mean(),
        actual_means: agent.actual_means(),
        q_values: agent.q_values.clone(),
        visit_counts: agent.num_times_arm_selected.clone(),
    };
    log::debug!(
        "Exploration: {} \t Total Reward: {} \t Average Reward: {} \t Best Arm Mean: {}",
        agent.exploration(),
        agent.total_reward(),
        series.final_average(),
        series.best_arm_mean
    );
    Ok(series)
}

/// Plays the same environment once for every exploration value in the sweep.
pub struct SimulationRunner {
    config: SweepConfig,
    agent: UcbLearningAgent,
    seed: u64,
    rng: StdRng,
}

impl SimulationRunner {
    /// Validates the configuration and generates a fresh random environment.
    pub fn new(config: SweepConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let seed = Self::resolve_seed(&config);
        let mut rng = StdRng::seed_from_u64(seed);
        let agent = UcbLearningAgent::new_random(
            config.num_of_arms,
            &config.mean_range,
            &config.spread_range,
            &mut rng
        )?;
        Ok(SimulationRunner { config, agent, seed, rng })
    }

    /// Uses an existing agent, so a known environment can be swept. The number of
    /// arms and the ranges of the configuration are ignored.
    #[cfg(test)]
    pub fn from(agent: UcbLearningAgent, config: SweepConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let seed = Self::resolve_seed(&config);
        Ok(SimulationRunner { config, agent, seed, rng: StdRng::seed_from_u64(seed) })
    }

    fn resolve_seed(config: &SweepConfig) -> u64 {
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        log::info!("Simulation seed: {}", seed);
        seed
    }

    pub fn agent(&self) -> &UcbLearningAgent {
        &self.agent
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Runs every sweep point one after another on the same agent and generator.
    pub fn run_sweep(&mut self) -> Result<Vec<SweepSeries>, ConfigurationError> {
        log::info!(
            "### Running UCB sweep: {} arms \t {} iterations \t {} exploration values ###",
            self.agent.num_of_arms(),
            self.config.num_of_iterations,
            self.config.exploration_values.len()
        );
        let start_time = Instant::now();
        let mut results = Vec::with_capacity(self.config.exploration_values.len());
        for &exploration in &self.config.exploration_values {
            results.push(
                simulate_sweep_point(
                    &mut self.agent,
                    exploration,
                    self.config.num_of_iterations,
                    &mut self.rng
                )?
            );
        }
        log::info!("# Sequential Run: Elapsed time: {:.2?}", start_time.elapsed());
        Ok(results)
    }

    /// Runs the sweep points in parallel. Each point plays its own copy of the agent
    /// with its own generator, seeded from the runner seed and the point's position,
    /// so results do not depend on scheduling.
    pub fn run_sweep_in_parallel(&self) -> Result<Vec<SweepSeries>, ConfigurationError> {
        log::info!(
            "### Running UCB sweep in parallel: {} arms \t {} iterations \t {} exploration values ###",
            self.agent.num_of_arms(),
            self.config.num_of_iterations,
            self.config.exploration_values.len()
        );
        let start_time = Instant::now();
        let results = self.config.exploration_values
            .par_iter()
            .enumerate()
            .map(|(index, &exploration)| {
                let mut agent = self.agent.clone();
                let mut rng = StdRng::seed_from_u64(
                    self.seed.wrapping_add((index as u64).wrapping_add(1))
                );
                simulate_sweep_point(
                    &mut agent,
                    exploration,
                    self.config.num_of_iterations,
                    &mut rng
                )
            })
            .collect::<Result<Vec<SweepSeries>, ConfigurationError>>()?;
        log::info!("# Parallel Run: Elapsed time: {:.2?}", start_time.elapsed());
        Ok(results)
    }

    pub fn run(&mut self) -> Result<Vec<SweepSeries>, ConfigurationError> {
        if self.config.run_in_parallel {
            self.run_sweep_in_parallel()
        } else {
            self.run_sweep()
        }
    }

    /// Runs the sweep and hands every series, in sweep order, to the reporter.
    pub fn run_and_report<T: SweepReporter>(
        &mut self,
        reporter: &mut T
    ) -> Result<(), SimulationError> {
        let results = self.run()?;
        for series in &results {
            reporter.report(series)?;
        }
        reporter.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;
    use crate::environments::gaussian_arm::GaussianArmEnvironment;
    use crate::errors::ReportError;

    fn small_config() -> SweepConfig {
        SweepConfig {
            num_of_arms: 5,
            num_of_iterations: 100,
            exploration_values: vec![0.0, 0.5, 1.0],
            seed: Some(42),
            run_in_parallel: false,
            ..SweepConfig::default()
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        labels: Vec<String>,
        finished: bool,
        fail_on_report: bool,
    }

    impl SweepReporter for RecordingReporter {
        fn report(&mut self, series: &SweepSeries) -> Result<(), ReportError> {
            if self.fail_on_report {
                return Err(
                    ReportError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
                );
            }
            self.labels.push(series.label.clone());
            Ok(())
        }

        fn finish(&mut self) -> Result<(), ReportError> {
            self.finished = true;
            Ok(())
        }
    }

    #[test]
    fn test_default_config_matches_constants() {
        let config = SweepConfig::default();

        assert_eq!(config.num_of_arms, NUM_OF_ARMS);
        assert_eq!(config.num_of_iterations, NUM_OF_ITERATIONS);
        assert_eq!(config.exploration_values.len(), EXPLORATION_SWEEP_LEN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_linear_exploration_range() {
        let values = SweepConfig::linear_exploration_range(0.001, 0.001, 199);

        assert_eq!(values.len(), 199);
        assert_relative_eq!(values[0], 0.001);
        assert_relative_eq!(values[198], 0.199, epsilon = 1e-12);
        assert!(SweepConfig::linear_exploration_range(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_validate_rejects_invalid_configurations() {
        let config = SweepConfig { num_of_arms: 0, ..small_config() };
        assert_eq!(config.validate(), Err(ConfigurationError::NoArms));

        let config = SweepConfig { num_of_iterations: 0, ..small_config() };
        assert_eq!(config.validate(), Err(ConfigurationError::NoIterations));

        let config = SweepConfig { exploration_values: vec![], ..small_config() };
        assert_eq!(config.validate(), Err(ConfigurationError::EmptySweep));

        let config = SweepConfig { exploration_values: vec![0.1, -1.0], ..small_config() };
        assert_eq!(config.validate(), Err(ConfigurationError::InvalidExploration(-1.0)));

        let config = SweepConfig { spread_range: -1.0..=1.0, ..small_config() };
        assert!(matches!(config.validate(), Err(ConfigurationError::InvalidRange { .. })));

        let config = SweepConfig { mean_range: -f64::MAX..=f64::MAX, ..small_config() };
        assert!(matches!(config.validate(), Err(ConfigurationError::InvalidRange { .. })));
    }

    #[test]
    fn test_runner_creation_fails_before_any_step() {
        let config = SweepConfig { exploration_values: vec![], ..small_config() };
        assert!(matches!(SimulationRunner::new(config), Err(ConfigurationError::EmptySweep)));

        let config = SweepConfig { mean_range: -f64::MAX..=f64::MAX, ..small_config() };
        assert!(
            matches!(SimulationRunner::new(config), Err(ConfigurationError::InvalidRange { .. }))
        );
    }

    #[test]
    fn test_creation_of_runner() {
        let runner = SimulationRunner::new(small_config()).unwrap();

        assert_eq!(runner.seed(), 42);
        assert_eq!(runner.agent().num_of_arms(), 5);
        assert_eq!(runner.agent().total_visits(), 0);
    }

    #[test]
    fn test_run_sweep_produces_series_for_each_exploration_value() {
        let mut runner = SimulationRunner::new(small_config()).unwrap();
        let arms_before = runner.agent().environment.clone();

        let results = runner.run_sweep().unwrap();

        assert_eq!(results.len(), 3);
        for (series, &exploration) in results.iter().zip(small_config().exploration_values.iter()) {
            assert_eq!(series.exploration, exploration);
            assert_eq!(series.label, format!("Exploration: {:.6}", exploration));
            assert_eq!(series.iterations, (0..100).collect::<Vec<usize>>());
            assert_eq!(series.running_averages.len(), 100);
            assert_eq!(series.visit_counts.iter().sum::<u64>(), 100);
        }
        assert_eq!(runner.agent().environment, arms_before, "Sweep must not regenerate the arms");
    }

    #[test]
    fn test_running_average_matches_rewards() {
        let arms = vec![
            GaussianArmEnvironment::new(10.0, 0.0).unwrap(),
            GaussianArmEnvironment::new(0.0, 0.0).unwrap()
        ];
        let agent = UcbLearningAgent::new(arms).unwrap();
        let config = SweepConfig {
            num_of_iterations: 10,
            exploration_values: vec![1.0],
            ..small_config()
        };
        let mut runner = SimulationRunner::from(agent, config).unwrap();

        let series = runner.run_sweep().unwrap().remove(0);

        assert_eq!(series.visit_counts, vec![9, 1]);
        assert_eq!(series.q_values, vec![10.0, 0.0]);
        assert_eq!(series.best_arm, 0);
        assert_eq!(series.best_arm_mean, 10.0);
        assert_eq!(series.actual_means, vec![10.0, 0.0]);
        assert_relative_eq!(series.final_average(), 9.0);
        // After the first two forced pulls the average is always (10 * (n - 1)) / n.
        assert_relative_eq!(series.running_averages[1], 5.0);
        assert_relative_eq!(series.running_averages[3], 7.5);
    }

    #[test]
    fn test_parallel_sweep_is_deterministic_for_a_seed() {
        let config = SweepConfig { run_in_parallel: true, ..small_config() };
        let runner = SimulationRunner::new(config.clone()).unwrap();
        let other_runner = SimulationRunner::new(config).unwrap();

        let first = runner.run_sweep_in_parallel().unwrap();
        let second = other_runner.run_sweep_in_parallel().unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first
                .iter()
                .map(|series| series.exploration)
                .collect::<Vec<f64>>(),
            vec![0.0, 0.5, 1.0]
        );
        for series in &first {
            assert_eq!(series.running_averages.len(), 100);
        }
    }

    #[test]
    fn test_run_and_report_forwards_every_series_in_order() {
        let mut runner = SimulationRunner::new(small_config()).unwrap();
        let mut reporter = RecordingReporter::default();

        runner.run_and_report(&mut reporter).unwrap();

        assert!(reporter.finished);
        assert_eq!(
            reporter.labels,
            vec!["Exploration: 0.000000", "Exploration: 0.500000", "Exploration: 1.000000"]
        );
    }

    #[test]
    fn test_run_and_report_surfaces_reporter_errors() {
        let mut runner = SimulationRunner::new(small_config()).unwrap();
        let arms_before = runner.agent().environment.clone();
        let mut reporter = RecordingReporter { fail_on_report: true, ..Default::default() };

        let result = runner.run_and_report(&mut reporter);

        assert!(matches!(result, Err(SimulationError::Report(ReportError::Io(_)))));
        assert!(!reporter.finished);
        assert_eq!(runner.agent().environment, arms_before);
    }
}
