use std::ops::RangeInclusive;

use rand::Rng;

use crate::constants::EXPLORATION;
use crate::environments::gaussian_arm::GaussianArmEnvironment;
use crate::errors::ConfigurationError;

/// Picks the index of the largest value. When several values share the maximum,
/// one of them is chosen uniformly at random instead of always taking the first.
/// NaN values never win; if every value is NaN any index may be chosen.
pub fn random_argmax<R: Rng>(values: &[f64], rng: &mut R) -> usize {
    let max_value = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let max_indices: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, &value)| value == max_value)
        .map(|(index, _)| index)
        .collect();

    if max_indices.is_empty() {
        return rng.gen_range(0..values.len());
    }
    max_indices[rng.gen_range(0..max_indices.len())]
}

/// Action taken and reward received on a single turn.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct StepOutcome {
    pub action: usize,
    pub reward: f64,
}

/// This agent represents a solution to the Multi-Armed Bandit problem with
/// Gaussian arms. Arms are selected with the upper confidence bound policy:
/// every arm is tried once, and after that the arm with the largest
/// q + c * sqrt(ln(N) / n) is pulled, where N is the number of turns taken
/// so far and n the number of times that arm was pulled.
#[derive(PartialEq, Debug, Clone)]
pub struct UcbLearningAgent {
    /// Arms with mean rewards that the agent does not know, but is attempting
    /// to learn. Index in the vector is the number of the arm.
    pub environment: Vec<GaussianArmEnvironment>,
    /// What the agent has learned about each arm so far: the mean of all
    /// rewards received from it.
    pub q_values: Vec<f64>,
    /// Number of times each arm was pulled.
    pub num_times_arm_selected: Vec<u64>,
    total_reward: f64,
    /// Exploration strength c, non-negative.
    exploration: f64,
    /// Arm to pull on the next turn. Computed lazily and forgotten whenever the
    /// state it was computed from changes.
    next_action: Option<usize>,
}

impl UcbLearningAgent {
    /// Creates an agent that plays the given arms, with all estimates set to zero.
    pub fn new(environment: Vec<GaussianArmEnvironment>) -> Result<Self, ConfigurationError> {
        if environment.is_empty() {
            return Err(ConfigurationError::NoArms);
        }
        let num_of_arms = environment.len();
        log::debug!("# Creating UCB agent with {num_of_arms} arms #");
        Ok(UcbLearningAgent {
            environment,
            q_values: vec![0.0; num_of_arms],
            num_times_arm_selected: vec![0; num_of_arms],
            total_reward: 0.0,
            exploration: EXPLORATION,
            next_action: None,
        })
    }

    /// Creates an agent with `num_of_arms` arms whose means and spreads are drawn
    /// uniformly from the given ranges.
    pub fn new_random<R: Rng>(
        num_of_arms: usize,
        mean_range: &RangeInclusive<f64>,
        spread_range: &RangeInclusive<f64>,
        rng: &mut R
    ) -> Result<Self, ConfigurationError> {
        if num_of_arms == 0 {
            return Err(ConfigurationError::NoArms);
        }
        let environment = GaussianArmEnvironment::new_as_vector(
            num_of_arms,
            mean_range,
            spread_range,
            rng
        )?;
        UcbLearningAgent::new(environment)
    }

    /// Forgets everything learned so far while keeping the same arms, so that the
    /// same environment can be played again with another exploration strength.
    pub fn reset(&mut self) {
        let num_of_arms = self.environment.len();
        self.q_values = vec![0.0; num_of_arms];
        self.num_times_arm_selected = vec![0; num_of_arms];
        self.total_reward = 0.0;
        self.next_action = None;
        log::debug!("# Agent reset, keeping {num_of_arms} arms #");
    }

    pub fn set_exploration(&mut self, exploration: f64) -> Result<(), ConfigurationError> {
        if !exploration.is_finite() || exploration < 0.0 {
            return Err(ConfigurationError::InvalidExploration(exploration));
        }
        self.exploration = exploration;
        self.next_action = None;
        Ok(())
    }

    pub fn exploration(&self) -> f64 {
        self.exploration
    }

    pub fn num_of_arms(&self) -> usize {
        self.environment.len()
    }

    /// Sum of all rewards received.
    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }

    pub fn total_visits(&self) -> u64 {
        self.num_times_arm_selected.iter().sum()
    }

    /// Average reward per turn, 0.0 before the first turn.
    pub fn average_reward(&self) -> f64 {
        let visits = self.total_visits();
        if visits == 0 {
            return 0.0;
        }
        self.total_reward / (visits as f64)
    }

    /// Returns the arm to be pulled on the next turn.
    pub fn pending_action<R: Rng>(&mut self, rng: &mut R) -> usize {
        match self.next_action {
            Some(action) => action,
            None => {
                let action = self.select_action(rng);
                self.next_action = Some(action);
                action
            }
        }
    }

    /// Upper confidence bound action selection policy.
    /// While some arm has never been pulled, one of the unpulled arms is chosen.
    /// Otherwise the arm with the highest UCB score is chosen, ties broken at random.
    pub fn select_action<R: Rng>(&self, rng: &mut R) -> usize {
        let unvisited: Vec<usize> = self.num_times_arm_selected
            .iter()
            .enumerate()
            .filter(|(_, &count)| count == 0)
            .map(|(index, _)| index)
            .collect();

        if !unvisited.is_empty() {
            let action = unvisited[rng.gen_range(0..unvisited.len())];
            log::trace!("# Unvisited arm selected: {} of {:?} #", action, unvisited);
            return action;
        }

        // Every count is at least 1 here, so N >= 1 and ln(N) >= 0.
        let log_total_visits = (self.total_visits() as f64).ln();
        let scores: Vec<f64> = self.q_values
            .iter()
            .zip(self.num_times_arm_selected.iter())
            .map(|(&q, &count)| q + self.exploration * (log_total_visits / (count as f64)).sqrt())
            .collect();

        let action = random_argmax(&scores, rng);
        log::trace!("# UCB action selected: {} with score {} #", action, scores[action]);
        action
    }

    /// Plays one turn: pulls the pending arm and learns from the reward.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> StepOutcome {
        let action = self.pending_action(rng);
        let reward = self.environment[action].step(rng);
        self.update_average_value_function(action, reward);
        self.next_action = None;

        log::trace!(
            "Turn={} \t Playing arm {} \t Reward is {} \t Q after update: {}",
            self.total_visits(),
            action,
            reward,
            self.q_values[action]
        );
        StepOutcome { action, reward }
    }

    /// Sample average update: q <- q + (r - q) / n
    fn update_average_value_function(&mut self, action: usize, reward: f64) {
        self.num_times_arm_selected[action] += 1;
        self.total_reward += reward;

        let alpha = 1.0 / (self.num_times_arm_selected[action] as f64);
        self.q_values[action] += alpha * (reward - self.q_values[action]);
    }

    /// True mean of each arm, for statistics only.
    pub fn actual_means(&self) -> Vec<f64> {
        self.environment
            .iter()
            .map(|arm| arm.mean())
            .collect()
    }

    /// Arm with the largest true mean, the lowest index on ties.
    pub fn best_arm(&self) -> usize {
        let mut best = 0;
        for (index, arm) in self.environment.iter().enumerate() {
            if arm.mean() > self.environment[best].mean() {
                best = index;
            }
        }
        best
    }

    /// Largest true mean among the arms, the best average reward any policy can hope for.
    pub fn best_arm_mean(&self) -> f64 {
        self.environment[self.best_arm()].mean()
    }
}
