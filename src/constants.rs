/// Represents the number of arms in the k-armed bandit problem, it is the number k.
pub const NUM_OF_ARMS: usize = 50;
/// Represents the number of steps the agent takes for each exploration value in the sweep.
pub const NUM_OF_ITERATIONS: usize = 200;
/// Lower bound of the range that each arm's true mean reward is drawn from.
pub const MIN_ARM_MEAN: f64 = -5.0;
/// Upper bound of the range that each arm's true mean reward is drawn from.
pub const MAX_ARM_MEAN: f64 = 5.0;
/// Lower bound of the range that each arm's standard deviation is drawn from.
pub const MIN_ARM_SPREAD: f64 = 0.0;
/// Upper bound of the range that each arm's standard deviation is drawn from.
pub const MAX_ARM_SPREAD: f64 = 3.0;
/// Exploration strength c in the UCB score q + c * sqrt(ln(N) / n).
/// When c = 0, agent always exploits the arm with the highest estimate once every
/// arm has been tried. The larger c is, the more weight is given to arms that were
/// pulled only a few times.
pub const EXPLORATION: f64 = 1.0;
/// First exploration value of the default sweep.
pub const EXPLORATION_SWEEP_START: f64 = 0.001;
/// Distance between two neighbouring exploration values in the default sweep.
pub const EXPLORATION_SWEEP_STEP: f64 = 0.001;
/// Number of exploration values in the default sweep.
pub const EXPLORATION_SWEEP_LEN: usize = 199;
/// Seed for the random number generator. When None, a fresh seed is drawn and logged
/// so that the run can be repeated.
pub const SEED: Option<u64> = None;
/// If true, independent sweep points are simulated on the rayon thread pool.
pub const RUN_SWEEP_IN_PARALLEL: bool = true;
/// Directory where the reports are written.
pub const REPORT_DIRECTORY: &str = "files/ucb_multi_armed_bandits";
/// Maximum number of columns polars prints for a single dataframe.
pub const POLARS_MAX_COLS: &str = "10";
