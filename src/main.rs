mod constants;
mod environments;
mod errors;
mod simulation_runner;
mod statistics_calculator;
mod ucb_agent;

use constants::REPORT_DIRECTORY;
use errors::SimulationError;
use simulation_runner::{ SimulationRunner, SweepConfig };
use statistics_calculator::DataFrameReporter;

fn main() -> Result<(), SimulationError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut runner = SimulationRunner::new(SweepConfig::default())?;
    for (arm_number, arm) in runner.agent().environment.iter().enumerate() {
        log::debug!("Arm: {} \t Mean: {} \t Spread: {}", arm_number, arm.mean(), arm.spread());
    }
    let mut reporter = DataFrameReporter::new(REPORT_DIRECTORY);
    runner.run_and_report(&mut reporter)?;

    if let Some(path) = reporter.file_path() {
        println!("Sweep results for seed {} written to {}", runner.seed(), path.display());
    }
    Ok(())
}
