use std::{ cmp, fs::{ self, File }, io::Write, path::{ Path, PathBuf } };

use chrono::{ DateTime, Local };
use polars::prelude::*;

use crate::constants::POLARS_MAX_COLS;
use crate::errors::ReportError;
use crate::simulation_runner::SweepSeries;

/// Receives the finished series of a sweep, one exploration value at a time, and
/// persists or renders them. `finish` is called once after the last series.
pub trait SweepReporter {
    fn report(&mut self, series: &SweepSeries) -> Result<(), ReportError>;

    fn finish(&mut self) -> Result<(), ReportError> {
        Ok(())
    }
}

/// Set environment variabls so that the whole dataframe is printed
fn set_polars_environment_variables(max_rows: usize) {
    std::env::set_var("POLARS_FMT_MAX_COLS", POLARS_MAX_COLS);
    std::env::set_var("POLARS_FMT_MAX_ROWS", max_rows.to_string());
}

/// Creates directory and its parents if they don't exist
fn create_directory(directory: &Path) -> Result<(), ReportError> {
    if directory.is_dir() {
        log::debug!("Directory '{}' already exists", directory.display());
        return Ok(());
    }
    fs::create_dir_all(directory)?;
    log::debug!("Directory '{}' created successfully", directory.display());
    Ok(())
}

fn get_timestamped_file_path(directory: &Path, file_name: &str) -> PathBuf {
    let local: DateTime<Local> = Local::now();
    let datetime_str: &str = &local.format("%Y-%m-%d_%H:%M:%S").to_string();
    let file_name = format!("{}_{}.txt", file_name, datetime_str);
    directory.join(file_name)
}

/// Collects every series into a polars dataframe and, when the sweep finishes,
/// writes them together with a summary of all sweep points into a timestamped file.
pub struct DataFrameReporter {
    directory: PathBuf,
    /// Label, running average frame and per-arm frame of every reported series.
    per_series_df: Vec<(String, DataFrame, DataFrame)>,
    explorations: Vec<f64>,
    final_averages: Vec<f64>,
    best_arm_means: Vec<f64>,
    best_arm_pulls: Vec<u64>,
    max_rows: usize,
    file_path: Option<PathBuf>,
}

impl DataFrameReporter {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        DataFrameReporter {
            directory: directory.as_ref().to_path_buf(),
            per_series_df: Vec::new(),
            explorations: Vec::new(),
            final_averages: Vec::new(),
            best_arm_means: Vec::new(),
            best_arm_pulls: Vec::new(),
            max_rows: 0,
            file_path: None,
        }
    }

    /// Path of the written report, None until `finish` wrote one.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Running average per iteration, with the regret against always pulling the best arm.
    fn series_dataframe(series: &SweepSeries) -> Result<DataFrame, ReportError> {
        let iterations: Vec<u64> = series.iterations
            .iter()
            .map(|&iteration| iteration as u64)
            .collect();
        let df = DataFrame::new(
            vec![
                Series::new("iteration", &iterations),
                Series::new("running_average", &series.running_averages)
            ]
        )?;

        let df = df
            .lazy()
            .with_column((lit(series.best_arm_mean) - col("running_average")).alias("regret"))
            .collect()?;
        Ok(df)
    }

    /// What was learned about each arm compared to its actual mean.
    fn per_arm_dataframe(series: &SweepSeries) -> Result<DataFrame, ReportError> {
        let arms: Vec<u64> = (0..series.actual_means.len() as u64).collect();
        let df = DataFrame::new(
            vec![
                Series::new("arm", &arms),
                Series::new("actual_mean", &series.actual_means),
                Series::new("q_value", &series.q_values),
                Series::new("visit_count", &series.visit_counts)
            ]
        )?;

        let df = df
            .lazy()
            .with_column((col("actual_mean") - col("q_value")).alias("diff_actual_learned"))
            .collect()?;
        Ok(df)
    }

    fn summary_dataframe(&self) -> Result<DataFrame, ReportError> {
        let df = DataFrame::new(
            vec![
                Series::new("exploration", &self.explorations),
                Series::new("final_average", &self.final_averages),
                Series::new("best_arm_mean", &self.best_arm_means),
                Series::new("best_arm_pulls", &self.best_arm_pulls)
            ]
        )?;

        let df = df
            .lazy()
            .with_column((col("best_arm_mean") - col("final_average")).alias("final_regret"))
            .collect()?;
        Ok(df)
    }

    fn get_data_to_write_in_file(&self) -> Result<Vec<String>, ReportError> {
        let mut lines: Vec<String> = Vec::new();

        lines.push("\n### Running average reward for each exploration value. ###".to_string());
        for (label, df, arms_df) in &self.per_series_df {
            lines.push(format!("### {} ###", label));
            lines.push(format!("{:?}\n", df));
            lines.push(format!("### {} \t Learned values per arm ###", label));
            lines.push(format!("{:?}\n", arms_df));
        }

        lines.push("### Summary for all exploration values ###".to_string());
        lines.push(format!("{:?}", self.summary_dataframe()?));
        Ok(lines)
    }
}

impl SweepReporter for DataFrameReporter {
    fn report(&mut self, series: &SweepSeries) -> Result<(), ReportError> {
        let df = Self::series_dataframe(series)?;
        let arms_df = Self::per_arm_dataframe(series)?;
        self.max_rows = cmp::max(self.max_rows, cmp::max(df.height(), arms_df.height()));
        self.per_series_df.push((series.label.clone(), df, arms_df));

        self.explorations.push(series.exploration);
        self.final_averages.push(series.final_average());
        self.best_arm_means.push(series.best_arm_mean);
        self.best_arm_pulls.push(series.best_arm_pulls());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        if self.per_series_df.is_empty() {
            log::warn!("No sweep results were reported, nothing to write");
            return Ok(());
        }

        set_polars_environment_variables(cmp::max(self.max_rows, self.explorations.len()));
        create_directory(&self.directory)?;

        let file_path = get_timestamped_file_path(&self.directory, "run_result");
        let mut output = File::create(&file_path)?;
        for line in self.get_data_to_write_in_file()? {
            writeln!(output, "{}", line)?;
        }

        log::info!("Statistics for all exploration values saved in file: {:?}", file_path);
        self.file_path = Some(file_path);
        Ok(())
    }
}
