// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! This module governs the command line driver, which runs reference problems through the
//! accelerated fixed-point loop
mod configuration;
mod error;
mod telemetry;

pub(crate) use configuration::Configuration;
pub(crate) use error::ApplicationError;

use crate::{
    problems::{LinearProblem, TrigonometricProblem},
    Accelerator, FixedPointLoopBuilder,
};
use clap::{ArgEnum, Parser};
use nalgebra::{DVector, RealField};
use ndarray::Array1;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct App {
    /// A configuration file overriding the defaults
    file_path: Option<PathBuf>,
    #[clap(arg_enum, short, long, default_value = "info")]
    log_level: LogLevel,
    #[clap(arg_enum, short, long, default_value = "linear")]
    problem: Problem,
    /// Also run plain damped iteration and report both iteration counts
    #[clap(long)]
    compare: bool,
    /// The directory holding `default.toml`
    #[clap(long, default_value = ".config")]
    config_directory: PathBuf,
    /// The directory the json logs are written to, one file per problem
    #[clap(long, default_value = "results")]
    log_directory: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ArgEnum)]
pub(crate) enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{level}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ArgEnum)]
pub(crate) enum Problem {
    Linear,
    Trigonometric,
}

/// Parse the command line, set up tracing and solve the requested problem
pub fn run<T>() -> color_eyre::Result<()>
where
    T: Copy + DeserializeOwned + RealField,
{
    let cli = App::parse();

    std::fs::create_dir_all(&cli.log_directory).map_err(ApplicationError::from)?;
    let (subscriber, _guard) =
        telemetry::get_subscriber(cli.log_level, &cli.log_directory, cli.problem);
    telemetry::init_subscriber(subscriber)?;

    let config: Configuration<T> =
        Configuration::build(&cli.config_directory, cli.file_path.as_deref())?;
    tracing::debug!(?config, "Loaded configuration");

    let accelerated = solve(&config, cli.problem, Accelerator::from(&config.accelerator))?;
    tracing::info!(
        problem = ?cli.problem,
        iterations = accelerated,
        "Accelerated loop converged"
    );

    if cli.compare {
        let plain = solve(&config, cli.problem, Accelerator::new(0, T::one(), T::one()))?;
        tracing::info!(
            problem = ?cli.problem,
            accelerated,
            plain,
            "Plain damped loop converged"
        );
    }

    Ok(())
}

/// Solve `problem` with the given accelerator, returning the number of iterations taken
pub(crate) fn solve<T>(
    config: &Configuration<T>,
    problem: Problem,
    accelerator: Accelerator<T>,
) -> Result<usize, ApplicationError>
where
    T: Copy + RealField,
{
    let _span = tracing::info_span!("solve", ?problem, disabled = accelerator.is_disabled())
        .entered();
    let dimension = config.problem.dimension;
    let iterations = match problem {
        Problem::Linear => {
            let problem = LinearProblem::evenly_spread(dimension, config.problem.spectral_radius);
            FixedPointLoopBuilder::new()
                .with_convergence_settings(&config.solver)
                .with_problem(problem)
                .with_accelerator(accelerator)
                .build()
                .run_loop(DVector::zeros(dimension))?
                .iterations
        }
        Problem::Trigonometric => {
            let problem = TrigonometricProblem::new(dimension, config.problem.coupling);
            FixedPointLoopBuilder::new()
                .with_convergence_settings(&config.solver)
                .with_problem(problem)
                .with_accelerator(accelerator)
                .build()
                .run_loop(Array1::zeros(dimension))?
                .iterations
        }
    };
    Ok(iterations)
}

#[cfg(test)]
mod test {
    use super::{solve, Configuration, Problem};
    use crate::Accelerator;
    use std::path::PathBuf;

    fn configuration() -> Configuration<f64> {
        let directory = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".config");
        Configuration::build(&directory, None).unwrap()
    }

    #[test]
    fn default_configuration_solves_both_problems() {
        let config = configuration();
        for problem in [Problem::Linear, Problem::Trigonometric] {
            let iterations =
                solve(&config, problem, Accelerator::from(&config.accelerator)).unwrap();
            assert!(iterations > 0);
        }
    }

    #[test]
    fn acceleration_needs_fewer_steps_than_plain_damping() {
        let config = configuration();
        let accelerated =
            solve(&config, Problem::Linear, Accelerator::from(&config.accelerator)).unwrap();
        let plain = solve(&config, Problem::Linear, Accelerator::new(0, 1., 1.)).unwrap();
        assert!(accelerated < plain);
    }

    #[test]
    fn log_level_renders_as_a_filter_directive() {
        assert_eq!(super::LogLevel::Warn.to_string(), "warn");
    }
}
