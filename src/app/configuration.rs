// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use super::error::ApplicationError;
use crate::{AcceleratorConfiguration, Convergence};
use config::{Config, File};
use serde::{de::DeserializeOwned, Deserialize};
use std::{env, path::Path};

#[derive(Debug, Deserialize)]
pub(crate) struct Configuration<T> {
    pub(crate) accelerator: AcceleratorConfiguration<T>,
    pub(crate) solver: Convergence<T>,
    pub(crate) problem: ProblemConfiguration<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProblemConfiguration<T> {
    pub(crate) dimension: usize,
    /// Largest eigenvalue of the linear contraction
    pub(crate) spectral_radius: T,
    /// Nearest neighbour coupling of the trigonometric chain
    pub(crate) coupling: T,
}

impl<T: DeserializeOwned> Configuration<T> {
    /// Layer the defaults, the settings for the current `RUN_MODE` and an optional user file
    pub(crate) fn build(
        config_directory: &Path,
        user_file: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // The default settings which we use in the general case
            .add_source(File::from(config_directory.join("default")))
            // Overrides for the run mode, optional
            .add_source(File::from(config_directory.join(run_mode)).required(false));
        if let Some(path) = user_file {
            builder = builder.add_source(File::from(path));
        }

        Ok(builder.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
mod test {
    use super::Configuration;
    use std::path::PathBuf;

    fn config_directory() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".config")
    }

    #[test]
    fn defaults_deserialize() {
        let config: Configuration<f64> = Configuration::build(&config_directory(), None).unwrap();
        assert_eq!(config.accelerator.history_depth, 10);
        approx::assert_relative_eq!(config.accelerator.maximum_condition_number, 1e6);
        approx::assert_relative_eq!(config.accelerator.error_factor, 1e4);
        assert!(config.solver.maximum_iterations() > 0);
        assert!(config.problem.dimension > 0);
    }

    #[test]
    fn user_file_overrides_defaults() {
        let path = std::env::temp_dir().join("transporter_anderson_override.toml");
        std::fs::write(&path, "[accelerator]\nhistory_depth = 3\nerror_factor = inf\n").unwrap();

        let config: Configuration<f64> =
            Configuration::build(&config_directory(), Some(&path)).unwrap();
        assert_eq!(config.accelerator.history_depth, 3);
        assert!(config.accelerator.error_factor.is_infinite());
        approx::assert_relative_eq!(config.accelerator.maximum_condition_number, 1e6);

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_defaults_are_an_error() {
        let missing = std::env::temp_dir().join("transporter_anderson_missing_config");
        assert!(Configuration::<f64>::build(&missing, None).is_err());
    }
}
