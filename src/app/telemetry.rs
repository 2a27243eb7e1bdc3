// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Telemetry
//!
//! Step by step progress goes to the terminal. Every reference problem also gets its own json
//! log, which records the duration of each `solve` span so accelerated and plain runs started
//! with `--compare` can be told apart and timed.

use super::{LogLevel, Problem};
use std::path::Path;
use tracing::{subscriber::set_global_default, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, EnvFilter, Registry};

/// The json log written for `problem`
pub(crate) fn log_file_name(problem: Problem) -> &'static str {
    match problem {
        Problem::Linear => "linear.json",
        Problem::Trigonometric => "trigonometric.json",
    }
}

/// Creates a subscriber writing to `console::Term::stdout` and to the json log of `problem`
/// in `log_directory`. `RUST_LOG` takes precedence over `log_level`.
pub(crate) fn get_subscriber(
    log_level: LogLevel,
    log_directory: &Path,
    problem: Problem,
) -> (impl Subscriber + Send + Sync, WorkerGuard) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(console::Term::stdout)
        .with_target(false)
        .without_time();

    let appender = tracing_appender::rolling::never(log_directory, log_file_name(problem));
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_span_events(FmtSpan::CLOSE)
        .json();

    (
        Registry::default()
            .with(env_filter)
            .with(console_layer)
            .with(json_layer),
        guard,
    )
}

/// Install the subscriber globally, routing `log` records through it
pub(crate) fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> color_eyre::Result<()> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{get_subscriber, log_file_name, LogLevel, Problem};

    #[test]
    fn each_problem_logs_to_its_own_file() {
        assert_ne!(
            log_file_name(Problem::Linear),
            log_file_name(Problem::Trigonometric)
        );
    }

    #[test]
    fn solve_spans_and_events_reach_the_json_log() {
        let directory = std::env::temp_dir().join("transporter_anderson_telemetry");
        std::fs::create_dir_all(&directory).unwrap();
        let path = directory.join(log_file_name(Problem::Trigonometric));
        let _ = std::fs::remove_file(&path);

        let (subscriber, guard) =
            get_subscriber(LogLevel::Info, &directory, Problem::Trigonometric);
        tracing::subscriber::with_default(subscriber, || {
            let _span = tracing::info_span!("solve", disabled = false).entered();
            tracing::info!(iterations = 7, "Accelerated loop converged");
        });
        // Dropping the guard flushes the non-blocking writer
        drop(guard);

        let log = std::fs::read_to_string(&path).unwrap();
        assert!(log.contains("Accelerated loop converged"));
        assert!(log.contains("\"iterations\":7"));
        assert!(log.contains("time.busy"));
    }
}
