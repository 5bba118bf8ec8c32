//! Benchmark loop behind the `bench` command.
//!
//! Each row is written to the report as soon as every backend has run on it,
//! so a failure on a later run never loses earlier timings.

use julia_core::backend::JuliaBackend;
use julia_core::driver::GenerationDriver;
use julia_core::models::GenerationParameters;

use crate::parsers::Run;
use crate::report::{ReportWriter, Row};

/// One backend that failed on one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub backend: String,
    pub run: Run,
    pub message: String,
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed on {}: {}", self.backend, self.run, self.message)
    }
}

/// What a suite left behind.
#[derive(Debug, Default)]
pub struct SuiteSummary {
    pub rows: usize,
    pub failures: Vec<Failure>,
}

/// Run every backend on every run and append one report row per run.
///
/// `backends` must be in the same order as the report's columns. A backend
/// error is printed, recorded in the summary and written as `-1`; only report
/// I/O errors abort the suite.
pub fn run_suite(
    driver: &GenerationDriver<'_>,
    backends: &[Box<dyn JuliaBackend>],
    base: &GenerationParameters,
    runs: &[Run],
    report: &mut ReportWriter,
) -> Result<SuiteSummary, String> {
    let mut summary = SuiteSummary::default();

    for run in runs {
        println!("Run {}", run);
        let params = match base.with_grid(run.size, run.max_iterations) {
            Ok(params) => params,
            Err(e) => {
                let failure = Failure {
                    backend: "all".to_string(),
                    run: *run,
                    message: e.to_string(),
                };
                eprintln!("  {}", failure);
                summary.failures.push(failure);
                continue;
            }
        };

        let mut stats = Vec::with_capacity(backends.len());
        for backend in backends {
            match driver.run(backend.as_ref(), &params, None) {
                Ok(outcome) => {
                    println!("  {:<28} {}", backend.name(), outcome.stats);
                    stats.push(Some(outcome.stats));
                }
                Err(e) => {
                    let failure = Failure {
                        backend: backend.name(),
                        run: *run,
                        message: e.to_string(),
                    };
                    eprintln!("  {}", failure);
                    log::error!("{}", failure);
                    summary.failures.push(failure);
                    stats.push(None);
                }
            }
        }

        report.append(&Row {
            size: run.size,
            max_iterations: run.max_iterations,
            stats,
        })?;
        summary.rows += 1;
    }

    Ok(summary)
}
