use std::path::PathBuf;

use julia_cli::{
    apply_overrides, build_backend, run_suite, BackendKind, Column, ConfigOverrides, ReportWriter,
    Run,
};
use julia_core::backend::JuliaBackend;
use julia_core::config::load_config;
use julia_core::driver::GenerationDriver;
use julia_core::exporters::PngSink;

/// Time every backend on every run and append the results to a CSV report.
pub fn cmd_bench(
    config_path: Option<PathBuf>,
    backends: Vec<BackendKind>,
    runs: Vec<Run>,
    overrides: ConfigOverrides,
    report: PathBuf,
    save_images: bool,
) -> Result<(), String> {
    let handle = load_config(config_path.as_deref());
    handle.log_usage();
    let mut config = handle.config;
    apply_overrides(&mut config, overrides);

    // Validate constant, limit and palette once before building anything.
    let base = config.generation_parameters().map_err(|e| e.to_string())?;

    let built: Vec<(BackendKind, Box<dyn JuliaBackend>)> = backends
        .iter()
        .map(|&kind| build_backend(kind, &config).map(|backend| (kind, backend)))
        .collect::<Result<_, _>>()?;

    let columns: Vec<Column> = built
        .iter()
        .map(|(kind, backend)| Column {
            name: backend.name(),
            kernel_time: *kind == BackendKind::Gpu,
        })
        .collect();

    let sink = PngSink::new(&config.output_dir);
    let driver = if save_images {
        GenerationDriver::new().with_sink(&sink)
    } else {
        GenerationDriver::new()
    };

    let mut report = ReportWriter::open(&report, base.c(), base.limit(), columns)?;
    let backends: Vec<Box<dyn JuliaBackend>> = built.into_iter().map(|(_, b)| b).collect();
    let summary = run_suite(&driver, &backends, &base, &runs, &mut report)?;
    println!(
        "Appended {} rows to {}",
        summary.rows,
        report.path().display()
    );

    match summary.failures.len() {
        0 => Ok(()),
        n => Err(format!(
            "{} backend run(s) failed and were reported as -1; first: {}",
            n, summary.failures[0]
        )),
    }
}
