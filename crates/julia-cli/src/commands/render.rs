use std::path::PathBuf;

use julia_cli::{apply_overrides, build_backend, BackendKind, ConfigOverrides};
use julia_core::config::load_config;
use julia_core::driver::{GenerationDriver, Progress};
use julia_core::exporters::PngSink;

/// Render one image with the chosen backend and save it as PNG.
pub fn cmd_render(
    config_path: Option<PathBuf>,
    backend: BackendKind,
    overrides: ConfigOverrides,
    name: Option<String>,
) -> Result<(), String> {
    let handle = load_config(config_path.as_deref());
    handle.log_usage();
    let mut config = handle.config;
    apply_overrides(&mut config, overrides);

    let params = config.generation_parameters().map_err(|e| e.to_string())?;
    let backend = build_backend(backend, &config)?;
    let sink = PngSink::new(&config.output_dir);

    let driver = GenerationDriver::new()
        .with_sink(&sink)
        .on_progress(|event| match event {
            Progress::Started { backend, size } => {
                println!("Processing {}x{} with {}...", size, size, backend)
            }
            Progress::Computed { stats } => println!("  {}", stats),
            Progress::Persisted { tag } => println!("Saved: {}", sink.path_for(&tag).display()),
        });

    let outcome = driver
        .run(backend.as_ref(), &params, name.as_deref())
        .map_err(|e| e.to_string())?;

    log::debug!("Rendered '{}'", outcome.tag);
    println!("...done");
    Ok(())
}
