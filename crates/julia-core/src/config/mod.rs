//! YAML configuration: file discovery, parsing and defaults.

mod defaults;

use std::fs;
use std::path::{Path, PathBuf};

pub use defaults::{GpuSettings, JuliaConfig, ParallelSettings, DEFAULT_PALETTE};

/// Candidate config file names searched for on disk.
const CONFIG_FILENAMES: &[&str] = &["julia.yml", "julia.yaml"];

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "JULIA_CONFIG";

/// The loaded configuration, where it came from, and anything skipped on the way.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    pub config: JuliaConfig,
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

impl ConfigHandle {
    /// Log the config source and warnings.
    pub fn log_usage(&self) {
        match &self.source {
            Some(source) => log::info!("Loaded config from {}", source.display()),
            None => log::info!("Using built-in defaults"),
        }
        for warning in &self.warnings {
            log::warn!("Config warning: {}", warning);
        }
    }
}

/// Load the first readable, parseable config file.
///
/// Unreadable or malformed candidates are recorded as warnings and the
/// search continues; built-in defaults are used when nothing loads.
pub fn load_config(custom_path: Option<&Path>) -> ConfigHandle {
    load_from_candidates(config_candidates(custom_path))
}

fn load_from_candidates(candidates: Vec<PathBuf>) -> ConfigHandle {
    let mut warnings = Vec::new();

    for candidate in candidates {
        if !candidate.is_file() {
            continue;
        }

        match fs::read_to_string(&candidate) {
            Ok(contents) => match parse_config(&contents) {
                Ok(config) => {
                    let source = fs::canonicalize(&candidate).unwrap_or(candidate);
                    return ConfigHandle {
                        config,
                        source: Some(source),
                        warnings,
                    };
                }
                Err(err) => warnings.push(format!(
                    "Failed to parse config {}: {}",
                    candidate.display(),
                    err
                )),
            },
            Err(err) => warnings.push(format!(
                "Failed to read config {}: {}",
                candidate.display(),
                err
            )),
        }
    }

    warnings.push("No config found; using built-in defaults.".to_string());
    ConfigHandle {
        config: JuliaConfig::default(),
        source: None,
        warnings,
    }
}

/// Parse a YAML document. Missing keys take their defaults; an empty
/// document is the default config.
pub fn parse_config(contents: &str) -> Result<JuliaConfig, crate::error::ConfigError> {
    if contents.trim().is_empty() {
        return Ok(JuliaConfig::default());
    }
    serde_yaml::from_str(contents).map_err(|e| crate::error::ConfigError::Load(e.to_string()))
}

fn config_candidates(custom_path: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = custom_path {
        candidates.push(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        candidates.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        for name in CONFIG_FILENAMES {
            candidates.push(cwd.join("config").join(name));
            candidates.push(cwd.join(name));
        }
    }

    if let Some(home_dir) = dirs::home_dir() {
        for name in CONFIG_FILENAMES {
            candidates.push(home_dir.join("julia").join(name));
        }
    }

    candidates
}
