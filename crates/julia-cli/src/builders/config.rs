//! Command-line overrides layered on top of the loaded [`JuliaConfig`].

use std::path::PathBuf;

use julia_core::config::JuliaConfig;
use num_complex::Complex32;

/// Values given on the command line. `None` keeps the config value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub constant: Option<Complex32>,
    pub limit: Option<f32>,
    pub size: Option<u32>,
    pub max_iterations: Option<u32>,
    pub palette: Option<Vec<[u8; 3]>>,
    pub output_dir: Option<PathBuf>,
    pub platform: Option<String>,
    pub kernel: Option<PathBuf>,
    pub block_size: Option<u32>,
    pub threads: Option<usize>,
}

/// Apply every set override to `config`.
pub fn apply_overrides(config: &mut JuliaConfig, overrides: ConfigOverrides) {
    if let Some(c) = overrides.constant {
        config.constant = [c.re, c.im];
    }
    if let Some(limit) = overrides.limit {
        config.limit = limit;
    }
    if let Some(size) = overrides.size {
        config.size = size;
    }
    if let Some(max_iterations) = overrides.max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(palette) = overrides.palette {
        config.palette = palette;
    }
    if let Some(dir) = overrides.output_dir {
        config.output_dir = dir;
    }
    if overrides.platform.is_some() {
        config.gpu.platform = overrides.platform;
    }
    if overrides.kernel.is_some() {
        config.gpu.kernel = overrides.kernel;
    }
    if let Some(block_size) = overrides.block_size {
        config.parallel.block_size = block_size;
    }
    if overrides.threads.is_some() {
        config.parallel.threads = overrides.threads;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_overrides_keep_config() {
        let mut config = JuliaConfig::default();
        apply_overrides(&mut config, ConfigOverrides::default());
        assert_eq!(config, JuliaConfig::default());
    }

    #[test]
    fn test_overrides_replace_values() {
        let mut config = JuliaConfig::default();
        apply_overrides(
            &mut config,
            ConfigOverrides {
                constant: Some(Complex32::new(0.285, 0.01)),
                size: Some(64),
                max_iterations: Some(0),
                platform: Some("intel".to_string()),
                threads: Some(3),
                ..Default::default()
            },
        );
        assert_eq!(config.constant, [0.285, 0.01]);
        assert_eq!(config.size, 64);
        assert_eq!(config.max_iterations, 0);
        assert_eq!(config.gpu.platform.as_deref(), Some("intel"));
        assert_eq!(config.parallel.threads, Some(3));
        assert_eq!(config.limit, 1.7);
    }
}
