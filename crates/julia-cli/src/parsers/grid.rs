//! Parsing of `size:iterations` run lists for the bench command.

use std::fmt;
use std::str::FromStr;

/// One benchmark point: grid side length and iteration cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub size: u32,
    pub max_iterations: u32,
}

impl FromStr for Run {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (size, iterations) = value
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("Run must be in format SIZE:ITERATIONS, got: {}", value))?;
        let size = size
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("Invalid size: {}", size))?;
        if size == 0 {
            return Err(format!("Size must be positive in run: {}", value));
        }
        let max_iterations = iterations
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("Invalid iteration count: {}", iterations))?;
        Ok(Self {
            size,
            max_iterations,
        })
    }
}

impl fmt::Display for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.size, self.max_iterations)
    }
}

/// Parse a comma-separated list such as "500:100,1000:300".
pub fn parse_runs(value: &str) -> Result<Vec<Run>, String> {
    let runs = value
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(str::parse)
        .collect::<Result<Vec<Run>, String>>()?;
    if runs.is_empty() {
        return Err("At least one SIZE:ITERATIONS run is required".to_string());
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_runs() {
        let runs = parse_runs("500:100, 6000:2000").unwrap();
        assert_eq!(
            runs,
            vec![
                Run {
                    size: 500,
                    max_iterations: 100
                },
                Run {
                    size: 6000,
                    max_iterations: 2000
                },
            ]
        );
        assert_eq!(runs[1].to_string(), "6000:2000");
    }

    #[test]
    fn test_zero_iterations_allowed_zero_size_rejected() {
        assert_eq!(
            "16:0".parse::<Run>().unwrap(),
            Run {
                size: 16,
                max_iterations: 0
            }
        );
        assert!("0:10".parse::<Run>().is_err());
    }

    #[test]
    fn test_malformed_runs() {
        assert!(parse_runs("").is_err());
        assert!(parse_runs("100").is_err());
        assert!(parse_runs("100:x").is_err());
    }
}
