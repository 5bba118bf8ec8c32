//! Scalar and list parsers: complex constants, palettes, backend lists.

use num_complex::Complex32;

use crate::builders::BackendKind;

/// Parse a complex constant in format "re,im" (parentheses optional).
pub fn parse_complex(value: &str) -> Result<Complex32, String> {
    let trimmed = value.trim().trim_start_matches('(').trim_end_matches(')');
    let parts: Vec<&str> = trimmed.split(',').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Constant must be in format re,im (e.g., -0.805,0.156), got: {}",
            value
        ));
    }

    let re = parts[0]
        .trim()
        .parse::<f32>()
        .map_err(|_| format!("Invalid real part: {}", parts[0]))?;
    let im = parts[1]
        .trim()
        .parse::<f32>()
        .map_err(|_| format!("Invalid imaginary part: {}", parts[1]))?;

    Ok(Complex32::new(re, im))
}

/// Parse a palette in format "R,G,B;R,G,B;..." with 0-255 components.
pub fn parse_rgb_list(value: &str) -> Result<Vec<[u8; 3]>, String> {
    value
        .split(';')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            let parts: Vec<&str> = entry.split(',').collect();
            if parts.len() != 3 {
                return Err(format!("Color must be in format R,G,B, got: {}", entry));
            }
            let mut rgb = [0u8; 3];
            for (slot, part) in rgb.iter_mut().zip(&parts) {
                *slot = part
                    .trim()
                    .parse::<u8>()
                    .map_err(|_| format!("Invalid color component (0-255): {}", part))?;
            }
            Ok(rgb)
        })
        .collect()
}

/// Parse a comma-separated backend list, e.g. "gpu,parallel,sequential".
pub fn parse_backend_kinds(value: &str) -> Result<Vec<BackendKind>, String> {
    let kinds = value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::parse)
        .collect::<Result<Vec<BackendKind>, String>>()?;
    if kinds.is_empty() {
        return Err("At least one backend is required".to_string());
    }
    Ok(kinds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_complex() {
        assert_eq!(
            parse_complex("-0.805,0.156").unwrap(),
            Complex32::new(-0.805, 0.156)
        );
        assert_eq!(
            parse_complex("(0.285, 0.01)").unwrap(),
            Complex32::new(0.285, 0.01)
        );
        assert!(parse_complex("1.0").is_err());
        assert!(parse_complex("a,b").is_err());
    }

    #[test]
    fn test_parse_rgb_list() {
        assert_eq!(
            parse_rgb_list("0,0,100; 0,0,130").unwrap(),
            vec![[0, 0, 100], [0, 0, 130]]
        );
        assert!(parse_rgb_list("0,0").is_err());
        assert!(parse_rgb_list("0,0,300").is_err());
        assert!(parse_rgb_list("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_backend_kinds() {
        assert_eq!(
            parse_backend_kinds("sequential, parallel").unwrap(),
            vec![BackendKind::Sequential, BackendKind::Parallel]
        );
        assert!(parse_backend_kinds("cuda").is_err());
        assert!(parse_backend_kinds(" , ").is_err());
    }
}
