//! Numeric checks

use crate::Violation;

/// Parses a user-supplied number, tolerating surrounding whitespace
pub fn parse_number(s: &str) -> Result<f64, Violation> {
    s.trim().parse::<f64>().map_err(|_| Violation::NotANumber)
}

pub fn check_integer(n: f64) -> Result<(), Violation> {
    if n.fract() == 0.0 {
        Ok(())
    } else {
        Err(Violation::NotAnInteger)
    }
}

/// Inclusive bounds; either side may be open
pub fn check_range(n: f64, min: Option<f64>, max: Option<f64>) -> Result<(), Violation> {
    if let Some(min) = min {
        if n < min {
            return Err(Violation::TooSmall { min });
        }
    }

    match max {
        Some(max) if n > max => Err(Violation::TooLarge { max }),
        _ => Ok(()),
    }
}
