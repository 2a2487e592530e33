//! String checks
//!
//! Lengths are counted in characters, not bytes, so "héllo" has length 5.

use crate::Violation;
use regex::Regex;

/// True for empty or whitespace-only strings
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

pub fn check_presence(s: &str) -> Result<(), Violation> {
    if is_blank(s) {
        Err(Violation::Blank)
    } else {
        Ok(())
    }
}

pub fn check_absence(s: &str) -> Result<(), Violation> {
    if is_blank(s) {
        Ok(())
    } else {
        Err(Violation::Present)
    }
}

/// Checks an optional lower and upper character bound
pub fn check_length(s: &str, min: Option<usize>, max: Option<usize>) -> Result<(), Violation> {
    let len = s.chars().count();

    if let Some(min) = min {
        if len < min {
            return Err(Violation::TooShort { min });
        }
    }

    match max {
        Some(max) if len > max => Err(Violation::TooLong { max }),
        _ => Ok(()),
    }
}

pub fn check_exact_length(s: &str, exact: usize) -> Result<(), Violation> {
    if s.chars().count() == exact {
        Ok(())
    } else {
        Err(Violation::WrongLength { exact })
    }
}

/// Whole-value match is the caller's business: anchor the pattern if needed
pub fn check_format(s: &str, pattern: &Regex) -> Result<(), Violation> {
    if pattern.is_match(s) {
        Ok(())
    } else {
        Err(Violation::Invalid)
    }
}

/// Checkbox-style acceptance ("1", "true", "yes", "on")
pub fn check_acceptance(s: &str) -> Result<(), Violation> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(()),
        _ => Err(Violation::NotAccepted),
    }
}
