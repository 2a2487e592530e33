//! Collection and membership checks

use crate::Violation;
use std::collections::BTreeSet;

/// Inclusive bounds on the number of entries
pub fn check_count(len: usize, min: Option<usize>, max: Option<usize>) -> Result<(), Violation> {
    if let Some(min) = min {
        if len < min {
            return Err(Violation::TooFew { min });
        }
    }

    match max {
        Some(max) if len > max => Err(Violation::TooMany { max }),
        _ => Ok(()),
    }
}

/// Fails on the first repeated key
pub fn check_unique<T: Ord>(keys: impl IntoIterator<Item = T>) -> Result<(), Violation> {
    let mut seen = BTreeSet::new();

    for key in keys {
        if !seen.insert(key) {
            return Err(Violation::Duplicate);
        }
    }

    Ok(())
}

pub fn check_inclusion<T: PartialEq>(value: &T, allowed: &[T]) -> Result<(), Violation> {
    if allowed.contains(value) {
        Ok(())
    } else {
        Err(Violation::NotIncluded)
    }
}

pub fn check_exclusion<T: PartialEq>(value: &T, forbidden: &[T]) -> Result<(), Violation> {
    if forbidden.contains(value) {
        Err(Violation::Excluded)
    } else {
        Ok(())
    }
}
