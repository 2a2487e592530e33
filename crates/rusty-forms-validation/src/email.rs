//! Email checks

use crate::Violation;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]{1,64}@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email pattern compiles")
});

/// Syntactic check only; deliverability is out of reach here
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && !email.contains("..") && EMAIL_REGEX.is_match(email)
}

pub fn check_email(email: &str) -> Result<(), Violation> {
    if is_valid_email(email.trim()) {
        Ok(())
    } else {
        Err(Violation::InvalidEmail)
    }
}
