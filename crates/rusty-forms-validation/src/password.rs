//! Password strength checks

use crate::Violation;
use std::str::FromStr;

/// Strength tiers, from least to most demanding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordStrength {
    /// 6+ characters
    Basic,
    /// 8+ characters with upper, lower and digit
    Medium,
    /// Medium plus a non-alphanumeric character
    Strong,
}

impl FromStr for PasswordStrength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "medium" => Ok(Self::Medium),
            "strong" => Ok(Self::Strong),
            other => Err(format!("unknown password strength `{other}`")),
        }
    }
}

/// Reports the first unmet requirement
pub fn check_password(password: &str, strength: PasswordStrength) -> Result<(), Violation> {
    let len = password.chars().count();
    let min_len = match strength {
        PasswordStrength::Basic => 6,
        PasswordStrength::Medium | PasswordStrength::Strong => 8,
    };

    if len < min_len {
        return Err(Violation::TooShort { min: min_len });
    }
    if strength == PasswordStrength::Basic {
        return Ok(());
    }

    let checks = [
        (password.chars().any(char::is_uppercase), "must contain an uppercase letter"),
        (password.chars().any(char::is_lowercase), "must contain a lowercase letter"),
        (password.chars().any(|c| c.is_ascii_digit()), "must contain a digit"),
        (
            strength != PasswordStrength::Strong || password.chars().any(|c| !c.is_alphanumeric()),
            "must contain a special character",
        ),
    ];

    checks
        .iter()
        .find(|(passed, _)| !passed)
        .map_or(Ok(()), |(_, message)| Err(Violation::WeakPassword(*message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strength() {
        assert_eq!("medium".parse::<PasswordStrength>(), Ok(PasswordStrength::Medium));
        assert!("extreme".parse::<PasswordStrength>().is_err());
    }

    #[test]
    fn test_basic() {
        assert!(check_password("abcdef", PasswordStrength::Basic).is_ok());
        assert_eq!(
            check_password("abc", PasswordStrength::Basic),
            Err(Violation::TooShort { min: 6 })
        );
    }

    #[test]
    fn test_medium_and_strong() {
        assert!(check_password("Abcdefg1", PasswordStrength::Medium).is_ok());
        assert_eq!(
            check_password("abcdefg1", PasswordStrength::Medium),
            Err(Violation::WeakPassword("must contain an uppercase letter"))
        );
        assert_eq!(
            check_password("Abcdefg1", PasswordStrength::Strong),
            Err(Violation::WeakPassword("must contain a special character"))
        );
        assert!(check_password("Abcdef1!", PasswordStrength::Strong).is_ok());
    }
}
