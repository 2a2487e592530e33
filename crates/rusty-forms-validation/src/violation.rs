//! Violation type returned by every check

use thiserror::Error;

/// A failed check. The `Display` output is the user-facing message,
/// phrased to follow the field name ("title can't be blank").
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("can't be blank")]
    Blank,

    #[error("must be blank")]
    Present,

    #[error("is too short (minimum is {min} characters)")]
    TooShort { min: usize },

    #[error("is too long (maximum is {max} characters)")]
    TooLong { max: usize },

    #[error("is the wrong length (should be {exact} characters)")]
    WrongLength { exact: usize },

    #[error("is invalid")]
    Invalid,

    #[error("is not a valid email address")]
    InvalidEmail,

    #[error("is not included in the list")]
    NotIncluded,

    #[error("is reserved")]
    Excluded,

    #[error("is not a number")]
    NotANumber,

    #[error("must be an integer")]
    NotAnInteger,

    #[error("must be greater than or equal to {min}")]
    TooSmall { min: f64 },

    #[error("must be less than or equal to {max}")]
    TooLarge { max: f64 },

    #[error("doesn't match {other}")]
    Mismatch { other: String },

    #[error("must be accepted")]
    NotAccepted,

    #[error("must have at least {min} entries")]
    TooFew { min: usize },

    #[error("must have at most {max} entries")]
    TooMany { max: usize },

    #[error("must be unique")]
    Duplicate,

    #[error("{0}")]
    WeakPassword(&'static str),
}
