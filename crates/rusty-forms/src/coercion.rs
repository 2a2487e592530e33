// File: src/coercion.rs
// Purpose: Convert raw input fragments into typed field values

use crate::value::Value;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use uuid::Uuid;

type CustomCoercion = Rc<dyn Fn(&Value) -> Result<Value, String>>;

/// Target type of a field
///
/// Applied only while deserializing input; values read from the domain
/// object are taken as they are.
#[derive(Clone)]
pub enum Coercion {
    String,
    Integer,
    Float,
    Boolean,
    /// Parsed with `CoercionConfig::date_format`
    Date,
    /// RFC 3339, normalized to UTC
    DateTime,
    Uuid,
    Custom(CustomCoercion),
}

impl Coercion {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + 'static,
    {
        Coercion::Custom(Rc::new(f))
    }

    /// Null passes through untouched
    pub fn apply(&self, raw: &Value, date_format: &str) -> Result<Value, CoercionError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }

        match self {
            Coercion::String => to_string(raw),
            Coercion::Integer => to_integer(raw),
            Coercion::Float => to_float(raw),
            Coercion::Boolean => to_boolean(raw),
            Coercion::Date => to_date(raw, date_format),
            Coercion::DateTime => to_datetime(raw),
            Coercion::Uuid => to_uuid(raw),
            Coercion::Custom(f) => f(raw).map_err(CoercionError::Custom),
        }
    }
}

impl fmt::Debug for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coercion::String => f.write_str("String"),
            Coercion::Integer => f.write_str("Integer"),
            Coercion::Float => f.write_str("Float"),
            Coercion::Boolean => f.write_str("Boolean"),
            Coercion::Date => f.write_str("Date"),
            Coercion::DateTime => f.write_str("DateTime"),
            Coercion::Uuid => f.write_str("Uuid"),
            Coercion::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Reported as a validation message on the field
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("is not a valid string")]
    String,

    #[error("is not a valid integer")]
    Integer,

    #[error("is not a valid number")]
    Float,

    #[error("is not a valid boolean")]
    Boolean,

    #[error("is not a valid date")]
    Date,

    #[error("is not a valid date and time")]
    DateTime,

    #[error("is not a valid UUID")]
    Uuid,

    #[error("{0}")]
    Custom(String),
}

fn to_string(raw: &Value) -> Result<Value, CoercionError> {
    match raw {
        Value::List(_) | Value::Map(_) => Err(CoercionError::String),
        Value::String(s) => Ok(Value::String(s.clone())),
        other => Ok(Value::String(other.to_string())),
    }
}

// 2^63 is exactly representable and the first float past i64::MAX
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

fn to_integer(raw: &Value) -> Result<Value, CoercionError> {
    match raw {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(n) if n.fract() == 0.0 && (I64_LOWER..I64_UPPER).contains(n) => Ok(Value::Int(*n as i64)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| CoercionError::Integer),
        _ => Err(CoercionError::Integer),
    }
}

fn to_float(raw: &Value) -> Result<Value, CoercionError> {
    match raw {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(n) => Ok(Value::Float(*n)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Float)
            .ok_or(CoercionError::Float),
        _ => Err(CoercionError::Float),
    }
}

fn to_boolean(raw: &Value) -> Result<Value, CoercionError> {
    match raw {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Int(0) => Ok(Value::Bool(false)),
        Value::Int(1) => Ok(Value::Bool(true)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(CoercionError::Boolean),
        },
        _ => Err(CoercionError::Boolean),
    }
}

fn to_date(raw: &Value, format: &str) -> Result<Value, CoercionError> {
    match raw {
        Value::Date(d) => Ok(Value::Date(*d)),
        Value::DateTime(dt) => Ok(Value::Date(dt.date_naive())),
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), format)
            .map(Value::Date)
            .map_err(|_| CoercionError::Date),
        _ => Err(CoercionError::Date),
    }
}

fn to_datetime(raw: &Value) -> Result<Value, CoercionError> {
    match raw {
        Value::DateTime(dt) => Ok(Value::DateTime(*dt)),
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
            .map_err(|_| CoercionError::DateTime),
        _ => Err(CoercionError::DateTime),
    }
}

fn to_uuid(raw: &Value) -> Result<Value, CoercionError> {
    match raw {
        Value::Uuid(id) => Ok(Value::Uuid(*id)),
        Value::String(s) => Uuid::parse_str(s.trim())
            .map(Value::Uuid)
            .map_err(|_| CoercionError::Uuid),
        _ => Err(CoercionError::Uuid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    const ISO: &str = "%Y-%m-%d";

    #[rstest]
    #[case(Value::from("42"), Ok(Value::Int(42)))]
    #[case(Value::from(" -7 "), Ok(Value::Int(-7)))]
    #[case(Value::Float(3.0), Ok(Value::Int(3)))]
    #[case(Value::Float(3.5), Err(CoercionError::Integer))]
    #[case(Value::Float(1e20), Err(CoercionError::Integer))]
    #[case(Value::Float(-1e20), Err(CoercionError::Integer))]
    #[case(Value::Float(f64::INFINITY), Err(CoercionError::Integer))]
    #[case(Value::Float(-9_223_372_036_854_775_808.0), Ok(Value::Int(i64::MIN)))]
    #[case(Value::from("forty-two"), Err(CoercionError::Integer))]
    #[case(Value::Null, Ok(Value::Null))]
    fn test_integer(#[case] raw: Value, #[case] expected: Result<Value, CoercionError>) {
        assert_eq!(Coercion::Integer.apply(&raw, ISO), expected);
    }

    #[rstest]
    #[case("yes", true)]
    #[case("ON", true)]
    #[case("1", true)]
    #[case("off", false)]
    #[case("0", false)]
    fn test_boolean_strings(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(Coercion::Boolean.apply(&Value::from(raw), ISO), Ok(Value::Bool(expected)));
    }

    #[test]
    fn test_boolean_rejects_garbage() {
        assert_eq!(Coercion::Boolean.apply(&Value::from("maybe"), ISO), Err(CoercionError::Boolean));
    }

    #[test]
    fn test_float() {
        assert_eq!(Coercion::Float.apply(&Value::from("2.5"), ISO), Ok(Value::Float(2.5)));
        assert_eq!(Coercion::Float.apply(&Value::Int(2), ISO), Ok(Value::Float(2.0)));
        assert_eq!(Coercion::Float.apply(&Value::from("inf"), ISO), Err(CoercionError::Float));
    }

    #[test]
    fn test_date_uses_configured_format() {
        let expected = Value::Date(NaiveDate::from_ymd_opt(1983, 6, 1).unwrap());
        assert_eq!(Coercion::Date.apply(&Value::from("1983-06-01"), ISO), Ok(expected.clone()));
        assert_eq!(Coercion::Date.apply(&Value::from("01.06.1983"), "%d.%m.%Y"), Ok(expected));
        assert_eq!(Coercion::Date.apply(&Value::from("June 1st"), ISO), Err(CoercionError::Date));
    }

    #[test]
    fn test_datetime_normalizes_to_utc() {
        let parsed = Coercion::DateTime
            .apply(&Value::from("2024-05-01T12:00:00+02:00"), ISO)
            .unwrap();
        assert_eq!(parsed, Value::DateTime(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()));
    }

    #[test]
    fn test_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(Coercion::Uuid.apply(&Value::from(id.to_string()), ISO), Ok(Value::Uuid(id)));
        assert_eq!(Coercion::Uuid.apply(&Value::from("not-a-uuid"), ISO), Err(CoercionError::Uuid));
    }

    #[test]
    fn test_string_from_scalars() {
        assert_eq!(Coercion::String.apply(&Value::Int(5), ISO), Ok(Value::from("5")));
        assert_eq!(
            Coercion::String.apply(&Value::List(vec![]), ISO),
            Err(CoercionError::String)
        );
    }

    #[test]
    fn test_custom() {
        let upcase = Coercion::custom(|v| match v {
            Value::String(s) => Ok(Value::String(s.to_uppercase())),
            _ => Err("must be text".to_string()),
        });
        assert_eq!(upcase.apply(&Value::from("abc"), ISO), Ok(Value::from("ABC")));
        assert_eq!(
            upcase.apply(&Value::Int(1), ISO),
            Err(CoercionError::Custom("must be text".to_string()))
        );
    }
}
