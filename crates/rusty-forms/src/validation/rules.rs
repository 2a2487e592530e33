// File: src/validation/rules.rs
// Purpose: Declarative field rules evaluated against the form's own values

use crate::form::Form;
use crate::value::Value;
use regex::Regex;
use rusty_forms_validation::{self as checks, PasswordStrength, Violation};
use std::fmt;
use std::rc::Rc;

type CustomCheck = Rc<dyn Fn(&Value, &Form) -> Result<(), String>>;
type Guard = Rc<dyn Fn(&Form) -> bool>;

/// Compiled once; a bad pattern is reported by `SchemaBuilder::build`
#[derive(Clone)]
pub(crate) struct Pattern {
    pub(crate) source: String,
    pub(crate) compiled: Result<Regex, regex::Error>,
}

#[derive(Clone)]
pub(crate) enum Check {
    Presence,
    Absence,
    Length { min: Option<usize>, max: Option<usize> },
    ExactLength(usize),
    Format(Pattern),
    Email,
    Inclusion(Vec<Value>),
    Exclusion(Vec<Value>),
    Numericality { min: Option<f64>, max: Option<f64>, integer: bool },
    Confirmation,
    Acceptance,
    Count { min: Option<usize>, max: Option<usize> },
    UniqueBy(String),
    Password(PasswordStrength),
    Custom(CustomCheck),
}

/// Where a rule may be declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Applies {
    Scalar,
    Collection,
    ScalarOrCollection,
    Any,
}

/// The value a rule sees for its field
#[derive(Clone, Copy)]
pub(crate) enum Target<'a> {
    Scalar(&'a Value),
    One(Option<&'a Form>),
    Many(&'a [Form]),
}

/// A validation rule attached to a field
///
/// Format, length, email, inclusion, numericality and password rules skip
/// null values; pair them with [`Rule::presence`] to require a value.
#[derive(Clone)]
pub struct Rule {
    pub(crate) check: Check,
    message: Option<String>,
    when: Option<Guard>,
    unless: Option<Guard>,
}

impl Rule {
    fn new(check: Check) -> Self {
        Self {
            check,
            message: None,
            when: None,
            unless: None,
        }
    }

    /// Not blank; for nested fields, present; for collections, non-empty
    pub fn presence() -> Self {
        Self::new(Check::Presence)
    }

    pub fn absence() -> Self {
        Self::new(Check::Absence)
    }

    pub fn min_length(min: usize) -> Self {
        Self::new(Check::Length { min: Some(min), max: None })
    }

    pub fn max_length(max: usize) -> Self {
        Self::new(Check::Length { min: None, max: Some(max) })
    }

    pub fn length_between(min: usize, max: usize) -> Self {
        Self::new(Check::Length { min: Some(min), max: Some(max) })
    }

    pub fn exact_length(len: usize) -> Self {
        Self::new(Check::ExactLength(len))
    }

    /// Regex over the value's string form; anchor it to match the whole value
    pub fn format(pattern: &str) -> Self {
        Self::new(Check::Format(Pattern {
            source: pattern.to_string(),
            compiled: Regex::new(pattern),
        }))
    }

    pub fn email() -> Self {
        Self::new(Check::Email)
    }

    pub fn inclusion<I, V>(allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(Check::Inclusion(allowed.into_iter().map(Into::into).collect()))
    }

    pub fn exclusion<I, V>(forbidden: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(Check::Exclusion(forbidden.into_iter().map(Into::into).collect()))
    }

    /// Numbers or numeric strings
    pub fn numericality() -> Self {
        Self::new(Check::Numericality { min: None, max: None, integer: false })
    }

    pub fn integer() -> Self {
        Self::new(Check::Numericality { min: None, max: None, integer: true })
    }

    pub fn at_least(min: f64) -> Self {
        Self::new(Check::Numericality { min: Some(min), max: None, integer: false })
    }

    pub fn at_most(max: f64) -> Self {
        Self::new(Check::Numericality { min: None, max: Some(max), integer: false })
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self::new(Check::Numericality { min: Some(min), max: Some(max), integer: false })
    }

    /// Equal to the sibling field `<name>_confirmation` when that one is set
    pub fn confirmation() -> Self {
        Self::new(Check::Confirmation)
    }

    /// Checkbox-style: true, 1, "1", "yes", "on"
    pub fn acceptance() -> Self {
        Self::new(Check::Acceptance)
    }

    pub fn min_count(min: usize) -> Self {
        Self::new(Check::Count { min: Some(min), max: None })
    }

    pub fn max_count(max: usize) -> Self {
        Self::new(Check::Count { min: None, max: Some(max) })
    }

    /// Collection entries must differ in the given nested field; blanks are ignored
    pub fn unique_by(field: impl Into<String>) -> Self {
        Self::new(Check::UniqueBy(field.into()))
    }

    pub fn password(strength: PasswordStrength) -> Self {
        Self::new(Check::Password(strength))
    }

    /// Arbitrary check; nested fields are passed as their snapshot
    pub fn custom<F>(check: F) -> Self
    where
        F: Fn(&Value, &Form) -> Result<(), String> + 'static,
    {
        Self::new(Check::Custom(Rc::new(check)))
    }

    /// Replaces the default message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Evaluate only when the guard holds
    pub fn when<F>(mut self, guard: F) -> Self
    where
        F: Fn(&Form) -> bool + 'static,
    {
        self.when = Some(Rc::new(guard));
        self
    }

    /// Skip when the guard holds
    pub fn unless<F>(mut self, guard: F) -> Self
    where
        F: Fn(&Form) -> bool + 'static,
    {
        self.unless = Some(Rc::new(guard));
        self
    }

    pub fn name(&self) -> &'static str {
        match &self.check {
            Check::Presence => "presence",
            Check::Absence => "absence",
            Check::Length { .. } => "length",
            Check::ExactLength(_) => "length",
            Check::Format(_) => "format",
            Check::Email => "email",
            Check::Inclusion(_) => "inclusion",
            Check::Exclusion(_) => "exclusion",
            Check::Numericality { .. } => "numericality",
            Check::Confirmation => "confirmation",
            Check::Acceptance => "acceptance",
            Check::Count { .. } => "count",
            Check::UniqueBy(_) => "uniqueness",
            Check::Password(_) => "password",
            Check::Custom(_) => "custom",
        }
    }

    pub(crate) fn applies_to(&self) -> Applies {
        match &self.check {
            Check::Presence | Check::Absence | Check::Custom(_) => Applies::Any,
            Check::Count { .. } => Applies::ScalarOrCollection,
            Check::UniqueBy(_) => Applies::Collection,
            _ => Applies::Scalar,
        }
    }

    pub(crate) fn is_unconditional(&self) -> bool {
        self.when.is_none() && self.unless.is_none()
    }

    pub(crate) fn is_active(&self, form: &Form) -> bool {
        self.when.as_ref().map_or(true, |guard| guard(form))
            && !self.unless.as_ref().map_or(false, |guard| guard(form))
    }

    /// Runs the check; `Err` carries the final message
    pub(crate) fn evaluate(&self, field: &str, target: Target<'_>, form: &Form) -> Result<(), String> {
        let outcome = match target {
            Target::Scalar(value) => self.check_scalar(field, value, form),
            Target::One(child) => self.check_one(child, form),
            Target::Many(children) => self.check_many(children, form),
        };

        outcome.map_err(|message| self.message.clone().unwrap_or(message))
    }

    fn check_scalar(&self, field: &str, value: &Value, form: &Form) -> Result<(), String> {
        let violation = match &self.check {
            Check::Presence => (!value.is_blank()).then_some(()).ok_or(Violation::Blank),
            Check::Absence => value.is_blank().then_some(()).ok_or(Violation::Present),
            Check::Custom(check) => return check(value, form),
            _ if value.is_null() => Ok(()),
            Check::Length { min, max } => match value {
                Value::List(items) => checks::check_count(items.len(), *min, *max),
                other => checks::check_length(&other.to_string(), *min, *max),
            },
            Check::ExactLength(len) => checks::check_exact_length(&value.to_string(), *len),
            Check::Format(pattern) => match &pattern.compiled {
                Ok(regex) => checks::check_format(&value.to_string(), regex),
                Err(_) => Err(Violation::Invalid),
            },
            Check::Email => checks::check_email(&value.to_string()),
            Check::Inclusion(allowed) => checks::check_inclusion(value, allowed),
            Check::Exclusion(forbidden) => checks::check_exclusion(value, forbidden),
            Check::Numericality { min, max, integer } => number_of(value).and_then(|n| {
                if *integer {
                    checks::check_integer(n)?;
                }
                checks::check_range(n, *min, *max)
            }),
            Check::Confirmation => {
                let other = format!("{field}_confirmation");
                match form.value(&other) {
                    Some(confirmation) if !confirmation.is_null() && confirmation != value => {
                        Err(Violation::Mismatch { other: other.replace('_', " ") })
                    }
                    _ => Ok(()),
                }
            }
            Check::Acceptance => match value {
                Value::Bool(true) | Value::Int(1) => Ok(()),
                Value::String(s) => checks::check_acceptance(s),
                _ => Err(Violation::NotAccepted),
            },
            Check::Count { min, max } => match value {
                Value::List(items) => checks::check_count(items.len(), *min, *max),
                _ => Ok(()),
            },
            Check::Password(strength) => checks::check_password(&value.to_string(), *strength),
            Check::UniqueBy(_) => Ok(()),
        };

        violation.map_err(|v| v.to_string())
    }

    fn check_one(&self, child: Option<&Form>, form: &Form) -> Result<(), String> {
        let violation = match &self.check {
            Check::Presence => child.map(|_| ()).ok_or(Violation::Blank),
            Check::Absence => match child {
                Some(_) => Err(Violation::Present),
                None => Ok(()),
            },
            Check::Custom(check) => {
                let snapshot = child.map_or(Value::Null, Form::to_snapshot);
                return check(&snapshot, form);
            }
            _ => Ok(()),
        };

        violation.map_err(|v| v.to_string())
    }

    fn check_many(&self, children: &[Form], form: &Form) -> Result<(), String> {
        let violation = match &self.check {
            Check::Presence => (!children.is_empty()).then_some(()).ok_or(Violation::Blank),
            Check::Absence => children.is_empty().then_some(()).ok_or(Violation::Present),
            Check::Count { min, max } => checks::check_count(children.len(), *min, *max),
            Check::UniqueBy(key) => checks::check_unique(
                children
                    .iter()
                    .filter_map(|child| child.value(key))
                    .filter(|v| !v.is_blank())
                    .map(|v| v.to_json().to_string()),
            ),
            Check::Custom(check) => {
                let snapshot = Value::List(children.iter().map(Form::to_snapshot).collect());
                return check(&snapshot, form);
            }
            _ => Ok(()),
        };

        violation.map_err(|v| v.to_string())
    }
}

fn number_of(value: &Value) -> Result<f64, Violation> {
    match value {
        Value::String(s) => checks::parse_number(s),
        other => other.as_f64().ok_or(Violation::NotANumber),
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("check", &self.name())
            .field("message", &self.message)
            .finish()
    }
}
