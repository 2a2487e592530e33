// File: src/error.rs
// Purpose: Error types for schema definition, form setup, domain access and persistence

use crate::persist::SaveReport;
use thiserror::Error;

/// Raised by [`SchemaBuilder::build`](crate::SchemaBuilder::build) for
/// definitions that can never work
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{schema}: field `{field}` is declared twice")]
    DuplicateField { schema: String, field: String },

    #[error("{schema}: field `{field}` is declared on unknown model `{owner}`")]
    UnknownOwner {
        schema: String,
        field: String,
        owner: String,
    },

    #[error("{schema}: {rule} rule on `{field}` refers to undeclared field `{target}`")]
    UnknownField {
        schema: String,
        field: String,
        rule: &'static str,
        target: String,
    },

    #[error("{schema}: {rule} rule cannot be applied to {kind} field `{field}`")]
    RuleNotApplicable {
        schema: String,
        field: String,
        rule: &'static str,
        kind: &'static str,
    },

    #[error("{schema}: invalid pattern `{pattern}` on `{field}`: {source}")]
    InvalidPattern {
        schema: String,
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{schema}: nested form `{field}` uses a composed schema, which only top-level forms support")]
    ComposedNested { schema: String, field: String },
}

/// Failure reported by a domain object
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("{model} has no accessor `{accessor}`")]
    UnknownAccessor { model: String, accessor: String },

    #[error("{model}.{accessor} has no writer")]
    ReadOnly { model: String, accessor: String },

    #[error("{model}.{accessor} rejected the value: {reason}")]
    Rejected {
        model: String,
        accessor: String,
        reason: String,
    },

    #[error("model is already borrowed while accessing `{accessor}`")]
    Busy { accessor: String },

    #[error("{model} could not be saved: {reason}")]
    SaveFailed { model: String, reason: String },
}

/// Setup and persistence failures of the pipeline
///
/// Validation problems never show up here; they are collected in
/// [`Errors`](crate::Errors).
#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("{schema}: composition is missing model `{owner}`")]
    MissingOwner { schema: String, owner: String },

    #[error("{schema}: accessor `{accessor}` returned a {found}, field `{field}` expects a {expected}")]
    AttributeShape {
        schema: String,
        field: String,
        accessor: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("save failed: {0}")]
    Save(SaveReport),
}

impl FormError {
    /// True for failures raised while saving, after validation already passed
    pub fn is_save_failure(&self) -> bool {
        matches!(self, FormError::Save(_))
    }
}

/// Malformed input documents
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("input document must be a mapping, got {0}")]
    NotAMapping(&'static str),

    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not decode `{input}`: {reason}")]
    Decode { input: String, reason: String },

    #[error("parameter `{key}` is used both as a value and as a nested key")]
    Conflict { key: String },
}
