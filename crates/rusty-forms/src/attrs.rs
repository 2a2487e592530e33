// File: src/attrs.rs
// Purpose: HTML5 input attributes derived from a field's declared rules

use crate::form::Form;
use crate::validation::rules::Check;
use crate::value::Value;
use serde_json::{json, Map as JsonMap};
use std::collections::BTreeMap;

/// Attributes for rendering one field (HTML5 + data-validate JSON)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldAttrs {
    /// HTML5 validation attributes (type, required, minlength, pattern, ...)
    pub html5_attrs: BTreeMap<String, String>,

    /// JSON for the data-validate attribute, for client-side checks
    pub data_validate: String,
}

impl FieldAttrs {
    /// Render all attributes as one HTML string, in attribute name order
    pub fn render_all(&self) -> String {
        let mut attrs = vec![];

        for (key, value) in &self.html5_attrs {
            if value.is_empty() {
                attrs.push(key.clone());
            } else {
                attrs.push(format!(r#"{}="{}""#, key, escape(value)));
            }
        }

        if !self.data_validate.is_empty() {
            attrs.push(format!(r#"data-validate='{}'"#, self.data_validate.replace('\'', "&#39;")));
        }

        attrs.join(" ")
    }
}

impl Form {
    /// Attributes for the scalar field `name`; guarded rules are left out
    ///
    /// Unknown and nested fields yield empty attributes.
    pub fn field_attrs(&self, name: &str) -> FieldAttrs {
        let Some(field) = self.schema.field(name) else {
            return FieldAttrs::default();
        };
        if field.nested_schema().is_some() {
            return FieldAttrs::default();
        }

        let mut html5 = BTreeMap::new();
        let mut rules = JsonMap::new();

        for rule in field.rules().iter().filter(|rule| rule.is_unconditional()) {
            match &rule.check {
                Check::Presence => {
                    html5.insert("required".to_string(), String::new());
                    rules.insert("required".into(), json!(true));
                }
                Check::Length { min, max } => {
                    if let Some(min) = min {
                        html5.insert("minlength".to_string(), min.to_string());
                        rules.insert("min_length".into(), json!(min));
                    }
                    if let Some(max) = max {
                        html5.insert("maxlength".to_string(), max.to_string());
                        rules.insert("max_length".into(), json!(max));
                    }
                }
                Check::ExactLength(len) => {
                    html5.insert("minlength".to_string(), len.to_string());
                    html5.insert("maxlength".to_string(), len.to_string());
                    rules.insert("length".into(), json!(len));
                }
                Check::Format(pattern) => {
                    html5.insert("pattern".to_string(), pattern.source.clone());
                    rules.insert("pattern".into(), json!(pattern.source));
                }
                Check::Email => {
                    html5.insert("type".to_string(), "email".to_string());
                    rules.insert("email".into(), json!(true));
                }
                Check::Numericality { min, max, integer } => {
                    html5.insert("type".to_string(), "number".to_string());
                    if *integer {
                        html5.insert("step".to_string(), "1".to_string());
                    }
                    if let Some(min) = min {
                        html5.insert("min".to_string(), min.to_string());
                        rules.insert("min".into(), json!(min));
                    }
                    if let Some(max) = max {
                        html5.insert("max".to_string(), max.to_string());
                        rules.insert("max".into(), json!(max));
                    }
                }
                Check::Inclusion(allowed) => {
                    let allowed: Vec<_> = allowed.iter().map(Value::to_json).collect();
                    rules.insert("in".into(), json!(allowed));
                }
                Check::Acceptance => {
                    html5.insert("type".to_string(), "checkbox".to_string());
                    html5.insert("required".to_string(), String::new());
                }
                Check::Confirmation => {
                    rules.insert("equals".into(), json!(format!("{name}_confirmation")));
                }
                _ => {}
            }
        }

        FieldAttrs {
            html5_attrs: html5,
            data_validate: if rules.is_empty() {
                String::new()
            } else {
                serde_json::Value::Object(rules).to_string()
            },
        }
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
