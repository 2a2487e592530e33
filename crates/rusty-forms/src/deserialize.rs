// File: src/deserialize.rs
// Purpose: Apply an input document onto a form graph

use crate::composition::Composition;
use crate::error::FormError;
use crate::form::{Form, Slot};
use crate::schema::{FieldDefinition, FieldKind, Schema};
use crate::value::Value;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::trace;

const INVALID: &str = "is invalid";
const NO_NEW_ENTRIES: &str = "does not accept new entries";

/// Updates the form in place from `params`
///
/// Undeclared keys are ignored; absent and skipped keys leave their field,
/// and any input error it carries, untouched.
/// Coercion failures and malformed fragments are kept as input errors for the
/// validator to report.
pub(crate) fn apply(form: &mut Form, params: &BTreeMap<String, Value>) -> Result<(), FormError> {
    let schema = Rc::clone(&form.schema);

    for (idx, field) in schema.fields().iter().enumerate() {
        if !field.parses() {
            continue;
        }

        let Some(fragment) = params.get(field.name()) else {
            continue;
        };

        // Collections test the predicate per entry
        let per_entry = matches!(field.kind(), FieldKind::Collection(_));
        if !per_entry && field.skip_if().map_or(false, |skip| skip.matches(fragment)) {
            trace!(field = field.name(), "skipped");
            continue;
        }

        // Input errors stand until the field receives a new fragment
        form.input_errors[idx] = None;

        match field.kind() {
            FieldKind::Scalar => apply_scalar(form, idx, field, fragment),
            FieldKind::Nested(nested) => apply_nested(form, idx, field, nested, fragment)?,
            FieldKind::Collection(nested) => apply_collection(form, idx, field, nested, fragment)?,
        }
    }

    Ok(())
}

fn apply_scalar(form: &mut Form, idx: usize, field: &FieldDefinition, fragment: &Value) {
    let coercion = &form.config.coercion;

    let raw = match fragment {
        Value::String(s) if s.trim().is_empty() && (field.nilifies() || coercion.nilify_blank) => Value::Null,
        other => other.clone(),
    };

    let value = match field.coercion() {
        Some(target) => match target.apply(&raw, &coercion.date_format) {
            Ok(value) => value,
            Err(err) => {
                trace!(field = field.name(), error = %err, "coercion failed");
                form.input_errors[idx] = Some(err.to_string());
                raw
            }
        },
        None => raw,
    };

    if let Slot::Scalar(current) = &mut form.slots[idx] {
        if *current != value {
            trace!(field = field.name(), "changed");
            *current = value;
            form.changed[idx] = true;
        }
    }
}

fn apply_nested(
    form: &mut Form,
    idx: usize,
    field: &FieldDefinition,
    nested: &Rc<Schema>,
    fragment: &Value,
) -> Result<(), FormError> {
    let entry = match fragment {
        Value::Null => return Ok(()),
        Value::Map(entry) => entry,
        _ => {
            form.input_errors[idx] = Some(INVALID.to_string());
            return Ok(());
        }
    };

    let config = Rc::clone(&form.config);
    let Slot::One(slot) = &mut form.slots[idx] else {
        return Ok(());
    };

    match slot {
        Some(child) => {
            apply(child, entry)?;
            form.changed[idx] |= child.any_changed();
        }
        None => match field.populate(fragment) {
            Some(handle) => {
                trace!(field = field.name(), "populated");
                let mut child = Form::build(Rc::clone(nested), Composition::single(handle), &config)?;
                apply(&mut child, entry)?;
                *slot = Some(Box::new(child));
                form.changed[idx] = true;
            }
            None => form.input_errors[idx] = Some(NO_NEW_ENTRIES.to_string()),
        },
    }

    Ok(())
}

fn apply_collection(
    form: &mut Form,
    idx: usize,
    field: &FieldDefinition,
    nested: &Rc<Schema>,
    fragment: &Value,
) -> Result<(), FormError> {
    let Some(entries) = collection_entries(fragment) else {
        if !fragment.is_null() {
            form.input_errors[idx] = Some(INVALID.to_string());
        }
        return Ok(());
    };

    let config = Rc::clone(&form.config);
    let drop_blank = config.deserialize.drop_blank_collection_entries;
    let Slot::Many(children) = &mut form.slots[idx] else {
        return Ok(());
    };
    let existing = children.len();

    for (position, entry) in entries.into_iter().enumerate() {
        let skipped = field.skip_if().map_or(false, |skip| skip.matches(entry)) || (drop_blank && entry.is_blank());
        if skipped {
            trace!(field = field.name(), position, "entry skipped");
            continue;
        }

        let Value::Map(values) = entry else {
            form.input_errors[idx] = Some(INVALID.to_string());
            continue;
        };

        if position < existing {
            apply(&mut children[position], values)?;
            continue;
        }

        match field.populate(entry) {
            Some(handle) => {
                trace!(field = field.name(), position, "populated");
                let mut child = Form::build(Rc::clone(nested), Composition::single(handle), &config)?;
                apply(&mut child, values)?;
                children.push(child);
                form.changed[idx] = true;
            }
            None => form.input_errors[idx] = Some(NO_NEW_ENTRIES.to_string()),
        }
    }

    form.changed[idx] |= children.iter().any(Form::any_changed);
    Ok(())
}

/// A list, or a map keyed by indices as produced by bracket notation
fn collection_entries(fragment: &Value) -> Option<Vec<&Value>> {
    match fragment {
        Value::List(items) => Some(items.iter().collect()),
        Value::Map(map) => {
            let mut indexed = map
                .iter()
                .map(|(key, value)| key.parse::<usize>().ok().map(|i| (i, value)))
                .collect::<Option<Vec<_>>>()?;
            indexed.sort_by_key(|(i, _)| *i);
            Some(indexed.into_iter().map(|(_, value)| value).collect())
        }
        _ => None,
    }
}
