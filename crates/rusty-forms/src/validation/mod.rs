// File: src/validation/mod.rs
// Purpose: Run declared rules over a form graph and collect errors per path

use crate::form::{Form, Slot};
use std::fmt;
use std::rc::Rc;

pub mod errors;
pub mod rules;

pub use errors::Errors;
pub use rules::Rule;

use rules::Target;

type FormCheck = Rc<dyn Fn(&Form, &mut Errors)>;

/// Form-level validation with access to every field
///
/// Paths added to `errors` are relative to the form the rule is declared on.
#[derive(Clone)]
pub struct FormRule(FormCheck);

impl FormRule {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Form, &mut Errors) + 'static,
    {
        Self(Rc::new(check))
    }

    pub(crate) fn run(&self, form: &Form, errors: &mut Errors) {
        (self.0)(form, errors)
    }
}

impl fmt::Debug for FormRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FormRule(..)")
    }
}

/// Validates children first, then the node itself; stores the result on
/// every node and returns whether the whole subtree is valid
pub(crate) fn run(form: &mut Form) -> bool {
    for slot in form.slots.iter_mut() {
        match slot {
            Slot::One(Some(child)) => {
                run(child);
            }
            Slot::Many(children) => {
                for child in children.iter_mut() {
                    run(child);
                }
            }
            _ => {}
        }
    }

    let errors = collect(form);
    form.errors = errors;
    form.errors.is_empty()
}

fn collect(form: &Form) -> Errors {
    let config = &form.config.validation;
    let mut errors = Errors::new(config.base_key.clone());

    for (idx, field) in form.schema.fields().iter().enumerate() {
        let path = field.name();

        // A failed coercion or malformed fragment replaces the field's rules
        let input_error = form.input_errors[idx].as_deref();
        if let Some(message) = input_error {
            errors.add(path, message);
        }

        let target = match &form.slots[idx] {
            Slot::Scalar(value) => Target::Scalar(value),
            Slot::One(child) => Target::One(child.as_deref()),
            Slot::Many(children) => Target::Many(children),
        };

        if input_error.is_none() {
            for rule in field.rules().iter().filter(|rule| rule.is_active(form)) {
                if let Err(message) = rule.evaluate(path, target, form) {
                    errors.add(path, message);
                }
            }
        }

        match target {
            Target::One(Some(child)) => errors.merge_prefixed(path, &child.errors),
            Target::Many(children) => {
                for (i, child) in children.iter().enumerate() {
                    errors.merge_prefixed(&format!("{path}.{i}"), &child.errors);
                }
            }
            _ => {}
        }
    }

    for rule in form.schema.form_rules() {
        rule.run(form, &mut errors);
    }

    if config.halt_on_first_error {
        errors.truncate_to_first();
    }

    errors
}
