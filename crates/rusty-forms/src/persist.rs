// File: src/persist.rs
// Purpose: Save nested objects and composition owners after sync

use crate::error::ModelError;
use crate::form::{Form, Slot};
use crate::model::ModelHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{trace, warn};

/// What to do after the first failed save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavePolicy {
    /// Attempt every save and report all failures
    #[default]
    CollectAll,
    /// Stop at the first failure
    ShortCircuit,
}

/// One failed `save`
#[derive(Debug, Clone, PartialEq)]
pub struct SaveFailure {
    /// Field path of the nested object, or the owner key for top-level objects
    pub path: String,
    pub model: String,
    pub error: ModelError,
}

/// Outcome of [`Form::save`](crate::Form::save)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    /// Successful saves
    pub saved: usize,
    pub failures: Vec<SaveFailure>,
}

impl SaveReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure(&self, path: &str) -> Option<&SaveFailure> {
        self.failures.iter().find(|f| f.path == path)
    }
}

impl fmt::Display for SaveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} saved, {} failed", self.saved, self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.path, failure.error)?;
        }
        Ok(())
    }
}

struct Halted;

/// Saves children before parents, depth first, and the primary owner last
pub(crate) fn run(form: &Form, policy: SavePolicy) -> SaveReport {
    let mut report = SaveReport::default();
    let _ = save_form(form, None, policy, &mut report);
    report
}

fn save_form(form: &Form, prefix: Option<&str>, policy: SavePolicy, report: &mut SaveReport) -> Result<(), Halted> {
    for (field, slot) in form.schema.fields().iter().zip(&form.slots) {
        if field.is_virtual() || !field.saves() {
            continue;
        }

        let path = match prefix {
            Some(prefix) => format!("{prefix}.{}", field.name()),
            None => field.name().to_string(),
        };

        match slot {
            Slot::One(Some(child)) => save_form(child, Some(&path), policy, report)?,
            Slot::Many(children) => {
                for (i, child) in children.iter().enumerate() {
                    save_form(child, Some(&format!("{path}.{i}")), policy, report)?;
                }
            }
            _ => {}
        }
    }

    for (key, handle) in form.composition.save_order() {
        let path = prefix.unwrap_or(key);
        save_one(path, handle, policy, report)?;
    }

    Ok(())
}

fn save_one(path: &str, handle: &ModelHandle, policy: SavePolicy, report: &mut SaveReport) -> Result<(), Halted> {
    match handle.save() {
        Ok(()) => {
            trace!(path, "saved");
            report.saved += 1;
            Ok(())
        }
        Err(error) => {
            let model = handle.name();
            warn!(path, model = %model, error = %error, "save failed");
            report.failures.push(SaveFailure {
                path: path.to_string(),
                model,
                error,
            });
            match policy {
                SavePolicy::CollectAll => Ok(()),
                SavePolicy::ShortCircuit => Err(Halted),
            }
        }
    }
}
