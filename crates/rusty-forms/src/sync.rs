// File: src/sync.rs
// Purpose: Write form values back onto the domain objects

use crate::error::FormError;
use crate::form::{Form, Slot};
use crate::model::{Attribute, ModelHandle};
use tracing::trace;

/// Writes every writeable field to its owner, nested forms first
///
/// Virtual and non-writeable fields are skipped along with their nested forms.
/// Collections are written as the list of nested handles in form order, so
/// populated entries get attached to the parent object.
pub(crate) fn run(form: &Form) -> Result<(), FormError> {
    for (field, slot) in form.schema.fields().iter().zip(&form.slots) {
        if !field.is_writeable() {
            continue;
        }

        let owner = form
            .composition
            .resolve(field.owner())
            .ok_or_else(|| FormError::MissingOwner {
                schema: form.schema.name().to_string(),
                owner: field.owner().unwrap_or_default().to_string(),
            })?;

        let attribute = match slot {
            Slot::Scalar(value) => Attribute::Scalar(value.clone()),
            Slot::One(child) => {
                if let Some(child) = child {
                    run(child)?;
                }
                Attribute::One(child.as_ref().map(|c| c.model().clone()))
            }
            Slot::Many(children) => {
                for child in children {
                    run(child)?;
                }
                Attribute::Many(children.iter().map(|c| c.model().clone()).collect::<Vec<ModelHandle>>())
            }
        };

        trace!(field = field.name(), accessor = field.accessor(), "write");
        owner.write(field.accessor(), attribute)?;
    }

    Ok(())
}
