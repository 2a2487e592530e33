// File: src/form.rs
// Purpose: The form twin: values read from domain objects, edited by input, written back on sync

use crate::composition::Composition;
use crate::config::FormsConfig;
use crate::error::FormError;
use crate::model::{Attribute, ModelHandle};
use crate::params::Document;
use crate::persist::{self, SaveReport};
use crate::schema::{FieldDefinition, FieldKind, Schema};
use crate::validation::{self, Errors};
use crate::value::Value;
use crate::{deserialize, sync};
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, debug_span};

/// Current content of one field
#[derive(Debug, Clone)]
pub enum Slot {
    Scalar(Value),
    One(Option<Box<Form>>),
    Many(Vec<Form>),
}

impl Slot {
    fn empty(kind: &FieldKind, default: Option<&Value>) -> Self {
        match kind {
            FieldKind::Scalar => Slot::Scalar(default.cloned().unwrap_or(Value::Null)),
            FieldKind::Nested(_) => Slot::One(None),
            FieldKind::Collection(_) => Slot::Many(Vec::new()),
        }
    }
}

/// A form over one or more domain objects
///
/// Built from a [`Schema`]; every readable field is read once from the domain
/// object at construction. From then on the form works on its own copy:
/// [`Form::validate`] edits and checks that copy, and only [`Form::sync`] and
/// [`Form::save`] write it back.
///
/// ```rust,ignore
/// let mut form = Form::new(album_schema, album.clone())?;
/// if form.validate(&Document::parse_json(body)?)? {
///     form.save()?;
/// } else {
///     render(form.errors());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Form {
    pub(crate) schema: Rc<Schema>,
    pub(crate) config: Rc<FormsConfig>,
    pub(crate) composition: Composition,
    pub(crate) slots: Vec<Slot>,
    pub(crate) changed: Vec<bool>,
    pub(crate) input_errors: Vec<Option<String>>,
    pub(crate) errors: Errors,
}

impl Form {
    /// Form over a single domain object
    pub fn new(schema: impl Into<Rc<Schema>>, model: ModelHandle) -> Result<Self, FormError> {
        Self::compose(schema, Composition::single(model))
    }

    /// Form over several domain objects; fields pick theirs with `on`
    pub fn compose(schema: impl Into<Rc<Schema>>, composition: Composition) -> Result<Self, FormError> {
        let schema = schema.into();
        let config = schema.config().cloned().unwrap_or_default();
        Self::build(schema, composition, &config)
    }

    pub(crate) fn build(
        schema: Rc<Schema>,
        composition: Composition,
        inherited: &Rc<FormsConfig>,
    ) -> Result<Self, FormError> {
        let config = schema.config().cloned().unwrap_or_else(|| Rc::clone(inherited));

        for owner in schema.owners() {
            if composition.owner(owner).is_none() {
                return Err(FormError::MissingOwner {
                    schema: schema.name().to_string(),
                    owner: owner.clone(),
                });
            }
        }

        let slots = schema
            .fields()
            .iter()
            .map(|field| read_field(&schema, &composition, field, &config))
            .collect::<Result<Vec<_>, _>>()?;

        let count = slots.len();
        Ok(Self {
            errors: Errors::new(config.validation.base_key.clone()),
            schema,
            config,
            composition,
            slots,
            changed: vec![false; count],
            input_errors: vec![None; count],
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &FormsConfig {
        &self.config
    }

    /// The primary domain object
    pub fn model(&self) -> &ModelHandle {
        self.composition.primary_handle()
    }

    pub fn models(&self) -> &Composition {
        &self.composition
    }

    /// Scalar field value; `None` for unknown or nested fields
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.slot(name)? {
            Slot::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn nested(&self, name: &str) -> Option<&Form> {
        match self.slot(name)? {
            Slot::One(child) => child.as_deref(),
            _ => None,
        }
    }

    pub fn collection(&self, name: &str) -> Option<&[Form]> {
        match self.slot(name)? {
            Slot::Many(children) => Some(children),
            _ => None,
        }
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.schema.position(name).map(|idx| &self.slots[idx])
    }

    /// Whether input changed the field; stays set once set
    pub fn is_changed(&self, name: &str) -> bool {
        self.schema.position(name).map_or(false, |idx| self.changed[idx])
    }

    /// Any field here or in a nested form changed
    pub fn any_changed(&self) -> bool {
        self.changed.iter().any(|c| *c)
            || self.slots.iter().any(|slot| match slot {
                Slot::One(Some(child)) => child.any_changed(),
                Slot::Many(children) => children.iter().any(Form::any_changed),
                _ => false,
            })
    }

    /// Errors of the last validation run, nested paths included
    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    /// Nested map of every field, virtual ones included
    pub fn to_snapshot(&self) -> Value {
        let map: BTreeMap<String, Value> = self
            .schema
            .fields()
            .iter()
            .zip(&self.slots)
            .map(|(field, slot)| {
                let value = match slot {
                    Slot::Scalar(value) => value.clone(),
                    Slot::One(child) => child.as_ref().map_or(Value::Null, |c| c.to_snapshot()),
                    Slot::Many(children) => Value::List(children.iter().map(Form::to_snapshot).collect()),
                };
                (field.name().to_string(), value)
            })
            .collect();
        Value::Map(map)
    }

    /// Applies the document to the form and runs every rule
    ///
    /// Returns whether the whole form is valid. Domain objects are read only
    /// when new nested entries are populated; they are never written here.
    pub fn validate(&mut self, params: &Document) -> Result<bool, FormError> {
        let span = debug_span!("form.validate", schema = %self.schema.name());
        let _enter = span.enter();

        deserialize::apply(self, params.fields())?;
        let valid = validation::run(self);

        debug!(valid, errors = self.errors.message_count(), "validation finished");
        Ok(valid)
    }

    /// Writes form values to the domain objects, nested ones included
    pub fn sync(&self) -> Result<(), FormError> {
        let span = debug_span!("form.sync", schema = %self.schema.name());
        let _enter = span.enter();

        sync::run(self)?;
        debug!("synced");
        Ok(())
    }

    /// Syncs, then saves nested objects and every composition owner
    pub fn save(&self) -> Result<SaveReport, FormError> {
        let span = debug_span!("form.save", schema = %self.schema.name());
        let _enter = span.enter();

        sync::run(self)?;
        let report = persist::run(self, self.config.persist.save_policy);
        debug!(saved = report.saved, failed = report.failures.len(), "save finished");

        if report.is_success() {
            Ok(report)
        } else {
            Err(FormError::Save(report))
        }
    }

    /// Hands the snapshot to `persist` instead of touching domain objects
    pub fn save_with<F, T>(&self, persist: F) -> T
    where
        F: FnOnce(Value) -> T,
    {
        persist(self.to_snapshot())
    }
}

fn read_field(
    schema: &Schema,
    composition: &Composition,
    field: &FieldDefinition,
    config: &Rc<FormsConfig>,
) -> Result<Slot, FormError> {
    if !field.is_readable() {
        return Ok(Slot::empty(field.kind(), field.default_value()));
    }

    let handle = composition.resolve(field.owner()).ok_or_else(|| FormError::MissingOwner {
        schema: schema.name().to_string(),
        owner: field.owner().unwrap_or_default().to_string(),
    })?;

    let attribute = handle.read(field.accessor())?;
    let slot = match (field.kind(), attribute) {
        (FieldKind::Scalar, Attribute::Scalar(Value::Null)) => {
            Slot::Scalar(field.default_value().cloned().unwrap_or(Value::Null))
        }
        (FieldKind::Scalar, Attribute::Scalar(value)) => Slot::Scalar(value),
        (FieldKind::Nested(nested), Attribute::One(child)) => Slot::One(
            child
                .map(|h| Form::build(Rc::clone(nested), Composition::single(h), config).map(Box::new))
                .transpose()?,
        ),
        (FieldKind::Collection(nested), Attribute::Many(children)) => Slot::Many(
            children
                .into_iter()
                .map(|h| Form::build(Rc::clone(nested), Composition::single(h), config))
                .collect::<Result<_, _>>()?,
        ),
        (kind, found) => {
            return Err(FormError::AttributeShape {
                schema: schema.name().to_string(),
                field: field.name().to_string(),
                accessor: field.accessor().to_string(),
                expected: expected_shape(kind),
                found: found.kind(),
            })
        }
    };

    Ok(slot)
}

fn expected_shape(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Scalar => "scalar",
        FieldKind::Nested(_) => "nested object",
        FieldKind::Collection(_) => "collection",
    }
}
