// File: src/model.rs
// Purpose: Domain object contract and a map-backed adapter

use crate::error::ModelError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// What a domain accessor holds: a plain value, one nested object, or a list
/// of nested objects
#[derive(Debug, Clone)]
pub enum Attribute {
    Scalar(Value),
    One(Option<ModelHandle>),
    Many(Vec<ModelHandle>),
}

impl Attribute {
    pub fn scalar(value: impl Into<Value>) -> Self {
        Attribute::Scalar(value.into())
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Attribute::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Attribute::Scalar(_) => "scalar",
            Attribute::One(_) => "nested object",
            Attribute::Many(_) => "collection",
        }
    }
}

macro_rules! scalar_attribute_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Attribute {
                fn from(value: $ty) -> Self {
                    Attribute::Scalar(value.into())
                }
            }
        )*
    };
}

scalar_attribute_from!(Value, bool, i32, i64, f64, String, &str);

impl From<ModelHandle> for Attribute {
    fn from(handle: ModelHandle) -> Self {
        Attribute::One(Some(handle))
    }
}

impl From<Option<ModelHandle>> for Attribute {
    fn from(handle: Option<ModelHandle>) -> Self {
        Attribute::One(handle)
    }
}

impl From<Vec<ModelHandle>> for Attribute {
    fn from(handles: Vec<ModelHandle>) -> Self {
        Attribute::Many(handles)
    }
}

/// Capability interface a domain object exposes to forms
///
/// Forms read every readable field once at construction, write only during
/// sync, and call `save` only from the persister. An accessor the object does
/// not know must be reported as [`ModelError::UnknownAccessor`].
pub trait Model {
    /// Name used in logs and error messages
    fn model_name(&self) -> &str {
        "model"
    }

    fn read(&self, accessor: &str) -> Result<Attribute, ModelError>;

    fn write(&mut self, accessor: &str, value: Attribute) -> Result<(), ModelError>;

    /// Persist the object. Objects without persistence succeed trivially.
    fn save(&mut self) -> Result<(), ModelError> {
        Ok(())
    }
}

/// Shared handle to a domain object
///
/// The caller keeps its own clone; forms hold one only while they live.
#[derive(Clone)]
pub struct ModelHandle(Rc<RefCell<dyn Model>>);

impl ModelHandle {
    pub fn new<M: Model + 'static>(model: M) -> Self {
        Self(Rc::new(RefCell::new(model)))
    }

    /// Wraps a handle the caller already shares, e.g. `Rc<RefCell<Album>>`
    pub fn from_rc(model: Rc<RefCell<dyn Model>>) -> Self {
        Self(model)
    }

    pub fn name(&self) -> String {
        self.0
            .try_borrow()
            .map(|m| m.model_name().to_string())
            .unwrap_or_else(|_| "model".to_string())
    }

    pub fn read(&self, accessor: &str) -> Result<Attribute, ModelError> {
        let model = self.0.try_borrow().map_err(|_| ModelError::Busy {
            accessor: accessor.to_string(),
        })?;
        model.read(accessor)
    }

    pub fn write(&self, accessor: &str, value: Attribute) -> Result<(), ModelError> {
        let mut model = self.0.try_borrow_mut().map_err(|_| ModelError::Busy {
            accessor: accessor.to_string(),
        })?;
        model.write(accessor, value)
    }

    pub fn save(&self) -> Result<(), ModelError> {
        let mut model = self.0.try_borrow_mut().map_err(|_| ModelError::Busy {
            accessor: "save".to_string(),
        })?;
        model.save()
    }

    /// Reads a scalar accessor, `None` for nested attributes
    pub fn value(&self, accessor: &str) -> Result<Option<Value>, ModelError> {
        Ok(self.read(accessor)?.as_scalar().cloned())
    }

    pub fn ptr_eq(&self, other: &ModelHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModelHandle").field(&self.name()).finish()
    }
}

type SaveHook = Box<dyn FnMut(&BTreeMap<String, Attribute>) -> Result<(), String>>;

/// Map-backed domain object
///
/// Accessors are fixed by the attributes given at construction: reading or
/// writing anything else fails with [`ModelError::UnknownAccessor`].
pub struct Record {
    name: String,
    attributes: BTreeMap<String, Attribute>,
    read_only: Vec<String>,
    save_hook: Option<SaveHook>,
    saves: usize,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            read_only: Vec::new(),
            save_hook: None,
            saves: 0,
        }
    }

    pub fn with(mut self, accessor: impl Into<String>, value: impl Into<Attribute>) -> Self {
        self.attributes.insert(accessor.into(), value.into());
        self
    }

    /// Declares an accessor without a writer
    pub fn read_only(mut self, accessor: impl Into<String>, value: impl Into<Attribute>) -> Self {
        let accessor = accessor.into();
        self.attributes.insert(accessor.clone(), value.into());
        self.read_only.push(accessor);
        self
    }

    /// Runs on every `save`; an `Err` becomes [`ModelError::SaveFailed`]
    pub fn on_save<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&BTreeMap<String, Attribute>) -> Result<(), String> + 'static,
    {
        self.save_hook = Some(Box::new(hook));
        self
    }

    pub fn get(&self, accessor: &str) -> Option<&Attribute> {
        self.attributes.get(accessor)
    }

    pub fn value(&self, accessor: &str) -> Option<&Value> {
        self.get(accessor)?.as_scalar()
    }

    /// Successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves
    }

    pub fn into_handle(self) -> ModelHandle {
        ModelHandle::new(self)
    }

    fn unknown(&self, accessor: &str) -> ModelError {
        ModelError::UnknownAccessor {
            model: self.name.clone(),
            accessor: accessor.to_string(),
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("saves", &self.saves)
            .finish()
    }
}

impl Model for Record {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn read(&self, accessor: &str) -> Result<Attribute, ModelError> {
        self.attributes
            .get(accessor)
            .cloned()
            .ok_or_else(|| self.unknown(accessor))
    }

    fn write(&mut self, accessor: &str, value: Attribute) -> Result<(), ModelError> {
        if self.read_only.iter().any(|a| a == accessor) {
            return Err(ModelError::ReadOnly {
                model: self.name.clone(),
                accessor: accessor.to_string(),
            });
        }

        match self.attributes.get_mut(accessor) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(self.unknown(accessor)),
        }
    }

    fn save(&mut self) -> Result<(), ModelError> {
        if let Some(hook) = self.save_hook.as_mut() {
            hook(&self.attributes).map_err(|reason| ModelError::SaveFailed {
                model: self.name.clone(),
                reason,
            })?;
        }
        self.saves += 1;
        Ok(())
    }
}
