// File: src/schema.rs
// Purpose: Form definitions: fields, nesting, visibility, coercion, rules

use crate::coercion::Coercion;
use crate::config::FormsConfig;
use crate::error::SchemaError;
use crate::model::ModelHandle;
use crate::validation::rules::{Applies, Check};
use crate::validation::{Errors, FormRule, Rule};
use crate::form::Form;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

type Populator = Rc<dyn Fn(&Value) -> ModelHandle>;

/// Shape of a field
#[derive(Clone)]
pub enum FieldKind {
    Scalar,
    /// One nested form
    Nested(Rc<Schema>),
    /// A list of nested forms aligned positionally with the input
    Collection(Rc<Schema>),
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Scalar => "scalar",
            FieldKind::Nested(_) => "nested",
            FieldKind::Collection(_) => "collection",
        }
    }
}

/// Decides whether an incoming fragment is ignored
#[derive(Clone)]
pub enum SkipIf {
    /// Null, blank strings, and maps/lists made only of blanks
    AllBlank,
    Custom(Rc<dyn Fn(&Value) -> bool>),
}

impl SkipIf {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        SkipIf::Custom(Rc::new(predicate))
    }

    pub fn matches(&self, fragment: &Value) -> bool {
        match self {
            SkipIf::AllBlank => fragment.is_blank(),
            SkipIf::Custom(predicate) => predicate(fragment),
        }
    }
}

/// One declared field
#[derive(Clone)]
pub struct FieldDefinition {
    name: String,
    from: Option<String>,
    readable: bool,
    writeable: bool,
    is_virtual: bool,
    parse: bool,
    coercion: Option<Coercion>,
    nilify: bool,
    default: Option<Value>,
    skip_if: Option<SkipIf>,
    on: Option<String>,
    kind: FieldKind,
    populator: Option<Populator>,
    save: bool,
    rules: Vec<Rule>,
}

impl FieldDefinition {
    fn new(name: String, kind: FieldKind) -> Self {
        Self {
            name,
            from: None,
            readable: true,
            writeable: true,
            is_virtual: false,
            parse: true,
            coercion: None,
            nilify: false,
            default: None,
            skip_if: None,
            on: None,
            kind,
            populator: None,
            save: true,
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accessor on the domain object; the field name unless renamed
    pub fn accessor(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.name)
    }

    /// Read from the domain object at construction
    pub fn is_readable(&self) -> bool {
        self.readable && !self.is_virtual
    }

    /// Written to the domain object on sync
    pub fn is_writeable(&self) -> bool {
        self.writeable && !self.is_virtual
    }

    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    /// Accepts values from input documents
    pub fn parses(&self) -> bool {
        self.parse
    }

    pub fn coercion(&self) -> Option<&Coercion> {
        self.coercion.as_ref()
    }

    pub fn nilifies(&self) -> bool {
        self.nilify
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn skip_if(&self) -> Option<&SkipIf> {
        self.skip_if.as_ref()
    }

    /// Composition owner; `None` means the primary object
    pub fn owner(&self) -> Option<&str> {
        self.on.as_deref()
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn nested_schema(&self) -> Option<&Rc<Schema>> {
        match &self.kind {
            FieldKind::Scalar => None,
            FieldKind::Nested(schema) | FieldKind::Collection(schema) => Some(schema),
        }
    }

    /// Builds a domain object for an input entry with no existing counterpart
    pub fn populate(&self, fragment: &Value) -> Option<ModelHandle> {
        self.populator.as_ref().map(|populate| populate(fragment))
    }

    /// Nested objects are saved along with the parent
    pub fn saves(&self) -> bool {
        self.save
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

impl fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("name", &self.name)
            .field("accessor", &self.accessor())
            .field("kind", &self.kind.name())
            .field("readable", &self.is_readable())
            .field("writeable", &self.is_writeable())
            .field("virtual", &self.is_virtual)
            .field("coercion", &self.coercion)
            .field("on", &self.on)
            .field("rules", &self.rules)
            .finish()
    }
}

/// Options for one field, passed to the closures of [`SchemaBuilder`]
pub struct FieldBuilder(FieldDefinition);

impl FieldBuilder {
    /// Read and write a differently named accessor
    pub fn from(mut self, accessor: impl Into<String>) -> Self {
        self.0.from = Some(accessor.into());
        self
    }

    pub fn readable(mut self, readable: bool) -> Self {
        self.0.readable = readable;
        self
    }

    pub fn writeable(mut self, writeable: bool) -> Self {
        self.0.writeable = writeable;
        self
    }

    /// Never read from nor written to the domain object
    pub fn virtual_field(mut self) -> Self {
        self.0.is_virtual = true;
        self
    }

    pub fn parse(mut self, parse: bool) -> Self {
        self.0.parse = parse;
        self
    }

    pub fn coerce(mut self, coercion: Coercion) -> Self {
        self.0.coercion = Some(coercion);
        self
    }

    /// Blank strings become null before coercion
    pub fn nilify(mut self) -> Self {
        self.0.nilify = true;
        self
    }

    /// Used when the domain value is null, and for virtual fields
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.0.default = Some(value.into());
        self
    }

    pub fn skip_if(mut self, skip: SkipIf) -> Self {
        self.0.skip_if = Some(skip);
        self
    }

    /// Route reads, writes and saves to a composition owner
    pub fn on(mut self, owner: impl Into<String>) -> Self {
        self.0.on = Some(owner.into());
        self
    }

    /// Factory for domain objects behind new nested entries
    pub fn populate_if_empty<F>(mut self, populator: F) -> Self
    where
        F: Fn(&Value) -> ModelHandle + 'static,
    {
        self.0.populator = Some(Rc::new(populator));
        self
    }

    /// Opt the nested objects out of auto-save
    pub fn save(mut self, save: bool) -> Self {
        self.0.save = save;
        self
    }

    pub fn validate(mut self, rule: Rule) -> Self {
        self.0.rules.push(rule);
        self
    }
}

/// An immutable form definition
///
/// Share it across requests with `Rc<Schema>`; every [`Form`] built from it
/// reads the same field list.
pub struct Schema {
    name: String,
    fields: Vec<FieldDefinition>,
    index: HashMap<String, usize>,
    owners: Vec<String>,
    form_rules: Vec<FormRule>,
    config: Option<Rc<FormsConfig>>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            owners: Vec::new(),
            form_rules: Vec::new(),
            config: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.position(name).map(|idx| &self.fields[idx])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Composition owners; empty for single-object forms
    pub fn owners(&self) -> &[String] {
        &self.owners
    }

    pub fn is_composed(&self) -> bool {
        !self.owners.is_empty()
    }

    pub fn config(&self) -> Option<&Rc<FormsConfig>> {
        self.config.as_ref()
    }

    pub(crate) fn form_rules(&self) -> &[FormRule] {
        &self.form_rules
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("owners", &self.owners)
            .finish()
    }
}

/// Collects field declarations and checks them in [`SchemaBuilder::build`]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldDefinition>,
    owners: Vec<String>,
    form_rules: Vec<FormRule>,
    config: Option<Rc<FormsConfig>>,
}

impl SchemaBuilder {
    /// Plain field with default options
    pub fn field(self, name: impl Into<String>) -> Self {
        self.property(name, |f| f)
    }

    pub fn property<F>(self, name: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(FieldBuilder) -> FieldBuilder,
    {
        self.declare(name.into(), FieldKind::Scalar, configure)
    }

    pub fn nested<F>(self, name: impl Into<String>, schema: impl Into<Rc<Schema>>, configure: F) -> Self
    where
        F: FnOnce(FieldBuilder) -> FieldBuilder,
    {
        self.declare(name.into(), FieldKind::Nested(schema.into()), configure)
    }

    pub fn collection<F>(self, name: impl Into<String>, schema: impl Into<Rc<Schema>>, configure: F) -> Self
    where
        F: FnOnce(FieldBuilder) -> FieldBuilder,
    {
        self.declare(name.into(), FieldKind::Collection(schema.into()), configure)
    }

    /// Declares a composition owner; fields pick one with `on`
    pub fn model(mut self, owner: impl Into<String>) -> Self {
        let owner = owner.into();
        if !self.owners.contains(&owner) {
            self.owners.push(owner);
        }
        self
    }

    /// Form-level rule with access to all fields
    pub fn validate_with<F>(mut self, check: F) -> Self
    where
        F: Fn(&Form, &mut Errors) + 'static,
    {
        self.form_rules.push(FormRule::new(check));
        self
    }

    pub fn config(mut self, config: impl Into<Rc<FormsConfig>>) -> Self {
        self.config = Some(config.into());
        self
    }

    fn declare<F>(mut self, name: String, kind: FieldKind, configure: F) -> Self
    where
        F: FnOnce(FieldBuilder) -> FieldBuilder,
    {
        let FieldBuilder(field) = configure(FieldBuilder(FieldDefinition::new(name, kind)));
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut index = HashMap::with_capacity(self.fields.len());

        for (idx, field) in self.fields.iter().enumerate() {
            if index.insert(field.name.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateField {
                    schema: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        for field in &self.fields {
            self.check_field(field, &index)?;
        }

        Ok(Schema {
            name: self.name,
            fields: self.fields,
            index,
            owners: self.owners,
            form_rules: self.form_rules,
            config: self.config,
        })
    }

    fn check_field(&self, field: &FieldDefinition, index: &HashMap<String, usize>) -> Result<(), SchemaError> {
        if let Some(owner) = field.owner() {
            if !self.owners.iter().any(|o| o == owner) {
                return Err(SchemaError::UnknownOwner {
                    schema: self.name.clone(),
                    field: field.name.clone(),
                    owner: owner.to_string(),
                });
            }
        }

        if let Some(nested) = field.nested_schema() {
            if nested.is_composed() {
                return Err(SchemaError::ComposedNested {
                    schema: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        for rule in &field.rules {
            let allowed = match (rule.applies_to(), &field.kind) {
                (Applies::Any, _) => true,
                (Applies::Scalar, FieldKind::Scalar) => true,
                (Applies::Collection, FieldKind::Collection(_)) => true,
                (Applies::ScalarOrCollection, FieldKind::Scalar | FieldKind::Collection(_)) => true,
                _ => false,
            };
            if !allowed {
                return Err(SchemaError::RuleNotApplicable {
                    schema: self.name.clone(),
                    field: field.name.clone(),
                    rule: rule.name(),
                    kind: field.kind.name(),
                });
            }

            match &rule.check {
                Check::Format(pattern) => {
                    if let Err(source) = &pattern.compiled {
                        return Err(SchemaError::InvalidPattern {
                            schema: self.name.clone(),
                            field: field.name.clone(),
                            pattern: pattern.source.clone(),
                            source: source.clone(),
                        });
                    }
                }
                Check::Confirmation => {
                    let target = format!("{}_confirmation", field.name);
                    if !index.contains_key(&target) {
                        return Err(self.unknown_field(field, rule, target));
                    }
                }
                Check::UniqueBy(key) => {
                    let known = field
                        .nested_schema()
                        .map_or(false, |nested| nested.position(key).is_some());
                    if !known {
                        return Err(self.unknown_field(field, rule, key.clone()));
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn unknown_field(&self, field: &FieldDefinition, rule: &Rule, target: String) -> SchemaError {
        SchemaError::UnknownField {
            schema: self.name.clone(),
            field: field.name.clone(),
            rule: rule.name(),
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song() -> Schema {
        Schema::builder("song")
            .property("title", |f| f.validate(Rule::presence()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_field_options() {
        let schema = Schema::builder("album")
            .property("title", |f| f.from("name"))
            .property("password_confirmation", |f| f.virtual_field())
            .property("id", |f| f.writeable(false).parse(false))
            .build()
            .unwrap();

        let title = schema.field("title").unwrap();
        assert_eq!(title.accessor(), "name");
        assert!(title.is_readable() && title.is_writeable());

        let confirmation = schema.field("password_confirmation").unwrap();
        assert!(!confirmation.is_readable());
        assert!(!confirmation.is_writeable());

        let id = schema.field("id").unwrap();
        assert!(id.is_readable());
        assert!(!id.is_writeable());
        assert!(!id.parses());

        let names: Vec<&str> = schema.fields().iter().map(FieldDefinition::name).collect();
        assert_eq!(names, vec!["title", "password_confirmation", "id"]);
    }

    #[test]
    fn test_duplicate_field() {
        let err = Schema::builder("album").field("title").field("title").build().unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { ref field, .. } if field == "title"));
    }

    #[test]
    fn test_unknown_owner() {
        let err = Schema::builder("album")
            .model("album")
            .property("name", |f| f.on("artist"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownOwner { ref owner, .. } if owner == "artist"));
    }

    #[test]
    fn test_confirmation_needs_sibling() {
        let err = Schema::builder("user")
            .property("password", |f| f.validate(Rule::confirmation()))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownField { ref target, .. } if target == "password_confirmation"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Schema::builder("album")
            .property("code", |f| f.validate(Rule::format("([a-z")))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { .. }));
    }

    #[test]
    fn test_rule_kind_mismatch() {
        let err = Schema::builder("album")
            .collection("songs", song(), |f| f.validate(Rule::min_length(2)))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::RuleNotApplicable { rule: "length", kind: "collection", .. }));

        let err = Schema::builder("album")
            .property("title", |f| f.validate(Rule::unique_by("title")))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::RuleNotApplicable { rule: "uniqueness", .. }));
    }

    #[test]
    fn test_unique_by_must_name_nested_field() {
        let err = Schema::builder("album")
            .collection("songs", song(), |f| f.validate(Rule::unique_by("isrc")))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownField { ref target, .. } if target == "isrc"));

        assert!(Schema::builder("album")
            .collection("songs", song(), |f| f.validate(Rule::unique_by("title")))
            .build()
            .is_ok());
    }

    #[test]
    fn test_composed_schema_cannot_be_nested() {
        let composed = Schema::builder("cover")
            .model("image")
            .property("url", |f| f.on("image"))
            .build()
            .unwrap();
        let err = Schema::builder("album")
            .nested("cover", composed, |f| f)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::ComposedNested { .. }));
    }

    #[test]
    fn test_skip_if() {
        assert!(SkipIf::AllBlank.matches(&Value::from("  ")));
        assert!(!SkipIf::AllBlank.matches(&Value::from("x")));

        let no_title = SkipIf::custom(|fragment| fragment.get("title").map_or(true, Value::is_blank));
        let mut entry = std::collections::BTreeMap::new();
        entry.insert("track".to_string(), Value::Int(1));
        assert!(no_title.matches(&Value::Map(entry)));
    }
}
