//! # rusty-forms
//!
//! Form objects decoupled from domain models. A form reads its initial values
//! from one or more domain objects, takes nested input documents, validates
//! them against declared rules and writes the result back only when asked.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rusty_forms::{Coercion, Document, Form, Record, Rule, Schema, SkipIf};
//!
//! let song = Schema::builder("song")
//!     .property("title", |f| f.validate(Rule::presence()))
//!     .property("track", |f| f.coerce(Coercion::Integer))
//!     .build()?;
//!
//! let album = Schema::builder("album")
//!     .property("title", |f| f.validate(Rule::presence()).validate(Rule::max_length(80)))
//!     .collection("songs", song, |f| {
//!         f.skip_if(SkipIf::AllBlank)
//!             .populate_if_empty(|_| Record::new("song").with("title", "").with("track", 0).into_handle())
//!             .validate(Rule::min_count(1))
//!     })
//!     .build()?;
//!
//! let mut form = Form::new(album, model.clone())?;
//! let params = Document::from_urlencoded(body)?.scope("album")?;
//!
//! if form.validate(&params)? {
//!     form.save()?;
//! } else {
//!     // {"songs.1.title": ["can't be blank"]}
//!     let json = serde_json::to_string(form.errors())?;
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Deserialize** - [`Form::validate`] applies a [`Document`] to the form,
//!   coercing scalars and aligning collections with existing entries
//! - **Validate** - declared [`Rule`]s run against the form's own values; errors
//!   land in [`Errors`] keyed by dotted path
//! - **Sync** - [`Form::sync`] writes values through the [`Model`] trait
//! - **Save** - [`Form::save`] syncs, then saves nested objects and every
//!   composition owner
//!
//! ## Architecture
//!
//! Rule predicates live in the `rusty-forms-validation` crate, re-exported here
//! as [`predicates`]. Pipeline settings come from a `forms.toml` file, see
//! [`FormsConfig`].

#![doc(html_root_url = "https://docs.rs/rusty-forms/0.1.0")]

pub mod attrs;
pub mod coercion;
pub mod composition;
pub mod config;
mod deserialize;
pub mod error;
pub mod form;
pub mod model;
pub mod params;
pub mod persist;
pub mod schema;
mod sync;
pub mod validation;
pub mod value;

pub use rusty_forms_validation as predicates;
pub use rusty_forms_validation::PasswordStrength;

pub use attrs::FieldAttrs;
pub use coercion::{Coercion, CoercionError};
pub use composition::{Composition, DEFAULT_OWNER};
pub use config::FormsConfig;
pub use error::{FormError, ModelError, ParamsError, SchemaError};
pub use form::{Form, Slot};
pub use model::{Attribute, Model, ModelHandle, Record};
pub use params::Document;
pub use persist::{SaveFailure, SavePolicy, SaveReport};
pub use schema::{FieldBuilder, FieldDefinition, FieldKind, Schema, SchemaBuilder, SkipIf};
pub use validation::{Errors, FormRule, Rule};
pub use value::Value;
