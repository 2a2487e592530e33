// Shared fixtures for the integration tests
#![allow(dead_code)]

use rusty_forms::{Coercion, ModelHandle, Record, Rule, Schema, SkipIf, Value};
use std::rc::Rc;

/// Installs a fmt subscriber that writes through the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

pub fn song_schema() -> Rc<Schema> {
    Rc::new(
        Schema::builder("song")
            .property("title", |f| f.validate(Rule::presence()))
            .property("track", |f| f.coerce(Coercion::Integer).validate(Rule::at_least(1.0)))
            .build()
            .expect("song schema"),
    )
}

pub fn new_song(_: &Value) -> ModelHandle {
    Record::new("song")
        .with("title", Value::Null)
        .with("track", Value::Null)
        .into_handle()
}

pub fn album_schema() -> Schema {
    Schema::builder("album")
        .property("title", |f| f.validate(Rule::presence()).validate(Rule::max_length(80)))
        .property("released_on", |f| f.coerce(Coercion::Date).nilify())
        .collection("songs", song_schema(), |f| {
            f.skip_if(SkipIf::AllBlank)
                .populate_if_empty(new_song)
                .validate(Rule::unique_by("title"))
        })
        .build()
        .expect("album schema")
}

pub fn song(title: &str, track: i64) -> ModelHandle {
    Record::new("song")
        .with("title", title)
        .with("track", track)
        .into_handle()
}

pub fn album(title: &str, songs: Vec<ModelHandle>) -> ModelHandle {
    Record::new("album")
        .with("title", title)
        .with("released_on", Value::Null)
        .with("songs", songs)
        .into_handle()
}
