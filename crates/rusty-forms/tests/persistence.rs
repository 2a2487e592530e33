/// Saving nested objects and composition owners
///
/// Covers save order, failure aggregation per policy, and the `save` opt-out.
mod common;

use common::*;
use pretty_assertions::assert_eq;
use rusty_forms::{
    Composition, Document, Form, FormError, FormsConfig, ModelHandle, Record, SavePolicy, Schema, Value,
};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

type Journal = Rc<RefCell<Vec<String>>>;

fn logged(name: &str, journal: &Journal, fail: bool) -> Record {
    let journal = Rc::clone(journal);
    let label = name.to_string();
    Record::new(name).on_save(move |attrs| {
        let title = attrs
            .get("title")
            .and_then(|a| a.as_scalar())
            .map(Value::to_string)
            .unwrap_or_default();
        journal.borrow_mut().push(format!("{label}:{title}"));
        if fail {
            Err("disk full".to_string())
        } else {
            Ok(())
        }
    })
}

fn song_in(journal: &Journal, title: &str, fail: bool) -> ModelHandle {
    logged("song", journal, fail).with("title", title).with("track", 1).into_handle()
}

fn album_in(journal: &Journal, songs: Vec<ModelHandle>) -> ModelHandle {
    logged("album", journal, false)
        .with("title", "Ghost in the Machine")
        .with("released_on", Value::Null)
        .with("songs", songs)
        .into_handle()
}

#[test]
fn test_children_save_before_parent() {
    init_tracing();
    let journal = Journal::default();
    let model = album_in(&journal, vec![song_in(&journal, "Spirits", false), song_in(&journal, "Omegaman", false)]);
    let mut form = Form::new(album_schema(), model).unwrap();

    assert!(form.validate(&Document::from_json(json!({"songs": [{"title": "Spirits in the Material World"}]})).unwrap()).unwrap());
    let report = form.save().unwrap();

    assert_eq!(report.saved, 3);
    assert_eq!(
        *journal.borrow(),
        vec![
            "song:Spirits in the Material World".to_string(),
            "song:Omegaman".to_string(),
            "album:Ghost in the Machine".to_string(),
        ]
    );
}

#[test]
fn test_collect_all_reports_every_failure() {
    init_tracing();
    let journal = Journal::default();
    let model = album_in(&journal, vec![song_in(&journal, "Spirits", true), song_in(&journal, "Omegaman", true)]);
    let form = Form::new(album_schema(), model).unwrap();

    let err = form.save().unwrap_err();
    assert!(err.is_save_failure());
    let FormError::Save(report) = err else { unreachable!() };

    assert_eq!(report.saved, 1);
    let paths: Vec<&str> = report.failures.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["songs.0", "songs.1"]);
    assert_eq!(report.failures[0].model, "song");
    assert_eq!(journal.borrow().len(), 3);
}

#[test]
fn test_short_circuit_stops_at_first_failure() {
    let journal = Journal::default();
    let config = FormsConfig::from_toml_str("[persist]\nsave_policy = \"short_circuit\"").unwrap();
    assert_eq!(config.persist.save_policy, SavePolicy::ShortCircuit);

    let schema = Schema::builder("album")
        .field("title")
        .field("released_on")
        .collection("songs", song_schema(), |f| f)
        .config(config)
        .build()
        .unwrap();
    let model = album_in(&journal, vec![song_in(&journal, "Spirits", true), song_in(&journal, "Omegaman", false)]);
    let form = Form::new(schema, model).unwrap();

    let Err(FormError::Save(report)) = form.save() else {
        panic!("save should fail");
    };
    assert_eq!(report.saved, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(*journal.borrow(), vec!["song:Spirits".to_string()]);
}

#[test]
fn test_save_opt_out() {
    let journal = Journal::default();
    let schema = Schema::builder("album")
        .field("title")
        .collection("songs", song_schema(), |f| f.save(false))
        .build()
        .unwrap();
    let model = logged("album", &journal, false)
        .with("title", "Outlandos d'Amour")
        .with("songs", vec![song_in(&journal, "Roxanne", true)])
        .into_handle();
    let form = Form::new(schema, model).unwrap();

    let report = form.save().unwrap();
    assert_eq!(report.saved, 1);
    assert_eq!(*journal.borrow(), vec!["album:Outlandos d'Amour".to_string()]);
}

#[test]
fn test_composition_saves_primary_last() {
    let journal = Journal::default();
    let schema = Schema::builder("release")
        .model("album")
        .model("label")
        .property("title", |f| f.on("album"))
        .property("label_title", |f| f.on("label").from("title"))
        .build()
        .unwrap();
    let album = logged("album", &journal, false).with("title", "Synchronicity").into_handle();
    let label = logged("label", &journal, false).with("title", "A&M").into_handle();
    let form = Form::compose(schema, Composition::new("album", album).with("label", label)).unwrap();

    form.save().unwrap();
    assert_eq!(
        *journal.borrow(),
        vec!["label:A&M".to_string(), "album:Synchronicity".to_string()]
    );
}

#[test]
fn test_failed_owner_is_reported_by_key() {
    let journal = Journal::default();
    let schema = Schema::builder("release")
        .model("album")
        .model("label")
        .property("title", |f| f.on("album"))
        .build()
        .unwrap();
    let album = logged("album", &journal, false).with("title", "Synchronicity").into_handle();
    let label = logged("label", &journal, true).into_handle();
    let form = Form::compose(schema, Composition::new("album", album).with("label", label)).unwrap();

    let Err(FormError::Save(report)) = form.save() else {
        panic!("label save should fail");
    };
    assert!(report.failure("label").is_some());
    assert_eq!(report.saved, 1);
    assert_eq!(report.to_string(), "1 saved, 1 failed; label: label could not be saved: disk full");
}
