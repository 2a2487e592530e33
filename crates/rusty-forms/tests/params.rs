/// Bracket-notation form bodies applied to nested forms
mod common;

use common::*;
use pretty_assertions::assert_eq;
use rusty_forms::{Document, Form, Value};

#[test]
fn test_urlencoded_body_updates_nested_collection() {
    init_tracing();
    let model = album("Outlandos d'Amour", vec![song("Roxanne", 1)]);
    let mut form = Form::new(album_schema(), model.clone()).unwrap();

    let body = "album%5Btitle%5D=Reggatta+de+Blanc\
                &album[released_on]=1979-10-02\
                &album[songs][1][title]=Message+in+a+Bottle&album[songs][1][track]=2\
                &album[songs][0][title]=Roxanne\
                &commit=Save";
    let params = Document::from_urlencoded(body).unwrap().scope("album").unwrap();

    assert!(form.validate(&params).unwrap());
    let titles: Vec<Value> = form
        .collection("songs")
        .unwrap()
        .iter()
        .filter_map(|s| s.value("title").cloned())
        .collect();
    assert_eq!(titles, vec![Value::from("Roxanne"), Value::from("Message in a Bottle")]);
    assert_eq!(form.collection("songs").unwrap()[1].value("track"), Some(&Value::Int(2)));
    assert_eq!(form.value("title"), Some(&Value::from("Reggatta de Blanc")));
}

#[test]
fn test_blank_rows_from_html_tables_are_skipped() {
    let model = album("Outlandos d'Amour", vec![]);
    let mut form = Form::new(album_schema(), model).unwrap();

    let body = "songs[0][title]=Roxanne&songs[0][track]=1&songs[1][title]=&songs[1][track]=";
    assert!(form.validate(&Document::from_urlencoded(body).unwrap()).unwrap());
    assert_eq!(form.collection("songs").unwrap().len(), 1);
}

#[test]
fn test_malformed_percent_encoding() {
    let err = Document::from_urlencoded("title=%FF%FE").unwrap_err();
    assert!(err.to_string().starts_with("could not decode `%FF%FE`"));
}
