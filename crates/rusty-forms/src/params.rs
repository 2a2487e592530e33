// File: src/params.rs
// Purpose: Input documents from JSON and urlencoded bodies with bracket notation

use crate::error::ParamsError;
use crate::value::Value;
use std::collections::BTreeMap;

/// A nested input document: field names to scalars, maps or lists
///
/// Keys the form does not declare are ignored when it is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: BTreeMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one key
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn from_json(json: serde_json::Value) -> Result<Self, ParamsError> {
        match Value::from_json(json) {
            Value::Map(fields) => Ok(Self { fields }),
            other => Err(ParamsError::NotAMapping(other.kind())),
        }
    }

    pub fn parse_json(text: &str) -> Result<Self, ParamsError> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Self::from_json(json)
    }

    /// Parses `application/x-www-form-urlencoded` bodies
    ///
    /// `album[songs][0][title]=x` nests, `tags[]=a&tags[]=b` appends, `+`
    /// decodes to a space, and a repeated plain key keeps its last value.
    /// All values arrive as strings; declare coercions for typed fields.
    pub fn from_urlencoded(body: &str) -> Result<Self, ParamsError> {
        let mut fields = BTreeMap::new();

        for pair in body.split('&').filter(|pair| !pair.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode(raw_key)?;
            let value = decode(raw_value)?;

            let segments = split_key(&key);
            insert(&mut fields, &segments, Value::String(value), &key)?;
        }

        Ok(Self { fields })
    }

    /// The nested document under `key`, as when a body is wrapped in `album[...]`
    ///
    /// A missing key yields an empty document.
    pub fn scope(&self, key: &str) -> Result<Document, ParamsError> {
        match self.fields.get(key) {
            None => Ok(Document::new()),
            Some(Value::Map(fields)) => Ok(Self { fields: fields.clone() }),
            Some(other) => Err(ParamsError::NotAMapping(other.kind())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn into_value(self) -> Value {
        Value::Map(self.fields)
    }
}

impl From<BTreeMap<String, Value>> for Document {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

fn decode(raw: &str) -> Result<String, ParamsError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ParamsError::Decode {
            input: raw.to_string(),
            reason: e.to_string(),
        })
}

/// `a[b][]` => ["a", "b", ""]; text after an unclosed bracket is dropped
fn split_key(key: &str) -> Vec<&str> {
    let Some(open) = key.find('[') else {
        return vec![key];
    };

    let mut segments = vec![&key[..open]];
    let mut rest = &key[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            break;
        };
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    segments
}

fn insert(map: &mut BTreeMap<String, Value>, segments: &[&str], value: Value, key: &str) -> Result<(), ParamsError> {
    let Some((head, rest)) = segments.split_first() else {
        return Ok(());
    };
    let conflict = || ParamsError::Conflict { key: key.to_string() };

    let Some((next, tail)) = rest.split_first() else {
        return match map.get(*head) {
            Some(Value::Map(_) | Value::List(_)) => Err(conflict()),
            _ => {
                map.insert(head.to_string(), value);
                Ok(())
            }
        };
    };

    if next.is_empty() {
        let slot = map.entry(head.to_string()).or_insert_with(|| Value::List(Vec::new()));
        let Value::List(items) = slot else {
            return Err(conflict());
        };

        let Some(field) = tail.first() else {
            items.push(value);
            return Ok(());
        };

        // `songs[][title]` starts a new entry once the last one has that key
        let start_new = match items.last() {
            Some(Value::Map(entry)) => entry.contains_key(*field),
            _ => true,
        };
        if start_new {
            items.push(Value::Map(BTreeMap::new()));
        }
        match items.last_mut() {
            Some(Value::Map(entry)) => insert(entry, tail, value, key),
            _ => Err(conflict()),
        }
    } else {
        let slot = map.entry(head.to_string()).or_insert_with(|| Value::Map(BTreeMap::new()));
        match slot {
            Value::Map(inner) => insert(inner, rest, value, key),
            _ => Err(conflict()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("title"), vec!["title"]);
        assert_eq!(split_key("album[songs][0][title]"), vec!["album", "songs", "0", "title"]);
        assert_eq!(split_key("tags[]"), vec!["tags", ""]);
        assert_eq!(split_key("broken[key"), vec!["broken"]);
    }

    #[test]
    fn test_nested_brackets() {
        let doc = Document::from_urlencoded("album[title]=Ghost+in+the%20Machine&album[songs][0][title]=Spirits&album[songs][1][title]=Invisible+Sun").unwrap();

        assert_eq!(
            doc.into_value().to_json(),
            json!({"album": {
                "title": "Ghost in the Machine",
                "songs": {"0": {"title": "Spirits"}, "1": {"title": "Invisible Sun"}},
            }})
        );
    }

    #[test]
    fn test_appending() {
        let doc = Document::from_urlencoded("tags[]=rock&tags[]=new+wave&songs[][title]=a&songs[][track]=1&songs[][title]=b").unwrap();

        assert_eq!(
            doc.into_value().to_json(),
            json!({
                "tags": ["rock", "new wave"],
                "songs": [{"title": "a", "track": "1"}, {"title": "b"}],
            })
        );
    }

    #[test]
    fn test_conflicts() {
        assert!(matches!(
            Document::from_urlencoded("title=x&title[en]=y"),
            Err(ParamsError::Conflict { .. })
        ));
        assert!(matches!(
            Document::from_urlencoded("title[en]=y&title=x"),
            Err(ParamsError::Conflict { .. })
        ));
    }

    #[test]
    fn test_last_plain_value_wins() {
        let doc = Document::from_urlencoded("title=a&title=b&flag").unwrap();
        assert_eq!(doc.get("title"), Some(&Value::from("b")));
        assert_eq!(doc.get("flag"), Some(&Value::from("")));
    }

    #[test]
    fn test_scope_and_json() {
        let doc = Document::parse_json(r#"{"album": {"title": "Synchronicity"}, "commit": "Save"}"#).unwrap();
        let album = doc.scope("album").unwrap();
        assert_eq!(album.get("title"), Some(&Value::from("Synchronicity")));
        assert!(doc.scope("artist").unwrap().is_empty());
        assert!(matches!(doc.scope("commit"), Err(ParamsError::NotAMapping("string"))));

        assert!(matches!(Document::parse_json("[1, 2]"), Err(ParamsError::NotAMapping("list"))));
        assert!(matches!(Document::parse_json("{"), Err(ParamsError::Json(_))));
    }
}
