use crate::error::{Error, Result};
use crate::store::{cell_text, is_filled, Record};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// The flat parameter bag every action receives, from a query string, a
/// form body or a JSON body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Params(pub Map<String, Value>);

impl Params {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        )
    }

    pub fn from_query(query: HashMap<String, String>) -> Self {
        Self::from_pairs(query)
    }

    /// Later values win.
    pub fn merge(mut self, other: Params) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn action(&self) -> Option<String> {
        self.text(&["action"])
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// First filled value among `keys`, in its text form.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .find(|v| is_filled(v))
            .map(cell_text)
    }

    pub fn require(&self, keys: &[&str], label: &str) -> Result<String> {
        self.text(keys).ok_or_else(|| Error::missing(label))
    }

    /// First value present among `keys`, even when blank.
    pub fn raw(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|k| self.0.get(*k))
    }

    /// `true` or `"true"` is true; any other present value is false.
    pub fn flag(&self, keys: &[&str]) -> Option<bool> {
        self.raw(keys).map(|v| match v {
            Value::Bool(b) => *b,
            Value::String(s) => s == "true" || s == "TRUE",
            _ => false,
        })
    }

    /// Id lists arrive as a comma-separated string or a JSON array.
    pub fn id_list(&self, keys: &[&str]) -> Option<Vec<String>> {
        let ids: Vec<String> = match self.raw(keys)? {
            Value::String(s) => s
                .split(',')
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
            Value::Array(items) => items
                .iter()
                .filter(|v| is_filled(v))
                .map(|v| cell_text(v).trim().to_string())
                .collect(),
            other if is_filled(other) => vec![cell_text(other)],
            _ => Vec::new(),
        };
        if ids.is_empty() {
            None
        } else {
            Some(ids)
        }
    }

    /// A list of objects, given inline or as a JSON-encoded string.
    pub fn records(&self, key: &str) -> Result<Option<Vec<Record>>> {
        let value = match self.0.get(key) {
            None => return Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
            Some(Value::String(s)) => serde_json::from_str::<Value>(s)?,
            Some(other) => other.clone(),
        };
        match value {
            Value::Array(items) => Ok(Some(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(map) => Some(map),
                        _ => None,
                    })
                    .collect(),
            )),
            _ => Err(Error::BadRequest(format!("{} deve ser uma lista", key))),
        }
    }
}
