//! Untyped rows and entity types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CleanError;

/// The three record kinds a sheet can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Client,
    Worker,
    Task,
}

impl EntityType {
    /// All entity types in display order.
    pub const ALL: [EntityType; 3] = [EntityType::Client, EntityType::Worker, EntityType::Task];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Client => "client",
            EntityType::Worker => "worker",
            EntityType::Task => "task",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = CleanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" | "clients" => Ok(EntityType::Client),
            "worker" | "workers" => Ok(EntityType::Worker),
            "task" | "tasks" => Ok(EntityType::Task),
            _ => Err(CleanError::UnknownEntityType(s.to_string())),
        }
    }
}

/// One uploaded record: field name to loosely typed value, in upload order.
///
/// A key that is missing and a key holding `null` are both treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builds a row from `(field, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns the value of a field, treating `null` as absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    /// Returns true if the key exists, even when it holds `null`.
    pub fn has_key(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns the field rendered as text, or `None` when absent.
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).map(value_text)
    }

    /// Returns the trimmed text of a field if it is present and not blank.
    pub fn non_blank(&self, field: &str) -> Option<String> {
        self.text(field)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Sets a field, keeping its position if it already exists.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Renames a key in place, keeping order. Returns false if `from` is missing.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if from == to || !self.0.contains_key(from) {
            return self.0.contains_key(from);
        }
        let entries = std::mem::take(&mut self.0);
        self.0 = entries
            .into_iter()
            .map(|(k, v)| if k == from { (to.to_string(), v) } else { (k, v) })
            .collect();
        true
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Decodes a JSON array of objects into rows.
pub fn rows_from_json(json: &str) -> Result<Vec<Row>, CleanError> {
    serde_json::from_str(json).map_err(|e| CleanError::InvalidRows(e.to_string()))
}

/// Renders a value the way a spreadsheet cell would display it.
///
/// Integral floats print without a fraction (`5.0` becomes `"5"`), arrays of
/// scalars join with commas, objects print as compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                format_float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

pub(crate) fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
