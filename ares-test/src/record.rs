use ares_data::Resource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A resource item backed by a JSON object.
///
/// The identity is the `id` attribute; a JSON array under `id` is a
/// composite identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wrap a JSON object. Any other value yields an empty record.
    pub fn new(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self(Map::new()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Attribute rendered the way it appears in a query string.
    pub(crate) fn text(&self, name: &str) -> Option<String> {
        self.0.get(name).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Record::new(value)
    }
}

impl Resource for Record {
    fn id_property(&self) -> Value {
        self.0.get("id").cloned().unwrap_or(Value::Null)
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        self.0.get(name).cloned()
    }
}
