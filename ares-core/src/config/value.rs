use std::collections::BTreeMap;

use super::ConfigError;

/// A single configuration value that can be converted to various types.
///
/// Maps are ordered by key so that sections read back from YAML (scope
/// mappings in particular) iterate deterministically.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
    List(Vec<ConfigValue>),
    Map(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    pub(crate) fn from_yaml(value: &serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Bool(b) => ConfigValue::Bool(*b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ConfigValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    ConfigValue::Float(f)
                } else {
                    ConfigValue::String(n.to_string())
                }
            }
            serde_yaml::Value::String(s) => ConfigValue::String(s.clone()),
            serde_yaml::Value::Null => ConfigValue::Null,
            serde_yaml::Value::Sequence(seq) => {
                ConfigValue::List(seq.iter().map(ConfigValue::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(map) => ConfigValue::Map(
                map.iter()
                    .map(|(k, v)| (yaml_key(k), ConfigValue::from_yaml(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => ConfigValue::from_yaml(&tagged.value),
        }
    }

    /// Short name of the variant, used in type-mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::String(_) => "string",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Null => "null",
            ConfigValue::List(_) => "list",
            ConfigValue::Map(_) => "map",
        }
    }

    /// Build a map value from `(key, value)` pairs.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, ConfigValue)>) -> Self {
        ConfigValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Convert into a JSON value, keeping the structure.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ConfigValue::String(s) => serde_json::Value::String(s.clone()),
            ConfigValue::Integer(i) => serde_json::Value::from(*i),
            ConfigValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ConfigValue::Bool(b) => serde_json::Value::Bool(*b),
            ConfigValue::Null => serde_json::Value::Null,
            ConfigValue::List(items) => {
                serde_json::Value::Array(items.iter().map(ConfigValue::to_json).collect())
            }
            ConfigValue::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

pub(crate) fn yaml_key(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        other => format!("{other:?}"),
    }
}

/// Trait for converting a `ConfigValue` into a concrete type.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be used as a config value type",
    label = "not a valid config value type",
    note = "built-in types: String, i64, f64, bool, Option<T>, Vec<T>, ConfigValue. Implement `FromConfigValue` for custom types."
)]
pub trait FromConfigValue: Sized {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError>;
}

fn mismatch(key: &str, expected: &'static str) -> ConfigError {
    ConfigError::TypeMismatch {
        key: key.to_string(),
        expected,
    }
}

impl FromConfigValue for ConfigValue {
    fn from_config_value(value: &ConfigValue, _key: &str) -> Result<Self, ConfigError> {
        Ok(value.clone())
    }
}

impl FromConfigValue for String {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::String(s) => Ok(s.clone()),
            ConfigValue::Integer(i) => Ok(i.to_string()),
            ConfigValue::Float(f) => Ok(f.to_string()),
            ConfigValue::Bool(b) => Ok(b.to_string()),
            ConfigValue::Null | ConfigValue::List(_) | ConfigValue::Map(_) => {
                Err(mismatch(key, "String"))
            }
        }
    }
}

impl FromConfigValue for i64 {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::Integer(i) => Ok(*i),
            ConfigValue::String(s) => s.trim().parse().map_err(|_| mismatch(key, "i64")),
            _ => Err(mismatch(key, "i64")),
        }
    }
}

impl FromConfigValue for f64 {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::Float(f) => Ok(*f),
            ConfigValue::Integer(i) => Ok(*i as f64),
            ConfigValue::String(s) => s.trim().parse().map_err(|_| mismatch(key, "f64")),
            _ => Err(mismatch(key, "f64")),
        }
    }
}

impl FromConfigValue for bool {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::Bool(b) => Ok(*b),
            ConfigValue::String(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(mismatch(key, "bool")),
            },
            _ => Err(mismatch(key, "bool")),
        }
    }
}

impl<T: FromConfigValue> FromConfigValue for Option<T> {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::Null => Ok(None),
            v => T::from_config_value(v, key).map(Some),
        }
    }
}

impl<T: FromConfigValue> FromConfigValue for Vec<T> {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| T::from_config_value(v, &format!("{key}[{i}]")))
                .collect(),
            // Fallback: single value -> vec of one
            other => Ok(vec![T::from_config_value(other, key)?]),
        }
    }
}

impl<V: FromConfigValue> FromConfigValue for BTreeMap<String, V> {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::Map(map) => map
                .iter()
                .map(|(k, v)| Ok((k.clone(), V::from_config_value(v, &format!("{key}.{k}"))?)))
                .collect(),
            _ => Err(mismatch(key, "BTreeMap<String, _>")),
        }
    }
}

// ── Integer types via i64 with range check ──────────────────────────────

macro_rules! impl_from_config_int {
    ($($ty:ty),+) => {
        $(
            impl FromConfigValue for $ty {
                fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
                    let i = i64::from_config_value(value, key)?;
                    <$ty>::try_from(i).map_err(|_| mismatch(key, stringify!($ty)))
                }
            }
        )+
    };
}

impl_from_config_int!(u32, u64, i32, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_map_to_json() {
        let value = ConfigValue::map([
            ("limit", ConfigValue::Integer(5)),
            ("tags", ConfigValue::List(vec!["a".into(), "b".into()])),
        ]);
        assert_eq!(
            value.to_json(),
            serde_json::json!({ "limit": 5, "tags": ["a", "b"] })
        );
    }

    #[test]
    fn test_unsigned_rejects_negative() {
        let err = u64::from_config_value(&ConfigValue::Integer(-1), "page_size").unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { expected: "u64", .. }));
    }

    #[test]
    fn test_string_from_scalar() {
        assert_eq!(
            String::from_config_value(&ConfigValue::Integer(7), "k").unwrap(),
            "7"
        );
        assert!(String::from_config_value(&ConfigValue::Null, "k").is_err());
    }
}
