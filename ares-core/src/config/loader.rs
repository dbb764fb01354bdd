use std::collections::HashMap;
use std::path::Path;

use super::value::{yaml_key, ConfigValue};
use super::ConfigError;

/// Load and parse a YAML file, flattening it into the values map.
///
/// A missing file is not an error: profile overrides are optional.
pub(crate) fn load_yaml_file(
    path: &Path,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        load_yaml_str(&content, values)?;
    }
    Ok(())
}

/// Parse a YAML string and flatten it into the values map.
pub(crate) fn load_yaml_str(
    content: &str,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
    flatten_yaml("", &yaml, values);
    Ok(())
}

/// Flatten a YAML tree into dot-separated keys.
///
/// Every non-root mapping and sequence is also stored whole under its own
/// key. A later file overriding `a.b.c` therefore replaces the leaf but not
/// the stored `a.b` section; sections are merged key by key below.
pub(crate) fn flatten_yaml(
    prefix: &str,
    value: &serde_yaml::Value,
    out: &mut HashMap<String, ConfigValue>,
) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            if !prefix.is_empty() {
                merge_section(out, prefix, ConfigValue::from_yaml(value));
            }
            for (k, v) in map {
                let key_str = yaml_key(k);
                let full_key = if prefix.is_empty() {
                    key_str
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(&full_key, v, out);
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), ConfigValue::from_yaml(value));
                // Each element also gets an indexed key (key.0, key.1, ...)
                for (i, item) in seq.iter().enumerate() {
                    flatten_yaml(&format!("{prefix}.{i}"), item, out);
                }
            }
        }
        leaf => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), ConfigValue::from_yaml(leaf));
            }
        }
    }
}

fn merge_section(out: &mut HashMap<String, ConfigValue>, key: &str, incoming: ConfigValue) {
    match (out.get_mut(key), incoming) {
        (Some(ConfigValue::Map(existing)), ConfigValue::Map(incoming)) => {
            merge_maps(existing, incoming);
        }
        (_, incoming) => {
            out.insert(key.to_string(), incoming);
        }
    }
}

fn merge_maps(
    existing: &mut std::collections::BTreeMap<String, ConfigValue>,
    incoming: std::collections::BTreeMap<String, ConfigValue>,
) {
    for (k, v) in incoming {
        match (existing.get_mut(&k), v) {
            (Some(ConfigValue::Map(inner)), ConfigValue::Map(v)) => merge_maps(inner, v),
            (_, v) => {
                existing.insert(k, v);
            }
        }
    }
}
