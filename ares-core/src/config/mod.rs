mod loader;
pub mod secrets;
pub mod value;

use std::collections::HashMap;
use std::path::Path;

pub use secrets::{DefaultSecretResolver, MapResolver, SecretResolver};
pub use value::{ConfigValue, FromConfigValue};

/// Environment variable selecting the active profile.
pub const PROFILE_ENV: &str = "ARES_PROFILE";

#[derive(Debug)]
pub enum ConfigError {
    /// No value under the key.
    NotFound(String),
    /// The value exists but has another shape.
    TypeMismatch { key: String, expected: &'static str },
    /// A file could not be read or parsed, or a placeholder did not resolve.
    Load(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Missing configuration key '{key}'"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Configuration key '{key}' is not {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Cannot load configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Layered configuration for resources and data providers.
///
/// Layers, lowest priority first:
///
/// | layer | example |
/// |-------|---------|
/// | `application.yaml` | `resources.post.site: http://api` |
/// | `application-{profile}.yaml` | `providers.posts.pagination.page_size: 50` |
/// | `.env`, `.env.{profile}` | exported to the process environment |
/// | process environment | `RESOURCES_POST_SITE=http://other` |
///
/// Every value is addressable by its dotted key, and every mapping can also
/// be read whole through [`value`](Self::value). Overrides from later layers
/// and from [`set`](Self::set) show up in both views.
///
/// An environment variable `NAME_X` maps to the key `name.x`. It replaces a
/// value only when that key already holds a scalar; sections and lists are
/// never overridden from the environment, and keys containing an underscore
/// (`key_attribute`, `page_size`) cannot be reached this way. Any other
/// variable is kept as a flat key and leaves sections untouched.
#[derive(Debug, Clone)]
pub struct AresConfig {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl AresConfig {
    /// Load from the working directory with the default resolver.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_with_resolver(profile, &DefaultSecretResolver)
    }

    pub fn load_with_resolver(
        profile: &str,
        resolver: &dyn SecretResolver,
    ) -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."), profile, resolver)
    }

    /// Load every layer from `dir`. `ARES_PROFILE` takes precedence over `profile`.
    pub fn load_from_dir(
        dir: &Path,
        profile: &str,
        resolver: &dyn SecretResolver,
    ) -> Result<Self, ConfigError> {
        let profile = std::env::var(PROFILE_ENV).unwrap_or_else(|_| profile.to_string());
        let mut config = AresConfig {
            values: HashMap::new(),
            profile,
        };

        for file in ["application.yaml".to_string(), format!("application-{}.yaml", config.profile)] {
            loader::load_yaml_file(&dir.join(file), &mut config.values)?;
        }

        // Variables already in the environment win over .env files.
        for file in [".env".to_string(), format!(".env.{}", config.profile)] {
            if dotenvy::from_path(dir.join(&file)).is_ok() {
                tracing::trace!(file = %file, "Loaded dotenv file");
            }
        }

        for value in config.values.values_mut() {
            resolve_value(value, resolver)?;
        }

        // Only keys that already hold a scalar are patched into their sections.
        let mut overridden = 0usize;
        for (name, raw) in std::env::vars() {
            let key = name.to_lowercase().replace('_', ".");
            match config.values.get(&key) {
                Some(ConfigValue::Map(_) | ConfigValue::List(_)) => {
                    tracing::trace!(variable = %name, "Skipped override of a section");
                }
                Some(_) => {
                    overridden += 1;
                    config.set(&key, ConfigValue::String(raw));
                }
                None => {
                    config.values.insert(key, ConfigValue::String(raw));
                }
            }
        }

        tracing::debug!(
            profile = %config.profile,
            keys = config.values.len(),
            overridden,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parse a single YAML document, without files or environment.
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut config = AresConfig {
            values: HashMap::new(),
            profile: profile.to_string(),
        };
        loader::load_yaml_str(yaml, &mut config.values)?;
        Ok(config)
    }

    pub fn empty() -> Self {
        AresConfig {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    /// Store `value` under `key` and patch every enclosing section with it.
    pub fn set(&mut self, key: &str, value: ConfigValue) {
        let mut parent = key;
        while let Some((head, _)) = parent.rsplit_once('.') {
            if let Some(ConfigValue::Map(section)) = self.values.get_mut(head) {
                let rest = &key[head.len() + 1..];
                insert_path(section, rest, value.clone());
            }
            parent = head;
        }
        self.values.insert(key.to_string(), value);
    }

    /// Typed value under a dotted key.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        match self.values.get(key) {
            Some(value) => V::from_config_value(value, key),
            None => Err(ConfigError::NotFound(key.to_string())),
        }
    }

    /// Typed value, or `default` when missing or mistyped.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    /// Raw value under `key`. Sections come back as [`ConfigValue::Map`].
    pub fn value(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }
}

fn insert_path(
    section: &mut std::collections::BTreeMap<String, ConfigValue>,
    path: &str,
    value: ConfigValue,
) {
    match path.split_once('.') {
        None => {
            section.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = section
                .entry(head.to_string())
                .or_insert_with(|| ConfigValue::Map(Default::default()));
            if !matches!(child, ConfigValue::Map(_)) {
                *child = ConfigValue::Map(Default::default());
            }
            if let ConfigValue::Map(child) = child {
                insert_path(child, rest, value);
            }
        }
    }
}

fn resolve_value(value: &mut ConfigValue, resolver: &dyn SecretResolver) -> Result<(), ConfigError> {
    match value {
        ConfigValue::String(s) if s.contains("${") => {
            *s = secrets::resolve_placeholders(s, resolver)?;
        }
        ConfigValue::List(items) => {
            for item in items {
                resolve_value(item, resolver)?;
            }
        }
        ConfigValue::Map(map) => {
            for item in map.values_mut() {
                resolve_value(item, resolver)?;
            }
        }
        _ => {}
    }
    Ok(())
}
