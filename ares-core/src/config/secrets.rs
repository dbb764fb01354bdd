use std::collections::HashMap;

use super::ConfigError;

/// Backend used to expand `${...}` references in configuration strings.
pub trait SecretResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Result<String, ConfigError>;
}

/// Default resolver: environment variables and file references.
///
/// Supported reference formats:
/// - `${VAR_NAME}`: environment variable
/// - `${env:VAR_NAME}`: environment variable, explicit form
/// - `${file:/path/to/secret}`: file contents, trimmed
///
/// Any reference may carry a fallback after `:-`, e.g.
/// `${RESOURCE_SITE:-http://localhost:8080}`.
pub struct DefaultSecretResolver;

impl SecretResolver for DefaultSecretResolver {
    fn resolve(&self, reference: &str) -> Result<String, ConfigError> {
        let reference = reference.trim();
        if let Some(path) = reference.strip_prefix("file:") {
            let path = path.trim();
            std::fs::read_to_string(path)
                .map(|s| s.trim().to_string())
                .map_err(|e| ConfigError::Load(format!("Secret file '{path}': {e}")))
        } else {
            let var = reference.strip_prefix("env:").unwrap_or(reference).trim();
            std::env::var(var).map_err(|_| ConfigError::NotFound(var.to_string()))
        }
    }
}

/// Resolver backed by a fixed map, for tests and embedded setups.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    entries: HashMap<String, String>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl SecretResolver for MapResolver {
    fn resolve(&self, reference: &str) -> Result<String, ConfigError> {
        self.entries
            .get(reference.trim())
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(reference.trim().to_string()))
    }
}

/// Expand every `${...}` placeholder in `value`.
///
/// Resolved text is not scanned again, so a secret containing `${` is kept
/// verbatim.
pub fn resolve_placeholders(
    value: &str,
    resolver: &dyn SecretResolver,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let body = &rest[start + 2..];
        let end = body
            .find('}')
            .ok_or_else(|| ConfigError::Load(format!("Unclosed placeholder in: {value}")))?;
        out.push_str(&resolve_reference(&body[..end], resolver)?);
        rest = &body[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn resolve_reference(reference: &str, resolver: &dyn SecretResolver) -> Result<String, ConfigError> {
    match reference.split_once(":-") {
        Some((name, fallback)) => match resolver.resolve(name) {
            Ok(resolved) => Ok(resolved),
            Err(ConfigError::NotFound(_)) => Ok(fallback.to_string()),
            Err(err) => Err(err),
        },
        None => resolver.resolve(reference),
    }
}
