use ares_core::{AresConfig, ConfigValue, FromConfigValue};

use crate::criteria::QueryCriteria;
use crate::error::DataError;
use crate::pagination::Pagination;
use crate::provider::Slot;
use crate::sort::Sort;

/// Provider settings read from a configuration section.
///
/// ```yaml
/// providers:
///   posts:
///     id: post
///     key_attribute: slug
///     criteria:
///       condition: status=1
///       order: created DESC
///     pagination:
///       page_size: 10
///     sort: false
/// ```
///
/// `pagination` and `sort` take `false` to disable the collaborator, or a
/// mapping of settings applied on top of its defaults.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub id: Option<String>,
    pub criteria: Option<QueryCriteria>,
    pub pagination: Slot<ConfigValue>,
    pub sort: Slot<ConfigValue>,
    pub key_attribute: Option<String>,
}

impl ProviderConfig {
    /// Read the section stored under `prefix`, e.g. `providers.posts`.
    pub fn from_config(config: &AresConfig, prefix: &str) -> Result<Self, DataError> {
        let section = config.value(prefix).ok_or_else(|| {
            DataError::configuration(format!("No provider configuration under '{prefix}'"))
        })?;
        let settings = Self::from_config_value(section)?;
        tracing::debug!(
            prefix,
            pagination = !settings.pagination.is_disabled(),
            sort = !settings.sort.is_disabled(),
            "Provider configuration loaded"
        );
        Ok(settings)
    }

    pub fn from_config_value(value: &ConfigValue) -> Result<Self, DataError> {
        let ConfigValue::Map(map) = value else {
            return Err(DataError::configuration(format!(
                "provider configuration must be a mapping, got {}",
                value.type_name()
            )));
        };
        let mut settings = ProviderConfig::default();
        for (key, raw) in map {
            match key.as_str() {
                "id" => settings.id = Some(String::from_config_value(raw, key)?),
                "key_attribute" => {
                    settings.key_attribute = Option::<String>::from_config_value(raw, key)?
                }
                "criteria" => settings.criteria = Some(QueryCriteria::from_config(raw)?),
                "pagination" => {
                    settings.pagination = toggle(raw, key)?;
                    // Fail here rather than when the provider is built.
                    if let Slot::Ready(raw) = &settings.pagination {
                        Pagination::from_config(raw)?;
                    }
                }
                "sort" => {
                    settings.sort = toggle(raw, key)?;
                    if let Slot::Ready(raw) = &settings.sort {
                        Sort::from_config(raw)?;
                    }
                }
                other => {
                    return Err(DataError::configuration(format!(
                        "unknown provider key '{other}'"
                    )))
                }
            }
        }
        Ok(settings)
    }
}

fn toggle(raw: &ConfigValue, key: &str) -> Result<Slot<ConfigValue>, DataError> {
    match raw {
        ConfigValue::Bool(false) => Ok(Slot::Disabled),
        ConfigValue::Bool(true) | ConfigValue::Null => Ok(Slot::Unset),
        ConfigValue::Map(_) => Ok(Slot::Ready(raw.clone())),
        other => Err(DataError::configuration(format!(
            "{key} must be `false` or a mapping, got {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles() {
        let raw = ConfigValue::map([
            ("pagination", ConfigValue::Bool(false)),
            ("sort", ConfigValue::map([("default_order", ConfigValue::from("id"))])),
        ]);
        let settings = ProviderConfig::from_config_value(&raw).unwrap();
        assert!(settings.pagination.is_disabled());
        assert!(matches!(settings.sort, Slot::Ready(_)));
        assert!(settings.criteria.is_none());
    }

    #[test]
    fn test_bad_criteria_fails_at_coercion() {
        let raw = ConfigValue::map([(
            "criteria",
            ConfigValue::map([("limit", ConfigValue::Integer(-5))]),
        )]);
        let err = ProviderConfig::from_config_value(&raw).unwrap_err();
        assert!(matches!(err, DataError::Criteria(_)));
    }

    #[test]
    fn test_bad_pagination_rejected_early() {
        let raw = ConfigValue::map([(
            "pagination",
            ConfigValue::map([("page_size", ConfigValue::from("ten"))]),
        )]);
        assert!(ProviderConfig::from_config_value(&raw).is_err());

        let raw = ConfigValue::map([("sort", ConfigValue::Integer(1))]);
        assert!(ProviderConfig::from_config_value(&raw)
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn test_missing_section() {
        let config = AresConfig::empty();
        assert!(ProviderConfig::from_config(&config, "providers.posts")
            .unwrap_err()
            .is_configuration());
    }
}
