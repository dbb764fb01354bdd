use ares_core::{ConfigValue, FromConfigValue};

use crate::criteria::QueryCriteria;
use crate::error::DataError;

pub const DEFAULT_SORT_VAR: &str = "sort";

/// Ordering collaborator of a [`CollectionProvider`](crate::CollectionProvider).
pub trait ApplyOrder: Send + Sync {
    /// Tag the sort with the resource it orders, so attribute names can be
    /// checked against that resource.
    fn set_resource(&mut self, resource: &str);

    /// Write the order expression onto `criteria`.
    fn apply_order(&self, criteria: &mut QueryCriteria);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDirection {
    pub attribute: String,
    pub descending: bool,
}

/// Sort specification driven by a `attr1.desc-attr2` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    sort_var: String,
    default_order: String,
    attributes: Vec<String>,
    multi_sort: bool,
    resource: Option<String>,
    directives: String,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            sort_var: DEFAULT_SORT_VAR.to_string(),
            default_order: String::new(),
            attributes: Vec::new(),
            multi_sort: false,
            resource: None,
            directives: String::new(),
        }
    }
}

impl Sort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes that may be sorted on. Empty allows any attribute.
    pub fn with_attributes<S: AsRef<str>>(mut self, attributes: &[S]) -> Self {
        self.attributes = attributes.iter().map(|a| a.as_ref().to_string()).collect();
        self
    }

    /// Order used when no directive selects one.
    pub fn with_default_order(mut self, order: &str) -> Self {
        self.default_order = order.to_string();
        self
    }

    pub fn with_multi_sort(mut self, multi_sort: bool) -> Self {
        self.multi_sort = multi_sort;
        self
    }

    pub fn with_directives(mut self, directives: &str) -> Self {
        self.directives = directives.to_string();
        self
    }

    pub fn sort_var(&self) -> &str {
        &self.sort_var
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    pub fn set_directives(&mut self, directives: &str) {
        self.directives = directives.to_string();
    }

    /// Read the directive from a URL query string; returns whether one was found.
    pub fn resolve_directives(&mut self, query: &str) -> bool {
        let query = query.strip_prefix('?').unwrap_or(query);
        match form_urlencoded::parse(query.as_bytes()).find(|(name, _)| name == self.sort_var.as_str()) {
            Some((_, value)) => {
                self.directives = value.into_owned();
                true
            }
            None => false,
        }
    }

    fn is_allowed(&self, attribute: &str) -> bool {
        self.attributes.is_empty() || self.attributes.iter().any(|a| a == attribute)
    }

    /// Parsed directive, unknown and repeated attributes dropped.
    pub fn directions(&self) -> Vec<SortDirection> {
        let mut directions: Vec<SortDirection> = Vec::new();
        for part in self.directives.split('-').filter(|p| !p.is_empty()) {
            let (attribute, descending) = match part.rsplit_once('.') {
                Some((attribute, "desc")) => (attribute, true),
                Some((attribute, "asc")) => (attribute, false),
                _ => (part, false),
            };
            if !self.is_allowed(attribute) {
                tracing::warn!(
                    resource = self.resource.as_deref().unwrap_or(""),
                    attribute,
                    "Ignoring sort on unknown attribute"
                );
                continue;
            }
            if directions.iter().any(|d| d.attribute == attribute) {
                continue;
            }
            directions.push(SortDirection {
                attribute: attribute.to_string(),
                descending,
            });
            if !self.multi_sort {
                break;
            }
        }
        directions
    }

    /// Order expression for the current directive, e.g. `"title DESC, id"`.
    pub fn order_by(&self) -> String {
        let directions = self.directions();
        if directions.is_empty() {
            return self.default_order.clone();
        }
        directions
            .iter()
            .map(|d| {
                if d.descending {
                    format!("{} DESC", d.attribute)
                } else {
                    d.attribute.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Build from a `{sort_var, default_order, attributes, multi_sort}` mapping.
    pub fn from_config(value: &ConfigValue) -> Result<Self, DataError> {
        let mut sort = Sort::new();
        sort.configure(value)?;
        Ok(sort)
    }

    pub fn configure(&mut self, value: &ConfigValue) -> Result<(), DataError> {
        let ConfigValue::Map(map) = value else {
            return Err(DataError::configuration("sort must be `false` or a mapping"));
        };
        for (key, raw) in map {
            let key_path = format!("sort.{key}");
            match key.as_str() {
                "sort_var" => self.sort_var = String::from_config_value(raw, &key_path)?,
                "default_order" => self.default_order = String::from_config_value(raw, &key_path)?,
                "attributes" => self.attributes = Vec::<String>::from_config_value(raw, &key_path)?,
                "multi_sort" => self.multi_sort = bool::from_config_value(raw, &key_path)?,
                other => {
                    return Err(DataError::configuration(format!("unknown sort key '{other}'")))
                }
            }
        }
        Ok(())
    }
}

impl ApplyOrder for Sort {
    fn set_resource(&mut self, resource: &str) {
        self.resource = Some(resource.to_string());
    }

    /// Appends after any order already on the criteria.
    fn apply_order(&self, criteria: &mut QueryCriteria) {
        let order = self.order_by();
        if order.is_empty() {
            return;
        }
        if criteria.order().is_empty() {
            criteria.set_order(&order);
        } else {
            let combined = format!("{}, {}", criteria.order(), order);
            criteria.set_order(&combined);
        }
    }
}
