use ares_core::{AresConfig, ConfigValue};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::error::DataError;

/// A property declared in a resource schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub default: Option<Value>,
}

/// Ordered property list of a resource.
///
/// Builder methods keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSchema {
    properties: Vec<Property>,
}

impl ResourceSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(mut self, name: &str) -> Self {
        self.properties.push(Property {
            name: name.to_string(),
            default: None,
        });
        self
    }

    pub fn property_with_default(mut self, name: &str, default: Value) -> Self {
        self.properties.push(Property {
            name: name.to_string(),
            default: Some(default),
        });
        self
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.properties.iter().map(|p| p.name.as_str()).collect()
    }

    /// Read properties from configuration.
    ///
    /// A `{name: {default: value} | null}` mapping yields properties ordered
    /// by name. A list of names or single-entry mappings keeps its order:
    ///
    /// ```yaml
    /// properties: [id, title, {status: {default: 1}}]
    /// ```
    pub fn from_config(value: &ConfigValue) -> Result<Self, DataError> {
        let mut schema = ResourceSchema::new();
        match value {
            ConfigValue::Map(map) => {
                for (name, spec) in map {
                    schema.push_config(name, spec)?;
                }
            }
            ConfigValue::List(items) => {
                for item in items {
                    match item {
                        ConfigValue::String(name) => schema.push_config(name, &ConfigValue::Null)?,
                        ConfigValue::Map(entry) if entry.len() == 1 => {
                            for (name, spec) in entry {
                                schema.push_config(name, spec)?;
                            }
                        }
                        _ => {
                            return Err(DataError::configuration(
                                "property list entries must be names or single-entry mappings",
                            ))
                        }
                    }
                }
            }
            _ => return Err(DataError::configuration("properties must be a mapping or a list")),
        }
        Ok(schema)
    }

    fn push_config(&mut self, name: &str, spec: &ConfigValue) -> Result<(), DataError> {
        let default = match spec {
            ConfigValue::Map(spec) => spec.get("default").map(ConfigValue::to_json),
            ConfigValue::Null => None,
            _ => {
                return Err(DataError::configuration(format!(
                    "property '{name}' must be a mapping"
                )))
            }
        };
        self.properties.push(Property {
            name: name.to_string(),
            default,
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsTo,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::HasOne => "has_one",
            RelationKind::HasMany => "has_many",
            RelationKind::BelongsTo => "belongs_to",
        }
    }

    /// Whether the relation resolves to a list of related resources.
    pub fn is_collection(self) -> bool {
        matches!(self, RelationKind::HasMany)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub name: String,
    pub kind: RelationKind,
    /// Identity of the related resource, e.g. `"User"`.
    pub related: String,
    /// Foreign-key expression linking the two resources.
    pub foreign_key: String,
    /// Extra definition entries after the foreign key.
    pub options: Vec<Value>,
}

/// Maps relation type names found in configuration to [`RelationKind`]s.
///
/// Lookup ignores case and underscores, so `has_many`, `HAS_MANY` and
/// `HasMany` all resolve.
#[derive(Debug, Clone)]
pub struct RelationRegistry {
    kinds: HashMap<String, RelationKind>,
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

impl Default for RelationRegistry {
    fn default() -> Self {
        let mut registry = Self {
            kinds: HashMap::new(),
        };
        for kind in [RelationKind::HasOne, RelationKind::HasMany, RelationKind::BelongsTo] {
            registry.register(kind.as_str(), kind);
        }
        registry
    }
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an alias, e.g. `register("owner", RelationKind::BelongsTo)`.
    pub fn register(&mut self, name: &str, kind: RelationKind) {
        self.kinds.insert(normalize(name), kind);
    }

    pub fn resolve(&self, name: &str) -> Option<RelationKind> {
        self.kinds.get(&normalize(name)).copied()
    }

    /// Build a relation from a `[type, related, foreign_key, options...]` definition.
    pub fn build(
        &self,
        resource: &str,
        name: &str,
        definition: &[ConfigValue],
    ) -> Result<Relation, DataError> {
        let invalid = || {
            DataError::configuration(format!(
                "Active resource \"{resource}\" has an invalid configuration for relation \"{name}\". \
                 It must specify the relation type, the related active resource and the foreign key."
            ))
        };
        let [kind, related, foreign_key, options @ ..] = definition else {
            return Err(invalid());
        };
        let (ConfigValue::String(kind), ConfigValue::String(related)) = (kind, related) else {
            return Err(invalid());
        };
        let kind = self.resolve(kind).ok_or_else(|| {
            DataError::configuration(format!(
                "Active resource \"{resource}\" uses unknown relation type \"{kind}\" for relation \"{name}\"."
            ))
        })?;
        let foreign_key = match foreign_key {
            ConfigValue::String(fk) => fk.clone(),
            ConfigValue::List(parts) => parts
                .iter()
                .map(|p| match p {
                    ConfigValue::String(s) => Ok(s.clone()),
                    _ => Err(invalid()),
                })
                .collect::<Result<Vec<_>, _>>()?
                .join(","),
            _ => return Err(invalid()),
        };
        Ok(Relation {
            name: name.to_string(),
            kind,
            related: related.clone(),
            foreign_key,
            options: options.iter().map(ConfigValue::to_json).collect(),
        })
    }
}

/// Schema and relations of one resource.
#[derive(Debug, Clone)]
pub struct ResourceMetaData {
    resource: String,
    schema: ResourceSchema,
    attribute_defaults: BTreeMap<String, Value>,
    relations: BTreeMap<String, Relation>,
    registry: RelationRegistry,
}

impl ResourceMetaData {
    /// Resolve the metadata of `resource`.
    ///
    /// A missing schema or a malformed relation is a configuration error.
    pub fn new<'a>(
        resource: &str,
        schema: Option<ResourceSchema>,
        relations: impl IntoIterator<Item = (&'a str, &'a [ConfigValue])>,
        registry: RelationRegistry,
    ) -> Result<Self, DataError> {
        let schema = schema.ok_or_else(|| {
            DataError::configuration(format!(
                "The resource \"{resource}\" configuration could not be found in the resource configuration."
            ))
        })?;
        let attribute_defaults = schema
            .properties()
            .iter()
            .filter_map(|p| p.default.clone().map(|d| (p.name.clone(), d)))
            .collect();
        let mut meta = Self {
            resource: resource.to_string(),
            schema,
            attribute_defaults,
            relations: BTreeMap::new(),
            registry,
        };
        for (name, definition) in relations {
            meta.add_relation(name, definition)?;
        }
        tracing::debug!(
            resource,
            properties = meta.schema.properties().len(),
            relations = meta.relations.len(),
            "Resource metadata resolved"
        );
        Ok(meta)
    }

    /// Read `resources.<resource>.properties` and `resources.<resource>.relations`.
    pub fn from_config(config: &AresConfig, resource: &str) -> Result<Self, DataError> {
        let prefix = format!("resources.{resource}");
        let schema = config
            .value(&format!("{prefix}.properties"))
            .map(ResourceSchema::from_config)
            .transpose()?;
        let relations = match config.value(&format!("{prefix}.relations")) {
            None | Some(ConfigValue::Null) => BTreeMap::new(),
            Some(ConfigValue::Map(map)) => map.clone(),
            Some(_) => {
                return Err(DataError::configuration(format!(
                    "{prefix}.relations must be a mapping"
                )))
            }
        };
        let mut definitions: Vec<(&str, Vec<ConfigValue>)> = Vec::with_capacity(relations.len());
        for (name, definition) in &relations {
            match definition {
                ConfigValue::List(items) => definitions.push((name.as_str(), items.clone())),
                _ => definitions.push((name.as_str(), Vec::new())),
            }
        }
        Self::new(
            resource,
            schema,
            definitions.iter().map(|(n, d)| (*n, d.as_slice())),
            RelationRegistry::default(),
        )
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    pub fn attribute_defaults(&self) -> &BTreeMap<String, Value> {
        &self.attribute_defaults
    }

    pub fn add_relation(&mut self, name: &str, definition: &[ConfigValue]) -> Result<(), DataError> {
        let relation = self.registry.build(&self.resource, name, definition)?;
        self.relations.insert(name.to_string(), relation);
        Ok(())
    }

    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    pub fn remove_relation(&mut self, name: &str) -> Option<Relation> {
        self.relations.remove(name)
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn def(items: &[&str]) -> Vec<ConfigValue> {
        items.iter().map(|s| ConfigValue::from(*s)).collect()
    }

    #[test]
    fn test_registry_resolves_spellings() {
        let registry = RelationRegistry::new();
        assert_eq!(registry.resolve("has_many"), Some(RelationKind::HasMany));
        assert_eq!(registry.resolve("HAS_ONE"), Some(RelationKind::HasOne));
        assert_eq!(registry.resolve("BelongsTo"), Some(RelationKind::BelongsTo));
        assert_eq!(registry.resolve("many_many"), None);
    }

    #[test]
    fn test_registry_alias() {
        let mut registry = RelationRegistry::new();
        registry.register("owner", RelationKind::BelongsTo);
        let relation = registry
            .build("Post", "author", &def(&["owner", "User", "author_id"]))
            .unwrap();
        assert_eq!(relation.kind, RelationKind::BelongsTo);
    }

    #[test]
    fn test_missing_schema_is_configuration_error() {
        let err = ResourceMetaData::new("Post", None, [], RelationRegistry::new()).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("\"Post\""));
    }

    #[test]
    fn test_short_relation_definition() {
        let short = def(&["has_many", "Comment"]);
        let err = ResourceMetaData::new(
            "Post",
            Some(ResourceSchema::new().property("id")),
            [("comments", short.as_slice())],
            RelationRegistry::new(),
        )
        .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("\"comments\""));
    }

    #[test]
    fn test_relations_and_defaults() {
        let comments = def(&["has_many", "Comment", "post_id"]);
        let schema = ResourceSchema::new()
            .property("id")
            .property_with_default("status", json!(1));
        let mut meta = ResourceMetaData::new(
            "Post",
            Some(schema),
            [("comments", comments.as_slice())],
            RelationRegistry::new(),
        )
        .unwrap();

        assert_eq!(meta.attribute_defaults().get("status"), Some(&json!(1)));
        let relation = meta.relation("comments").unwrap();
        assert!(relation.kind.is_collection());
        assert_eq!(relation.related, "Comment");
        assert_eq!(relation.foreign_key, "post_id");

        assert!(meta.remove_relation("comments").is_some());
        assert!(!meta.has_relation("comments"));
    }

    #[test]
    fn test_composite_foreign_key_and_options() {
        let definition = vec![
            ConfigValue::from("belongs_to"),
            ConfigValue::from("Author"),
            ConfigValue::List(vec!["site_id".into(), "author_id".into()]),
            ConfigValue::map([("cache", ConfigValue::Bool(true))]),
        ];
        let relation = RelationRegistry::new()
            .build("Post", "author", &definition)
            .unwrap();
        assert_eq!(relation.foreign_key, "site_id,author_id");
        assert_eq!(relation.options, vec![json!({ "cache": true })]);
    }

    #[test]
    fn test_builder_keeps_insertion_order() {
        let schema = ResourceSchema::new()
            .property("title")
            .property_with_default("status", json!(1))
            .property("id");
        assert_eq!(schema.attribute_names(), vec!["title", "status", "id"]);
    }

    #[test]
    fn test_schema_config_forms() {
        let mapping = ConfigValue::map([
            ("title", ConfigValue::Null),
            ("id", ConfigValue::Null),
        ]);
        let schema = ResourceSchema::from_config(&mapping).unwrap();
        assert_eq!(schema.attribute_names(), vec!["id", "title"]);

        let list = ConfigValue::List(vec![
            ConfigValue::from("title"),
            ConfigValue::map([(
                "status",
                ConfigValue::map([("default", ConfigValue::Integer(1))]),
            )]),
            ConfigValue::from("id"),
        ]);
        let schema = ResourceSchema::from_config(&list).unwrap();
        assert_eq!(schema.attribute_names(), vec!["title", "status", "id"]);
        assert_eq!(schema.properties()[1].default, Some(json!(1)));

        assert!(ResourceSchema::from_config(&ConfigValue::List(vec![ConfigValue::Integer(3)])).is_err());
        assert!(ResourceSchema::from_config(&ConfigValue::from("id")).is_err());
    }
}
