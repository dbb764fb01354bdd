use ares_core::{AresConfig, ConfigValue, MapResolver};
use ares_data::prelude::*;
use ares_data::{RelationKind, ResourceMetaData, ResourceSchema};
use ares_test::{CallKind, InMemoryResource};
use serde_json::json;
use serial_test::serial;

const CONFIG: &str = r#"
resources:
  Post:
    properties:
      id: ~
      title: ~
      status:
        default: 1
    relations:
      comments: [has_many, Comment, post_id]
      author: [BELONGS_TO, User, author_id, {select: "id,name"}]
  Ordered:
    properties: [title, id, {status: {default: 0}}]
  Draft:
    relations:
      owner: [belongs_to, User, owner_id]
  Broken:
    properties:
      id: ~
    relations:
      tags: [many_many, Tag, post_id]

providers:
  posts:
    id: post
    key_attribute: slug
    criteria:
      condition: status=1
      order: id
    pagination:
      page_size: 2
    sort: false
  unpaged:
    pagination: false
    sort:
      default_order: title DESC
  invalid:
    criteria:
      limit: -4
"#;

fn config() -> AresConfig {
    AresConfig::from_yaml_str(CONFIG, "test").unwrap()
}

fn posts() -> InMemoryResource {
    InMemoryResource::new("Post").with_records([
        json!({ "id": 1, "status": 1, "title": "b", "slug": "first" }),
        json!({ "id": 2, "status": 0, "title": "a", "slug": "draft" }),
        json!({ "id": 3, "status": 1, "title": "c", "slug": "third" }),
        json!({ "id": 4, "status": 1, "title": "a", "slug": "fourth" }),
    ])
}

fn provider_at(prefix: &str) -> Result<CollectionProvider<InMemoryResource>, DataError> {
    CollectionProvider::from_config(posts(), &config(), prefix)
}

#[tokio::test]
async fn test_provider_from_config() {
    let mut provider = provider_at("providers.posts").unwrap();

    assert_eq!(provider.id(), "post");
    assert_eq!(provider.key_attribute(), Some("slug"));
    assert!(provider.get_sort().is_none());
    let pagination = provider.get_pagination().unwrap();
    assert_eq!(pagination.page_size(), 2);
    assert_eq!(pagination.page_var(), "post_page");

    let keys = provider.keys().await.unwrap();
    assert_eq!(
        keys.values().cloned().collect::<Vec<_>>(),
        vec![json!("first"), json!("third")]
    );
    assert_eq!(provider.total_count().await.unwrap(), 3);
}

#[test]
#[serial]
fn test_provider_from_loaded_config_with_env() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("application.yaml"),
        "providers:\n  posts:\n    id: post\n    key_attribute: id\n    pagination:\n      page_size: 2\n",
    )
    .unwrap();

    let vars = [
        ("PROVIDERS", "flat"),
        ("PROVIDERS_POSTS_ID", "recent"),
        ("PROVIDERS_POSTS_KEY_ATTRIBUTE", "slug"),
        ("PROVIDERS_POSTS_PAGINATION_PAGE_SIZE", "7"),
    ];
    for (name, value) in vars {
        unsafe { std::env::set_var(name, value) };
    }
    let config = AresConfig::load_from_dir(dir.path(), "dev", &MapResolver::new());
    for (name, _) in vars {
        unsafe { std::env::remove_var(name) };
    }
    let config = config.unwrap();
    assert!(matches!(config.value("providers"), Some(ConfigValue::Map(_))));

    let mut provider: CollectionProvider<InMemoryResource> =
        CollectionProvider::from_config(posts(), &config, "providers.posts").unwrap();
    assert_eq!(provider.id(), "recent");
    assert_eq!(provider.key_attribute(), Some("id"));
    assert_eq!(provider.get_pagination().unwrap().page_size(), 2);
}

#[tokio::test]
async fn test_unpaged_provider_from_config() {
    let mut provider = provider_at("providers.unpaged").unwrap();
    assert!(provider.get_pagination().is_none());

    let titles: Vec<_> = provider
        .data()
        .await
        .unwrap()
        .iter()
        .map(|r| r.attribute("title").unwrap())
        .collect();
    assert_eq!(titles, vec![json!("c"), json!("b"), json!("a"), json!("a")]);
    assert!(provider
        .model()
        .lock()
        .await
        .calls_of(CallKind::Collection)
        .is_empty());
}

#[test]
fn test_invalid_criteria_config() {
    let err = provider_at("providers.invalid").err().unwrap();
    assert!(matches!(err, DataError::Criteria(_)));

    let missing = provider_at("providers.nope").err().unwrap();
    assert!(missing.is_configuration());
}

#[test]
fn test_set_criteria_config() {
    let mut provider: CollectionProvider<InMemoryResource> = CollectionProvider::new(posts());
    let raw = ConfigValue::map([
        ("condition", ConfigValue::List(vec!["status=1".into(), "title=a".into()])),
        ("limit", ConfigValue::Integer(-1)),
    ]);
    provider.set_criteria_config(&raw).unwrap();
    assert_eq!(provider.criteria().condition(), "status=1&title=a");
    assert_eq!(provider.criteria().limit(), None);

    let bad = ConfigValue::map([("conditions", ConfigValue::from("x=1"))]);
    assert!(provider.set_criteria_config(&bad).is_err());
}

#[test]
fn test_metadata_from_config() {
    let meta = ResourceMetaData::from_config(&config(), "Post").unwrap();
    assert_eq!(meta.schema().attribute_names(), vec!["id", "status", "title"]);
    assert_eq!(meta.attribute_defaults().get("status"), Some(&json!(1)));

    let author = meta.relation("author").unwrap();
    assert_eq!(author.kind, RelationKind::BelongsTo);
    assert_eq!(author.related, "User");
    assert_eq!(author.options, vec![json!({ "select": "id,name" })]);
    assert_eq!(meta.relations().count(), 2);
}

#[test]
fn test_metadata_property_order() {
    let config = config();

    let named = ResourceMetaData::from_config(&config, "Post").unwrap();
    let Some(ConfigValue::Map(_)) = config.value("resources.Post.properties") else {
        panic!("resources.Post.properties is not a mapping");
    };
    assert_eq!(named.schema().attribute_names(), vec!["id", "status", "title"]);

    let listed = ResourceMetaData::from_config(&config, "Ordered").unwrap();
    assert_eq!(listed.schema().attribute_names(), vec!["title", "id", "status"]);
    assert_eq!(listed.attribute_defaults().get("status"), Some(&json!(0)));
    assert_eq!(listed.relations().count(), 0);

    let schema = ResourceSchema::new().property("title").property("id");
    assert_eq!(schema.attribute_names(), vec!["title", "id"]);
}

#[test]
fn test_metadata_configuration_errors() {
    let config = config();

    let err = ResourceMetaData::from_config(&config, "Draft").unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("Draft"));

    let err = ResourceMetaData::from_config(&config, "Broken").unwrap_err();
    assert!(err.to_string().contains("many_many"));

    assert!(ResourceMetaData::from_config(&config, "Missing").is_err());
}
