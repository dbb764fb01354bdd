//! Query criteria for a remote resource collection.
//!
//! A criteria bundles a filter condition, bound parameters, paging, ordering,
//! an optional index attribute and named scopes. Criteria from several
//! sources are combined with [`QueryCriteria::merge_with`] and turned into the
//! query part of a collection URL with [`QueryCriteria::build_query_string`].
//!
//! # Example
//!
//! ```ignore
//! let mut c = QueryCriteria::new()
//!     .with_condition("status=:status")
//!     .with_param(":status", 1)
//!     .with_limit(10);
//! c.add_condition("author=ann");
//! assert_eq!(c.build_query_string(), "?status=1&author=ann&count=10");
//! ```

use ares_core::{ConfigValue, FromConfigValue};
use serde::de::{DeserializeSeed, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::error::CriteriaError;
use crate::params::{translate, ParamSequence};
use crate::scope::Scopes;

pub const DEFAULT_OFFSET_KEY: &str = "page";
pub const DEFAULT_LIMIT_KEY: &str = "count";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryCriteria {
    condition: String,
    params: BTreeMap<String, String>,
    limit: Option<u64>,
    offset: Option<u64>,
    order: String,
    index: Option<String>,
    scopes: Scopes,
    offset_key: String,
    limit_key: String,
}

impl Default for QueryCriteria {
    fn default() -> Self {
        Self {
            condition: String::new(),
            params: BTreeMap::new(),
            limit: None,
            offset: None,
            order: String::new(),
            index: None,
            scopes: Scopes::new(),
            offset_key: DEFAULT_OFFSET_KEY.to_string(),
            limit_key: DEFAULT_LIMIT_KEY.to_string(),
        }
    }
}

/// Values accepted by [`QueryCriteria::add_condition`]: a single condition or
/// a list of conditions joined with `&`.
pub trait IntoCondition {
    /// `None` when there is nothing to append.
    fn into_condition(self) -> Option<String>;
}

impl IntoCondition for &str {
    fn into_condition(self) -> Option<String> {
        (!self.is_empty()).then(|| self.to_string())
    }
}

impl IntoCondition for String {
    fn into_condition(self) -> Option<String> {
        (!self.is_empty()).then_some(self)
    }
}

// Empty entries are skipped so `["a=1", "", "b=2"]` never yields `a=1&&b=2`.
fn join_conditions<S: AsRef<str>>(parts: &[S]) -> Option<String> {
    let parts: Vec<&str> = parts
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| !p.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join("&"))
}

impl<S: AsRef<str>> IntoCondition for &[S] {
    fn into_condition(self) -> Option<String> {
        join_conditions(self)
    }
}

impl<S: AsRef<str>> IntoCondition for Vec<S> {
    fn into_condition(self) -> Option<String> {
        join_conditions(&self)
    }
}

impl<S: AsRef<str>, const N: usize> IntoCondition for [S; N] {
    fn into_condition(self) -> Option<String> {
        join_conditions(&self)
    }
}

impl QueryCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    // ── accessors ──────────────────────────────────────────────────────

    pub fn condition(&self) -> &str {
        &self.condition
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Maximum number of items; `None` means unbounded.
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Offset value sent under [`offset_key`](Self::offset_key); `None` means from the start.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn order(&self) -> &str {
        &self.order
    }

    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }

    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    pub fn offset_key(&self) -> &str {
        &self.offset_key
    }

    pub fn limit_key(&self) -> &str {
        &self.limit_key
    }

    // ── builders ───────────────────────────────────────────────────────

    pub fn with_condition(mut self, condition: &str) -> Self {
        self.condition = condition.to_string();
        self
    }

    pub fn with_param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    /// A zero limit is treated as unbounded.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.set_limit(Some(limit));
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_order(mut self, order: &str) -> Self {
        self.order = order.to_string();
        self
    }

    pub fn with_index(mut self, attribute: &str) -> Self {
        self.index = Some(attribute.to_string());
        self
    }

    pub fn with_scopes(mut self, scopes: impl Into<Scopes>) -> Self {
        self.scopes = scopes.into();
        self
    }

    /// Query-string keys used for the offset and the limit.
    pub fn with_keys(mut self, offset_key: &str, limit_key: &str) -> Self {
        self.offset_key = offset_key.to_string();
        self.limit_key = limit_key.to_string();
        self
    }

    // ── mutators ───────────────────────────────────────────────────────

    pub fn set_condition(&mut self, condition: &str) {
        self.condition = condition.to_string();
    }

    pub fn set_param(&mut self, name: &str, value: impl ToString) {
        self.params.insert(name.to_string(), value.to_string());
    }

    pub fn set_limit(&mut self, limit: Option<u64>) {
        self.limit = limit.filter(|l| *l > 0);
    }

    pub fn set_offset(&mut self, offset: Option<u64>) {
        self.offset = offset;
    }

    pub fn set_order(&mut self, order: &str) {
        self.order = order.to_string();
    }

    pub fn set_index(&mut self, attribute: Option<&str>) {
        self.index = attribute.map(str::to_string);
    }

    pub fn set_scopes(&mut self, scopes: Scopes) {
        self.scopes = scopes;
    }

    /// Append a condition (or a list of conditions) with `&`.
    ///
    /// Empty input leaves the condition untouched.
    pub fn add_condition(&mut self, condition: impl IntoCondition) -> &mut Self {
        if let Some(condition) = condition.into_condition() {
            if self.condition.is_empty() {
                self.condition = condition;
            } else {
                self.condition = format!("{}&{}", self.condition, condition);
            }
        }
        self
    }

    /// Bind `value` under a fresh anonymous name and return the placeholder.
    pub fn bind_param(&mut self, seq: &ParamSequence, value: impl ToString) -> String {
        let name = seq.next_name();
        self.params.insert(name.clone(), value.to_string());
        name
    }

    /// Append `column=<placeholder>` with `value` bound anonymously.
    pub fn add_column_condition(
        &mut self,
        seq: &ParamSequence,
        column: &str,
        value: impl ToString,
    ) -> &mut Self {
        let placeholder = self.bind_param(seq, value);
        self.add_condition(format!("{column}={placeholder}"))
    }

    /// Merge `other` into this criteria. `other` is left untouched.
    ///
    /// - conditions are concatenated with `&`, never replaced;
    /// - params are united, `other` wins on a name collision;
    /// - `other`'s limit wins when positive, its offset when set;
    /// - `other`'s order is prepended (`"{other}, {self}"`);
    /// - `other`'s index wins when set;
    /// - scopes are united without losing any invocation.
    pub fn merge_with(&mut self, other: &QueryCriteria) -> &mut Self {
        if self.condition != other.condition {
            if self.condition.is_empty() {
                self.condition = other.condition.clone();
            } else if !other.condition.is_empty() {
                self.condition = format!("{}&{}", self.condition, other.condition);
            }
        }

        if self.params != other.params {
            for (name, value) in &other.params {
                self.params.insert(name.clone(), value.clone());
            }
        }

        if let Some(limit) = other.limit.filter(|l| *l > 0) {
            self.limit = Some(limit);
        }

        if other.offset.is_some() {
            self.offset = other.offset;
        }

        if self.order != other.order {
            if self.order.is_empty() {
                self.order = other.order.clone();
            } else if !other.order.is_empty() {
                self.order = format!("{}, {}", other.order, self.order);
            }
        }

        if other.index.is_some() {
            self.index = other.index.clone();
        }

        self.scopes.merge(&other.scopes);
        self
    }

    /// Coerce a raw configuration mapping and merge it in.
    ///
    /// Coercion errors surface before anything is merged.
    pub fn merge_with_config(&mut self, raw: &ConfigValue) -> Result<&mut Self, CriteriaError> {
        let other = QueryCriteria::from_config(raw)?;
        Ok(self.merge_with(&other))
    }

    /// Query part of the collection URL:
    /// `?<condition>[&<offset_key>=<offset>][&<limit_key>=<limit>]`.
    ///
    /// Empty when nothing is set. Bound parameters are substituted textually
    /// and nothing is URL-encoded.
    pub fn build_query_string(&self) -> String {
        let mut segments = Vec::with_capacity(3);
        if !self.condition.is_empty() {
            segments.push(self.condition.clone());
        }
        if let Some(offset) = self.offset.filter(|o| *o > 0) {
            segments.push(format!("{}={}", self.offset_key, offset));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            segments.push(format!("{}={}", self.limit_key, limit));
        }
        if segments.is_empty() {
            return String::new();
        }
        translate(&format!("?{}", segments.join("&")), &self.params)
    }

    /// Snapshot of `condition`, `params`, `limit`, `offset`, `order`,
    /// `scopes` and `index`, with `-1` standing for an unset limit/offset.
    pub fn to_value(&self) -> Value {
        json!({
            "condition": self.condition,
            "params": self.params,
            "limit": self.limit.map(|l| l as i64).unwrap_or(-1),
            "offset": self.offset.map(|o| o as i64).unwrap_or(-1),
            "order": self.order,
            "scopes": self.scopes.to_value(),
            "index": self.index,
        })
    }

    /// Serialize for persistence (session, cache).
    pub fn to_json(&self) -> Result<String, CriteriaError> {
        serde_json::to_string(self).map_err(|e| CriteriaError::Malformed(e.to_string()))
    }

    /// Rehydrate persisted criteria, renaming every bound parameter from `seq`.
    pub fn from_json(json: &str, seq: &ParamSequence) -> Result<Self, CriteriaError> {
        let mut de = serde_json::Deserializer::from_str(json);
        let criteria = RehydrateSeed(seq)
            .deserialize(&mut de)
            .map_err(|e| CriteriaError::Malformed(e.to_string()))?;
        de.end().map_err(|e| CriteriaError::Malformed(e.to_string()))?;
        Ok(criteria)
    }

    /// Give every bound parameter a fresh name from `seq`, rewriting the
    /// condition's references in the same pass.
    pub fn remap_params(&mut self, seq: &ParamSequence) {
        if self.params.is_empty() {
            return;
        }
        let mut renames = BTreeMap::new();
        let mut params = BTreeMap::new();
        for (name, value) in std::mem::take(&mut self.params) {
            let fresh = seq.next_name();
            params.insert(fresh.clone(), value);
            renames.insert(name, fresh);
        }
        self.condition = translate(&self.condition, &renames);
        self.params = params;
    }

    /// Build criteria from a configuration mapping.
    ///
    /// Recognised keys: `condition`, `params`, `limit`, `offset`, `order`,
    /// `index`, `scopes`, `offset_key`, `limit_key`.
    pub fn from_config(value: &ConfigValue) -> Result<Self, CriteriaError> {
        let ConfigValue::Map(map) = value else {
            return Err(CriteriaError::TypeMismatch {
                key: "criteria".into(),
                expected: "a mapping",
            });
        };
        let mut criteria = QueryCriteria::new();
        for (key, raw) in map {
            match key.as_str() {
                "condition" => {
                    criteria.condition = match raw {
                        ConfigValue::List(_) => {
                            let parts: Vec<String> = config_field(raw, key, "a string or list of strings")?;
                            join_conditions(&parts).unwrap_or_default()
                        }
                        _ => config_field(raw, key, "a string")?,
                    };
                }
                "params" => {
                    criteria.params = config_field(raw, key, "a mapping of scalar values")?;
                }
                "limit" => {
                    let limit: i64 = config_field(raw, key, "an integer")?;
                    criteria.limit = match limit {
                        -1 => None,
                        l if l > 0 => Some(l as u64),
                        l => return Err(CriteriaError::InvalidLimit(l)),
                    };
                }
                "offset" => {
                    let offset: i64 = config_field(raw, key, "an integer")?;
                    criteria.offset = match offset {
                        -1 => None,
                        o if o >= 0 => Some(o as u64),
                        o => return Err(CriteriaError::InvalidOffset(o)),
                    };
                }
                "order" => criteria.order = config_field(raw, key, "a string")?,
                "index" => criteria.index = config_field(raw, key, "a string")?,
                "scopes" => criteria.scopes = Scopes::from_config(raw)?,
                "offset_key" => criteria.offset_key = config_field(raw, key, "a string")?,
                "limit_key" => criteria.limit_key = config_field(raw, key, "a string")?,
                other => return Err(CriteriaError::UnknownKey(other.to_string())),
            }
        }
        Ok(criteria)
    }
}

fn config_field<T: FromConfigValue>(
    raw: &ConfigValue,
    key: &str,
    expected: &'static str,
) -> Result<T, CriteriaError> {
    T::from_config_value(raw, key).map_err(|_| CriteriaError::TypeMismatch {
        key: key.to_string(),
        expected,
    })
}

impl TryFrom<&ConfigValue> for QueryCriteria {
    type Error = CriteriaError;

    fn try_from(value: &ConfigValue) -> Result<Self, Self::Error> {
        QueryCriteria::from_config(value)
    }
}

/// On-the-wire form of persisted criteria, before parameter renaming.
#[derive(Deserialize)]
#[serde(default)]
struct PersistedCriteria {
    condition: String,
    params: BTreeMap<String, String>,
    limit: Option<u64>,
    offset: Option<u64>,
    order: String,
    index: Option<String>,
    scopes: Scopes,
    offset_key: String,
    limit_key: String,
}

impl Default for PersistedCriteria {
    fn default() -> Self {
        let c = QueryCriteria::default();
        Self {
            condition: c.condition,
            params: c.params,
            limit: c.limit,
            offset: c.offset,
            order: c.order,
            index: c.index,
            scopes: c.scopes,
            offset_key: c.offset_key,
            limit_key: c.limit_key,
        }
    }
}

impl PersistedCriteria {
    fn rehydrate(self, seq: &ParamSequence) -> QueryCriteria {
        let mut criteria = QueryCriteria {
            condition: self.condition,
            params: self.params,
            limit: self.limit.filter(|l| *l > 0),
            offset: self.offset,
            order: self.order,
            index: self.index,
            scopes: self.scopes,
            offset_key: self.offset_key,
            limit_key: self.limit_key,
        };
        criteria.remap_params(seq);
        criteria
    }
}

/// Deserializes persisted criteria and renames their parameters from an
/// explicit [`ParamSequence`].
pub struct RehydrateSeed<'a>(pub &'a ParamSequence);

impl<'de> DeserializeSeed<'de> for RehydrateSeed<'_> {
    type Value = QueryCriteria;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<QueryCriteria, D::Error> {
        let persisted = PersistedCriteria::deserialize(deserializer)?;
        Ok(persisted.rehydrate(self.0))
    }
}

/// Rehydrates through [`ParamSequence::global`].
impl<'de> Deserialize<'de> for QueryCriteria {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RehydrateSeed(ParamSequence::global()).deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;

    #[test]
    fn test_add_condition_string_and_list() {
        let mut c = QueryCriteria::new();
        c.add_condition("status=1");
        c.add_condition(["author=ann", "year=2012"]);
        assert_eq!(c.condition(), "status=1&author=ann&year=2012");
    }

    #[test]
    fn test_add_condition_empty_is_noop() {
        let mut c = QueryCriteria::new().with_condition("status=1");
        c.add_condition(Vec::<String>::new()).add_condition("");
        assert_eq!(c.condition(), "status=1");
    }

    #[test]
    fn test_add_condition_skips_empty_entries() {
        let mut c = QueryCriteria::new();
        c.add_condition(["a=1", "", "b=2"]);
        assert_eq!(c.condition(), "a=1&b=2");

        c.add_condition(vec![String::new(), String::new()]);
        assert_eq!(c.condition(), "a=1&b=2");
    }

    #[test]
    fn test_merge_conditions_concatenate() {
        let mut a = QueryCriteria::new().with_condition("x=1");
        let b = QueryCriteria::new().with_condition("y=2");
        a.merge_with(&b);
        assert_eq!(a.condition(), "x=1&y=2");
        assert_eq!(b.condition(), "y=2");
    }

    #[test]
    fn test_merge_equal_or_empty_conditions() {
        let mut a = QueryCriteria::new().with_condition("x=1");
        a.merge_with(&QueryCriteria::new().with_condition("x=1"));
        assert_eq!(a.condition(), "x=1");

        let mut empty = QueryCriteria::new();
        empty.merge_with(&a);
        assert_eq!(empty.condition(), "x=1");

        a.merge_with(&QueryCriteria::new());
        assert_eq!(a.condition(), "x=1");
    }

    #[test]
    fn test_merge_params_other_wins() {
        let mut a = QueryCriteria::new().with_param(":a", 1).with_param(":b", 2);
        let b = QueryCriteria::new().with_param(":b", 3).with_param(":c", 4);
        a.merge_with(&b);
        let params: Vec<_> = a.params().iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(params, vec![(":a", "1"), (":b", "3"), (":c", "4")]);
    }

    #[test]
    fn test_merge_limit_offset_index_precedence() {
        let mut a = QueryCriteria::new().with_limit(10).with_offset(3).with_index("id");
        a.merge_with(&QueryCriteria::new());
        assert_eq!(a.limit(), Some(10));
        assert_eq!(a.offset(), Some(3));
        assert_eq!(a.index(), Some("id"));

        a.merge_with(&QueryCriteria::new().with_limit(5).with_offset(0).with_index("slug"));
        assert_eq!(a.limit(), Some(5));
        assert_eq!(a.offset(), Some(0));
        assert_eq!(a.index(), Some("slug"));
    }

    #[test]
    fn test_merge_order_prefixes_other() {
        let mut a = QueryCriteria::new().with_order("a");
        a.merge_with(&QueryCriteria::new().with_order("b"));
        assert_eq!(a.order(), "b, a");

        let mut empty = QueryCriteria::new();
        empty.merge_with(&QueryCriteria::new().with_order("b"));
        assert_eq!(empty.order(), "b");
    }

    #[test]
    fn test_merge_scopes_collision() {
        let mut a = QueryCriteria::new()
            .with_scopes(Scopes::new().keyed("recent", json!({})));
        let b = QueryCriteria::new()
            .with_scopes(Scopes::new().keyed("recent", json!({ "limit": 5 })));
        a.merge_with(&b);

        let recent: Vec<&Scope> = a.scopes().invocations("recent").collect();
        assert_eq!(recent.len(), 2);
        assert_ne!(recent[0], recent[1]);
    }

    #[test]
    fn test_query_string_full() {
        let c = QueryCriteria::new()
            .with_condition("status=1")
            .with_offset(2)
            .with_limit(10)
            .with_keys("page", "count");
        assert_eq!(c.build_query_string(), "?status=1&page=2&count=10");
    }

    #[test]
    fn test_query_string_empty() {
        assert_eq!(QueryCriteria::new().build_query_string(), "");
        assert_eq!(QueryCriteria::new().with_offset(0).build_query_string(), "");
    }

    #[test]
    fn test_query_string_without_condition() {
        let c = QueryCriteria::new().with_offset(2);
        assert_eq!(c.build_query_string(), "?page=2");
    }

    #[test]
    fn test_query_string_substitutes_params() {
        let c = QueryCriteria::new()
            .with_condition("status=:s&title=:title")
            .with_param(":s", 1)
            .with_param(":title", "a b")
            .with_keys("p", "n")
            .with_limit(5);
        assert_eq!(c.build_query_string(), "?status=1&title=a b&n=5");
    }

    #[test]
    fn test_column_condition_binds_anonymously() {
        let seq = ParamSequence::new();
        let mut c = QueryCriteria::new();
        c.add_column_condition(&seq, "status", 1)
            .add_column_condition(&seq, "author", "ann");
        assert_eq!(c.condition(), "status=:arp0&author=:arp1");
        assert_eq!(c.build_query_string(), "?status=1&author=ann");
    }

    #[test]
    fn test_to_value_snapshot() {
        let c = QueryCriteria::new().with_condition("x=1").with_limit(3);
        assert_eq!(
            c.to_value(),
            json!({
                "condition": "x=1",
                "params": {},
                "limit": 3,
                "offset": -1,
                "order": "",
                "scopes": null,
                "index": null,
            })
        );
    }

    #[test]
    fn test_rehydrate_renames_params() {
        let seq = ParamSequence::new();
        let a = QueryCriteria::new()
            .with_condition("status=:s")
            .with_param(":s", 1)
            .to_json()
            .unwrap();
        let b = QueryCriteria::new()
            .with_condition("author=:s")
            .with_param(":s", "ann")
            .to_json()
            .unwrap();

        let mut a = QueryCriteria::from_json(&a, &seq).unwrap();
        let b = QueryCriteria::from_json(&b, &seq).unwrap();
        assert_eq!(a.condition(), "status=:arp0");
        assert_eq!(b.condition(), "author=:arp1");

        a.merge_with(&b);
        assert_eq!(a.params().len(), 2);
        assert_eq!(a.build_query_string(), "?status=1&author=ann");
    }

    #[test]
    fn test_rehydrate_keeps_everything_else() {
        let seq = ParamSequence::new();
        let original = QueryCriteria::new()
            .with_condition("x=1")
            .with_order("id")
            .with_limit(5)
            .with_offset(2)
            .with_index("slug")
            .with_keys("p", "n")
            .with_scopes(Scopes::new().named("published").invoke("recent", json!([3])));
        let restored = QueryCriteria::from_json(&original.to_json().unwrap(), &seq).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_from_json_malformed() {
        let seq = ParamSequence::new();
        assert!(matches!(
            QueryCriteria::from_json("{\"limit\": \"ten\"}", &seq),
            Err(CriteriaError::Malformed(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let raw = ConfigValue::map([
            ("condition", ConfigValue::from("status=:s")),
            ("params", ConfigValue::map([(":s", ConfigValue::Integer(1))])),
            ("limit", ConfigValue::Integer(-1)),
            ("offset", ConfigValue::Integer(4)),
            ("order", ConfigValue::from("created DESC")),
            ("scopes", ConfigValue::from("published")),
        ]);
        let c = QueryCriteria::from_config(&raw).unwrap();
        assert_eq!(c.limit(), None);
        assert_eq!(c.offset(), Some(4));
        assert_eq!(c.order(), "created DESC");
        assert_eq!(c.build_query_string(), "?status=1&page=4");
    }

    #[test]
    fn test_from_config_rejects_bad_input() {
        let unknown = ConfigValue::map([("conditon", ConfigValue::from("x=1"))]);
        assert_eq!(
            QueryCriteria::from_config(&unknown),
            Err(CriteriaError::UnknownKey("conditon".into()))
        );

        let zero_limit = ConfigValue::map([("limit", ConfigValue::Integer(0))]);
        assert_eq!(
            QueryCriteria::from_config(&zero_limit),
            Err(CriteriaError::InvalidLimit(0))
        );

        let bad_offset = ConfigValue::map([("offset", ConfigValue::Integer(-2))]);
        assert_eq!(
            QueryCriteria::from_config(&bad_offset),
            Err(CriteriaError::InvalidOffset(-2))
        );

        assert!(QueryCriteria::from_config(&ConfigValue::from("x=1")).is_err());
    }

    #[test]
    fn test_merge_with_config_fails_before_merging() {
        let mut c = QueryCriteria::new().with_condition("x=1");
        let raw = ConfigValue::map([
            ("condition", ConfigValue::from("y=2")),
            ("limit", ConfigValue::from("many")),
        ]);
        assert!(c.merge_with_config(&raw).is_err());
        assert_eq!(c.condition(), "x=1");

        c.merge_with_config(&ConfigValue::map([("condition", ConfigValue::from("y=2"))]))
            .unwrap();
        assert_eq!(c.condition(), "x=1&y=2");
    }
}
