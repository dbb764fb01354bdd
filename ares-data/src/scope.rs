use ares_core::ConfigValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::CriteriaError;

/// One entry of a scope specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// A bare scope name, invoked without parameters.
    Named(String),
    /// An entry of a scope mapping. Names are unique among keyed entries.
    Keyed { name: String, params: Value },
    /// A positional `{name: params}` invocation. Several may share a name.
    Invocation { name: String, params: Value },
}

impl Scope {
    pub fn name(&self) -> &str {
        match self {
            Scope::Named(name) => name,
            Scope::Keyed { name, .. } | Scope::Invocation { name, .. } => name,
        }
    }

    pub fn params(&self) -> Option<&Value> {
        match self {
            Scope::Named(_) => None,
            Scope::Keyed { params, .. } | Scope::Invocation { params, .. } => Some(params),
        }
    }

    /// A keyed entry whose name also appears keyed on the other side turns
    /// into a positional invocation, so both sides survive the merge.
    fn settle(self, other_keyed: &BTreeSet<String>) -> Scope {
        match self {
            Scope::Keyed { name, params } if other_keyed.contains(&name) => {
                Scope::Invocation { name, params }
            }
            other => other,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Scope::Named(name) => Value::String(name.clone()),
            Scope::Keyed { name, params } | Scope::Invocation { name, params } => {
                let mut entry = serde_json::Map::new();
                entry.insert(name.clone(), params.clone());
                Value::Object(entry)
            }
        }
    }
}

/// Ordered scope specification of a criteria.
///
/// Covers every accepted form: a single name, a list of names, a mapping of
/// name to parameters, and a list of `{name: params}` invocations repeating
/// the same name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scopes(Vec<Scope>);

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scope> {
        self.0.iter()
    }

    /// Add a bare scope name.
    pub fn named(mut self, name: &str) -> Self {
        self.0.push(Scope::Named(name.to_string()));
        self
    }

    /// Set a mapping entry; an existing keyed entry of the same name is replaced.
    pub fn keyed(mut self, name: &str, params: Value) -> Self {
        match self
            .0
            .iter_mut()
            .find(|s| matches!(s, Scope::Keyed { name: n, .. } if n == name))
        {
            Some(Scope::Keyed { params: p, .. }) => *p = params,
            _ => self.0.push(Scope::Keyed {
                name: name.to_string(),
                params,
            }),
        }
        self
    }

    /// Add a positional invocation, kept even when the name repeats.
    pub fn invoke(mut self, name: &str, params: Value) -> Self {
        self.0.push(Scope::Invocation {
            name: name.to_string(),
            params,
        });
        self
    }

    /// All invocations of `name`, in order.
    pub fn invocations<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Scope> + 'a {
        self.0.iter().filter(move |s| s.name() == name)
    }

    fn keyed_names(&self) -> BTreeSet<String> {
        self.0
            .iter()
            .filter_map(|s| match s {
                Scope::Keyed { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Union of both specifications; no invocation from either side is lost.
    ///
    /// Own entries come first. Keyed entries present on both sides are
    /// emitted once per side as positional invocations.
    pub fn merge(&mut self, other: &Scopes) {
        if self.is_empty() {
            self.0 = other.0.clone();
            return;
        }
        if other.is_empty() {
            return;
        }
        let mine = self.keyed_names();
        let theirs = other.keyed_names();
        let mut merged = Vec::with_capacity(self.len() + other.len());
        merged.extend(self.0.drain(..).map(|s| s.settle(&theirs)));
        merged.extend(other.0.iter().cloned().map(|s| s.settle(&mine)));
        self.0 = merged;
    }

    /// JSON view: an object when every entry is keyed, a list otherwise.
    pub fn to_value(&self) -> Value {
        if self.is_empty() {
            return Value::Null;
        }
        if self.0.iter().all(|s| matches!(s, Scope::Keyed { .. })) {
            let map = self
                .0
                .iter()
                .filter_map(|s| match s {
                    Scope::Keyed { name, params } => Some((name.clone(), params.clone())),
                    _ => None,
                })
                .collect();
            return Value::Object(map);
        }
        Value::Array(self.0.iter().map(Scope::to_value).collect())
    }

    /// Coerce a configuration value in any of the accepted forms.
    pub fn from_config(value: &ConfigValue) -> Result<Self, CriteriaError> {
        let mismatch = || CriteriaError::TypeMismatch {
            key: "scopes".into(),
            expected: "a scope name, a list of scopes or a mapping of scope parameters",
        };
        match value {
            ConfigValue::Null => Ok(Scopes::new()),
            ConfigValue::String(name) => Ok(Scopes::new().named(name)),
            ConfigValue::Map(map) => Ok(map
                .iter()
                .fold(Scopes::new(), |scopes, (name, params)| {
                    scopes.keyed(name, params.to_json())
                })),
            ConfigValue::List(items) => {
                let mut scopes = Scopes::new();
                for item in items {
                    scopes = match item {
                        ConfigValue::String(name) => scopes.named(name),
                        ConfigValue::Map(entry) if entry.len() == 1 => {
                            let (name, params) = entry.iter().next().ok_or_else(mismatch)?;
                            scopes.invoke(name, params.to_json())
                        }
                        _ => return Err(mismatch()),
                    };
                }
                Ok(scopes)
            }
            _ => Err(mismatch()),
        }
    }
}

impl From<&str> for Scopes {
    fn from(name: &str) -> Self {
        Scopes::new().named(name)
    }
}

impl<'a> IntoIterator for &'a Scopes {
    type Item = &'a Scope;
    type IntoIter = std::slice::Iter<'a, Scope>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keyed_collision_keeps_both_invocations() {
        let mut a = Scopes::new().keyed("recent", json!({}));
        let b = Scopes::new().keyed("recent", json!({ "limit": 5 }));
        a.merge(&b);

        let recent: Vec<_> = a.invocations("recent").collect();
        assert_eq!(recent.len(), 2);
        assert_eq!(
            recent[0],
            &Scope::Invocation { name: "recent".into(), params: json!({}) }
        );
        assert_eq!(
            recent[1],
            &Scope::Invocation { name: "recent".into(), params: json!({ "limit": 5 }) }
        );
    }

    #[test]
    fn test_non_colliding_entries_keep_their_form() {
        let mut a = Scopes::new().named("published").keyed("recent", json!([3]));
        let b = Scopes::new().keyed("byAuthor", json!(["ann"])).named("published");
        a.merge(&b);

        let entries: Vec<_> = a.iter().cloned().collect();
        assert_eq!(
            entries,
            vec![
                Scope::Named("published".into()),
                Scope::Keyed { name: "recent".into(), params: json!([3]) },
                Scope::Keyed { name: "byAuthor".into(), params: json!(["ann"]) },
                Scope::Named("published".into()),
            ]
        );
    }

    #[test]
    fn test_empty_side_takes_other() {
        let mut a = Scopes::new();
        a.merge(&Scopes::from("published"));
        assert_eq!(a, Scopes::from("published"));

        let mut b = Scopes::from("published");
        b.merge(&Scopes::new());
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_keyed_replaces_same_name() {
        let scopes = Scopes::new()
            .keyed("recent", json!([1]))
            .keyed("recent", json!([2]));
        assert_eq!(scopes.to_value(), json!({ "recent": [2] }));
    }

    #[test]
    fn test_from_config_forms() {
        let single = Scopes::from_config(&ConfigValue::String("published".into())).unwrap();
        assert_eq!(single.to_value(), json!(["published"]));

        let mapping = Scopes::from_config(&ConfigValue::map([(
            "recent",
            ConfigValue::List(vec![ConfigValue::Integer(5)]),
        )]))
        .unwrap();
        assert_eq!(mapping.to_value(), json!({ "recent": [5] }));

        let repeated = Scopes::from_config(&ConfigValue::List(vec![
            ConfigValue::map([("recent", ConfigValue::Integer(1))]),
            ConfigValue::map([("recent", ConfigValue::Integer(2))]),
        ]))
        .unwrap();
        assert_eq!(repeated.invocations("recent").count(), 2);
    }

    #[test]
    fn test_from_config_rejects_scalars() {
        assert!(Scopes::from_config(&ConfigValue::Integer(3)).is_err());
    }
}
