use ares_data::params::translate;
use ares_data::{DataError, QueryCriteria, ResourceModel};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    FindAll,
    Collection,
}

/// A remote call as the in-memory resource saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub kind: CallKind,
    /// Criteria installed on the model when the call was made.
    pub installed: Option<QueryCriteria>,
    pub argument: QueryCriteria,
}

/// Resource model serving a fixed list of records, for tests.
///
/// Conditions are `attr=value` clauses joined with `&`, evaluated after
/// parameter substitution. Orders are `attr [DESC]` lists. The criteria
/// offset is read as a one-based page number and the limit as the page size,
/// as a paging REST backend would.
///
/// ```ignore
/// let model = InMemoryResource::new("Post")
///     .with_records([json!({"id": 1, "status": 1}), json!({"id": 2, "status": 0})])
///     .with_base_criteria(QueryCriteria::new().with_condition("status=1"));
/// ```
pub struct InMemoryResource {
    name: String,
    records: Vec<Record>,
    criteria: Option<QueryCriteria>,
    failures: Vec<(CallKind, String)>,
    latency: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl InMemoryResource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            records: Vec::new(),
            criteria: None,
            failures: Vec::new(),
            latency: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_records(mut self, records: impl IntoIterator<Item = Value>) -> Self {
        self.records.extend(records.into_iter().map(Record::new));
        self
    }

    /// Persistent criteria of the resource.
    pub fn with_base_criteria(mut self, criteria: QueryCriteria) -> Self {
        self.criteria = Some(criteria);
        self
    }

    /// Make every call of `kind` fail with a remote error.
    pub fn failing(mut self, kind: CallKind, message: &str) -> Self {
        self.failures.push((kind, message.to_string()));
        self
    }

    /// Delay every call, to widen race windows in concurrency tests.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.kind == kind).collect()
    }

    pub fn clear_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn record(&self, kind: CallKind, argument: &QueryCriteria) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                kind,
                installed: self.criteria.clone(),
                argument: argument.clone(),
            });
    }

    fn failure(&self, kind: CallKind) -> Option<DataError> {
        self.failures
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, message)| DataError::remote(std::io::Error::other(message.clone())))
    }

    async fn serve(&self, kind: CallKind, argument: &QueryCriteria) -> Result<Vec<Record>, DataError> {
        self.record(kind, argument);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(err) = self.failure(kind) {
            tracing::debug!(resource = %self.name, ?kind, "Injected failure");
            return Err(err);
        }

        let mut effective = self.criteria.clone().unwrap_or_default();
        effective.merge_with(argument);
        let mut items = self.matching(&effective);
        if kind == CallKind::FindAll {
            items = page(items, &effective);
        }
        tracing::debug!(
            resource = %self.name,
            ?kind,
            query = %effective.build_query_string(),
            count = items.len(),
            "Served in-memory request"
        );
        Ok(items)
    }

    fn matching(&self, criteria: &QueryCriteria) -> Vec<Record> {
        let condition = translate(criteria.condition(), criteria.params());
        let clauses: Vec<(&str, &str)> = condition
            .split('&')
            .filter_map(|clause| clause.split_once('='))
            .collect();
        let mut items: Vec<Record> = self
            .records
            .iter()
            .filter(|record| {
                clauses
                    .iter()
                    .all(|(name, value)| record.text(name).as_deref() == Some(*value))
            })
            .cloned()
            .collect();
        sort_records(&mut items, criteria.order());
        items
    }
}

fn page(items: Vec<Record>, criteria: &QueryCriteria) -> Vec<Record> {
    let Some(size) = criteria.limit() else {
        return items;
    };
    let page = criteria.offset().unwrap_or(1).max(1);
    let skip = ((page - 1) * size) as usize;
    items.into_iter().skip(skip).take(size as usize).collect()
}

fn sort_records(items: &mut [Record], order: &str) {
    let mut keys: Vec<(&str, bool)> = Vec::new();
    for part in order.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (attribute, descending) = match part.split_once(' ') {
            Some((attribute, direction)) => (attribute, direction.trim().eq_ignore_ascii_case("desc")),
            None => (part, false),
        };
        if !keys.iter().any(|(a, _)| *a == attribute) {
            keys.push((attribute, descending));
        }
    }
    if keys.is_empty() {
        return;
    }
    items.sort_by(|a, b| {
        for (attribute, descending) in &keys {
            let ordering = compare(a.get(attribute), b.get(attribute));
            let ordering = if *descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

impl ResourceModel for InMemoryResource {
    type Item = Record;

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn query_criteria(&self, _include_scopes: bool) -> Option<QueryCriteria> {
        self.criteria.clone()
    }

    fn set_query_criteria(&mut self, criteria: Option<QueryCriteria>) {
        self.criteria = criteria;
    }

    async fn find_all(&self, criteria: &QueryCriteria) -> Result<Vec<Record>, DataError> {
        self.serve(CallKind::FindAll, criteria).await
    }

    async fn collection_request(&self, criteria: &QueryCriteria) -> Result<Vec<Record>, DataError> {
        self.serve(CallKind::Collection, criteria).await
    }
}
