use ares_core::{AresConfig, ConfigValue};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::ProviderConfig;
use crate::criteria::QueryCriteria;
use crate::error::DataError;
use crate::model::{ModelHandle, Resource, ResourceModel};
use crate::page::Page;
use crate::pagination::{Paginate, Pagination};
use crate::sort::{ApplyOrder, Sort};

/// State of an optional, lazily created collaborator.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Slot<T> {
    /// Not created yet; the default is built on first use.
    #[default]
    Unset,
    /// Explicitly turned off.
    Disabled,
    Ready(T),
}

impl<T> Slot<T> {
    pub fn is_disabled(&self) -> bool {
        matches!(self, Slot::Disabled)
    }
}

/// Data provider over a remote resource collection.
///
/// The provider combines the caller criteria with the model's base criteria,
/// adds paging and ordering, and fetches one page. The model's base criteria
/// is restored after every fetch, whatever the outcome.
///
/// ```ignore
/// let mut provider = CollectionProvider::new(PostResource::new(client));
/// provider.criteria().add_condition("status=1");
/// let posts = provider.data().await?;
/// ```
pub struct CollectionProvider<M, P = Pagination, S = Sort>
where
    M: ResourceModel,
{
    id: String,
    model: ModelHandle<M>,
    criteria: Option<QueryCriteria>,
    pagination: Slot<P>,
    sort: Slot<S>,
    key_attribute: Option<String>,
    data: Option<Vec<M::Item>>,
    keys: Option<BTreeMap<usize, Value>>,
    total_count: Option<u64>,
}

impl<M, P, S> CollectionProvider<M, P, S>
where
    M: ResourceModel,
    P: Paginate + Default,
    S: ApplyOrder + Default,
{
    pub fn new(model: M) -> Self {
        Self::with_handle(ModelHandle::new(model))
    }

    /// Build a provider over a model shared with other callers.
    pub fn with_handle(model: ModelHandle<M>) -> Self {
        Self {
            id: model.resource_name().to_string(),
            model,
            criteria: None,
            pagination: Slot::Unset,
            sort: Slot::Unset,
            key_attribute: None,
            data: None,
            keys: None,
            total_count: None,
        }
    }

    /// Provider identifier, the resource name unless set otherwise.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
        let page_var = self.page_var();
        if let Slot::Ready(pagination) = &mut self.pagination {
            pagination.set_page_var(&page_var);
        }
    }

    fn page_var(&self) -> String {
        if self.id.is_empty() {
            crate::pagination::DEFAULT_PAGE_VAR.to_string()
        } else {
            format!("{}_page", self.id)
        }
    }

    pub fn model(&self) -> &ModelHandle<M> {
        &self.model
    }

    /// Caller criteria, created empty on first access.
    pub fn criteria(&mut self) -> &mut QueryCriteria {
        self.criteria.get_or_insert_with(QueryCriteria::new)
    }

    pub fn set_criteria(&mut self, criteria: QueryCriteria) {
        self.criteria = Some(criteria);
    }

    /// Replace the caller criteria with one coerced from configuration.
    pub fn set_criteria_config(&mut self, raw: &ConfigValue) -> Result<(), DataError> {
        self.criteria = Some(QueryCriteria::from_config(raw)?);
        Ok(())
    }

    /// Pagination, created on first access. `None` when disabled.
    pub fn get_pagination(&mut self) -> Option<&mut P> {
        if let Slot::Unset = self.pagination {
            let mut pagination = P::default();
            pagination.set_page_var(&self.page_var());
            self.pagination = Slot::Ready(pagination);
        }
        match &mut self.pagination {
            Slot::Ready(pagination) => Some(pagination),
            _ => None,
        }
    }

    pub fn set_pagination(&mut self, pagination: P) {
        self.pagination = Slot::Ready(pagination);
    }

    pub fn disable_pagination(&mut self) {
        self.pagination = Slot::Disabled;
    }

    /// Sort, created on first access and tagged with the resource name.
    /// `None` when disabled.
    pub fn get_sort(&mut self) -> Option<&mut S> {
        self.prepare_sort();
        match &mut self.sort {
            Slot::Ready(sort) => Some(sort),
            _ => None,
        }
    }

    fn prepare_sort(&mut self) {
        if let Slot::Unset = self.sort {
            self.sort = Slot::Ready(S::default());
        }
        if let Slot::Ready(sort) = &mut self.sort {
            sort.set_resource(self.model.resource_name());
        }
    }

    pub fn set_sort(&mut self, sort: S) {
        self.sort = Slot::Ready(sort);
    }

    pub fn disable_sort(&mut self) {
        self.sort = Slot::Disabled;
    }

    pub fn key_attribute(&self) -> Option<&str> {
        self.key_attribute.as_deref()
    }

    /// Attribute used to key items. `None` keys them by identity.
    pub fn set_key_attribute(&mut self, attribute: Option<&str>) {
        self.key_attribute = attribute.map(str::to_string);
    }

    /// Fetch the current page.
    ///
    /// The base criteria merged with the paged caller criteria is installed
    /// on the model for the remote call, then the base is put back. This
    /// holds when the call fails and when the returned future is dropped
    /// before completion.
    pub async fn fetch_page(&mut self) -> Result<Vec<M::Item>, DataError> {
        let mut working = self.criteria.clone().unwrap_or_default();

        if self.get_pagination().is_some() {
            let total = self.total_count().await?;
            if let Some(pagination) = self.get_pagination() {
                pagination.set_item_count(total);
                pagination.apply_limit(&mut working);
            }
        }
        // The sort must exist before the model is locked.
        self.prepare_sort();

        let mut scope = self.model.scope().await;
        let mut merged = match scope.base() {
            Some(base) => {
                let mut merged = base.clone();
                merged.merge_with(&working);
                merged
            }
            None => working.clone(),
        };
        if let Slot::Ready(sort) = &self.sort {
            sort.apply_order(&mut merged);
        }

        tracing::debug!(
            resource = %self.model.resource_name(),
            query = %merged.build_query_string(),
            order = merged.order(),
            "Fetching collection page"
        );
        scope.install(Some(merged));
        let items = scope.find_all(&working).await?;
        tracing::debug!(resource = %self.model.resource_name(), count = items.len(), "Page fetched");
        Ok(items)
    }

    /// Count every item matching the caller criteria, ignoring paging.
    pub async fn fetch_total_count(&self) -> Result<u64, DataError> {
        let mut criteria = self.criteria.clone().unwrap_or_default();
        criteria.set_limit(None);
        criteria.set_offset(None);

        let scope = self.model.scope().await;
        let count = scope.collection_request(&criteria).await?.len() as u64;
        tracing::debug!(resource = %self.model.resource_name(), count, "Total count fetched");
        Ok(count)
    }

    /// Key every item by position.
    ///
    /// Uses the key attribute when one is set, the item identity otherwise.
    /// Composite keys are joined with `,`.
    pub fn fetch_keys(&self, items: &[M::Item]) -> Result<BTreeMap<usize, Value>, DataError> {
        items
            .iter()
            .enumerate()
            .map(|(position, item)| {
                let key = match &self.key_attribute {
                    Some(attribute) => {
                        item.attribute(attribute)
                            .ok_or_else(|| DataError::MissingAttribute {
                                attribute: attribute.clone(),
                                position,
                            })?
                    }
                    None => item.id_property(),
                };
                Ok((position, flatten_key(key)))
            })
            .collect()
    }

    /// Items of the current page, fetched once until [`refresh`](Self::refresh).
    pub async fn data(&mut self) -> Result<&[M::Item], DataError> {
        if self.data.is_none() {
            let items = self.fetch_page().await?;
            self.data = Some(items);
        }
        Ok(self.data.as_deref().unwrap_or_default())
    }

    /// Keys of the current page, by position.
    pub async fn keys(&mut self) -> Result<&BTreeMap<usize, Value>, DataError> {
        if self.keys.is_none() {
            self.data().await?;
            let items = self.data.as_deref().unwrap_or_default();
            let keys = self.fetch_keys(items)?;
            self.keys = Some(keys);
        }
        let keys: &BTreeMap<usize, Value> = self.keys.get_or_insert_with(BTreeMap::new);
        Ok(keys)
    }

    /// Total number of matching items, fetched once until [`refresh`](Self::refresh).
    pub async fn total_count(&mut self) -> Result<u64, DataError> {
        if let Some(count) = self.total_count {
            return Ok(count);
        }
        let count = self.fetch_total_count().await?;
        self.total_count = Some(count);
        Ok(count)
    }

    /// Forget fetched data, keys and total count.
    pub fn refresh(&mut self) {
        self.data = None;
        self.keys = None;
        self.total_count = None;
    }

    /// The current page with its paging metadata.
    pub async fn page(&mut self) -> Result<Page<M::Item>, DataError>
    where
        M::Item: Clone,
    {
        let content = self.data().await?.to_vec();
        let total = self.total_count().await?;
        let (page, size) = match &self.pagination {
            Slot::Ready(pagination) => (pagination.current_page(), pagination.limit()),
            _ => (0, total),
        };
        Ok(Page::new(content, page, size, total))
    }
}

impl<M: ResourceModel> CollectionProvider<M> {
    /// Apply provider settings read from configuration.
    pub fn with_config(mut self, config: &ProviderConfig) -> Result<Self, DataError> {
        if let Some(id) = &config.id {
            self.set_id(id);
        }
        if let Some(criteria) = &config.criteria {
            self.set_criteria(criteria.clone());
        }

        match &config.pagination {
            Slot::Disabled => self.disable_pagination(),
            Slot::Ready(raw) => {
                if self.pagination.is_disabled() {
                    self.pagination = Slot::Unset;
                }
                if let Some(pagination) = self.get_pagination() {
                    pagination.configure(raw)?;
                }
            }
            Slot::Unset => {}
        }

        match &config.sort {
            Slot::Disabled => self.disable_sort(),
            Slot::Ready(raw) => {
                if self.sort.is_disabled() {
                    self.sort = Slot::Unset;
                }
                if let Some(sort) = self.get_sort() {
                    sort.configure(raw)?;
                }
            }
            Slot::Unset => {}
        }

        if let Some(attribute) = &config.key_attribute {
            self.set_key_attribute(Some(attribute));
        }
        Ok(self)
    }

    /// Build a provider from the configuration section at `prefix`.
    pub fn from_config(model: M, config: &AresConfig, prefix: &str) -> Result<Self, DataError> {
        let settings = ProviderConfig::from_config(config, prefix)?;
        Self::new(model).with_config(&settings)
    }
}

fn flatten_key(key: Value) -> Value {
    match key {
        Value::Array(parts) => Value::String(
            parts
                .iter()
                .map(|part| match part {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => other,
    }
}
