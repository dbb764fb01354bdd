use serde_json::Value;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::criteria::QueryCriteria;
use crate::error::DataError;

/// A single item returned by a resource collection.
///
/// # Example
///
/// ```ignore
/// impl Resource for Post {
///     fn id_property(&self) -> Value { json!(self.id) }
///     fn attribute(&self, name: &str) -> Option<Value> {
///         match name {
///             "slug" => Some(json!(self.slug)),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Resource: Send + Sync + 'static {
    /// Identity of the item. A composite identity is a JSON array of its parts.
    fn id_property(&self) -> Value;

    /// Value of the named attribute, `None` if the item has no such attribute.
    fn attribute(&self, name: &str) -> Option<Value>;
}

/// Accessor for a remote resource collection.
///
/// The model owns a persistent base criteria (resource-level scope such as a
/// published-only filter). Callers that install other criteria for a call
/// must put the base back afterwards; [`CriteriaScope`] does that.
///
/// Uses RPITIT (return-position `impl Trait` in traits), no `async-trait` needed.
pub trait ResourceModel: Send + Sync + 'static {
    type Item: Resource;

    /// Resource identity, e.g. `"Post"`.
    fn resource_name(&self) -> &str;

    /// Currently installed criteria. `include_scopes` asks for pending
    /// scope invocations to be folded in.
    fn query_criteria(&self, include_scopes: bool) -> Option<QueryCriteria>;

    fn set_query_criteria(&mut self, criteria: Option<QueryCriteria>);

    /// Fetch the items matching the installed criteria and `criteria`.
    fn find_all(
        &self,
        criteria: &QueryCriteria,
    ) -> impl Future<Output = Result<Vec<Self::Item>, DataError>> + Send;

    /// Issue the count-oriented `collection` request. The length of the
    /// result is the total number of matching items.
    fn collection_request(
        &self,
        criteria: &QueryCriteria,
    ) -> impl Future<Output = Result<Vec<Self::Item>, DataError>> + Send;
}

/// Shared handle to a resource model.
///
/// Fetches lock the handle for the whole install, call, restore sequence,
/// so concurrent fetches through clones of one handle run one at a time.
pub struct ModelHandle<M> {
    inner: Arc<Mutex<M>>,
    resource: Arc<str>,
}

impl<M> Clone for ModelHandle<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            resource: Arc::clone(&self.resource),
        }
    }
}

impl<M: ResourceModel> ModelHandle<M> {
    pub fn new(model: M) -> Self {
        let resource = Arc::from(model.resource_name());
        Self {
            inner: Arc::new(Mutex::new(model)),
            resource,
        }
    }

    pub fn resource_name(&self) -> &str {
        &self.resource
    }

    /// Exclusive access to the model.
    pub async fn lock(&self) -> MutexGuard<'_, M> {
        self.inner.lock().await
    }

    /// Lock the model and remember its base criteria for restoration.
    pub async fn scope(&self) -> CriteriaScope<'_, M> {
        CriteriaScope::acquire(self.inner.lock().await)
    }

    /// Current base criteria, as any unrelated caller would see it.
    pub async fn base_criteria(&self) -> Option<QueryCriteria> {
        self.inner.lock().await.query_criteria(false)
    }

    pub async fn set_base_criteria(&self, criteria: Option<QueryCriteria>) {
        self.inner.lock().await.set_query_criteria(criteria);
    }
}

/// Guard that holds a locked model and puts its base criteria back when dropped.
///
/// Restoration happens on every exit path: normal return, `?` on a failed
/// remote call, and cancellation of the surrounding future.
pub struct CriteriaScope<'a, M: ResourceModel> {
    model: MutexGuard<'a, M>,
    base: Option<QueryCriteria>,
}

impl<'a, M: ResourceModel> CriteriaScope<'a, M> {
    fn acquire(model: MutexGuard<'a, M>) -> Self {
        let base = model.query_criteria(false);
        Self { model, base }
    }

    /// The base criteria as it was when the scope was acquired.
    pub fn base(&self) -> Option<&QueryCriteria> {
        self.base.as_ref()
    }

    /// Install criteria on the model for the duration of the scope.
    pub fn install(&mut self, criteria: Option<QueryCriteria>) {
        self.model.set_query_criteria(criteria);
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: ResourceModel> Deref for CriteriaScope<'_, M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.model
    }
}

impl<M: ResourceModel> Drop for CriteriaScope<'_, M> {
    fn drop(&mut self) {
        self.model.set_query_criteria(self.base.take());
        tracing::trace!(resource = %self.model.resource_name(), "Base criteria restored");
    }
}
