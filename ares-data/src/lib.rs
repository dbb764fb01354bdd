pub mod config;
pub mod criteria;
pub mod error;
pub mod meta;
pub mod model;
pub mod page;
pub mod pagination;
pub mod params;
pub mod provider;
pub mod scope;
pub mod sort;

pub use config::ProviderConfig;
pub use criteria::{IntoCondition, QueryCriteria, RehydrateSeed};
pub use error::{CriteriaError, DataError};
pub use meta::{Property, Relation, RelationKind, RelationRegistry, ResourceMetaData, ResourceSchema};
pub use model::{CriteriaScope, ModelHandle, Resource, ResourceModel};
pub use page::Page;
pub use pagination::{Paginate, Pagination};
pub use params::ParamSequence;
pub use provider::{CollectionProvider, Slot};
pub use scope::{Scope, Scopes};
pub use sort::{ApplyOrder, Sort, SortDirection};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        CollectionProvider, DataError, ModelHandle, Paginate, Pagination, QueryCriteria, Resource,
        ResourceModel, Sort,
    };
}
