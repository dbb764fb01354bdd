use ares_core::{ConfigValue, FromConfigValue};

use crate::criteria::QueryCriteria;
use crate::error::DataError;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const DEFAULT_PAGE_VAR: &str = "page";

/// Paging collaborator of a [`CollectionProvider`](crate::CollectionProvider).
pub trait Paginate: Send + Sync {
    /// Value written to the criteria offset.
    fn offset(&self) -> u64;

    /// Value written to the criteria limit (the page size).
    fn limit(&self) -> u64;

    /// Zero-based index of the current page.
    fn current_page(&self) -> u64;

    fn set_item_count(&mut self, count: u64);

    /// Name of the query-string variable carrying the page number.
    fn set_page_var(&mut self, name: &str);

    /// Write this page's limit and offset onto `criteria`.
    fn apply_limit(&self, criteria: &mut QueryCriteria) {
        criteria.set_limit(Some(self.limit()));
        criteria.set_offset(Some(self.offset()));
    }
}

/// Page-number pagination for remote collections.
///
/// The criteria offset is the one-based page number the remote API expects
/// under the criteria's offset key (`page` by default), not an element
/// position. Page 0 of the pagination is sent as `page=1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    page_size: u64,
    page_var: String,
    item_count: Option<u64>,
    current_page: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_var: DEFAULT_PAGE_VAR.to_string(),
            item_count: None,
            current_page: 0,
        }
    }
}

impl Pagination {
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero page size falls back to [`DEFAULT_PAGE_SIZE`].
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.set_page_size(page_size);
        self
    }

    pub fn with_current_page(mut self, page: u64) -> Self {
        self.current_page = page;
        self
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: u64) {
        self.page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
    }

    pub fn page_var(&self) -> &str {
        &self.page_var
    }

    /// Total number of items, once known.
    pub fn item_count(&self) -> Option<u64> {
        self.item_count
    }

    /// Number of pages; zero until the item count is known.
    pub fn page_count(&self) -> u64 {
        self.item_count
            .map(|count| count.div_ceil(self.page_size))
            .unwrap_or(0)
    }

    pub fn set_current_page(&mut self, page: u64) {
        self.current_page = page;
    }

    /// Read the one-based page number from a URL query string.
    ///
    /// Returns the zero-based page that was selected, or `None` when the
    /// variable is absent or not a positive number (the page is then left
    /// unchanged).
    pub fn resolve_current_page(&mut self, query: &str) -> Option<u64> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let page = form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == self.page_var.as_str())
            .and_then(|(_, value)| value.trim().parse::<u64>().ok())
            .filter(|page| *page > 0)?;
        self.current_page = page - 1;
        Some(self.current_page)
    }

    /// Build from a `{page_size, page_var, current_page}` configuration mapping.
    pub fn from_config(value: &ConfigValue) -> Result<Self, DataError> {
        let mut pagination = Pagination::new();
        pagination.configure(value)?;
        Ok(pagination)
    }

    /// Apply a configuration mapping on top of the current settings.
    pub fn configure(&mut self, value: &ConfigValue) -> Result<(), DataError> {
        let ConfigValue::Map(map) = value else {
            return Err(DataError::configuration(
                "pagination must be `false` or a mapping",
            ));
        };
        for (key, raw) in map {
            let key_path = format!("pagination.{key}");
            match key.as_str() {
                "page_size" => self.set_page_size(u64::from_config_value(raw, &key_path)?),
                "page_var" => self.page_var = String::from_config_value(raw, &key_path)?,
                "current_page" => self.current_page = u64::from_config_value(raw, &key_path)?,
                other => {
                    return Err(DataError::configuration(format!(
                        "unknown pagination key '{other}'"
                    )))
                }
            }
        }
        Ok(())
    }
}

impl Paginate for Pagination {
    fn offset(&self) -> u64 {
        self.current_page() + 1
    }

    fn limit(&self) -> u64 {
        self.page_size
    }

    /// Clamped to the last page once the item count is known.
    fn current_page(&self) -> u64 {
        match self.item_count {
            Some(_) => self.current_page.min(self.page_count().saturating_sub(1)),
            None => self.current_page,
        }
    }

    fn set_item_count(&mut self, count: u64) {
        self.item_count = Some(count);
    }

    fn set_page_var(&mut self, name: &str) {
        self.page_var = name.to_string();
    }
}
