use serde::Serialize;

/// A page of items with pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    /// Zero-based page index.
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, page: u64, size: u64, total_elements: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(size)
        };
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
        }
    }

    pub fn is_last(&self) -> bool {
        self.page + 1 >= self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        let page = Page::new(vec![1, 2], 1, 2, 5);
        assert_eq!(page.total_pages, 3);
        assert!(!page.is_last());
        assert!(Page::new(Vec::<u8>::new(), 0, 0, 0).is_last());
    }
}
