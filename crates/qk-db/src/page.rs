//! Paginated results

use serde::Serialize;

/// One page of rows with the unpaginated total
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    /// 0 when the request had no limit
    pub limit: u64,
    pub offset: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, limit: u64, offset: u64) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
        }
    }

    /// 1-based page number
    pub fn page(&self) -> u64 {
        if self.limit == 0 {
            1
        } else {
            self.offset / self.limit + 1
        }
    }

    pub fn total_pages(&self) -> u64 {
        let total = self.total.max(0) as u64;
        if self.limit == 0 {
            1
        } else {
            total.div_ceil(self.limit).max(1)
        }
    }

    pub fn has_next(&self) -> bool {
        self.limit > 0 && (self.offset + self.limit) < self.total.max(0) as u64
    }

    pub fn has_prev(&self) -> bool {
        self.offset > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_helpers() {
        let page = Page::new(vec![1, 2, 3, 4, 5], 50, 5, 5);
        assert_eq!(page.page(), 2);
        assert_eq!(page.total_pages(), 10);
        assert!(page.has_next());
        assert!(page.has_prev());

        let last = Page::new(vec![1], 11, 5, 10);
        assert_eq!(last.page(), 3);
        assert_eq!(last.total_pages(), 3);
        assert!(!last.has_next());
    }

    #[test]
    fn test_unlimited_page() {
        let page = Page::new(vec!["a", "b"], 2, 0, 0);
        assert_eq!(page.page(), 1);
        assert_eq!(page.total_pages(), 1);
        assert!(!page.has_next());
        assert!(!page.has_prev());
    }

    #[test]
    fn test_serialize() {
        let page = Page::new(vec![10, 20], 2, 10, 0);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"items": [10, 20], "total": 2, "limit": 10, "offset": 0})
        );
    }
}
