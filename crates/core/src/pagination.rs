use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Build a page request, rejecting page 0 and sizes outside 1..=100.
    pub fn new(page: Option<u32>, page_size: Option<u32>, default_size: u32) -> CoreResult<Self> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(default_size);
        if page == 0 {
            return Err(CoreError::BadRequest("page must be at least 1".into()));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(CoreError::BadRequest(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self { page, page_size })
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

/// One page of results with totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        let size = i64::from(request.page_size);
        let pages = if total > 0 { (total + size - 1) / size } else { 0 };
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
            pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            pages: self.pages,
        }
    }
}

/// Apply a page request to an already-filtered, already-ordered list.
pub(crate) fn slice_page<T: Clone>(all: &[T], request: PageRequest) -> Page<T> {
    let items = all
        .iter()
        .skip(request.offset() as usize)
        .take(request.page_size as usize)
        .cloned()
        .collect();
    Page::new(items, all.len() as i64, request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let req = PageRequest::new(None, None, 10).unwrap();
        assert_eq!(req, PageRequest { page: 1, page_size: 10 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(PageRequest::new(Some(0), None, 10).is_err());
        assert!(PageRequest::new(None, Some(0), 10).is_err());
        assert!(PageRequest::new(None, Some(101), 10).is_err());
        assert!(PageRequest::new(None, Some(100), 10).is_ok());
    }

    #[test]
    fn pages_round_up() {
        let req = PageRequest::new(Some(3), Some(10), 10).unwrap();
        assert_eq!(req.offset(), 20);
        let page: Page<u8> = Page::new(vec![], 21, req);
        assert_eq!(page.pages, 3);
        let empty: Page<u8> = Page::new(vec![], 0, req);
        assert_eq!(empty.pages, 0);
    }

    #[test]
    fn slices_in_memory_lists() {
        let all: Vec<u32> = (0..25).collect();
        let req = PageRequest::new(Some(3), Some(10), 10).unwrap();
        let page = slice_page(&all, req);
        assert_eq!(page.items, vec![20, 21, 22, 23, 24]);
        assert_eq!(page.total, 25);
    }
}
