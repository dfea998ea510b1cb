use serde::{Deserialize, Serialize};

/// Page envelope returned by every listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
}

/// Zero-based page/size pair sent as query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

pub const DEFAULT_PAGE_SIZE: u32 = 20;

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// What a view keeps of a page after storing its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub size: u32,
    pub total_pages: u32,
    pub total_elements: u64,
}

impl Pagination {
    pub fn empty(size: u32) -> Self {
        Self {
            page: 0,
            size,
            total_pages: 0,
            total_elements: 0,
        }
    }

    pub fn of<T>(page: &Page<T>) -> Self {
        Self {
            page: page.number,
            size: page.size,
            total_pages: page.total_pages,
            total_elements: page.total_elements,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }

    pub fn next(&self) -> Option<u32> {
        self.has_next().then_some(self.page + 1)
    }

    pub fn prev(&self) -> Option<u32> {
        self.has_prev().then(|| self.page - 1)
    }

    /// One-based label for display, e.g. `Page 2 of 4`.
    pub fn label(&self) -> String {
        if self.total_pages == 0 {
            "No pages".to_string()
        } else {
            format!("Page {} of {}", self.page + 1, self.total_pages)
        }
    }
}
