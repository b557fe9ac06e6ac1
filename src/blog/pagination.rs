//! Page arithmetic for the blog list

use serde::Serialize;

/// Pages shown on each side of the current page
const WINDOW: usize = 2;

/// One entry in the page selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "number", rename_all = "lowercase")]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

/// Pagination state over a list of `total` items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// 1-based current page
    pub current: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl Pagination {
    /// `per_page` of zero is treated as one
    pub fn new(total: usize, per_page: usize, current: usize) -> Self {
        let per_page = per_page.max(1);
        Self {
            current,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }

    /// Reset out-of-range pages to the first page
    pub fn clamped(self) -> Self {
        let out_of_range = self.current == 0
            || (self.total_pages > 0 && self.current > self.total_pages)
            || (self.total == 0 && self.current > 1);
        if out_of_range {
            Self { current: 1, ..self }
        } else {
            self
        }
    }

    /// `[start, end)` indices of the current page
    pub fn range(&self) -> (usize, usize) {
        let start = self
            .current
            .saturating_sub(1)
            .saturating_mul(self.per_page)
            .min(self.total);
        let end = (start + self.per_page).min(self.total);
        (start, end)
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let (start, end) = self.range();
        let end = end.min(items.len());
        &items[start.min(end)..end]
    }

    /// 1-based first and last item numbers shown, `(0, 0)` when empty
    pub fn showing(&self) -> (usize, usize) {
        let (start, end) = self.range();
        if start >= end {
            (0, 0)
        } else {
            (start + 1, end)
        }
    }

    pub fn has_prev(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.total_pages
    }

    /// The selector is only shown with more than one page
    pub fn is_visible(&self) -> bool {
        self.total_pages > 1
    }

    /// First, last, and a window around the current page, with gaps marked
    pub fn page_numbers(&self) -> Vec<PageItem> {
        let total = self.total_pages;
        if total == 0 {
            return Vec::new();
        }
        if total == 1 {
            return vec![PageItem::Page(1)];
        }

        let current = self.current.clamp(1, total);
        let lo = current.saturating_sub(WINDOW).max(2);
        let hi = (current + WINDOW).min(total - 1);

        let mut items = vec![PageItem::Page(1)];
        if current > WINDOW + 2 {
            items.push(PageItem::Ellipsis);
        }
        items.extend((lo..=hi).map(PageItem::Page));
        if current + WINDOW < total - 1 {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page(total));
        items
    }
}
