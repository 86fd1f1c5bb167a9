use serde::Serialize;

/// One page of a filtered list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page actually served
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    /// Never below one, so "page 1 of 1" shows for empty results
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    total_items.div_ceil(page_size).max(1)
}

/// Slice out 1-based page `page`: items `(page-1)*size+1 ..= page*size`
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let start = (page - 1).saturating_mul(page_size);
    let slice = items
        .get(start..)
        .map(|rest| &rest[..rest.len().min(page_size)])
        .unwrap_or_default();

    Page {
        items: slice.to_vec(),
        page,
        page_size,
        total_items: items.len(),
        total_pages: total_pages(items.len(), page_size),
    }
}

/// Page numbers for the pager, with `None` standing for an ellipsis
pub fn page_window(current: usize, total: usize, radius: usize) -> Vec<Option<usize>> {
    let total = total.max(1);
    let current = current.clamp(1, total);
    let low = current.saturating_sub(radius).max(1);
    let high = (current + radius).min(total);

    let mut pages = Vec::new();
    if low > 1 {
        pages.push(Some(1));
        if low > 2 {
            pages.push(None);
        }
    }
    pages.extend((low..=high).map(Some));
    if high < total {
        if high + 1 < total {
            pages.push(None);
        }
        pages.push(Some(total));
    }
    pages
}
