use serde::{Deserialize, Serialize};

use crate::domain::vehicle::Vehicle;

/// One page of search results. `total_matched` counts every match before
/// pagination, so it is never smaller than `items.len()`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    total_matched: u64,
    items: Vec<Vehicle>,
    limit: u32,
    offset: u64,
}

impl ResultPage {
    pub fn new(total_matched: u64, mut items: Vec<Vehicle>, limit: u32, offset: u64) -> Self {
        items.truncate(limit as usize);
        let total_matched = total_matched.max(items.len() as u64);
        Self { total_matched, items, limit, offset }
    }

    pub fn empty(limit: u32, offset: u64) -> Self {
        Self::new(0, Vec::new(), limit, offset)
    }

    pub fn total_matched(&self) -> u64 {
        self.total_matched
    }

    pub fn items(&self) -> &[Vehicle] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Vehicle> {
        self.items
    }

    pub fn total_shown(&self) -> usize {
        self.items.len()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when the store matched more vehicles than this page carries.
    pub fn is_truncated(&self) -> bool {
        self.total_matched > self.items.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::ResultPage;

    #[test]
    fn empty_page_reports_zero_totals() {
        let page = ResultPage::empty(20, 0);
        assert_eq!(page.total_matched(), 0);
        assert_eq!(page.total_shown(), 0);
        assert!(page.is_empty());
        assert!(!page.is_truncated());
    }

    #[test]
    fn total_is_never_below_item_count() {
        let page = ResultPage::new(0, Vec::new(), 5, 0);
        assert_eq!(page.total_matched(), 0);
        let page = ResultPage::new(12, Vec::new(), 5, 10);
        assert_eq!(page.offset(), 10);
        assert!(page.is_truncated());
    }
}
