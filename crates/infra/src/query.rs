//! Listing filters and pagination shared by the query operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use almacen_catalog::{AlertLevel, ProductKind};
use almacen_core::{DomainError, DomainResult, ProductId};
use almacen_ingresos::IngresoState;

const MAX_PAGE_LIMIT: u32 = 100;

/// Page request. Pages are 1-based; `limit` is clamped by validation, not
/// silently.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> DomainResult<Self> {
        if page == 0 {
            return Err(DomainError::validation("page must be >= 1"));
        }
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(DomainError::validation(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }
        Ok(Self { page, limit })
    }
}

/// One page of results with totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Slice an already-filtered, already-ordered result set.
    pub fn slice(items: Vec<T>, pagination: Pagination) -> Self {
        let total = items.len() as u64;
        let limit = u64::from(pagination.limit);
        let total_pages = total.div_ceil(limit);
        let offset = u64::from(pagination.page - 1) * limit;

        let items = items
            .into_iter()
            .skip(offset as usize)
            .take(pagination.limit as usize)
            .collect();

        Self {
            items,
            page: pagination.page,
            limit: pagination.limit,
            total,
            total_pages,
        }
    }
}

/// Filters for the stock overview listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockFilter {
    /// Case-insensitive match on product code or name.
    pub search: Option<String>,
    pub kind: Option<ProductKind>,
    pub alert: Option<AlertLevel>,
}

impl StockFilter {
    pub fn matches_text(&self, code: &str, name: &str) -> bool {
        match &self.search {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                code.to_lowercase().contains(&needle) || name.to_lowercase().contains(&needle)
            }
        }
    }
}

/// Filters for the ingreso listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngresoFilter {
    /// Case-insensitive match on supplier, invoice or lot/serial.
    pub search: Option<String>,
    pub state: Option<IngresoState>,
    pub product_id: Option<ProductId>,
    pub desde: Option<DateTime<Utc>>,
    pub hasta: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rejects_zero_page_and_oversized_limit() {
        assert!(Pagination::new(0, 10).is_err());
        assert!(Pagination::new(1, 0).is_err());
        assert!(Pagination::new(1, 101).is_err());
        assert!(Pagination::new(3, 100).is_ok());
    }

    #[test]
    fn page_slice_reports_totals() {
        let page = Page::slice((1..=45).collect::<Vec<i32>>(), Pagination { page: 3, limit: 20 });
        assert_eq!(page.items, (41..=45).collect::<Vec<i32>>());
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn page_past_the_end_is_empty_but_keeps_totals() {
        let page = Page::slice(vec![1, 2, 3], Pagination { page: 5, limit: 2 });
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn stock_filter_text_match_is_case_insensitive() {
        let filter = StockFilter {
            search: Some("fil".to_string()),
            ..StockFilter::default()
        };
        assert!(filter.matches_text("P-0001", "Filtro de aceite"));
        assert!(!filter.matches_text("P-0002", "Guantes"));
    }
}
