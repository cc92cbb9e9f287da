use sea_orm::Order;
use serde::Serialize;

use crate::error::AppError;

/// Default page size for list endpoints.
pub const DEFAULT_PER_PAGE: u64 = 20;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

/// Highest accepted page number.
pub const MAX_PAGE: u64 = u32::MAX as u64;

/// Normalise `page` (1 to [`MAX_PAGE`]) and `per_page` (1-100, default 20).
pub fn page_bounds(page: Option<u64>, per_page: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, 100);
    (page, per_page)
}

/// Row offset of a 1-based page.
pub fn page_offset(page: u64, per_page: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(per_page)
}

/// `asc` or `desc`; absent or anything else falls back to `default`.
pub fn sort_order(value: Option<&str>, default: Order) -> Order {
    match value {
        Some("asc") => Order::Asc,
        Some("desc") => Order::Desc,
        _ => default,
    }
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Trim a required text field and check its length in characters.
///
/// `label` is the human-readable field name used in messages.
pub fn required_text(
    field: &'static str,
    label: &str,
    value: Option<&str>,
    max_len: Option<usize>,
) -> Result<String, AppError> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(AppError::field(field, format!("{label} is required")));
    }
    if let Some(max) = max_len
        && value.chars().count() > max
    {
        return Err(AppError::field(
            field,
            format!("{label} must be 1-{max} characters"),
        ));
    }
    Ok(value.to_string())
}
