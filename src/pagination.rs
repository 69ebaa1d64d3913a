//! Page-based pagination for list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

/// Query parameters accepted by every paginated listing. Out-of-range
/// values are clamped rather than rejected.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// 1-indexed page number.
    #[param(minimum = 1, default = 1)]
    #[serde(default = "one")]
    pub page: i64,

    /// Items per page, capped at 100.
    #[param(minimum = 1, maximum = 100, default = 20)]
    #[serde(default = "twenty")]
    pub per_page: i64,
}

fn one() -> i64 {
    1
}

fn twenty() -> i64 {
    DEFAULT_PER_PAGE
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PaginationParams {
    fn page_clamped(&self) -> i64 {
        self.page.max(1)
    }

    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page_clamped() - 1) * self.limit()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: i64,
    pub per_page: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn from_params(data: Vec<T>, params: &PaginationParams, total_count: i64) -> Self {
        let page = params.page_clamped();
        let per_page = params.limit();
        // An empty result set still reports one page so clients can
        // render "page 1 of 1".
        let total_pages = (total_count.max(0) + per_page - 1).max(1) / per_page.max(1);
        let total_pages = total_pages.max(1);

        Self {
            data,
            pagination: PaginationMeta {
                page,
                per_page,
                total_count,
                total_pages,
                has_next: page < total_pages,
                has_prev: page > 1,
            },
        }
    }
}
