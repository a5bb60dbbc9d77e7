//! Offset pagination shared by listing endpoints.

use serde::Serialize;

use crate::validation::ValidationErrors;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Parse `page` and `per_page` query values.
    ///
    /// Missing values fall back to page 1 and `default_per_page`.
    ///
    /// Records a field error for non-numeric values, a page below 1, or a
    /// page size outside `1..=max_per_page`.
    pub fn parse(
        page: Option<&str>,
        per_page: Option<&str>,
        default_per_page: u32,
        max_per_page: u32,
        errors: &mut ValidationErrors,
    ) -> Self {
        let page = match page.map(str::parse::<u32>) {
            None => 1,
            Some(Ok(p)) if p >= 1 => p,
            Some(_) => {
                errors.add("page", "The page field must be an integer of at least 1.");
                1
            }
        };
        let per_page = match per_page.map(str::parse::<u32>) {
            None => default_per_page,
            Some(Ok(n)) if (1..=max_per_page).contains(&n) => n,
            Some(_) => {
                errors.add(
                    "per_page",
                    format!("The per page field must be between 1 and {max_per_page}."),
                );
                default_per_page
            }
        };
        Self { page, per_page }
    }

    /// Fixed page size, used where clients cannot choose one.
    #[must_use]
    pub const fn fixed(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }

    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

/// One page of results plus paging metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub current_page: u32,
    pub per_page: u32,
    pub total: i64,
    pub last_page: u32,
}

impl<T> Paginated<T> {
    #[must_use]
    pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
        let per_page = i64::from(request.per_page.max(1));
        let pages = (total.max(0) + per_page - 1) / per_page;
        Self {
            data,
            current_page: request.page,
            per_page: request.per_page,
            total,
            last_page: u32::try_from(pages.max(1)).unwrap_or(u32::MAX),
        }
    }

    /// Transform each item, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
        }
    }
}
