//! Query descriptor handed to the query executor and the renderer

use crate::core::condition::{BindValue, Conditions, PlaceholderStyle};
use crate::core::sort::{REVERSE_SUFFIX, SortDirection, SortIndicator, SortState};
use crate::config::TableHeading;
use serde::Serialize;

/// Related tables to load with the rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "relations", rename_all = "lowercase")]
pub enum Relations {
    None,
    /// Eager-load these relations
    Includes(Vec<String>),
    /// Join these relations into the main query
    Joins(Vec<String>),
}

impl Relations {
    /// Joins win over includes when both are configured
    pub fn from_config(includes: &[String], joins: &[String]) -> Self {
        if !joins.is_empty() {
            Relations::Joins(joins.to_vec())
        } else if !includes.is_empty() {
            Relations::Includes(includes.to_vec())
        } else {
            Relations::None
        }
    }
}

/// Link state of one column heading
///
/// A primary link requests `sort=<link_key>`; a secondary link keeps the
/// active `sort` and requests `secondary_sort=<link_key>`. Both start over
/// on page 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingLink {
    pub label: String,
    pub sort_key: String,
    pub link_key: String,
    /// Set only on the heading that currently drives the order
    pub indicator: Option<SortIndicator>,
}

impl HeadingLink {
    pub(crate) fn build(heading: &TableHeading, state: &SortState, default_key: &str) -> Self {
        let key = heading.sort_key.as_str();
        let reversed = format!("{}{}", key, REVERSE_SUFFIX);

        let (link_key, indicator) = if state.is_default && key == default_key {
            (state.toggle_key.clone(), Some(state.indicator))
        } else {
            let on_primary = !state.is_default && state.active_sort_key == key;
            let on_secondary = state.secondary_sort_key.as_deref() == Some(key);
            let link_key = if on_primary || on_secondary {
                reversed.clone()
            } else {
                key.to_string()
            };

            let indicator = if state.is_default {
                None
            } else if state.active_sort_key == key {
                Some(SortIndicator::AscendingHint)
            } else if state.active_sort_key == reversed {
                Some(SortIndicator::DescendingHint)
            } else {
                None
            };
            (link_key, indicator)
        };

        Self {
            label: heading.label.clone(),
            sort_key: heading.sort_key.clone(),
            link_key,
            indicator,
        }
    }

    pub fn css_class(&self) -> Option<&'static str> {
        self.indicator.map(SortIndicator::css_class)
    }
}

/// Everything needed to fetch and render one page of a sortable table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDescriptor {
    /// ORDER BY body, e.g. `users.name ASC, users.id DESC`
    pub order_by: String,

    /// WHERE fragments, combined with AND
    pub conditions: Conditions,

    pub sort: SortState,

    /// Page number (starts at 1)
    pub page: u32,

    pub per_page: u32,

    pub relations: Relations,

    pub headings: Vec<HeadingLink>,
}

impl QueryDescriptor {
    pub fn active_sort_key(&self) -> &str {
        &self.sort.active_sort_key
    }

    pub fn active_direction(&self) -> SortDirection {
        self.sort.active_direction
    }

    pub fn toggle_key(&self) -> &str {
        &self.sort.toggle_key
    }

    pub fn indicator_class(&self) -> &'static str {
        self.sort.indicator.css_class()
    }

    /// Rows to skip for the requested page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }

    /// Combined WHERE body, `None` when unfiltered
    pub fn where_clause(&self, style: PlaceholderStyle) -> Option<String> {
        self.conditions.to_sql(style)
    }

    /// Bind values in placeholder order
    pub fn binds(&self) -> Vec<&BindValue> {
        self.conditions.binds()
    }

    /// Pagination metadata once the total row count is known
    pub fn pagination(&self, total: u64) -> PaginationMeta {
        PaginationMeta::new(self.page, self.per_page, total)
    }
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: u32,

    /// Number of items per page
    pub per_page: u32,

    /// Total number of items (after filters)
    pub total: u64,

    /// Total number of pages
    pub total_pages: u64,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        // Ensure per_page is at least 1 to avoid division by zero
        let per_page = per_page.max(1);
        let page = page.max(1);
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(u64::from(per_page))
        };
        let start = u64::from(page - 1) * u64::from(per_page);

        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: start + u64::from(per_page) < total,
            has_prev: page > 1,
        }
    }
}
