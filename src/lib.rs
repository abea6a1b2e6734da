//! # Sortable-RS
//!
//! Sortable, searchable, paginated tables for SQL-backed web handlers.
//!
//! The crate turns untrusted request parameters into a safe query shape:
//! an ORDER BY clause, parameterized WHERE conditions and paging, plus the
//! little bit of state a view needs to draw sort arrows and toggle links.
//! Running the query and rendering HTML are left to the caller.
//!
//! ## Features
//!
//! - **Sort Maps**: Logical sort keys mapped to one or more `table.column` targets
//! - **Reversible Sorting**: `key_reverse` inverts every direction of an entry
//! - **Secondary Sort**: A second key appended to the ORDER BY
//! - **Free-Text Search**: `q` matched case-insensitively across columns
//! - **Typed Filters**: String, date, datetime and numeric column filters
//! - **Letter Navigation**: Prefix match on a single letter
//! - **Injection-Safe**: Request values only ever travel as bind parameters
//! - **Configuration-Based**: Define tables in code or via YAML
//!
//! ## Quick Start
//!
//! ```rust
//! use sortable::prelude::*;
//!
//! let config = TableConfig::new("users")
//!     .with_heading("Name", "name")
//!     .with_sort("name", vec![SortTarget::desc("users.name")])
//!     .with_default_sort(DefaultSort::new("name", SortDirection::Desc))
//!     .with_search_columns(["users.email", "users.name"]);
//!
//! let shaper = QueryShaper::new(config).expect("valid table config");
//!
//! let params = RequestParams::from_pairs([("sort", "name_reverse"), ("q", "jo")]);
//! let query = shaper.shape(&params).expect("valid request");
//!
//! assert_eq!(query.order_by, "users.name ASC");
//! assert_eq!(
//!     query.where_clause(PlaceholderStyle::Question).as_deref(),
//!     Some("(users.email ILIKE ? OR users.name ILIKE ?)")
//! );
//! ```

pub mod config;
pub mod core;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Engine ===
    pub use crate::core::{
        extractors::ShapedQuery,
        params::RequestParams,
        query::{HeadingLink, PaginationMeta, QueryDescriptor, Relations},
        shaper::{QueryShaper, ShapeOptions},
    };

    // === Building blocks ===
    pub use crate::core::{
        condition::{BindValue, Condition, Conditions, PlaceholderStyle},
        filter::{ColumnType, ColumnTypeSource, FilterRule, FilterRuleConfig, SchemaCatalog},
        sort::{DefaultSort, SortDirection, SortIndicator, SortMap, SortState, SortTarget},
    };

    // === Errors ===
    pub use crate::core::error::{
        ConfigError, ErrorResponse, FilterError, RequestError, SortError, SortableError,
        SortableResult,
    };

    // === Config ===
    pub use crate::config::{TableConfig, TableHeading};

    // === Storage ===
    #[cfg(feature = "postgres")]
    pub use crate::storage::{push_descriptor, push_where};
}
