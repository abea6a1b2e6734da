//! Core module containing the query-shaping engine

pub mod condition;
pub mod error;
pub mod extractors;
pub mod filter;
pub mod letter;
pub mod params;
pub mod query;
pub mod search;
pub mod shaper;
pub mod sort;

pub use condition::{BindValue, Condition, Conditions, PlaceholderStyle};
pub use error::{
    ConfigError, FilterError, RequestError, SortError, SortableError, SortableResult,
};
pub use extractors::ShapedQuery;
pub use filter::{ColumnType, ColumnTypeSource, FilterRule, FilterRuleConfig, SchemaCatalog};
pub use params::{ParamValue, RequestParams};
pub use query::{HeadingLink, PaginationMeta, QueryDescriptor, Relations};
pub use shaper::{QueryShaper, ShapeOptions};
pub use sort::{DefaultSort, SortDirection, SortIndicator, SortMap, SortState, SortTarget};
