//! Query shaping: request parameters in, query descriptor out
//!
//! A [`QueryShaper`] is built once per table at startup and shared (usually
//! as `Arc<QueryShaper>` in handler state). Shaping is a pure function of the
//! shaper's configuration and the request parameters.

use crate::config::{TableConfig, TableHeading};
use crate::core::condition::{Condition, Conditions};
use crate::core::error::{ConfigError, SortableResult};
use crate::core::filter::{ColumnTypeSource, FilterRule, filter_conditions};
use crate::core::letter::letter_condition;
use crate::core::params::RequestParams;
use crate::core::query::{HeadingLink, QueryDescriptor, Relations};
use crate::core::search::search_condition;
use crate::core::sort::resolve_sort;
use std::sync::Arc;

/// Per-call overrides of the table configuration
///
/// Only the base condition, page size and headings vary per call. To use a
/// different sort map, default sort, search column list, filter set or letter
/// column for one endpoint, build a second [`QueryShaper`] from an adjusted
/// [`TableConfig`] and keep both in state. To turn filtering off for a call,
/// shape a copy of the parameters with the filter keys removed
/// ([`RequestParams::without`]).
#[derive(Debug, Clone, Default)]
pub struct ShapeOptions {
    /// Condition ANDed in front of everything derived from the request,
    /// its placeholders were checked when it was built
    pub base_condition: Option<Condition>,
    /// Records per page, clamped to the configured maximum
    pub per_page: Option<u32>,
    /// Headings to report instead of the configured ones
    pub headings: Option<Vec<TableHeading>>,
}

impl ShapeOptions {
    pub fn with_base_condition(mut self, condition: Condition) -> Self {
        self.base_condition = Some(condition);
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn with_headings(mut self, headings: Vec<TableHeading>) -> Self {
        self.headings = Some(headings);
        self
    }
}

/// Validated, immutable shaping engine for one table
#[derive(Debug, Clone)]
pub struct QueryShaper {
    config: Arc<TableConfig>,
    filters: Vec<FilterRule>,
    search_columns: Vec<String>,
    headings: Vec<TableHeading>,
}

impl QueryShaper {
    /// Validate the configuration and resolve filter column types from its
    /// `column_types` catalog
    pub fn new(config: impl Into<Arc<TableConfig>>) -> Result<Self, ConfigError> {
        let config = config.into();
        let catalog = config.column_types.clone();
        Self::with_type_source(config, &catalog)
    }

    /// Like [`QueryShaper::new`], resolving filter types from `source`
    pub fn with_type_source(
        config: impl Into<Arc<TableConfig>>,
        source: &dyn ColumnTypeSource,
    ) -> Result<Self, ConfigError> {
        let config = config.into();
        config.validate()?;

        let filters: Vec<FilterRule> = config
            .filters
            .iter()
            .map(|rule| FilterRule::resolve(rule, source, config.table.as_deref()))
            .collect();
        let search_columns = config.effective_search_columns();
        let headings = config.effective_headings();

        tracing::info!(
            table = config.table.as_deref().unwrap_or("-"),
            sort_keys = config.sort_map.len(),
            filters = filters.len(),
            search_columns = search_columns.len(),
            "sortable table configured"
        );

        Ok(Self {
            config,
            filters,
            search_columns,
            headings,
        })
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Filter rules with their resolved column types
    pub fn filters(&self) -> &[FilterRule] {
        &self.filters
    }

    pub fn search_columns(&self) -> &[String] {
        &self.search_columns
    }

    pub fn headings(&self) -> &[TableHeading] {
        &self.headings
    }

    /// Shape a request with the configured defaults
    pub fn shape(&self, params: &RequestParams) -> SortableResult<QueryDescriptor> {
        self.shape_with(params, &ShapeOptions::default())
    }

    /// Shape a request, applying per-call overrides
    ///
    /// Conditions are composed in a fixed order: base condition, search,
    /// filters, letter.
    pub fn shape_with(
        &self,
        params: &RequestParams,
        options: &ShapeOptions,
    ) -> SortableResult<QueryDescriptor> {
        let mut conditions = Conditions::new();

        if let Some(base) = &options.base_condition {
            conditions.push(base.clone());
        }
        if let Some(search) = search_condition(params.query(), &self.search_columns) {
            conditions.push(search);
        }
        for filter in filter_conditions(params, &self.filters)? {
            conditions.push(filter);
        }
        if let Some(letter) =
            letter_condition(params.letter(), self.config.letter_column.as_deref())?
        {
            conditions.push(letter);
        }

        let sort = resolve_sort(
            params.sort(),
            params.secondary_sort(),
            &self.config.sort_map,
            &self.config.default_sort,
        )?;

        let per_page = options
            .per_page
            .map(|n| n.clamp(1, self.config.max_per_page))
            .unwrap_or(self.config.per_page);

        let headings = options
            .headings
            .as_deref()
            .unwrap_or(&self.headings)
            .iter()
            .map(|h| HeadingLink::build(h, &sort.state, &self.config.default_sort.key))
            .collect();

        tracing::debug!(
            order_by = %sort.order_by,
            conditions = conditions.len(),
            page = params.page(),
            per_page,
            "shaped table query"
        );

        Ok(QueryDescriptor {
            order_by: sort.order_by,
            conditions,
            sort: sort.state,
            page: params.page(),
            per_page,
            relations: Relations::from_config(
                &self.config.include_relations,
                &self.config.join_relations,
            ),
            headings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::condition::{BindValue, PlaceholderStyle};
    use crate::core::error::{FilterError, SortError, SortableError};
    use crate::core::filter::{ColumnType, FilterRuleConfig, SchemaCatalog};
    use crate::core::sort::{DefaultSort, SortDirection, SortTarget};
    use std::collections::HashMap;

    fn users_config() -> TableConfig {
        TableConfig::new("users")
            .with_heading("Name", "name")
            .with_heading("Email", "email")
            .with_sort("name", vec![SortTarget::desc("users.name")])
            .with_sort("email", vec![SortTarget::asc("users.email")])
            .with_default_sort(DefaultSort::new("name", SortDirection::Desc))
            .with_search_columns(["users.email", "users.name"])
            .with_filter(FilterRuleConfig::new("status", "users.status"))
            .with_letter_column("users.name")
            .with_column_types(
                SchemaCatalog::new().with("users.status", ColumnType::Numeric),
            )
    }

    #[test]
    fn test_empty_params_use_defaults() {
        let shaper = QueryShaper::new(users_config()).unwrap();
        let descriptor = shaper.shape(&RequestParams::new()).unwrap();
        assert_eq!(descriptor.order_by, "users.name DESC");
        assert!(descriptor.conditions.is_empty());
        assert_eq!(descriptor.active_sort_key(), "name");
        assert_eq!(descriptor.toggle_key(), "name_reverse");
        assert_eq!(descriptor.indicator_class(), "sort-ascending-hint");
        assert_eq!(descriptor.page, 1);
        assert_eq!(descriptor.per_page, 10);
        assert_eq!(descriptor.relations, Relations::None);
    }

    #[test]
    fn test_full_request() {
        let shaper = QueryShaper::new(users_config()).unwrap();
        let params = RequestParams::from_pairs([
            ("sort", "email_reverse"),
            ("q", "jo"),
            ("status", "2"),
            ("letter", "J"),
            ("page", "3"),
        ]);
        let descriptor = shaper.shape(&params).unwrap();

        assert_eq!(descriptor.order_by, "users.email DESC");
        assert_eq!(
            descriptor.conditions.templates(),
            vec![
                "(users.email ILIKE ? OR users.name ILIKE ?)",
                "users.status = ?",
                "users.name ILIKE ?",
            ]
        );
        assert_eq!(
            descriptor.binds(),
            vec![
                &BindValue::Text("%jo%".to_string()),
                &BindValue::Text("%jo%".to_string()),
                &BindValue::Integer(2),
                &BindValue::Text("J%".to_string()),
            ]
        );
        assert_eq!(descriptor.offset(), 20);
        assert_eq!(
            descriptor.where_clause(PlaceholderStyle::Dollar).as_deref(),
            Some(
                "((users.email ILIKE $1 OR users.name ILIKE $2)) AND (users.status = $3) AND (users.name ILIKE $4)"
            )
        );
    }

    #[test]
    fn test_invalid_sort_is_distinct_error() {
        let shaper = QueryShaper::new(users_config()).unwrap();
        let err = shaper
            .shape(&RequestParams::from_pairs([("sort", "password")]))
            .unwrap_err();
        assert!(matches!(
            err,
            SortableError::Sort(SortError::InvalidSortKey { .. })
        ));

        // caller-side fallback to the default order
        let params = RequestParams::from_pairs([("sort", "password"), ("q", "jo")]);
        let descriptor = shaper.shape(&params.without(&["sort"])).unwrap();
        assert_eq!(descriptor.order_by, "users.name DESC");
        assert_eq!(descriptor.conditions.len(), 1);
    }

    #[test]
    fn test_bad_filter_value_is_error() {
        let shaper = QueryShaper::new(users_config()).unwrap();
        let err = shaper
            .shape(&RequestParams::from_pairs([("status", "active")]))
            .unwrap_err();
        assert!(matches!(
            err,
            SortableError::Filter(FilterError::ParseError { .. })
        ));
    }

    #[test]
    fn test_options_override() {
        let shaper = QueryShaper::new(users_config()).unwrap();
        let options = ShapeOptions::default()
            .with_base_condition(Condition::raw("users.deleted_at IS NULL").unwrap())
            .with_per_page(1_000)
            .with_headings(vec![TableHeading::new("Email", "email")]);
        let descriptor = shaper
            .shape_with(&RequestParams::from_pairs([("q", "jo")]), &options)
            .unwrap();

        assert_eq!(descriptor.conditions.templates()[0], "users.deleted_at IS NULL");
        assert_eq!(descriptor.conditions.len(), 2);
        assert_eq!(descriptor.per_page, 100);
        assert_eq!(descriptor.headings.len(), 1);
        assert_eq!(descriptor.headings[0].link_key, "email");
    }

    #[test]
    fn test_base_condition_with_literal_question_mark() {
        let shaper = QueryShaper::new(users_config()).unwrap();
        let options = ShapeOptions::default()
            .with_base_condition(Condition::raw("users.tags ?? 'admin'").unwrap());
        let descriptor = shaper
            .shape_with(&RequestParams::from_pairs([("q", "jo")]), &options)
            .unwrap();

        assert_eq!(descriptor.binds().len(), 2);
        assert_eq!(
            descriptor.where_clause(PlaceholderStyle::Dollar).as_deref(),
            Some("(users.tags ? 'admin') AND ((users.email ILIKE $1 OR users.name ILIKE $2))")
        );
    }

    #[test]
    fn test_letter_ignored_without_letter_column() {
        let config = TableConfig::new("users")
            .with_sort("name", vec![SortTarget::asc("users.name")])
            .with_default_sort(DefaultSort::new("name", SortDirection::Asc));
        let shaper = QueryShaper::new(config).unwrap();

        for letter in ["a", "ab", "7"] {
            let descriptor = shaper
                .shape(&RequestParams::from_pairs([("letter", letter)]))
                .unwrap();
            assert!(descriptor.conditions.is_empty(), "letter {}", letter);
        }
    }

    #[test]
    fn test_custom_type_source() {
        let mut types = HashMap::new();
        types.insert("users.status".to_string(), ColumnType::String);
        let shaper = QueryShaper::with_type_source(users_config(), &types).unwrap();
        assert_eq!(shaper.filters()[0].column_type, ColumnType::String);
    }

    #[test]
    fn test_misconfiguration_fails_at_setup() {
        let config = users_config().with_sort("broken", vec![]);
        assert_eq!(
            QueryShaper::new(config).unwrap_err(),
            ConfigError::EmptySortTargets {
                key: "broken".to_string()
            }
        );
    }

    #[test]
    fn test_shaper_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QueryShaper>();
    }
}
