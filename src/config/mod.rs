//! Table configuration loading and validation

use crate::core::error::{ConfigError, SortableError, SortableResult};
use crate::core::filter::{FilterRuleConfig, SchemaCatalog};
use crate::core::params::{
    LETTER_PARAM, PAGE_PARAM, QUERY_PARAM, SECONDARY_SORT_PARAM, SORT_PARAM,
};
use crate::core::sort::{DefaultSort, SortMap, SortTarget};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Records per page when none is configured
pub const DEFAULT_PER_PAGE: u32 = 10;
/// Upper bound applied to per-page overrides
pub const DEFAULT_MAX_PER_PAGE: u32 = 100;

/// A column heading and the sort key its link requests
///
/// Deserializes from `["Name", "name"]` or `{ label: Name, sort_key: name }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TableHeadingRepr")]
pub struct TableHeading {
    pub label: String,
    pub sort_key: String,
}

impl TableHeading {
    pub fn new(label: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sort_key: sort_key.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TableHeadingRepr {
    Pair(String, String),
    Full { label: String, sort_key: String },
}

impl From<TableHeadingRepr> for TableHeading {
    fn from(repr: TableHeadingRepr) -> Self {
        match repr {
            TableHeadingRepr::Pair(label, sort_key) => TableHeading::new(label, sort_key),
            TableHeadingRepr::Full { label, sort_key } => TableHeading::new(label, sort_key),
        }
    }
}

/// Complete configuration of one sortable table
///
/// # Example
/// ```yaml
/// table: users
/// headings:
///   - [Name, name]
///   - [Status, status]
///   - [Role, role]
/// sort_map:
///   name: [users.name]
///   status: [[users.status, DESC], [users.created_at, ASC]]
///   role: [roles.role]
/// default_sort: [name, ASC]
/// per_page: 25
/// search_columns: [users.name, users.email]
/// filters:
///   - { key: status, column: users.status }
///   - { key: signed_up, column: users.created_at, type: date }
/// letter_column: users.name
/// include_relations: [role]
/// column_types:
///   users.status: numeric
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Default table, used to qualify bare filter columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    /// Column headings (default: one per sort map key, humanized)
    #[serde(default)]
    pub headings: Vec<TableHeading>,

    /// Logical sort key -> physical targets
    #[serde(default)]
    pub sort_map: SortMap,

    /// Ordering without a `sort` parameter (default `id DESC`)
    #[serde(default)]
    pub default_sort: DefaultSort,

    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,

    /// Columns searched by `q` (default: first target of each sort entry,
    /// an explicit empty list disables search)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_columns: Option<Vec<String>>,

    #[serde(default)]
    pub filters: Vec<FilterRuleConfig>,

    /// Column matched by the `letter` parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_column: Option<String>,

    /// Relations eagerly loaded alongside the rows
    #[serde(default)]
    pub include_relations: Vec<String>,

    /// Relations joined into the query (take precedence over includes)
    #[serde(default)]
    pub join_relations: Vec<String>,

    /// Declared column types used to resolve filter comparisons
    #[serde(default)]
    pub column_types: SchemaCatalog,
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_max_per_page() -> u32 {
    DEFAULT_MAX_PER_PAGE
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            table: None,
            headings: Vec::new(),
            sort_map: SortMap::new(),
            default_sort: DefaultSort::default(),
            per_page: DEFAULT_PER_PAGE,
            max_per_page: DEFAULT_MAX_PER_PAGE,
            search_columns: None,
            filters: Vec::new(),
            letter_column: None,
            include_relations: Vec::new(),
            join_relations: Vec::new(),
            column_types: SchemaCatalog::new(),
        }
    }
}

impl TableConfig {
    /// Empty configuration for a table
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            ..Self::default()
        }
    }

    /// Configuration derived from a table's column names
    ///
    /// Every displayed column gets a humanized heading and a
    /// `table.column DESC` sort entry. `display` restricts and keeps the
    /// columns in table order; `None` displays all of them.
    pub fn from_columns(table: &str, columns: &[&str], display: Option<&[&str]>) -> Self {
        let mut config = Self::new(table);
        for column in columns {
            if display.is_some_and(|d| !d.contains(column)) {
                continue;
            }
            config
                .headings
                .push(TableHeading::new(humanize(column), *column));
            config.sort_map.insert(
                *column,
                vec![SortTarget::desc(format!("{}.{}", table, column))],
            );
        }
        config
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> SortableResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| {
            SortableError::Config(ConfigError::ParseError {
                file: Some(path.to_string()),
                message: e.to_string(),
            })
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> SortableResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn with_heading(mut self, label: impl Into<String>, sort_key: impl Into<String>) -> Self {
        self.headings.push(TableHeading::new(label, sort_key));
        self
    }

    pub fn with_sort(mut self, key: impl Into<String>, targets: Vec<SortTarget>) -> Self {
        self.sort_map.insert(key, targets);
        self
    }

    pub fn with_default_sort(mut self, default_sort: DefaultSort) -> Self {
        self.default_sort = default_sort;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_search_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_filter(mut self, rule: FilterRuleConfig) -> Self {
        self.filters.push(rule);
        self
    }

    pub fn with_letter_column(mut self, column: impl Into<String>) -> Self {
        self.letter_column = Some(column.into());
        self
    }

    pub fn with_includes<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_relations = relations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_joins<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.join_relations = relations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_column_types(mut self, catalog: SchemaCatalog) -> Self {
        self.column_types = catalog;
        self
    }

    /// Headings to render, defaulting to one per sort key
    pub fn effective_headings(&self) -> Vec<TableHeading> {
        if !self.headings.is_empty() {
            return self.headings.clone();
        }
        self.sort_map
            .keys()
            .map(|key| TableHeading::new(humanize(key), key))
            .collect()
    }

    /// Columns searched by `q`
    pub fn effective_search_columns(&self) -> Vec<String> {
        match &self.search_columns {
            Some(columns) => columns.clone(),
            None => self
                .sort_map
                .iter()
                .filter_map(|(_, targets)| targets.first().map(|t| t.column.clone()))
                .collect(),
        }
    }

    /// Check the configuration for mistakes that would only surface per request
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sort_map.validate()?;

        if !self.sort_map.contains_key(&self.default_sort.key) {
            return Err(ConfigError::UnknownSortKey {
                key: self.default_sort.key.clone(),
                context: "default_sort".to_string(),
            });
        }

        for heading in &self.headings {
            if !self.sort_map.contains_key(&heading.sort_key) {
                return Err(ConfigError::UnknownSortKey {
                    key: heading.sort_key.clone(),
                    context: format!("heading '{}'", heading.label),
                });
            }
        }

        if self.per_page == 0 {
            return Err(ConfigError::InvalidValue {
                field: "per_page".to_string(),
                value: "0".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_per_page < self.per_page {
            return Err(ConfigError::InvalidValue {
                field: "max_per_page".to_string(),
                value: self.max_per_page.to_string(),
                message: format!("must be at least per_page ({})", self.per_page),
            });
        }

        for (_, targets) in self.sort_map.iter() {
            for target in targets {
                check_identifier("sort_map", &target.column)?;
            }
        }
        for column in self.effective_search_columns() {
            check_identifier("search_columns", &column)?;
        }
        if let Some(column) = &self.letter_column {
            check_identifier("letter_column", column)?;
        }

        let reserved = [
            SORT_PARAM,
            SECONDARY_SORT_PARAM,
            QUERY_PARAM,
            LETTER_PARAM,
            PAGE_PARAM,
        ];
        let mut seen = HashSet::new();
        for rule in &self.filters {
            check_identifier("filters", &rule.column)?;
            if reserved.contains(&rule.key.as_str()) || !seen.insert(rule.key.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "filters".to_string(),
                    value: rule.key.clone(),
                    message: "filter keys must be unique and not reserved".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Turn a column name into a heading label (`created_at` -> `Created at`)
pub fn humanize(column: &str) -> String {
    let base = column.strip_suffix("_id").unwrap_or(column);
    let spaced = base.replace('_', " ").trim().to_lowercase();
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Column references are spliced into SQL, so only plain identifiers
/// (`col`, `table.col`, `fn(table.col)`) are accepted
fn check_identifier(field: &str, column: &str) -> Result<(), ConfigError> {
    static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = IDENTIFIER_REGEX.get_or_init(|| {
        let ident = r"[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*";
        Regex::new(&format!(
            r"^(?:{ident}|[A-Za-z_][A-Za-z0-9_]*\({ident}\))$"
        ))
        .expect("identifier regex is valid")
    });

    if regex.is_match(column) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: column.to_string(),
            message: "not a valid column reference".to_string(),
        })
    }
}
