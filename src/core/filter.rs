//! Structured per-column filters
//!
//! Each [`FilterRule`] binds a request parameter to a physical column. The
//! column's [`ColumnType`] is decided once, when the shaper is built, from an
//! explicit type on the rule or from a [`ColumnTypeSource`] such as
//! [`SchemaCatalog`]. Unknown columns compare as strings.

use crate::core::condition::{BindValue, Condition};
use crate::core::error::FilterError;
use crate::core::params::RequestParams;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Comparison semantics of a filtered column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Case-insensitive substring match
    #[default]
    #[serde(alias = "text", alias = "varchar")]
    String,
    /// Day equality
    Date,
    /// Day equality, accepting a time of day in the value
    #[serde(alias = "timestamp")]
    DateTime,
    /// Numeric equality
    #[serde(alias = "integer", alias = "decimal", alias = "float")]
    Numeric,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::Numeric => "numeric",
        }
    }
}

/// Anything that can tell the type of a `table.column`
pub trait ColumnTypeSource {
    fn column_type(&self, column: &str) -> Option<ColumnType>;
}

impl ColumnTypeSource for HashMap<String, ColumnType> {
    fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.get(column).copied()
    }
}

/// Statically declared column types, keyed by `table.column`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaCatalog {
    columns: IndexMap<String, ColumnType>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the type of a `table.column`
    pub fn with(mut self, column: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.insert(column.into(), column_type);
        self
    }

    /// Declare several columns of one table
    pub fn with_table<'a>(
        mut self,
        table: &str,
        columns: impl IntoIterator<Item = (&'a str, ColumnType)>,
    ) -> Self {
        for (column, column_type) in columns {
            self.columns
                .insert(format!("{}.{}", table, column), column_type);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl ColumnTypeSource for SchemaCatalog {
    fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.columns.get(column).copied()
    }
}

/// Declarative filter rule as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRuleConfig {
    /// Request parameter name
    pub key: String,
    /// Physical column, `table.column` or a column of the default table
    pub column: String,
    /// Explicit type, overrides the catalog
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,
}

impl FilterRuleConfig {
    pub fn new(key: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            column: column.into(),
            column_type: None,
        }
    }

    pub fn typed(mut self, column_type: ColumnType) -> Self {
        self.column_type = Some(column_type);
        self
    }
}

/// A filter rule with its column type resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterRule {
    pub key: String,
    pub column: String,
    pub column_type: ColumnType,
}

impl FilterRule {
    /// Resolve the column type of a configured rule
    ///
    /// Unqualified columns are looked up as `default_table.column`.
    pub fn resolve(
        config: &FilterRuleConfig,
        source: &dyn ColumnTypeSource,
        default_table: Option<&str>,
    ) -> Self {
        let column_type = config.column_type.or_else(|| {
            let qualified = match (config.column.contains('.'), default_table) {
                (false, Some(table)) => format!("{}.{}", table, config.column),
                _ => config.column.clone(),
            };
            source.column_type(&qualified)
        });

        let column_type = column_type.unwrap_or_else(|| {
            tracing::debug!(
                filter = %config.key,
                column = %config.column,
                "column type unknown, comparing as string"
            );
            ColumnType::String
        });

        Self {
            key: config.key.clone(),
            column: config.column.clone(),
            column_type,
        }
    }

    /// Build the condition for a non-blank request value
    ///
    /// Date and datetime filters both match on the calendar day. A datetime
    /// value may carry a time of day, but only its date is compared.
    pub fn condition(&self, value: &str) -> Result<Condition, FilterError> {
        let (template, bind) = match self.column_type {
            ColumnType::String => (
                format!("{} ILIKE ?", self.column),
                BindValue::Text(format!("%{}%", value)),
            ),
            ColumnType::Date => (
                format!("date({}) = ?", self.column),
                BindValue::Date(self.parse(value, parse_date)?),
            ),
            ColumnType::DateTime => (
                format!("date({}) = ?", self.column),
                BindValue::Date(self.parse(value, parse_datetime)?.date()),
            ),
            ColumnType::Numeric => (
                format!("{} = ?", self.column),
                self.parse(value, parse_numeric)?,
            ),
        };
        Ok(Condition::bound(template, vec![bind]))
    }

    fn parse<T>(&self, value: &str, parser: fn(&str) -> Option<T>) -> Result<T, FilterError> {
        parser(value.trim()).ok_or_else(|| FilterError::ParseError {
            key: self.key.clone(),
            value: value.to_string(),
            expected: self.column_type.as_str().to_string(),
        })
    }
}

/// One condition per rule whose parameter is present and non-blank, in rule order
pub fn filter_conditions(
    params: &RequestParams,
    rules: &[FilterRule],
) -> Result<Vec<Condition>, FilterError> {
    let mut conditions = Vec::new();
    for rule in rules {
        let Some(value) = params.get(&rule.key) else {
            continue;
        };
        conditions.push(rule.condition(value)?);
    }
    Ok(conditions)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%Y%m%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| parse_datetime_only(value).map(|dt| dt.date()))
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    parse_datetime_only(value).or_else(|| {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

fn parse_datetime_only(value: &str) -> Option<NaiveDateTime> {
    // keep the wall time the caller wrote, not its UTC equivalent
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn parse_numeric(value: &str) -> Option<BindValue> {
    if let Ok(i) = value.parse::<i64>() {
        return Some(BindValue::Integer(i));
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
        .map(BindValue::Float)
}
