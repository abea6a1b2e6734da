//! Parameterized WHERE fragments
//!
//! A [`Condition`] is a SQL template whose only dynamic parts are `?`
//! placeholders, paired with the values bound to them. Templates are built
//! exclusively from configuration (column identifiers); request data only
//! ever reaches the database through [`BindValue`]s.

use crate::core::error::ConfigError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder marker used in condition templates
pub const PLACEHOLDER: char = '?';

/// A value bound to a `?` placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl BindValue {
    /// Get the value as a string if it is textual
    pub fn as_text(&self) -> Option<&str> {
        match self {
            BindValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for BindValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindValue::Text(s) => write!(f, "{}", s),
            BindValue::Integer(i) => write!(f, "{}", i),
            BindValue::Float(x) => write!(f, "{}", x),
            BindValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            BindValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<String> for BindValue {
    fn from(s: String) -> Self {
        BindValue::Text(s)
    }
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::Text(s.to_string())
    }
}

/// One parameterized WHERE fragment
///
/// A lone `?` in the template is a placeholder. `??` stands for a literal
/// `?`, such as the PostgreSQL jsonb key-exists operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCondition")]
pub struct Condition {
    template: String,
    binds: Vec<BindValue>,
}

#[derive(Deserialize)]
struct RawCondition {
    template: String,
    #[serde(default)]
    binds: Vec<BindValue>,
}

impl TryFrom<RawCondition> for Condition {
    type Error = ConfigError;

    fn try_from(raw: RawCondition) -> Result<Self, Self::Error> {
        Condition::new(raw.template, raw.binds)
    }
}

impl Condition {
    /// Create a condition, the number of placeholders in `template` must
    /// match `binds`
    ///
    /// # Example
    ///
    /// ```rust
    /// use sortable::prelude::*;
    ///
    /// let tagged = Condition::new("users.tags ?? 'admin' AND users.age > ?", vec![BindValue::Integer(18)]);
    /// assert!(tagged.is_ok());
    ///
    /// let unbound = Condition::raw("users.tags ? 'admin'");
    /// assert!(matches!(unbound, Err(ConfigError::PlaceholderMismatch { .. })));
    /// ```
    pub fn new(template: impl Into<String>, binds: Vec<BindValue>) -> Result<Self, ConfigError> {
        let condition = Self {
            template: template.into(),
            binds,
        };
        let placeholders = condition.placeholder_count();
        if placeholders != condition.binds.len() {
            return Err(ConfigError::PlaceholderMismatch {
                template: condition.template,
                placeholders,
                binds: condition.binds.len(),
            });
        }
        Ok(condition)
    }

    /// A condition without bind values (configuration-only SQL)
    pub fn raw(template: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(template, Vec::new())
    }

    /// Build a condition from a template made of validated identifiers
    pub(crate) fn bound(template: String, binds: Vec<BindValue>) -> Self {
        let condition = Self { template, binds };
        debug_assert_eq!(
            condition.placeholder_count(),
            condition.binds.len(),
            "placeholder/bind mismatch in '{}'",
            condition.template
        );
        condition
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }

    pub fn placeholder_count(&self) -> usize {
        self.segments().len() - 1
    }

    /// Bind values rendered as strings
    pub fn bind_strings(&self) -> Vec<String> {
        self.binds.iter().map(ToString::to_string).collect()
    }

    /// SQL text between placeholders, with `??` unescaped
    pub(crate) fn segments(&self) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = self.template.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != PLACEHOLDER {
                current.push(ch);
            } else if chars.peek() == Some(&PLACEHOLDER) {
                chars.next();
                current.push(PLACEHOLDER);
            } else {
                segments.push(std::mem::take(&mut current));
            }
        }
        segments.push(current);
        segments
    }

    fn render_numbered(&self, next: &mut usize) -> String {
        let mut out = String::with_capacity(self.template.len() + 8);
        for (i, segment) in self.segments().iter().enumerate() {
            if i > 0 {
                *next += 1;
                out.push('$');
                out.push_str(&next.to_string());
            }
            out.push_str(segment);
        }
        out
    }
}

/// How placeholders are written when rendering SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// `?` (MySQL, SQLite, ActiveRecord-style)
    #[default]
    Question,
    /// `$1`, `$2`, ... (PostgreSQL)
    Dollar,
}

/// Ordered list of conditions combined with `AND`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conditions(Vec<Condition>);

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, condition: Condition) {
        self.0.push(condition);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Condition> {
        self.0.iter()
    }

    /// Templates in composition order
    pub fn templates(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.template.as_str()).collect()
    }

    /// All bind values, in placeholder order
    pub fn binds(&self) -> Vec<&BindValue> {
        self.0.iter().flat_map(|c| c.binds.iter()).collect()
    }

    /// Combined WHERE body, or `None` when there is nothing to filter on
    ///
    /// Multiple fragments are each parenthesized and joined with `AND`.
    /// `Question` keeps templates verbatim, escapes included. `Dollar`
    /// numbers the placeholders across all fragments and unescapes `??`.
    pub fn to_sql(&self, style: PlaceholderStyle) -> Option<String> {
        let mut next = 0;
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|c| match style {
                PlaceholderStyle::Question => c.template.clone(),
                PlaceholderStyle::Dollar => c.render_numbered(&mut next),
            })
            .collect();

        match rendered.as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            many => Some(
                many.iter()
                    .map(|sql| format!("({})", sql))
                    .collect::<Vec<_>>()
                    .join(" AND "),
            ),
        }
    }
}

impl IntoIterator for Conditions {
    type Item = Condition;
    type IntoIter = std::vec::IntoIter<Condition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Conditions {
    type Item = &'a Condition;
    type IntoIter = std::slice::Iter<'a, Condition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
