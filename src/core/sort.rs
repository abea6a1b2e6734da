//! Sort key resolution
//!
//! Logical sort keys coming from the request are mapped to one or more
//! physical `(column, direction)` targets. A trailing `_reverse` on the key
//! inverts every direction of the entry, which is how table headings toggle.

use crate::core::error::{ConfigError, SortError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Suffix that inverts the directions of a sort map entry
pub const REVERSE_SUFFIX: &str = "_reverse";

/// Direction of a single ORDER BY target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn inverted(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SortDirection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(ConfigError::InvalidValue {
                field: "direction".to_string(),
                value: s.to_string(),
                message: "expected ASC or DESC".to_string(),
            }),
        }
    }
}

impl TryFrom<String> for SortDirection {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortDirection> for String {
    fn from(direction: SortDirection) -> Self {
        direction.as_sql().to_string()
    }
}

/// One physical ordering target of a sort map entry
///
/// Deserializes from `"users.name"`, `["users.name", "asc"]` or
/// `{ column: users.name, direction: ASC }`. Direction defaults to DESC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SortTargetRepr")]
pub struct SortTarget {
    pub column: String,
    pub direction: SortDirection,
}

impl SortTarget {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Asc)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Desc)
    }

    fn inverted(&self) -> Self {
        Self::new(self.column.clone(), self.direction.inverted())
    }

    fn to_sql(&self) -> String {
        format!("{} {}", self.column, self.direction)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SortTargetRepr {
    Column(String),
    Seq(Vec<String>),
    Full {
        column: String,
        #[serde(default)]
        direction: Option<String>,
    },
}

impl TryFrom<SortTargetRepr> for SortTarget {
    type Error = ConfigError;

    fn try_from(repr: SortTargetRepr) -> Result<Self, Self::Error> {
        let (column, direction) = match repr {
            SortTargetRepr::Column(column) => (column, None),
            SortTargetRepr::Full { column, direction } => (column, direction),
            SortTargetRepr::Seq(parts) => {
                let mut parts = parts.into_iter();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(column), direction, None) => (column, direction),
                    _ => {
                        return Err(ConfigError::InvalidValue {
                            field: "sort_map".to_string(),
                            value: "[..]".to_string(),
                            message: "expected [column] or [column, direction]".to_string(),
                        });
                    }
                }
            }
        };

        let direction = match direction {
            Some(d) => d.parse()?,
            None => SortDirection::default(),
        };
        Ok(SortTarget::new(column, direction))
    }
}

/// Ordering applied when the request carries no `sort` parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DefaultSortRepr")]
pub struct DefaultSort {
    pub key: String,
    pub direction: SortDirection,
}

impl DefaultSort {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }
}

impl Default for DefaultSort {
    fn default() -> Self {
        Self::new("id", SortDirection::Desc)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DefaultSortRepr {
    Pair(String, String),
    Full {
        key: String,
        #[serde(default)]
        direction: Option<String>,
    },
}

impl TryFrom<DefaultSortRepr> for DefaultSort {
    type Error = ConfigError;

    fn try_from(repr: DefaultSortRepr) -> Result<Self, Self::Error> {
        let (key, direction) = match repr {
            DefaultSortRepr::Pair(key, direction) => (key, Some(direction)),
            DefaultSortRepr::Full { key, direction } => (key, direction),
        };
        let direction = match direction {
            Some(d) => d.parse()?,
            None => SortDirection::default(),
        };
        Ok(DefaultSort::new(key, direction))
    }
}

/// Visual hint for the active column heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortIndicator {
    /// Clicking the heading will sort ascending
    #[serde(rename = "sort-ascending-hint")]
    AscendingHint,
    /// Clicking the heading will sort descending
    #[serde(rename = "sort-descending-hint")]
    DescendingHint,
}

impl SortIndicator {
    pub fn css_class(self) -> &'static str {
        match self {
            SortIndicator::AscendingHint => "sort-ascending-hint",
            SortIndicator::DescendingHint => "sort-descending-hint",
        }
    }
}

/// Split a requested key into its map key and whether it is reversed
///
/// Only one trailing `_reverse` is stripped.
pub fn split_sort_key(key: &str) -> (&str, bool) {
    match key.strip_suffix(REVERSE_SUFFIX) {
        Some(map_key) => (map_key, true),
        None => (key, false),
    }
}

/// A sort key resolved against the sort map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSort {
    /// The key as requested, including any `_reverse` suffix
    pub key: String,
    /// The key used for the map lookup
    pub map_key: String,
    pub reversed: bool,
    /// Targets with inversion already applied
    pub targets: Vec<SortTarget>,
}

impl ResolvedSort {
    pub fn to_sql(&self) -> String {
        self.targets
            .iter()
            .map(SortTarget::to_sql)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Direction of the first target
    pub fn direction(&self) -> SortDirection {
        self.targets
            .first()
            .map(|t| t.direction)
            .unwrap_or_default()
    }
}

/// Ordered mapping from logical sort key to physical targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortMap {
    entries: IndexMap<String, Vec<SortTarget>>,
}

impl SortMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry
    pub fn insert(&mut self, key: impl Into<String>, targets: Vec<SortTarget>) {
        self.entries.insert(key.into(), targets);
    }

    /// Builder-style [`SortMap::insert`]
    pub fn with(mut self, key: impl Into<String>, targets: Vec<SortTarget>) -> Self {
        self.insert(key, targets);
        self
    }

    pub fn get(&self, key: &str) -> Option<&[SortTarget]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SortTarget])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reject entries without targets
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.entries.iter().find(|(_, targets)| targets.is_empty()) {
            Some((key, _)) => Err(ConfigError::EmptySortTargets { key: key.clone() }),
            None => Ok(()),
        }
    }

    /// Resolve a requested key, `param` names the request parameter for errors
    pub fn resolve(&self, key: &str, param: &str) -> Result<ResolvedSort, SortError> {
        let (map_key, reversed) = split_sort_key(key);

        let declared = self
            .entries
            .get(map_key)
            .filter(|targets| !targets.is_empty())
            .ok_or_else(|| SortError::InvalidSortKey {
                param: param.to_string(),
                key: key.to_string(),
            })?;

        let targets = if reversed {
            declared.iter().map(SortTarget::inverted).collect()
        } else {
            declared.clone()
        };

        Ok(ResolvedSort {
            key: key.to_string(),
            map_key: map_key.to_string(),
            reversed,
            targets,
        })
    }

    /// Resolve the default sort
    ///
    /// Declared targets are kept when the default direction matches the first
    /// target's direction and all inverted otherwise.
    pub fn resolve_default(&self, default: &DefaultSort) -> Result<ResolvedSort, SortError> {
        let declared = self.resolve(&default.key, "default_sort")?;
        if declared.direction() == default.direction {
            return Ok(declared);
        }

        Ok(ResolvedSort {
            targets: declared.targets.iter().map(SortTarget::inverted).collect(),
            ..declared
        })
    }
}

/// Sort state exposed to the rendering layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortState {
    /// Sort key currently in effect (raw request key, or default key)
    pub active_sort_key: String,
    /// Direction of the first resolved target
    pub active_direction: SortDirection,
    /// Key a link on the active heading should request to toggle the order
    pub toggle_key: String,
    pub indicator: SortIndicator,
    /// Whether no `sort` parameter was given
    pub is_default: bool,
    /// Raw secondary key, when one was applied
    pub secondary_sort_key: Option<String>,
}

/// Result of resolving the sort parameters of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortResolution {
    pub order_by: String,
    pub primary: ResolvedSort,
    pub secondary: Option<ResolvedSort>,
    pub state: SortState,
}

/// Resolve `sort`/`secondary_sort` into an ORDER BY clause and UI state
pub fn resolve_sort(
    sort: Option<&str>,
    secondary_sort: Option<&str>,
    sort_map: &SortMap,
    default_sort: &DefaultSort,
) -> Result<SortResolution, SortError> {
    let (primary, toggle_key, indicator, is_default) = match sort {
        None => {
            let primary = sort_map.resolve_default(default_sort)?;
            let (toggle_key, indicator) = match default_sort.direction {
                SortDirection::Desc => (
                    format!("{}{}", default_sort.key, REVERSE_SUFFIX),
                    SortIndicator::AscendingHint,
                ),
                SortDirection::Asc => (default_sort.key.clone(), SortIndicator::DescendingHint),
            };
            (primary, toggle_key, indicator, true)
        }
        Some(key) => {
            let primary = sort_map.resolve(key, "sort")?;
            let (toggle_key, indicator) = if primary.reversed {
                (primary.map_key.clone(), SortIndicator::DescendingHint)
            } else {
                (
                    format!("{}{}", primary.map_key, REVERSE_SUFFIX),
                    SortIndicator::AscendingHint,
                )
            };
            (primary, toggle_key, indicator, false)
        }
    };

    let secondary = secondary_sort
        .map(|key| sort_map.resolve(key, "secondary_sort"))
        .transpose()?;

    let mut order_by = primary.to_sql();
    if let Some(secondary) = &secondary {
        order_by.push_str(", ");
        order_by.push_str(&secondary.to_sql());
    }

    tracing::debug!(
        sort = %primary.key,
        secondary = secondary.as_ref().map(|s| s.key.as_str()),
        order_by = %order_by,
        "resolved sort"
    );

    let state = SortState {
        active_sort_key: primary.key.clone(),
        active_direction: primary.direction(),
        toggle_key,
        indicator,
        is_default,
        secondary_sort_key: secondary.as_ref().map(|s| s.key.clone()),
    };

    Ok(SortResolution {
        order_by,
        primary,
        secondary,
        state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sort_map() -> SortMap {
        SortMap::new()
            .with("name", vec![SortTarget::desc("name")])
            .with(
                "status",
                vec![
                    SortTarget::desc("users.status"),
                    SortTarget::asc("users.created_at"),
                ],
            )
    }

    #[test]
    fn test_direction_parse_is_case_insensitive() {
        assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert_eq!(" Desc ".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("sideways".parse::<SortDirection>().is_err());
    }

    #[test]
    fn test_split_sort_key_strips_one_suffix() {
        assert_eq!(split_sort_key("name"), ("name", false));
        assert_eq!(split_sort_key("name_reverse"), ("name", true));
        assert_eq!(split_sort_key("name_reverse_reverse"), ("name_reverse", true));
    }

    #[test]
    fn test_default_sort_without_params() {
        let resolved = resolve_sort(
            None,
            None,
            &sort_map(),
            &DefaultSort::new("name", SortDirection::Desc),
        )
        .unwrap();
        assert_eq!(resolved.order_by, "name DESC");
        assert_eq!(resolved.state.active_sort_key, "name");
        assert_eq!(resolved.state.toggle_key, "name_reverse");
        assert_eq!(resolved.state.indicator, SortIndicator::AscendingHint);
        assert!(resolved.state.is_default);
    }

    #[test]
    fn test_default_sort_ascending_inverts_targets() {
        let resolved = resolve_sort(
            None,
            None,
            &sort_map(),
            &DefaultSort::new("status", SortDirection::Asc),
        )
        .unwrap();
        assert_eq!(resolved.order_by, "users.status ASC, users.created_at DESC");
        assert_eq!(resolved.state.toggle_key, "status");
        assert_eq!(resolved.state.indicator, SortIndicator::DescendingHint);
    }

    #[test]
    fn test_reverse_inverts_every_target() {
        let map = sort_map();
        let default = DefaultSort::new("name", SortDirection::Desc);

        let forward = resolve_sort(Some("status"), None, &map, &default).unwrap();
        assert_eq!(forward.order_by, "users.status DESC, users.created_at ASC");
        assert_eq!(forward.state.toggle_key, "status_reverse");

        let reverse = resolve_sort(Some("status_reverse"), None, &map, &default).unwrap();
        assert_eq!(reverse.order_by, "users.status ASC, users.created_at DESC");
        assert_eq!(reverse.state.active_sort_key, "status_reverse");
        assert_eq!(reverse.state.toggle_key, "status");
        assert_eq!(reverse.state.indicator, SortIndicator::DescendingHint);
    }

    #[test]
    fn test_secondary_sort_appended() {
        let resolved = resolve_sort(
            Some("name_reverse"),
            Some("status"),
            &sort_map(),
            &DefaultSort::new("name", SortDirection::Desc),
        )
        .unwrap();
        assert_eq!(
            resolved.order_by,
            "name ASC, users.status DESC, users.created_at ASC"
        );
        assert_eq!(resolved.state.secondary_sort_key.as_deref(), Some("status"));
    }

    #[test]
    fn test_unknown_keys_are_errors() {
        let map = sort_map();
        let default = DefaultSort::new("name", SortDirection::Desc);

        let err = resolve_sort(Some("bogus"), None, &map, &default).unwrap_err();
        assert_eq!(
            err,
            SortError::InvalidSortKey {
                param: "sort".to_string(),
                key: "bogus".to_string()
            }
        );

        let err = resolve_sort(Some("name"), Some("bogus_reverse"), &map, &default).unwrap_err();
        assert!(matches!(err, SortError::InvalidSortKey { ref param, .. } if param == "secondary_sort"));
    }

    #[test]
    fn test_empty_targets_rejected() {
        let map = sort_map().with("broken", vec![]);
        assert_eq!(
            map.validate(),
            Err(ConfigError::EmptySortTargets {
                key: "broken".to_string()
            })
        );
    }

    #[test]
    fn test_sort_target_yaml_forms() {
        let targets: Vec<SortTarget> = serde_yaml::from_str(
            r#"
- users.name
- [users.status, asc]
- { column: users.created_at, direction: Desc }
"#,
        )
        .unwrap();
        assert_eq!(
            targets,
            vec![
                SortTarget::desc("users.name"),
                SortTarget::asc("users.status"),
                SortTarget::desc("users.created_at"),
            ]
        );
    }

    #[test]
    fn test_default_sort_yaml_forms() {
        let pair: DefaultSort = serde_yaml::from_str("[name, ASC]").unwrap();
        assert_eq!(pair, DefaultSort::new("name", SortDirection::Asc));
        let full: DefaultSort = serde_yaml::from_str("{ key: role }").unwrap();
        assert_eq!(full, DefaultSort::new("role", SortDirection::Desc));
    }
}
