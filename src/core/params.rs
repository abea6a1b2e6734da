//! Request parameter bag consumed by the query shaper

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Parameter carrying the primary sort key
pub const SORT_PARAM: &str = "sort";
/// Parameter carrying the secondary sort key
pub const SECONDARY_SORT_PARAM: &str = "secondary_sort";
/// Parameter carrying the free-text search query
pub const QUERY_PARAM: &str = "q";
/// Parameter carrying the selected letter
pub const LETTER_PARAM: &str = "letter";
/// Parameter carrying the page number
pub const PAGE_PARAM: &str = "page";

/// A single request parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Multiple(Vec<String>),
}

impl ParamValue {
    /// First non-blank value, if any
    pub fn first_present(&self) -> Option<&str> {
        match self {
            ParamValue::Single(s) => Some(s.as_str()).filter(|s| !is_blank(s)),
            ParamValue::Multiple(values) => {
                values.iter().map(String::as_str).find(|s| !is_blank(s))
            }
        }
    }

    /// All values in the order they were received
    pub fn values(&self) -> Vec<&str> {
        match self {
            ParamValue::Single(s) => vec![s.as_str()],
            ParamValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            ParamValue::Single(existing) => {
                *self = ParamValue::Multiple(vec![std::mem::take(existing), value]);
            }
            ParamValue::Multiple(values) => values.push(value),
        }
    }
}

/// Read-only bag of query parameters
///
/// Keys keep the order in which they were first seen. Repeated keys and
/// `key[]` keys collapse into [`ParamValue::Multiple`].
///
/// # Example
/// ```rust
/// use sortable::core::params::RequestParams;
///
/// let params = RequestParams::from_pairs([("sort", "name_reverse"), ("q", "  ")]);
/// assert_eq!(params.sort(), Some("name_reverse"));
/// assert_eq!(params.query(), None); // blank is absent
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParams {
    values: IndexMap<String, ParamValue>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bag from decoded `(key, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.append(key, value);
        }
        params
    }

    /// Add a value, turning repeated keys into a multi-valued parameter
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let key = match key.strip_suffix("[]") {
            Some(stripped) => stripped.to_string(),
            None => key,
        };
        let value = value.into();

        match self.values.get_mut(&key) {
            Some(existing) => existing.push(value),
            None => {
                self.values.insert(key, ParamValue::Single(value));
            }
        }
    }

    /// Raw value for a key
    pub fn raw(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// First non-blank value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(ParamValue::first_present)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn sort(&self) -> Option<&str> {
        self.get(SORT_PARAM)
    }

    pub fn secondary_sort(&self) -> Option<&str> {
        self.get(SECONDARY_SORT_PARAM)
    }

    pub fn query(&self) -> Option<&str> {
        self.get(QUERY_PARAM)
    }

    pub fn letter(&self) -> Option<&str> {
        self.get(LETTER_PARAM)
    }

    /// Requested page, starting at 1
    ///
    /// Missing, unparsable and zero pages all resolve to the first page.
    pub fn page(&self) -> u32 {
        self.get(PAGE_PARAM)
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1)
    }

    /// Copy of the bag without the given keys
    pub fn without(&self, keys: &[&str]) -> Self {
        Self {
            values: self
                .values
                .iter()
                .filter(|(k, _)| !keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RequestParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Blank means empty or whitespace only
pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_are_absent() {
        let params = RequestParams::from_pairs([("q", ""), ("letter", "   "), ("sort", "name")]);
        assert_eq!(params.query(), None);
        assert_eq!(params.letter(), None);
        assert_eq!(params.sort(), Some("name"));
        assert!(params.contains_key("q"));
    }

    #[test]
    fn test_repeated_keys_become_multiple() {
        let params = RequestParams::from_pairs([
            ("status[]", ""),
            ("status[]", "2"),
            ("status", "3"),
        ]);
        assert_eq!(
            params.raw("status"),
            Some(&ParamValue::Multiple(vec![
                "".to_string(),
                "2".to_string(),
                "3".to_string()
            ]))
        );
        assert_eq!(params.get("status"), Some("2"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_page_defaults_to_one() {
        assert_eq!(RequestParams::new().page(), 1);
        assert_eq!(RequestParams::from_pairs([("page", "0")]).page(), 1);
        assert_eq!(RequestParams::from_pairs([("page", "two")]).page(), 1);
        assert_eq!(RequestParams::from_pairs([("page", "4")]).page(), 4);
    }

    #[test]
    fn test_without_drops_keys() {
        let params = RequestParams::from_pairs([("sort", "bogus"), ("q", "jo")]);
        let trimmed = params.without(&[SORT_PARAM, SECONDARY_SORT_PARAM]);
        assert_eq!(trimmed.sort(), None);
        assert_eq!(trimmed.query(), Some("jo"));
        // original untouched
        assert_eq!(params.sort(), Some("bogus"));
    }

    #[test]
    fn test_deserialize_from_json_map() {
        let params: RequestParams =
            serde_json::from_value(serde_json::json!({ "sort": "name", "tags": ["a", "b"] }))
                .unwrap();
        assert_eq!(params.sort(), Some("name"));
        assert_eq!(params.raw("tags").map(ParamValue::values), Some(vec!["a", "b"]));
    }
}
