//! Free-text search across several columns

use crate::core::condition::{BindValue, Condition};

/// Build the OR-group matching `query` as a substring of any column
///
/// Returns `None` for a blank query and for an empty column list. An empty
/// list means search is disabled for the table, so the query is ignored
/// instead of producing an empty or match-all group.
///
/// `%` and `_` in the query are not escaped and keep their LIKE meaning, so
/// `q=%` matches every row. They only widen the match, the value is still
/// bound and never reaches the SQL text.
pub fn search_condition(query: Option<&str>, columns: &[String]) -> Option<Condition> {
    let query = query.filter(|q| !q.trim().is_empty())?;

    if columns.is_empty() {
        tracing::debug!(query = %query, "search disabled for this table, ignoring query");
        return None;
    }

    let pattern = format!("%{}%", query);
    let template = columns
        .iter()
        .map(|column| format!("{} ILIKE ?", column))
        .collect::<Vec<_>>()
        .join(" OR ");
    let binds = columns
        .iter()
        .map(|_| BindValue::Text(pattern.clone()))
        .collect();

    Some(Condition::bound(format!("({})", template), binds))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        vec!["users.email".to_string(), "users.name".to_string()]
    }

    #[test]
    fn test_search_builds_or_group() {
        let condition = search_condition(Some("jo"), &columns()).unwrap();
        assert_eq!(
            condition.template(),
            "(users.email ILIKE ? OR users.name ILIKE ?)"
        );
        assert_eq!(condition.bind_strings(), vec!["%jo%", "%jo%"]);
    }

    #[test]
    fn test_blank_query_adds_nothing() {
        assert!(search_condition(None, &columns()).is_none());
        assert!(search_condition(Some(""), &columns()).is_none());
        assert!(search_condition(Some(" \t"), &columns()).is_none());
    }

    #[test]
    fn test_empty_column_list_disables_search() {
        assert!(search_condition(Some("jo"), &[]).is_none());
    }

    #[test]
    fn test_query_is_bound_not_interpolated() {
        let condition = search_condition(Some("' OR 1=1 --"), &columns()).unwrap();
        assert!(!condition.template().contains("OR 1=1"));
        assert_eq!(condition.bind_strings()[0], "%' OR 1=1 --%");
    }

    #[test]
    fn test_like_wildcards_pass_through() {
        let condition = search_condition(Some("50%_off"), &columns()).unwrap();
        assert_eq!(condition.bind_strings()[0], "%50%_off%");
    }
}
