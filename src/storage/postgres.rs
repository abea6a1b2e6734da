//! PostgreSQL binding of shaped queries using sqlx.
//!
//! Appends the WHERE, ORDER BY, LIMIT and OFFSET parts of a
//! [`QueryDescriptor`] to a `sqlx::QueryBuilder<Postgres>`, binding every
//! request-derived value with its native type.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! sortable-rs = { version = "0.1", features = ["postgres"] }
//! ```

use sqlx::{Postgres, QueryBuilder};

use crate::core::condition::{BindValue, Conditions};
use crate::core::query::QueryDescriptor;

/// Append ` WHERE (..) AND (..)`, nothing when there are no conditions
pub fn push_where<'args>(builder: &mut QueryBuilder<'args, Postgres>, conditions: &Conditions) {
    for (i, condition) in conditions.iter().enumerate() {
        builder.push(if i == 0 { " WHERE (" } else { " AND (" });

        // segments and binds line up, `Condition` checks it on construction
        let mut binds = condition.binds().iter();
        for (i, segment) in condition.segments().iter().enumerate() {
            if i > 0 {
                if let Some(value) = binds.next() {
                    push_bind_value(builder, value.clone());
                }
            }
            builder.push(segment);
        }

        builder.push(")");
    }
}

/// Append the filtering, ordering and paging of a descriptor
pub fn push_descriptor<'args>(
    builder: &mut QueryBuilder<'args, Postgres>,
    descriptor: &QueryDescriptor,
) {
    push_where(builder, &descriptor.conditions);
    builder.push(" ORDER BY ");
    builder.push(&descriptor.order_by);
    builder.push(" LIMIT ");
    builder.push_bind(descriptor.limit() as i64);
    builder.push(" OFFSET ");
    builder.push_bind(descriptor.offset() as i64);
}

fn push_bind_value<'args>(builder: &mut QueryBuilder<'args, Postgres>, value: BindValue) {
    match value {
        BindValue::Text(s) => builder.push_bind(s),
        BindValue::Integer(i) => builder.push_bind(i),
        BindValue::Float(x) => builder.push_bind(x),
        BindValue::Date(d) => builder.push_bind(d),
        BindValue::DateTime(dt) => builder.push_bind(dt),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;
    use crate::core::filter::{ColumnType, FilterRuleConfig};
    use crate::core::params::RequestParams;
    use crate::core::shaper::QueryShaper;
    use crate::core::sort::{DefaultSort, SortDirection, SortTarget};

    #[test]
    fn test_push_descriptor_numbers_placeholders() {
        let config = TableConfig::new("users")
            .with_sort("name", vec![SortTarget::asc("users.name")])
            .with_default_sort(DefaultSort::new("name", SortDirection::Asc))
            .with_search_columns(["users.name"])
            .with_filter(
                FilterRuleConfig::new("status", "users.status").typed(ColumnType::Numeric),
            );
        let shaper = QueryShaper::new(config).unwrap();
        let descriptor = shaper
            .shape(&RequestParams::from_pairs([("q", "jo"), ("status", "2")]))
            .unwrap();

        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM users");
        push_descriptor(&mut builder, &descriptor);

        assert_eq!(
            builder.sql(),
            "SELECT * FROM users WHERE ((users.name ILIKE $1)) AND (users.status = $2) \
             ORDER BY users.name ASC LIMIT $3 OFFSET $4"
        );
    }

    #[test]
    fn test_push_where_unescapes_literal_question_mark() {
        use crate::core::condition::Condition;

        let mut conditions = Conditions::new();
        conditions.push(Condition::raw("users.tags ?? 'admin'").unwrap());
        conditions.push(Condition::new("users.name ILIKE ?", vec!["%jo%".into()]).unwrap());

        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM users");
        push_where(&mut builder, &conditions);
        assert_eq!(
            builder.sql(),
            "SELECT * FROM users WHERE (users.tags ? 'admin') AND (users.name ILIKE $1)"
        );
    }

    #[test]
    fn test_push_where_without_conditions() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1");
        push_where(&mut builder, &Conditions::new());
        assert_eq!(builder.sql(), "SELECT 1");
    }
}
