//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from query descriptors.

use crate::model::{FieldSet, Filter, ModelConfig, QueryDescriptor, Record};
use serde_json::Value;
use std::collections::HashMap;

/// Table identity and column types for one model.
#[derive(Clone, Debug)]
pub struct TableSpec {
    pub schema: String,
    pub table: String,
    pub primary_key: String,
    /// Column name -> PostgreSQL type; used for `$n::type` casts.
    pub column_types: HashMap<String, String>,
}

impl TableSpec {
    pub fn from_model(config: &ModelConfig) -> Self {
        TableSpec {
            schema: config.schema.clone(),
            table: config.table.clone(),
            primary_key: config.primary_key.clone(),
            column_types: config.column_types(),
        }
    }

    fn qualified(&self) -> String {
        format!("{}.{}", quoted(&self.schema), quoted(&self.table))
    }

    fn pg_type(&self, column: &str) -> Option<&str> {
        self.column_types.get(column).map(String::as_str)
    }
}

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Bind `value` for `column`, cast to the column type when known. Nulls are inlined.
    fn placeholder(&mut self, spec: &TableSpec, column: &str, value: &Value) -> String {
        if value.is_null() {
            return "NULL".into();
        }
        let n = self.push_param(value.clone());
        spec.pg_type(column)
            .map(|t| format!("${}::{}", n, t))
            .unwrap_or_else(|| format!("${}", n))
    }
}

/// Column list for SELECT/RETURNING. Custom enums (schema.typename) and numeric are read back as text.
fn select_column_list(spec: &TableSpec, select: Option<&FieldSet>) -> String {
    let Some(fields) = select else {
        return "*".into();
    };
    fields
        .iter()
        .map(|name| {
            let q = quoted(name);
            let pg_type = spec.pg_type(name).unwrap_or("");
            if pg_type.contains('.') || pg_type == "numeric" {
                format!("{}::text AS {}", q, q)
            } else {
                q
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// ` WHERE a = $1 AND b IS NULL`, or empty when the filter is empty.
fn where_clause(q: &mut QueryBuf, spec: &TableSpec, filter: Option<&Filter>) -> String {
    let Some(filter) = filter else {
        return String::new();
    };
    let parts: Vec<String> = filter
        .iter()
        .map(|(col, val)| {
            if val.is_null() {
                format!("{} IS NULL", quoted(col))
            } else {
                format!("{} = {}", quoted(col), q.placeholder(spec, col, val))
            }
        })
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

fn order_clause(spec: &TableSpec, query: &QueryDescriptor) -> String {
    match &query.order_by {
        Some(order) if !order.is_empty() => {
            let parts: Vec<String> = order
                .iter()
                .map(|(f, d)| format!("{} {}", quoted(f), d.as_sql()))
                .collect();
            format!(" ORDER BY {}", parts.join(", "))
        }
        _ => format!(" ORDER BY {}", quoted(&spec.primary_key)),
    }
}

fn distinct_fields(query: &QueryDescriptor) -> Option<String> {
    query
        .distinct
        .as_ref()
        .filter(|d| !d.is_empty())
        .map(|d| d.iter().map(|f| quoted(f)).collect::<Vec<_>>().join(", "))
}

/// SELECT with optional filters, selection, ordering (default primary key), DISTINCT ON, LIMIT/OFFSET.
pub fn select(spec: &TableSpec, query: &QueryDescriptor) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = spec.qualified();
    let where_sql = where_clause(&mut q, spec, query.where_.as_ref());
    let order_sql = order_clause(spec, query);
    let cols = select_column_list(spec, query.select.as_ref());
    let limit_sql = query.take.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_sql = query.skip.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();

    let source = match distinct_fields(query) {
        // DISTINCT ON keeps the first row per group under the requested ordering.
        Some(d) => {
            let inner_order = match &query.order_by {
                Some(order) if !order.is_empty() => {
                    let rest: Vec<String> = order
                        .iter()
                        .map(|(f, dir)| format!("{} {}", quoted(f), dir.as_sql()))
                        .collect();
                    format!("{}, {}", d, rest.join(", "))
                }
                _ => format!("{}, {}", d, quoted(&spec.primary_key)),
            };
            format!(
                "(SELECT DISTINCT ON ({}) * FROM {}{} ORDER BY {}) AS sub",
                d, table, where_sql, inner_order
            )
        }
        None => format!("{}{}", table, where_sql),
    };

    q.sql = format!("SELECT {} FROM {}{}{}{}", cols, source, order_sql, limit_sql, offset_sql);
    q
}

/// COUNT(*) over the filtered rows, or over distinct groups when distinct is set.
pub fn count(spec: &TableSpec, query: &QueryDescriptor) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = spec.qualified();
    let where_sql = where_clause(&mut q, spec, query.where_.as_ref());
    q.sql = match distinct_fields(query) {
        Some(d) => format!(
            "SELECT COUNT(*) FROM (SELECT DISTINCT {} FROM {}{}) AS sub",
            d, table, where_sql
        ),
        None => format!("SELECT COUNT(*) FROM {}{}", table, where_sql),
    };
    q
}

/// INSERT the supplied fields, RETURNING the selection.
pub fn insert(spec: &TableSpec, data: &Record, select: Option<&FieldSet>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = spec.qualified();
    let returning = select_column_list(spec, select);
    if data.is_empty() {
        q.sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning);
        return q;
    }
    let mut cols = Vec::with_capacity(data.len());
    let mut placeholders = Vec::with_capacity(data.len());
    for (name, val) in data {
        cols.push(quoted(name));
        placeholders.push(q.placeholder(spec, name, val));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table,
        cols.join(", "),
        placeholders.join(", "),
        returning
    );
    q
}

/// UPDATE rows matching `filter`: SET only the supplied fields (never the primary key).
/// With nothing to set, selects the matching row instead.
pub fn update(spec: &TableSpec, filter: &Filter, data: &Record, select: Option<&FieldSet>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = spec.qualified();
    let returning = select_column_list(spec, select);
    let mut sets = Vec::new();
    for (k, v) in data {
        if *k == spec.primary_key {
            continue;
        }
        let rhs = q.placeholder(spec, k, v);
        sets.push(format!("{} = {}", quoted(k), rhs));
    }
    if sets.is_empty() {
        let where_sql = where_clause(&mut q, spec, Some(filter));
        q.sql = format!("SELECT {} FROM {}{} LIMIT 1", returning, table, where_sql);
        return q;
    }
    let where_sql = where_clause(&mut q, spec, Some(filter));
    q.sql = format!(
        "UPDATE {} SET {}{} RETURNING {}",
        table,
        sets.join(", "),
        where_sql,
        returning
    );
    q
}

/// DELETE rows matching `filter`, RETURNING them.
pub fn delete(spec: &TableSpec, filter: &Filter) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = spec.qualified();
    let where_sql = where_clause(&mut q, spec, Some(filter));
    q.sql = format!("DELETE FROM {}{} RETURNING *", table, where_sql);
    q
}

/// DELETE every row.
pub fn delete_all(spec: &TableSpec) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("DELETE FROM {}", spec.qualified());
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnSpec, SortDirection};
    use serde_json::json;

    fn spec() -> TableSpec {
        TableSpec::from_model(
            &ModelConfig::new("products")
                .soft_delete(true)
                .column(ColumnSpec::new("title", "text"))
                .column(ColumnSpec::new("price", "numeric")),
        )
    }

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_select_defaults() {
        let q = select(&spec(), &QueryDescriptor::new());
        assert_eq!(q.sql, r#"SELECT * FROM "public"."products" ORDER BY "id""#);
        assert!(q.params.is_empty());
    }

    #[test]
    fn test_select_with_filters_and_paging() {
        let query = QueryDescriptor::filter("deleted_at", Value::Null)
            .where_("id", 3)
            .select("price")
            .select("title")
            .order_by("title", SortDirection::Desc)
            .skip(8)
            .take(4);
        let q = select(&spec(), &query);
        assert_eq!(
            q.sql,
            r#"SELECT "price"::text AS "price", "title" FROM "public"."products" WHERE "deleted_at" IS NULL AND "id" = $1::bigint ORDER BY "title" DESC LIMIT 4 OFFSET 8"#
        );
        assert_eq!(q.params, vec![json!(3)]);
    }

    #[test]
    fn test_select_distinct_wraps_subquery() {
        let query = QueryDescriptor::new().distinct("title");
        let q = select(&spec(), &query);
        assert_eq!(
            q.sql,
            r#"SELECT * FROM (SELECT DISTINCT ON ("title") * FROM "public"."products" ORDER BY "title", "id") AS sub ORDER BY "id""#
        );
    }

    #[test]
    fn test_count_ignores_ordering() {
        let query = QueryDescriptor::filter("title", "x").order_by("id", SortDirection::Asc);
        let q = count(&spec(), &query);
        assert_eq!(q.sql, r#"SELECT COUNT(*) FROM "public"."products" WHERE "title" = $1::text"#);
    }

    #[test]
    fn test_insert_inlines_nulls() {
        let q = insert(&spec(), &record(json!({ "title": "a", "deleted_at": null })), None);
        assert_eq!(
            q.sql,
            r#"INSERT INTO "public"."products" ("deleted_at", "title") VALUES (NULL, $1::text) RETURNING *"#
        );
        assert_eq!(q.params, vec![json!("a")]);
    }

    #[test]
    fn test_insert_without_fields_uses_defaults() {
        let q = insert(&spec(), &Record::new(), None);
        assert_eq!(q.sql, r#"INSERT INTO "public"."products" DEFAULT VALUES RETURNING *"#);
    }

    #[test]
    fn test_update_skips_primary_key() {
        let q = update(
            &spec(),
            &record(json!({ "id": 1 })),
            &record(json!({ "id": 9, "title": "b" })),
            None,
        );
        assert_eq!(
            q.sql,
            r#"UPDATE "public"."products" SET "title" = $1::text WHERE "id" = $2::bigint RETURNING *"#
        );
        assert_eq!(q.params, vec![json!("b"), json!(1)]);
    }

    #[test]
    fn test_delete_by_key() {
        let q = delete(&spec(), &record(json!({ "id": 1 })));
        assert_eq!(q.sql, r#"DELETE FROM "public"."products" WHERE "id" = $1::bigint RETURNING *"#);
    }

    #[test]
    fn test_quoted_escapes_quotes() {
        assert_eq!(quoted(r#"a"b"#), r#""a""b""#);
    }
}
