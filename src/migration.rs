//! Create schemas and tables for configured resources. Idempotent (IF NOT EXISTS).

use crate::config::ResourceConfig;
use crate::error::AppError;
use crate::model::{KeyType, ModelConfig};
use crate::sql::quoted;
use sqlx::PgPool;
use std::collections::HashSet;

/// DDL statements for one model: CREATE SCHEMA, then CREATE TABLE.
///
/// The key column comes from `key_type`; timestamp and soft-delete columns are
/// added when enabled and not declared in `columns`.
pub fn table_ddl(config: &ModelConfig) -> Vec<String> {
    let schema = quoted(&config.schema);
    let full_name = format!("{}.{}", schema, quoted(&config.table));

    let mut col_defs: Vec<String> = Vec::new();
    let declared: HashSet<&str> = config.columns.iter().map(|c| c.name.as_str()).collect();

    if !declared.contains(config.primary_key.as_str()) {
        let key_def = match config.key_type {
            KeyType::Number => "BIGSERIAL",
            KeyType::Uuid => "UUID NOT NULL DEFAULT gen_random_uuid()",
            KeyType::Text => "TEXT NOT NULL",
        };
        col_defs.push(format!("{} {}", quoted(&config.primary_key), key_def));
    }

    for c in &config.columns {
        let mut def = format!("{} {}", quoted(&c.name), c.pg_type.to_uppercase());
        if !c.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(ref d) = c.default {
            def.push_str(" DEFAULT ");
            def.push_str(d);
        }
        col_defs.push(def);
    }

    let mut implicit: Vec<(&str, &str)> = Vec::new();
    if config.timestamps {
        implicit.push((config.created_at.as_str(), "TIMESTAMPTZ NOT NULL DEFAULT NOW()"));
        implicit.push((config.updated_at.as_str(), "TIMESTAMPTZ NOT NULL DEFAULT NOW()"));
    }
    if config.soft_delete {
        implicit.push((config.deleted_at.as_str(), "TIMESTAMPTZ"));
    }
    for (name, def_suffix) in implicit {
        if !declared.contains(name) {
            col_defs.push(format!("{} {}", quoted(name), def_suffix));
        }
    }

    col_defs.push(format!("PRIMARY KEY ({})", quoted(&config.primary_key)));

    vec![
        format!("CREATE SCHEMA IF NOT EXISTS {}", schema),
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            full_name,
            col_defs.join(",\n  ")
        ),
    ]
}

/// Apply DDL for every resource in order.
pub async fn apply_migrations(pool: &PgPool, resources: &[ResourceConfig]) -> Result<(), AppError> {
    for r in resources {
        for sql in table_ddl(&r.model) {
            tracing::debug!(sql = %sql, "migrate");
            sqlx::query(&sql).execute(pool).await?;
        }
        tracing::info!(resource = %r.path_segment, table = %r.model.table, "table ready");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_resources;
    use crate::model::ColumnSpec;

    #[test]
    fn test_products_table() {
        let ddl = table_ddl(&default_resources()[0].model);
        assert_eq!(ddl[0], r#"CREATE SCHEMA IF NOT EXISTS "public""#);
        assert_eq!(
            ddl[1],
            "CREATE TABLE IF NOT EXISTS \"public\".\"products\" (\n  \
             \"id\" BIGSERIAL,\n  \
             \"title\" TEXT NOT NULL,\n  \
             \"description\" TEXT,\n  \
             \"created_at\" TIMESTAMPTZ NOT NULL DEFAULT NOW(),\n  \
             \"updated_at\" TIMESTAMPTZ NOT NULL DEFAULT NOW(),\n  \
             \"deleted_at\" TIMESTAMPTZ,\n  \
             PRIMARY KEY (\"id\")\n)"
        );
    }

    #[test]
    fn test_uuid_key_and_declared_columns_win() {
        let config = ModelConfig::new("users")
            .schema("auth")
            .primary_key("uid", KeyType::Uuid)
            .soft_delete(true)
            .column(ColumnSpec::new("deleted_at", "timestamp").default_expr("NULL"));
        let ddl = table_ddl(&config);
        assert!(ddl[1].contains("\"uid\" UUID NOT NULL DEFAULT gen_random_uuid()"));
        assert!(ddl[1].contains("\"deleted_at\" TIMESTAMP DEFAULT NULL"));
        assert!(!ddl[1].contains("TIMESTAMPTZ"));
        assert!(ddl[1].starts_with("CREATE TABLE IF NOT EXISTS \"auth\".\"users\""));
    }
}
