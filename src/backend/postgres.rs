//! PostgreSQL backend: descriptors rendered by the SQL builder, rows returned as JSON records.

use crate::backend::QueryBackend;
use crate::error::AppError;
use crate::model::{FieldSet, Filter, ModelConfig, QueryDescriptor, Record};
use crate::sql::{self, PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres};

pub use crate::sql::TableSpec;

#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
    spec: TableSpec,
}

impl PgBackend {
    pub fn new(pool: PgPool, spec: TableSpec) -> Self {
        PgBackend { pool, spec }
    }

    pub fn for_model(pool: PgPool, config: &ModelConfig) -> Self {
        Self::new(pool, TableSpec::from_model(config))
    }

    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Record>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(sqlx::query(&q.sql), &q.params).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Record>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(sqlx::query(&q.sql), &q.params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| row_to_record(&r)))
    }
}

fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, Postgres, PgArguments>,
    params: &[Value],
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    for p in params {
        query = query.bind(PgBindValue::from_json(p));
    }
    query
}

#[async_trait]
impl QueryBackend for PgBackend {
    async fn count(&self, query: &QueryDescriptor) -> Result<u64, AppError> {
        let q = sql::count(&self.spec, query);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut scalar = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            scalar = scalar.bind(PgBindValue::from_json(p));
        }
        let n = scalar.fetch_one(&self.pool).await?;
        Ok(n.max(0) as u64)
    }

    async fn find_first(&self, query: &QueryDescriptor) -> Result<Option<Record>, AppError> {
        let q = sql::select(&self.spec, &query.clone().take(1));
        self.fetch_optional(&q).await
    }

    async fn find_many(&self, query: &QueryDescriptor) -> Result<Vec<Record>, AppError> {
        let q = sql::select(&self.spec, query);
        self.fetch_all(&q).await
    }

    async fn create(&self, data: Record, select: Option<&FieldSet>) -> Result<Record, AppError> {
        let q = sql::insert(&self.spec, &data, select);
        self.fetch_optional(&q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(&self, filter: &Filter, data: Record, select: Option<&FieldSet>) -> Result<Record, AppError> {
        let q = sql::update(&self.spec, filter, &data, select);
        self.fetch_optional(&q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn delete(&self, filter: &Filter) -> Result<Record, AppError> {
        let q = sql::delete(&self.spec, filter);
        self.fetch_optional(&q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn delete_many(&self) -> Result<u64, AppError> {
        let q = sql::delete_all(&self.spec);
        tracing::debug!(sql = %q.sql, "query");
        let result = sqlx::query(&q.sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

fn row_to_record(row: &PgRow) -> Record {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return j;
    }
    Value::Null
}
