//! In-process backend over a locked row vector. Used without a database and in tests.

use crate::backend::QueryBackend;
use crate::error::AppError;
use crate::model::{FieldSet, Filter, KeyType, ModelConfig, QueryDescriptor, Record, SortDirection};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct MemoryTable {
    rows: Vec<Record>,
    next_id: i64,
}

pub struct MemoryBackend {
    primary_key: String,
    key_type: KeyType,
    table: RwLock<MemoryTable>,
}

impl MemoryBackend {
    pub fn new(primary_key: impl Into<String>, key_type: KeyType) -> Self {
        MemoryBackend {
            primary_key: primary_key.into(),
            key_type,
            table: RwLock::new(MemoryTable::default()),
        }
    }

    pub fn for_model(config: &ModelConfig) -> Self {
        Self::new(config.primary_key.clone(), config.key_type)
    }

    /// Every stored row, soft-deleted ones included, in insertion order.
    pub fn rows(&self) -> Vec<Record> {
        self.table.read().map(|t| t.rows.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.table.read().map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryTable>, AppError> {
        self.table.read().map_err(|_| AppError::Internal("memory table lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryTable>, AppError> {
        self.table.write().map_err(|_| AppError::Internal("memory table lock poisoned".into()))
    }

    fn assign_key(&self, table: &mut MemoryTable, row: &mut Record) -> Result<(), AppError> {
        match row.get(&self.primary_key) {
            None | Some(Value::Null) => {
                let key = match self.key_type {
                    KeyType::Number => {
                        table.next_id += 1;
                        Value::Number(table.next_id.into())
                    }
                    KeyType::Uuid | KeyType::Text => Value::String(uuid::Uuid::new_v4().to_string()),
                };
                row.insert(self.primary_key.clone(), key);
            }
            Some(key) => {
                if table.rows.iter().any(|r| r.get(&self.primary_key).is_some_and(|k| value_eq(k, key))) {
                    return Err(AppError::Validation(format!("duplicate {}: {}", self.primary_key, key)));
                }
                if let Some(n) = key.as_i64() {
                    table.next_id = table.next_id.max(n);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl QueryBackend for MemoryBackend {
    async fn count(&self, query: &QueryDescriptor) -> Result<u64, AppError> {
        let table = self.read()?;
        Ok(run(&table.rows, query).len() as u64)
    }

    async fn find_first(&self, query: &QueryDescriptor) -> Result<Option<Record>, AppError> {
        let query = query.clone().take(1);
        let table = self.read()?;
        Ok(run(&table.rows, &query).into_iter().next())
    }

    async fn find_many(&self, query: &QueryDescriptor) -> Result<Vec<Record>, AppError> {
        let table = self.read()?;
        Ok(run(&table.rows, query))
    }

    async fn create(&self, data: Record, select: Option<&FieldSet>) -> Result<Record, AppError> {
        let mut table = self.write()?;
        let mut row = data;
        self.assign_key(&mut table, &mut row)?;
        let out = project(&row, select);
        table.rows.push(row);
        Ok(out)
    }

    async fn update(&self, filter: &Filter, data: Record, select: Option<&FieldSet>) -> Result<Record, AppError> {
        let mut table = self.write()?;
        let row = table
            .rows
            .iter_mut()
            .find(|r| matches(r, filter))
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
        for (k, v) in data {
            if k == self.primary_key {
                continue;
            }
            row.insert(k, v);
        }
        Ok(project(row, select))
    }

    async fn delete(&self, filter: &Filter) -> Result<Record, AppError> {
        let mut table = self.write()?;
        let idx = table
            .rows
            .iter()
            .position(|r| matches(r, filter))
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
        Ok(table.rows.remove(idx))
    }

    async fn delete_many(&self) -> Result<u64, AppError> {
        let mut table = self.write()?;
        let n = table.rows.len() as u64;
        table.rows.clear();
        Ok(n)
    }
}

/// Filter, order, dedupe, slice and project, in that order.
fn run(rows: &[Record], query: &QueryDescriptor) -> Vec<Record> {
    let filter = query.where_or_empty();
    let mut out: Vec<&Record> = rows.iter().filter(|r| matches(r, &filter)).collect();

    if let Some(order) = &query.order_by {
        out.sort_by(|a, b| {
            order.iter().fold(Ordering::Equal, |acc, (field, direction)| {
                acc.then_with(|| {
                    let o = compare(field_of(a, field), field_of(b, field));
                    match direction {
                        SortDirection::Asc => o,
                        SortDirection::Desc => o.reverse(),
                    }
                })
            })
        });
    }

    if let Some(fields) = &query.distinct {
        let mut seen = HashSet::new();
        out.retain(|r| {
            let key = Value::Array(fields.iter().map(|f| field_of(r, f).clone()).collect()).to_string();
            seen.insert(key)
        });
    }

    let skip = query.skip.unwrap_or(0) as usize;
    let take = query.take.map(|n| n as usize).unwrap_or(usize::MAX);
    out.into_iter()
        .skip(skip)
        .take(take)
        .map(|r| project(r, query.select.as_ref()))
        .collect()
}

fn field_of<'a>(row: &'a Record, field: &str) -> &'a Value {
    row.get(field).unwrap_or(&Value::Null)
}

fn matches(row: &Record, filter: &Filter) -> bool {
    filter.iter().all(|(k, v)| value_eq(field_of(row, k), v))
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::String(t)) => s == t,
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

/// Ascending order with nulls last.
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(n), Value::Number(m)) => n
            .as_f64()
            .partial_cmp(&m.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(s), Value::String(t)) => s.cmp(t),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn project(row: &Record, select: Option<&FieldSet>) -> Record {
    match select {
        None => row.clone(),
        Some(fields) => row
            .iter()
            .filter(|(k, _)| fields.contains(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    async fn seeded() -> MemoryBackend {
        let backend = MemoryBackend::new("id", KeyType::Number);
        for (title, price, deleted) in [
            ("b", 20, Value::Null),
            ("a", 10, Value::Null),
            ("c", 10, json!("2024-01-01T00:00:00Z")),
            ("a", 30, Value::Null),
        ] {
            backend
                .create(record(json!({ "title": title, "price": price, "deleted_at": deleted })), None)
                .await
                .unwrap();
        }
        backend
    }

    #[tokio::test]
    async fn test_create_assigns_incrementing_keys() {
        let backend = seeded().await;
        let ids: Vec<i64> = backend.rows().iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        let explicit = backend.create(record(json!({ "id": 10, "title": "z" })), None).await.unwrap();
        assert_eq!(explicit["id"], 10);
        let next = backend.create(record(json!({ "title": "y" })), None).await.unwrap();
        assert_eq!(next["id"], 11);
        assert!(backend.create(record(json!({ "id": 10 })), None).await.is_err());
    }

    #[tokio::test]
    async fn test_null_filter_matches_missing_and_null() {
        let backend = seeded().await;
        let q = QueryDescriptor::filter("deleted_at", Value::Null);
        assert_eq!(backend.count(&q).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_order_distinct_skip_take() {
        let backend = seeded().await;
        let q = QueryDescriptor::new()
            .order_by("title", SortDirection::Asc)
            .order_by("price", SortDirection::Desc)
            .distinct("title");
        let rows = backend.find_many(&q).await.unwrap();
        let got: Vec<(String, i64)> = rows
            .iter()
            .map(|r| (r["title"].as_str().unwrap().to_string(), r["price"].as_i64().unwrap()))
            .collect();
        assert_eq!(got, vec![("a".into(), 30), ("b".into(), 20), ("c".into(), 10)]);

        let page = backend.find_many(&q.clone().skip(1).take(1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["title"], "b");
    }

    #[tokio::test]
    async fn test_select_projects_fields() {
        let backend = seeded().await;
        let row = backend
            .find_first(&QueryDescriptor::filter("id", 2).select("title"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row, record(json!({ "title": "a" })));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_row() {
        let backend = seeded().await;
        let filter = record(json!({ "id": 99 }));
        let err = backend.update(&filter, Record::new(), None).await.unwrap_err();
        assert!(matches!(err, AppError::Db(sqlx::Error::RowNotFound)));
        assert!(backend.delete(&filter).await.is_err());
    }

    #[tokio::test]
    async fn test_update_never_rewrites_key() {
        let backend = seeded().await;
        let updated = backend
            .update(&record(json!({ "id": 1 })), record(json!({ "id": 50, "title": "x" })), None)
            .await
            .unwrap();
        assert_eq!(updated["id"], 1);
        assert_eq!(updated["title"], "x");
    }

    #[tokio::test]
    async fn test_delete_many_empties_table() {
        let backend = seeded().await;
        assert_eq!(backend.delete_many().await.unwrap(), 4);
        assert!(backend.is_empty());
    }
}
