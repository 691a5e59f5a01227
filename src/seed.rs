//! Factories and seeding: fake records generated from a model's declared columns.

use crate::error::AppError;
use crate::model::{ColumnSpec, Model, QueryDescriptor, Record};
use crate::registry::ModelRegistry;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};

const ADJECTIVES: &[&str] = &[
    "Ergonomic", "Rustic", "Sleek", "Refined", "Handcrafted", "Small", "Practical", "Gorgeous", "Licensed", "Tasty",
];
const MATERIALS: &[&str] = &["Steel", "Wooden", "Cotton", "Granite", "Plastic", "Rubber", "Bronze", "Fresh"];
const NOUNS: &[&str] = &[
    "Chair", "Keyboard", "Table", "Shoes", "Computer", "Gloves", "Lamp", "Bike", "Salad", "Watch",
];
const WORDS: &[&str] = &[
    "carefully", "designed", "with", "the", "latest", "technology", "for", "everyday", "comfort", "and", "lasting",
    "quality", "built", "to", "perform", "in", "any", "setting",
];

/// Generates and persists fake records for one model.
#[derive(Clone)]
pub struct Factory {
    model: Model,
}

impl Factory {
    pub fn new(model: Model) -> Self {
        Factory { model }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// One fake value per declared column. Key, timestamp and soft-delete columns are left to the model.
    pub fn definition(&self) -> Record {
        let config = self.model.config();
        let managed = [
            config.primary_key.as_str(),
            config.created_at.as_str(),
            config.updated_at.as_str(),
            config.deleted_at.as_str(),
        ];
        let mut rng = rand::thread_rng();
        config
            .columns
            .iter()
            .filter(|c| !managed.contains(&c.name.as_str()))
            .map(|c| (c.name.clone(), fake_value(&mut rng, c)))
            .collect()
    }

    /// A fake record with `overrides` applied on top.
    pub fn make_one(&self, overrides: Record) -> Record {
        let mut data = self.definition();
        data.extend(overrides);
        data
    }

    pub fn make_many(&self, n: usize, overrides: &Record) -> Vec<Record> {
        (0..n).map(|_| self.make_one(overrides.clone())).collect()
    }

    /// Persist one fake record. Overrides may write fields outside `persist_only`.
    pub async fn create_one(&self, overrides: Record) -> Result<Record, AppError> {
        let data = self.make_one(overrides);
        self.model.create(data, true).await
    }

    /// Persist `n` fake records, stopping at the first failure.
    pub async fn create_many(&self, n: usize, overrides: Record) -> Result<Vec<Record>, AppError> {
        let mut created = Vec::with_capacity(n);
        for data in self.make_many(n, &overrides) {
            created.push(self.model.create(data, true).await?);
        }
        Ok(created)
    }

    pub async fn truncate(&self) -> Result<u64, AppError> {
        self.model.truncate().await
    }

    /// Rows visible through the model (soft-deleted rows excluded).
    pub async fn count(&self) -> Result<u64, AppError> {
        self.model.count(QueryDescriptor::new()).await
    }

    /// Whether any stored row matches `filter`, soft-deleted rows included.
    pub async fn exists(&self, filter: QueryDescriptor) -> Result<bool, AppError> {
        Ok(self.model.query().find_first(&filter).await?.is_some())
    }

    /// Whether the row matching `filter` carries a deleted-at timestamp.
    pub async fn is_soft_deleted(&self, filter: QueryDescriptor) -> Result<bool, AppError> {
        let row = self.model.query().find_first(&filter).await?;
        let column = &self.model.config().deleted_at;
        Ok(row.is_some_and(|r| r.get(column).is_some_and(|v| !v.is_null())))
    }
}

fn fake_value<R: Rng>(rng: &mut R, column: &ColumnSpec) -> Value {
    let t = column.pg_type.to_lowercase();
    if t.contains("int") || t.contains("serial") {
        return json!(rng.gen_range(1..1000));
    }
    if t.starts_with("numeric") || t.starts_with("decimal") || t.starts_with("real") || t.starts_with("double") || t.starts_with("float") {
        let cents: i64 = rng.gen_range(100..100_000);
        return json!(cents as f64 / 100.0);
    }
    if t.starts_with("bool") {
        return json!(rng.gen_bool(0.5));
    }
    if t == "uuid" {
        return json!(uuid::Uuid::new_v4().to_string());
    }
    if t.starts_with("timestamp") || t == "date" {
        let days = rng.gen_range(0..365);
        let at = chrono::Utc::now() - chrono::Duration::days(days);
        return if t == "date" {
            json!(at.format("%Y-%m-%d").to_string())
        } else {
            json!(at.to_rfc3339())
        };
    }
    if t.starts_with("json") {
        return json!({});
    }
    if column.name.contains("description") || column.name.contains("body") {
        return json!(sentence(rng));
    }
    json!(product_name(rng))
}

fn pick<'a, R: Rng>(rng: &mut R, words: &[&'a str]) -> &'a str {
    words.choose(rng).copied().unwrap_or_default()
}

fn product_name<R: Rng>(rng: &mut R) -> String {
    format!("{} {} {}", pick(rng, ADJECTIVES), pick(rng, MATERIALS), pick(rng, NOUNS))
}

fn sentence<R: Rng>(rng: &mut R) -> String {
    let n = rng.gen_range(6..12);
    let words: Vec<&str> = (0..n).map(|_| pick(rng, WORDS)).collect();
    format!("The {} {}.", product_name(rng).to_lowercase(), words.join(" "))
}

/// Seed `count` fake records into one resource, or into every resource when `resource` is `None`.
pub async fn seed(registry: &ModelRegistry, resource: Option<&str>, count: usize) -> Result<usize, AppError> {
    let targets: Vec<(&str, &Model)> = match resource {
        Some(name) => {
            let model = registry
                .get(name)
                .ok_or_else(|| AppError::NotFound(format!("unknown resource: {}", name)))?;
            vec![(name, model)]
        }
        None => registry.iter().collect(),
    };
    let mut total = 0;
    for (name, model) in targets {
        let created = Factory::new(model.clone()).create_many(count, Record::new()).await?;
        tracing::info!(resource = %name, count = created.len(), "seeded");
        total += created.len();
    }
    Ok(total)
}

/// Physically delete every row of every resource.
pub async fn wipe(registry: &ModelRegistry) -> Result<u64, AppError> {
    let mut total = 0;
    for (name, model) in registry.iter() {
        let n = model.truncate().await?;
        tracing::info!(resource = %name, rows = n, "wiped");
        total += n;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_resources;

    fn registry() -> ModelRegistry {
        ModelRegistry::in_memory(&default_resources())
    }

    fn products(registry: &ModelRegistry) -> Factory {
        Factory::new(registry.get("products").unwrap().clone())
    }

    fn overrides(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_definition_fills_declared_columns() {
        let registry = registry();
        let data = products(&registry).definition();
        assert!(data["title"].as_str().is_some_and(|s| !s.is_empty()));
        assert!(data["description"].is_string());
        assert!(data.get("id").is_none());
    }

    #[test]
    fn test_make_one_applies_overrides() {
        let registry = registry();
        let data = products(&registry).make_one(overrides(json!({ "title": "Macbook" })));
        assert_eq!(data["title"], "Macbook");
        assert!(data["description"].is_string());
    }

    #[tokio::test]
    async fn test_create_many_with_soft_deleted_rows() {
        let registry = registry();
        let factory = products(&registry);
        let first = factory.create_one(Record::new()).await.unwrap();
        factory.create_many(10, Record::new()).await.unwrap();
        factory
            .create_many(5, overrides(json!({ "deleted_at": chrono::Utc::now().to_rfc3339() })))
            .await
            .unwrap();

        assert_eq!(factory.count().await.unwrap(), 11);
        assert!(factory.exists(QueryDescriptor::filter("id", first["id"].clone())).await.unwrap());
        assert!(factory.is_soft_deleted(QueryDescriptor::filter("id", 16)).await.unwrap());
        assert!(!factory.is_soft_deleted(QueryDescriptor::filter("id", 1)).await.unwrap());

        assert_eq!(factory.truncate().await.unwrap(), 16);
        assert!(!factory.exists(QueryDescriptor::filter("id", 1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_seed_and_wipe() {
        let registry = registry();
        assert_eq!(seed(&registry, None, 3).await.unwrap(), 3);
        assert_eq!(seed(&registry, Some("products"), 2).await.unwrap(), 2);
        assert!(seed(&registry, Some("orders"), 1).await.unwrap_err().is_not_found());
        assert_eq!(wipe(&registry).await.unwrap(), 5);
    }
}
