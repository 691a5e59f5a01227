//! Resource CRUD over a Model, with camelCase keys on the wire.

use crate::case::{record_to_camel_case, record_to_snake_case, to_snake_case};
use crate::error::AppError;
use crate::extractors::Pagination;
use crate::model::{Model, Paginated, QueryDescriptor, Record};
use crate::service::RequestValidator;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Query keys handled by the router, never treated as filters.
const RESERVED_PARAMS: &[&str] = &["page", "limit", "force"];

pub struct ResourceService<'a> {
    model: &'a Model,
}

impl<'a> ResourceService<'a> {
    pub fn new(model: &'a Model) -> Self {
        ResourceService { model }
    }

    /// Equality filters from query params naming a known column. Values are typed by column.
    pub fn filters_from_params(&self, params: &HashMap<String, String>) -> QueryDescriptor {
        let config = self.model.config();
        let types = config.column_types();
        let mut known: HashSet<&str> = types.keys().map(String::as_str).collect();
        known.extend(config.attributes.fields().unwrap_or(&[]).iter().map(String::as_str));

        let mut filters = QueryDescriptor::new();
        for (k, v) in params {
            if RESERVED_PARAMS.contains(&k.as_str()) {
                continue;
            }
            let column = to_snake_case(k);
            if !known.contains(column.as_str()) {
                continue;
            }
            let value = query_value_for_column(types.get(&column).map(String::as_str), v);
            filters = filters.where_(column, value);
        }
        filters
    }

    pub async fn find_all(
        &self,
        pagination: &Pagination,
        params: &HashMap<String, String>,
    ) -> Result<Paginated<Record>, AppError> {
        let filters = self.filters_from_params(params);
        let page = self
            .model
            .paginate(pagination.page, pagination.limit, &pagination.resource_url, filters)
            .await?;
        Ok(page.map(record_to_camel_case))
    }

    pub async fn create_one(&self, body: Value) -> Result<Record, AppError> {
        let data = record_to_snake_case(RequestValidator::object(body)?);
        RequestValidator::validate_create(&data, &self.model.config().columns)?;
        let created = self.model.create(data, false).await?;
        Ok(record_to_camel_case(created))
    }

    pub async fn find_one(&self, id: &str) -> Result<Record, AppError> {
        let id = self.model.config().key_type.parse_id(id)?;
        let found = self.model.find_by_id_or_fail(id, QueryDescriptor::new()).await?;
        Ok(record_to_camel_case(found))
    }

    pub async fn update_one(&self, id: &str, body: Value) -> Result<Record, AppError> {
        let id = self.model.config().key_type.parse_id(id)?;
        let data = record_to_snake_case(RequestValidator::object(body)?);
        RequestValidator::validate_update(&data, &self.model.config().columns)?;
        let updated = self.model.update_by_id(id, data, false).await?;
        Ok(record_to_camel_case(updated))
    }

    /// Soft delete, or remove the row when `force` is set.
    pub async fn delete_one(&self, id: &str, force: bool) -> Result<(), AppError> {
        let id = self.model.config().key_type.parse_id(id)?;
        self.model.delete_by_id(id, force).await?;
        Ok(())
    }
}

fn query_value_for_column(pg_type: Option<&str>, s: &str) -> Value {
    let t = pg_type.unwrap_or("text").to_lowercase();
    if t.contains("int") || t.contains("serial") {
        if let Ok(n) = s.parse::<i64>() {
            return Value::Number(n.into());
        }
    }
    if t.starts_with("bool") {
        if s.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if s.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
    }
    if t.starts_with("numeric") || t.starts_with("decimal") || t.starts_with("real") || t.starts_with("double") || t.starts_with("float") {
        if let Some(n) = s.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
            return Value::Number(n);
        }
    }
    if t == "uuid" {
        if let Ok(u) = uuid::Uuid::parse_str(s) {
            return Value::String(u.to_string());
        }
    }
    Value::String(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::config::default_resources;
    use crate::model::{ColumnSpec, KeyType, ModelConfig};
    use serde_json::json;
    use std::sync::Arc;

    fn products() -> Model {
        let config = default_resources().remove(0).model;
        Model::new(config.clone(), Arc::new(MemoryBackend::for_model(&config)))
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_filters_keep_known_columns_only() {
        let config = ModelConfig::new("items")
            .column(ColumnSpec::new("in_stock", "boolean"))
            .column(ColumnSpec::new("qty", "integer"))
            .column(ColumnSpec::new("price", "numeric"));
        let model = Model::new(config, Arc::new(MemoryBackend::new("id", KeyType::Number)));
        let q = ResourceService::new(&model).filters_from_params(&params(&[
            ("inStock", "true"),
            ("qty", "3"),
            ("price", "9.5"),
            ("page", "1"),
            ("unknown", "x"),
        ]));
        let w = q.where_.unwrap();
        assert_eq!(w.len(), 3);
        assert_eq!(w["in_stock"], json!(true));
        assert_eq!(w["qty"], json!(3));
        assert_eq!(w["price"], json!(9.5));
    }

    #[tokio::test]
    async fn test_crud_round() {
        let model = products();
        let service = ResourceService::new(&model);
        let created = service
            .create_one(json!({ "title": "iPhone X", "description": "phone", "createdAt": "ignored" }))
            .await
            .unwrap();
        assert_eq!(Value::Object(created.clone()), json!({ "id": 1, "title": "iPhone X", "description": "phone" }));

        let found = service.find_one("1").await.unwrap();
        assert_eq!(found, created);

        let updated = service.update_one("1", json!({ "title": "iPhone XI" })).await.unwrap();
        assert_eq!(updated["title"], "iPhone XI");

        service.delete_one("1", false).await.unwrap();
        assert!(service.find_one("1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let model = products();
        let err = ResourceService::new(&model)
            .create_one(json!({ "description": "no title" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_bad_id_is_bad_request() {
        let model = products();
        let err = ResourceService::new(&model).find_one("abc").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
