//! Model: the generic repository every resource is served through.

use crate::backend::QueryBackend;
use crate::error::AppError;
use crate::model::{Criteria, FieldSet, Filter, ModelConfig, Paginated, QueryDescriptor, Record};
use serde_json::{Map, Value};
use std::sync::Arc;

const NOT_FOUND_MESSAGE: &str = "Model not found.";

/// Handle returned by [`Model::add_criteria`], used to remove that criteria later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CriteriaId(u64);

/// Repository bound to one backend handle.
///
/// Cloning is cheap: the definition and the backend are shared, the criteria
/// list is copied. Share one instance read-only across requests and use
/// [`Model::with_criteria`] for request-scoped constraints; adding or removing
/// criteria needs `&mut self`.
#[derive(Clone)]
pub struct Model {
    config: Arc<ModelConfig>,
    backend: Arc<dyn QueryBackend>,
    criteria: Vec<(CriteriaId, Criteria)>,
    next_criteria_id: u64,
}

impl Model {
    pub fn new(config: ModelConfig, backend: Arc<dyn QueryBackend>) -> Self {
        Model {
            config: Arc::new(config),
            backend,
            criteria: Vec::new(),
            next_criteria_id: 0,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// The backend, for queries the repository does not cover.
    pub fn query(&self) -> &dyn QueryBackend {
        self.backend.as_ref()
    }

    pub fn add_criteria(&mut self, criteria: Criteria) -> CriteriaId {
        self.next_criteria_id += 1;
        let id = CriteriaId(self.next_criteria_id);
        self.criteria.push((id, criteria));
        id
    }

    pub fn has_criteria(&self, id: CriteriaId) -> bool {
        self.criteria.iter().any(|(cid, _)| *cid == id)
    }

    pub fn remove_criteria(&mut self, id: CriteriaId) -> Option<Criteria> {
        let idx = self.criteria.iter().position(|(cid, _)| *cid == id)?;
        Some(self.criteria.remove(idx).1)
    }

    /// Active criteria in application order.
    pub fn criteria(&self) -> impl Iterator<Item = &Criteria> {
        self.criteria.iter().map(|(_, c)| c)
    }

    /// A copy of this model with one more criteria applied.
    pub fn with_criteria(&self, criteria: Criteria) -> Self {
        let mut model = self.clone();
        model.add_criteria(criteria);
        model
    }

    /// Assemble the descriptor sent to the backend.
    ///
    /// Attributes seed the selection, criteria apply in order (a populated
    /// category replaces the earlier one), then caller filters win key by key
    /// for `where` and wholesale for the other categories. The primary key is
    /// coerced and, unless `include_trashed`, soft-deleted rows are excluded.
    pub fn build_query(&self, filters: QueryDescriptor, include_trashed: bool) -> QueryDescriptor {
        let mut query = QueryDescriptor {
            select: self.default_select(),
            ..QueryDescriptor::default()
        };

        for criteria in self.criteria() {
            if let Some(w) = criteria.get_where() {
                query.where_ = Some(w.clone());
            }
            if let Some(s) = criteria.get_select() {
                query.select = Some(s.clone());
            }
            if let Some(o) = criteria.get_order_by() {
                query.order_by = Some(o.clone());
            }
            if let Some(d) = criteria.get_distinct() {
                query.distinct = Some(d.to_vec());
            }
        }

        if let Some(w) = filters.where_ {
            let target = query.where_.get_or_insert_with(Map::new);
            for (k, v) in w {
                target.insert(k, v);
            }
        }
        if filters.select.is_some() {
            query.select = filters.select;
        }
        if filters.order_by.is_some() {
            query.order_by = filters.order_by;
        }
        if filters.distinct.is_some() {
            query.distinct = filters.distinct;
        }
        query.skip = filters.skip;
        query.take = filters.take;

        if let Some(w) = query.where_.as_mut() {
            self.coerce_key(w);
        }
        if self.config.soft_delete && !include_trashed {
            query
                .where_
                .get_or_insert_with(Map::new)
                .insert(self.config.deleted_at.clone(), Value::Null);
        }
        query
    }

    pub async fn count(&self, filters: QueryDescriptor) -> Result<u64, AppError> {
        let mut query = self.build_query(filters, false);
        query.select = None;
        query.skip = None;
        query.take = None;
        self.backend.count(&query).await
    }

    pub async fn find_one(&self, filters: QueryDescriptor) -> Result<Option<Record>, AppError> {
        let query = self.build_query(filters, false);
        self.backend.find_first(&query).await
    }

    pub async fn find_one_or_fail(&self, filters: QueryDescriptor) -> Result<Record, AppError> {
        self.find_one(filters)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND_MESSAGE.into()))
    }

    pub async fn find_one_by_pk(
        &self,
        value: impl Into<Value>,
        filters: QueryDescriptor,
    ) -> Result<Option<Record>, AppError> {
        self.find_one(self.with_key(value.into(), filters)).await
    }

    pub async fn find_one_by_pk_or_fail(
        &self,
        value: impl Into<Value>,
        filters: QueryDescriptor,
    ) -> Result<Record, AppError> {
        self.find_one_or_fail(self.with_key(value.into(), filters)).await
    }

    /// Alias for [`Model::find_one_by_pk`].
    pub async fn find_by_id(&self, id: impl Into<Value>, filters: QueryDescriptor) -> Result<Option<Record>, AppError> {
        self.find_one_by_pk(id, filters).await
    }

    /// Alias for [`Model::find_one_by_pk_or_fail`].
    pub async fn find_by_id_or_fail(&self, id: impl Into<Value>, filters: QueryDescriptor) -> Result<Record, AppError> {
        self.find_one_by_pk_or_fail(id, filters).await
    }

    pub async fn find_many(&self, filters: QueryDescriptor) -> Result<Vec<Record>, AppError> {
        let query = self.build_query(filters, false);
        self.backend.find_many(&query).await
    }

    /// Up to `limit` records starting at offset `page`, plus the pagination envelope.
    pub async fn paginate(
        &self,
        page: u64,
        limit: u64,
        resource_url: &str,
        filters: QueryDescriptor,
    ) -> Result<Paginated<Record>, AppError> {
        let total = self.count(filters.clone()).await?;
        let data = self.for_page(page, limit, filters).await?;
        Ok(Paginated::new(data, total, page, limit, resource_url))
    }

    /// Same slice as [`Model::paginate`], without the envelope.
    pub async fn for_page(&self, page: u64, limit: u64, filters: QueryDescriptor) -> Result<Vec<Record>, AppError> {
        let filters = filters.skip(page).take(limit);
        self.find_many(filters).await
    }

    pub async fn create(&self, data: Record, ignore_persist_only: bool) -> Result<Record, AppError> {
        let mut data = self.strip(data, ignore_persist_only);
        if self.config.timestamps {
            let now = now();
            data.entry(self.config.created_at.clone()).or_insert_with(|| now.clone());
            data.entry(self.config.updated_at.clone()).or_insert(now);
        }
        let select = self.default_select();
        self.backend.create(data, select.as_ref()).await
    }

    /// Resolve the target with [`Model::find_one_or_fail`], then update it by primary key.
    pub async fn update(
        &self,
        filters: QueryDescriptor,
        data: Record,
        ignore_persist_only: bool,
    ) -> Result<Record, AppError> {
        let target = self.find_target(filters, false).await?;
        let mut data = self.strip(data, ignore_persist_only);
        if self.config.timestamps {
            data.insert(self.config.updated_at.clone(), now());
        }
        let select = self.default_select();
        self.backend.update(&target, data, select.as_ref()).await
    }

    pub async fn update_by_pk(
        &self,
        value: impl Into<Value>,
        data: Record,
        ignore_persist_only: bool,
    ) -> Result<Record, AppError> {
        let filters = self.with_key(value.into(), QueryDescriptor::new());
        self.update(filters, data, ignore_persist_only).await
    }

    /// Alias for [`Model::update_by_pk`].
    pub async fn update_by_id(&self, id: impl Into<Value>, data: Record, ignore_persist_only: bool) -> Result<Record, AppError> {
        self.update_by_pk(id, data, ignore_persist_only).await
    }

    /// Soft delete by stamping the deleted-at column, or remove the row when
    /// soft delete is off or `force` is set. `force` also reaches rows that are
    /// already soft-deleted.
    pub async fn delete(&self, filters: QueryDescriptor, force: bool) -> Result<Record, AppError> {
        let target = self.find_target(filters, force).await?;
        if self.config.soft_delete && !force {
            let mut data = Record::new();
            data.insert(self.config.deleted_at.clone(), now());
            tracing::debug!(table = %self.config.table, key = ?target, "soft delete");
            return self.backend.update(&target, data, None).await;
        }
        tracing::debug!(table = %self.config.table, key = ?target, "delete");
        self.backend.delete(&target).await
    }

    pub async fn delete_by_pk(&self, value: impl Into<Value>, force: bool) -> Result<Record, AppError> {
        let filters = self.with_key(value.into(), QueryDescriptor::new());
        self.delete(filters, force).await
    }

    /// Alias for [`Model::delete_by_pk`].
    pub async fn delete_by_id(&self, id: impl Into<Value>, force: bool) -> Result<Record, AppError> {
        self.delete_by_pk(id, force).await
    }

    /// Physically remove every row of the table.
    pub async fn truncate(&self) -> Result<u64, AppError> {
        self.backend.delete_many().await
    }

    fn default_select(&self) -> Option<FieldSet> {
        self.config
            .attributes
            .fields()
            .map(|fields| fields.iter().cloned().collect())
    }

    fn coerce_key(&self, filter: &mut Filter) {
        if let Some(v) = filter.remove(&self.config.primary_key) {
            filter.insert(self.config.primary_key.clone(), self.config.key_type.coerce(v));
        }
    }

    fn with_key(&self, value: Value, filters: QueryDescriptor) -> QueryDescriptor {
        filters.where_(self.config.primary_key.clone(), self.config.key_type.coerce(value))
    }

    /// Find the single row an update/delete applies to and return its key filter.
    async fn find_target(&self, filters: QueryDescriptor, include_trashed: bool) -> Result<Filter, AppError> {
        let mut query = self.build_query(filters, include_trashed);
        if let Some(select) = query.select.as_mut() {
            select.insert(self.config.primary_key.clone());
        }
        let row = self
            .backend
            .find_first(&query)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND_MESSAGE.into()))?;
        let key = row.get(&self.config.primary_key).cloned().unwrap_or(Value::Null);
        let mut filter = Filter::new();
        filter.insert(self.config.primary_key.clone(), key);
        Ok(filter)
    }

    /// Keep only the input's own keys that `persist_only` allows.
    fn strip(&self, data: Record, ignore_persist_only: bool) -> Record {
        if ignore_persist_only || self.config.persist_only.is_all() {
            return data;
        }
        data.into_iter()
            .filter(|(k, _)| self.config.persist_only.allows(k))
            .collect()
    }
}

fn now() -> Value {
    Value::String(chrono::Utc::now().to_rfc3339())
}
