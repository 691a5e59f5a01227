//! Query backends: the datastore side of a Model.

mod memory;
mod postgres;

pub use memory::MemoryBackend;
pub use postgres::{PgBackend, TableSpec};

use crate::error::AppError;
use crate::model::{FieldSet, Filter, QueryDescriptor, Record};
use async_trait::async_trait;

/// Executes assembled query descriptors against one table.
///
/// Filtering, ordering and pagination semantics belong to the implementation;
/// errors are returned as-is and never translated by the Model.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn count(&self, query: &QueryDescriptor) -> Result<u64, AppError>;

    async fn find_first(&self, query: &QueryDescriptor) -> Result<Option<Record>, AppError>;

    async fn find_many(&self, query: &QueryDescriptor) -> Result<Vec<Record>, AppError>;

    async fn create(&self, data: Record, select: Option<&FieldSet>) -> Result<Record, AppError>;

    /// Update rows matching `filter` and return the first. Fails with `RowNotFound` when nothing matches.
    async fn update(&self, filter: &Filter, data: Record, select: Option<&FieldSet>) -> Result<Record, AppError>;

    /// Delete the row matching `filter`, returning it.
    async fn delete(&self, filter: &Filter) -> Result<Record, AppError>;

    /// Delete every row, returning how many were removed.
    async fn delete_many(&self) -> Result<u64, AppError>;
}
