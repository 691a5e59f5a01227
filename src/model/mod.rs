//! Generic repository layer: criteria composition, primary-key coercion,
//! soft delete, persist-only stripping and pagination over a query backend.

mod criteria;
mod definition;
mod descriptor;
mod pagination;
mod repository;

pub use criteria::Criteria;
pub use definition::{ColumnSpec, FieldList, KeyType, ModelConfig};
pub use descriptor::{FieldSet, Filter, Ordering, QueryDescriptor, Record, SortDirection};
pub use pagination::{Paginated, PaginationLinks, PaginationMeta};
pub use repository::{CriteriaId, Model};
