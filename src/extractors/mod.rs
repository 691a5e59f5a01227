//! Request extractors.

mod pagination;
pub use pagination::{Pagination, DEFAULT_LIMIT, MAX_LIMIT};
