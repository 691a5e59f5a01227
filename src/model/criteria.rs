//! Reusable, mergeable query constraints attached to a Model.

use crate::model::descriptor::{upsert_order, FieldSet, Filter, Ordering, SortDirection};
use serde_json::Value;

/// Accumulates equality filters, a field selection, an ordering and distinct fields.
///
/// Each getter reports an empty category as `None`, so merging a Criteria into a
/// query never replaces a populated clause with an empty one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Criteria {
    where_: Filter,
    select: FieldSet,
    order_by: Ordering,
    distinct: Vec<String>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_.insert(field.into(), value.into());
        self
    }

    pub fn select(mut self, field: impl Into<String>) -> Self {
        self.select.insert(field.into());
        self
    }

    pub fn unselect(mut self, field: &str) -> Self {
        self.select.remove(field);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        upsert_order(&mut self.order_by, field.into(), direction);
        self
    }

    /// Append a distinct field. Adding the same field twice has no effect.
    pub fn distinct(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.distinct.contains(&field) {
            self.distinct.push(field);
        }
        self
    }

    pub fn get_where(&self) -> Option<&Filter> {
        (!self.where_.is_empty()).then_some(&self.where_)
    }

    pub fn get_select(&self) -> Option<&FieldSet> {
        (!self.select.is_empty()).then_some(&self.select)
    }

    pub fn get_order_by(&self) -> Option<&Ordering> {
        (!self.order_by.is_empty()).then_some(&self.order_by)
    }

    pub fn get_distinct(&self) -> Option<&[String]> {
        (!self.distinct.is_empty()).then_some(self.distinct.as_slice())
    }
}
