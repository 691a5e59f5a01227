//! Query descriptor: the one value passed from a Model to its backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::str::FromStr;

/// A stored row as a JSON object keyed by column name.
pub type Record = Map<String, Value>;

/// Equality constraints: field -> value. A `null` value means IS NULL.
pub type Filter = Map<String, Value>;

/// Selected field names. Order is irrelevant.
pub type FieldSet = BTreeSet<String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(crate::error::AppError::BadRequest(format!(
                "invalid sort direction: {} (expected asc or desc)",
                s
            ))),
        }
    }
}

/// Field ordering, in application order. A field appears at most once.
pub type Ordering = Vec<(String, SortDirection)>;

/// Set `field` to `direction`, keeping its position when it is already present.
pub(crate) fn upsert_order(order: &mut Ordering, field: String, direction: SortDirection) {
    match order.iter_mut().find(|(f, _)| *f == field) {
        Some(entry) => entry.1 = direction,
        None => order.push((field, direction)),
    }
}

/// Per-call filters and the assembled query handed to a backend.
///
/// Every category is optional; an absent category means "no constraint" and is
/// never confused with an empty one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryDescriptor {
    pub where_: Option<Filter>,
    pub select: Option<FieldSet>,
    pub order_by: Option<Ordering>,
    pub distinct: Option<Vec<String>>,
    pub skip: Option<u64>,
    pub take: Option<u64>,
}

impl QueryDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptor with a single equality constraint.
    pub fn filter(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().where_(field, value)
    }

    pub fn where_(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_
            .get_or_insert_with(Map::new)
            .insert(field.into(), value.into());
        self
    }

    pub fn select(mut self, field: impl Into<String>) -> Self {
        self.select.get_or_insert_with(BTreeSet::new).insert(field.into());
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        upsert_order(self.order_by.get_or_insert_with(Vec::new), field.into(), direction);
        self
    }

    pub fn distinct(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        let fields = self.distinct.get_or_insert_with(Vec::new);
        if !fields.contains(&field) {
            fields.push(field);
        }
        self
    }

    pub fn skip(mut self, n: u64) -> Self {
        self.skip = Some(n);
        self
    }

    pub fn take(mut self, n: u64) -> Self {
        self.take = Some(n);
        self
    }

    /// Equality constraints, or an empty filter when none are set.
    pub fn where_or_empty(&self) -> Filter {
        self.where_.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_descriptor_has_no_categories() {
        let q = QueryDescriptor::new();
        assert!(q.where_.is_none());
        assert!(q.select.is_none());
        assert!(q.order_by.is_none());
        assert!(q.distinct.is_none());
        assert!(q.skip.is_none() && q.take.is_none());
    }

    #[test]
    fn test_order_by_keeps_position_on_update() {
        let q = QueryDescriptor::new()
            .order_by("title", SortDirection::Asc)
            .order_by("id", SortDirection::Asc)
            .order_by("title", SortDirection::Desc);
        assert_eq!(
            q.order_by.unwrap(),
            vec![
                ("title".to_string(), SortDirection::Desc),
                ("id".to_string(), SortDirection::Asc)
            ]
        );
    }

    #[test]
    fn test_filter_shorthand() {
        let q = QueryDescriptor::filter("id", 3).take(1);
        assert_eq!(q.where_.unwrap().get("id"), Some(&json!(3)));
        assert_eq!(q.take, Some(1));
    }

    #[test]
    fn test_sort_direction_parse() {
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("sideways".parse::<SortDirection>().is_err());
    }
}
