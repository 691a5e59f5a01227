//! Model definition: table, primary key, soft-delete and persistence policy.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Declared type of the primary key. Only `Number` coerces filter input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    #[default]
    Number,
    Uuid,
    Text,
}

impl KeyType {
    /// Coerce a primary-key value to this key type. Values that cannot be
    /// represented are returned unchanged and left for the backend to judge.
    pub fn coerce(&self, value: Value) -> Value {
        if *self != KeyType::Number {
            return value;
        }
        match value {
            Value::String(s) => match s.trim().parse::<i64>() {
                Ok(n) => Value::Number(n.into()),
                Err(_) => match s.trim().parse::<f64>() {
                    Ok(f) if f.is_finite() => Value::Number((f.trunc() as i64).into()),
                    _ => Value::String(s),
                },
            },
            Value::Number(n) if n.is_f64() => match n.as_f64() {
                Some(f) if f.is_finite() => Value::Number((f.trunc() as i64).into()),
                _ => Value::Number(n),
            },
            other => other,
        }
    }

    /// Parse an id taken from a request path.
    pub fn parse_id(&self, id_str: &str) -> Result<Value, AppError> {
        Ok(match self {
            KeyType::Uuid => {
                let u = uuid::Uuid::parse_str(id_str).map_err(|_| AppError::BadRequest("invalid uuid".into()))?;
                Value::String(u.to_string())
            }
            KeyType::Number => {
                let n: i64 = id_str.parse().map_err(|_| AppError::BadRequest("invalid id".into()))?;
                Value::Number(n.into())
            }
            KeyType::Text => Value::String(id_str.to_string()),
        })
    }

    /// PostgreSQL type of the key column.
    pub fn pg_type(&self) -> &'static str {
        match self {
            KeyType::Number => "bigint",
            KeyType::Uuid => "uuid",
            KeyType::Text => "text",
        }
    }
}

/// Either every field (`["*"]` in config) or an explicit list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum FieldList {
    #[default]
    All,
    Only(Vec<String>),
}

impl FieldList {
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldList::from(fields.into_iter().map(Into::into).collect::<Vec<String>>())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, FieldList::All)
    }

    pub fn allows(&self, field: &str) -> bool {
        match self {
            FieldList::All => true,
            FieldList::Only(fields) => fields.iter().any(|f| f == field),
        }
    }

    pub fn fields(&self) -> Option<&[String]> {
        match self {
            FieldList::All => None,
            FieldList::Only(fields) => Some(fields),
        }
    }
}

impl From<Vec<String>> for FieldList {
    fn from(v: Vec<String>) -> Self {
        if v.first().map(|f| f == "*").unwrap_or(false) {
            FieldList::All
        } else {
            FieldList::Only(v)
        }
    }
}

impl From<FieldList> for Vec<String> {
    fn from(f: FieldList) -> Self {
        match f {
            FieldList::All => vec!["*".to_string()],
            FieldList::Only(v) => v,
        }
    }
}

/// Column known to the model. Drives SQL casts and table creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub pg_type: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// SQL default expression, e.g. `NOW()`.
    #[serde(default)]
    pub default: Option<String>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, pg_type: impl Into<String>) -> Self {
        ColumnSpec {
            name: name.into(),
            pg_type: pg_type.into(),
            nullable: true,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_expr(mut self, expression: impl Into<String>) -> Self {
        self.default = Some(expression.into());
        self
    }
}

fn default_true() -> bool {
    true
}

fn default_schema() -> String {
    "public".into()
}

fn default_primary_key() -> String {
    "id".into()
}

fn default_deleted_at() -> String {
    "deleted_at".into()
}

fn default_created_at() -> String {
    "created_at".into()
}

fn default_updated_at() -> String {
    "updated_at".into()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub table: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default)]
    pub key_type: KeyType,
    #[serde(default)]
    pub soft_delete: bool,
    #[serde(default = "default_deleted_at")]
    pub deleted_at: String,
    /// When set, the model writes `created_at`/`updated_at` itself.
    #[serde(default)]
    pub timestamps: bool,
    #[serde(default = "default_created_at")]
    pub created_at: String,
    #[serde(default = "default_updated_at")]
    pub updated_at: String,
    /// Fields selected by every read and returned by create/update.
    #[serde(default)]
    pub attributes: FieldList,
    /// Fields create/update may write.
    #[serde(default)]
    pub persist_only: FieldList,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

impl ModelConfig {
    pub fn new(table: impl Into<String>) -> Self {
        ModelConfig {
            table: table.into(),
            schema: default_schema(),
            primary_key: default_primary_key(),
            key_type: KeyType::default(),
            soft_delete: false,
            deleted_at: default_deleted_at(),
            timestamps: false,
            created_at: default_created_at(),
            updated_at: default_updated_at(),
            attributes: FieldList::All,
            persist_only: FieldList::All,
            columns: Vec::new(),
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn primary_key(mut self, name: impl Into<String>, key_type: KeyType) -> Self {
        self.primary_key = name.into();
        self.key_type = key_type;
        self
    }

    pub fn soft_delete(mut self, enabled: bool) -> Self {
        self.soft_delete = enabled;
        self
    }

    pub fn deleted_at(mut self, column: impl Into<String>) -> Self {
        self.deleted_at = column.into();
        self
    }

    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    pub fn attributes(mut self, attributes: FieldList) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn persist_only(mut self, persist_only: FieldList) -> Self {
        self.persist_only = persist_only;
        self
    }

    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    /// Column name -> PostgreSQL type, including the implicit key, timestamp
    /// and soft-delete columns unless `columns` declares them explicitly.
    pub fn column_types(&self) -> HashMap<String, String> {
        let mut types: HashMap<String, String> = HashMap::new();
        types.insert(self.primary_key.clone(), self.key_type.pg_type().to_string());
        if self.timestamps {
            types.insert(self.created_at.clone(), "timestamptz".into());
            types.insert(self.updated_at.clone(), "timestamptz".into());
        }
        if self.soft_delete {
            types.insert(self.deleted_at.clone(), "timestamptz".into());
        }
        for c in &self.columns {
            types.insert(c.name.clone(), c.pg_type.clone());
        }
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_key_coerces_numeric_strings() {
        assert_eq!(KeyType::Number.coerce(json!("42")), json!(42));
        assert_eq!(KeyType::Number.coerce(json!(" 7 ")), json!(7));
        assert_eq!(KeyType::Number.coerce(json!(3.9)), json!(3));
        assert_eq!(KeyType::Number.coerce(json!("abc")), json!("abc"));
        assert_eq!(KeyType::Number.coerce(Value::Null), Value::Null);
    }

    #[test]
    fn test_opaque_keys_pass_through() {
        assert_eq!(KeyType::Text.coerce(json!("42")), json!("42"));
        assert_eq!(KeyType::Uuid.coerce(json!("42")), json!("42"));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(KeyType::Number.parse_id("12").unwrap(), json!(12));
        assert!(KeyType::Number.parse_id("x").is_err());
        assert!(KeyType::Uuid.parse_id("not-a-uuid").is_err());
        assert_eq!(KeyType::Text.parse_id("abc").unwrap(), json!("abc"));
    }

    #[test]
    fn test_field_list_wildcard() {
        let all: FieldList = serde_json::from_value(json!(["*"])).unwrap();
        assert!(all.is_all());
        assert!(all.allows("anything"));

        let only: FieldList = serde_json::from_value(json!(["title", "description"])).unwrap();
        assert!(only.allows("title"));
        assert!(!only.allows("price"));
        assert_eq!(serde_json::to_value(&only).unwrap(), json!(["title", "description"]));
    }

    #[test]
    fn test_model_config_defaults_from_json() {
        let cfg: ModelConfig = serde_json::from_value(json!({ "table": "products" })).unwrap();
        assert_eq!(cfg.schema, "public");
        assert_eq!(cfg.primary_key, "id");
        assert_eq!(cfg.key_type, KeyType::Number);
        assert!(!cfg.soft_delete);
        assert_eq!(cfg.deleted_at, "deleted_at");
        assert!(cfg.attributes.is_all());
        assert!(cfg.persist_only.is_all());
    }

    #[test]
    fn test_column_types_include_implicit_columns() {
        let cfg = ModelConfig::new("products")
            .soft_delete(true)
            .timestamps(true)
            .column(ColumnSpec::new("title", "text"));
        let types = cfg.column_types();
        assert_eq!(types.get("id").map(String::as_str), Some("bigint"));
        assert_eq!(types.get("deleted_at").map(String::as_str), Some("timestamptz"));
        assert_eq!(types.get("updated_at").map(String::as_str), Some("timestamptz"));
        assert_eq!(types.get("title").map(String::as_str), Some("text"));
    }
}
