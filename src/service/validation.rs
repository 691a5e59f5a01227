//! Request body checks against the model's declared columns.

use crate::error::AppError;
use crate::model::{ColumnSpec, Record};
use serde_json::Value;

pub struct RequestValidator;

impl RequestValidator {
    /// The body must be a JSON object.
    pub fn object(body: Value) -> Result<Record, AppError> {
        match body {
            Value::Object(m) => Ok(m),
            _ => Err(AppError::BadRequest("body must be a JSON object".into())),
        }
    }

    /// NOT NULL columns without a default must be present and non-null.
    pub fn validate_create(body: &Record, columns: &[ColumnSpec]) -> Result<(), AppError> {
        for c in columns {
            if c.nullable || c.default.is_some() {
                continue;
            }
            match body.get(&c.name) {
                None | Some(Value::Null) => {
                    return Err(AppError::Validation(format!("{} is required", c.name)));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Only fields present in the body are checked; NOT NULL columns cannot be cleared.
    pub fn validate_update(body: &Record, columns: &[ColumnSpec]) -> Result<(), AppError> {
        for c in columns.iter().filter(|c| !c.nullable) {
            if let Some(Value::Null) = body.get(&c.name) {
                return Err(AppError::Validation(format!("{} cannot be null", c.name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("title", "text").not_null(),
            ColumnSpec::new("status", "text").not_null().default_expr("'draft'"),
            ColumnSpec::new("description", "text"),
        ]
    }

    #[test]
    fn test_object_required() {
        assert!(RequestValidator::object(json!([1])).is_err());
        assert!(RequestValidator::object(json!({})).is_ok());
    }

    #[test]
    fn test_create_requires_not_null_without_default() {
        let body = RequestValidator::object(json!({ "description": "d" })).unwrap();
        let err = RequestValidator::validate_create(&body, &columns()).unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "title is required"));

        let body = RequestValidator::object(json!({ "title": "t" })).unwrap();
        assert!(RequestValidator::validate_create(&body, &columns()).is_ok());
    }

    #[test]
    fn test_update_checks_present_fields_only() {
        let body = RequestValidator::object(json!({ "description": null })).unwrap();
        assert!(RequestValidator::validate_update(&body, &columns()).is_ok());
        let body = RequestValidator::object(json!({ "title": null })).unwrap();
        assert!(RequestValidator::validate_update(&body, &columns()).is_err());
    }
}
