//! Resource validation: identifier syntax, unique path segments, key consistency.

use crate::config::ResourceConfig;
use crate::error::ConfigError;
use crate::model::KeyType;
use regex::Regex;
use std::collections::HashSet;

const IDENTIFIER: &str = r"^[A-Za-z_][A-Za-z0-9_]{0,62}$";
const PATH_SEGMENT: &str = r"^[a-z0-9][a-z0-9_-]*$";

fn pattern(p: &str) -> Result<Regex, ConfigError> {
    Regex::new(p).map_err(|e| ConfigError::Validation(format!("pattern {}: {}", p, e)))
}

fn check_identifier(re: &Regex, kind: &'static str, value: &str) -> Result<(), ConfigError> {
    if re.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            kind,
            value: value.to_string(),
        })
    }
}

pub fn validate(resources: &[ResourceConfig]) -> Result<(), ConfigError> {
    let ident = pattern(IDENTIFIER)?;
    let segment = pattern(PATH_SEGMENT)?;
    let mut path_segments = HashSet::new();
    for r in resources {
        if !segment.is_match(&r.path_segment) {
            return Err(ConfigError::InvalidIdentifier {
                kind: "path_segment",
                value: r.path_segment.clone(),
            });
        }
        if !path_segments.insert(r.path_segment.as_str()) {
            return Err(ConfigError::DuplicatePathSegment(r.path_segment.clone()));
        }

        let m = &r.model;
        check_identifier(&ident, "schema", &m.schema)?;
        check_identifier(&ident, "table", &m.table)?;
        check_identifier(&ident, "primary_key", &m.primary_key)?;
        check_identifier(&ident, "deleted_at", &m.deleted_at)?;
        check_identifier(&ident, "created_at", &m.created_at)?;
        check_identifier(&ident, "updated_at", &m.updated_at)?;
        for f in m.attributes.fields().unwrap_or(&[]) {
            check_identifier(&ident, "attribute", f)?;
        }
        for f in m.persist_only.fields().unwrap_or(&[]) {
            check_identifier(&ident, "persist_only", f)?;
        }
        let mut columns = HashSet::new();
        for c in &m.columns {
            check_identifier(&ident, "column", &c.name)?;
            if !columns.insert(c.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "{}: duplicate column {}",
                    r.path_segment, c.name
                )));
            }
        }

        if let Some(attrs) = m.attributes.fields() {
            if !attrs.contains(&m.primary_key) {
                return Err(ConfigError::Validation(format!(
                    "{}: attributes must include primary key {}",
                    r.path_segment, m.primary_key
                )));
            }
        }
        if m.key_type == KeyType::Number {
            if let Some(persist) = m.persist_only.fields() {
                if persist.contains(&m.primary_key) {
                    return Err(ConfigError::Validation(format!(
                        "{}: generated key {} cannot be in persist_only",
                        r.path_segment, m.primary_key
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldList, ModelConfig};

    fn resource(segment: &str, model: ModelConfig) -> ResourceConfig {
        ResourceConfig::new(segment, model)
    }

    #[test]
    fn test_valid_resources() {
        let resources = vec![
            resource("products", ModelConfig::new("products")),
            resource("order-items", ModelConfig::new("order_items").schema("shop")),
        ];
        assert!(validate(&resources).is_ok());
    }

    #[test]
    fn test_duplicate_path_segment() {
        let resources = vec![
            resource("products", ModelConfig::new("products")),
            resource("products", ModelConfig::new("items")),
        ];
        assert!(matches!(
            validate(&resources),
            Err(ConfigError::DuplicatePathSegment(s)) if s == "products"
        ));
    }

    #[test]
    fn test_invalid_table_name() {
        let resources = vec![resource("p", ModelConfig::new("drop table; --"))];
        assert!(matches!(
            validate(&resources),
            Err(ConfigError::InvalidIdentifier { kind: "table", .. })
        ));
    }

    #[test]
    fn test_attributes_must_include_key() {
        let model = ModelConfig::new("products").attributes(FieldList::only(["title"]));
        assert!(matches!(
            validate(&[resource("products", model)]),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_number_key_not_writable() {
        let model = ModelConfig::new("products").persist_only(FieldList::only(["id", "title"]));
        assert!(validate(&[resource("products", model)]).is_err());
    }
}
