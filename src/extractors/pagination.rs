//! Page, limit and resource URL from the request.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, OriginalUri, Query},
    http::request::Parts,
};
use std::collections::HashMap;

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 1000;

/// Zero-based `page`, `limit` clamped to [`MAX_LIMIT`], and the request path used to build links.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub resource_url: String,
}

impl Pagination {
    /// Read `page` and `limit` from decoded query params. Other keys are ignored.
    pub fn from_params(path: &str, params: &HashMap<String, String>) -> Result<Self, AppError> {
        let page = match params.get("page") {
            Some(v) => v
                .parse()
                .map_err(|_| AppError::BadRequest(format!("invalid page: {}", v)))?,
            None => 0,
        };
        let limit: u64 = match params.get("limit") {
            Some(v) => v
                .parse()
                .map_err(|_| AppError::BadRequest(format!("invalid limit: {}", v)))?,
            None => DEFAULT_LIMIT,
        };
        Ok(Pagination {
            page,
            limit: limit.min(MAX_LIMIT),
            resource_url: path.to_string(),
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map(|u| u.0.path().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        Pagination::from_params(&path, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let p = Pagination::from_params("/api/products", &HashMap::new()).unwrap();
        assert_eq!(
            p,
            Pagination {
                page: 0,
                limit: 10,
                resource_url: "/api/products".into()
            }
        );
    }

    #[test]
    fn test_limit_is_capped() {
        let p = Pagination::from_params("/api/products", &params(&[("page", "3"), ("limit", "5000"), ("title", "x")]))
            .unwrap();
        assert_eq!(p.page, 3);
        assert_eq!(p.limit, MAX_LIMIT);
    }

    #[test]
    fn test_invalid_page() {
        let err = Pagination::from_params("/api/products", &params(&[("page", "-1")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
