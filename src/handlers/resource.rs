//! Resource CRUD handlers: list, create, read, update, delete.

use crate::error::AppError;
use crate::extractors::Pagination;
use crate::model::{Model, Paginated, Record};
use crate::response::{success_one, success_one_ok};
use crate::service::ResourceService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

fn model<'a>(state: &'a AppState, resource: &str) -> Result<&'a Model, AppError> {
    state
        .models
        .get(resource)
        .ok_or_else(|| AppError::NotFound(format!("unknown resource: {}", resource)))
}

pub async fn list(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    pagination: Pagination,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Paginated<Record>>, AppError> {
    let model = model(&state, &resource)?;
    let page = ResourceService::new(model).find_all(&pagination, &params).await?;
    Ok(Json(page))
}

pub async fn create(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let model = model(&state, &resource)?;
    let created = ResourceService::new(model).create_one(body).await?;
    Ok(success_one(created))
}

pub async fn read(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let model = model(&state, &resource)?;
    let found = ResourceService::new(model).find_one(&id).await?;
    Ok(success_one_ok(found))
}

pub async fn update(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let model = model(&state, &resource)?;
    let updated = ResourceService::new(model).update_one(&id, body).await?;
    Ok(success_one_ok(updated))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub force: bool,
}

pub async fn delete(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, AppError> {
    let model = model(&state, &resource)?;
    ResourceService::new(model).delete_one(&id, params.force).await?;
    Ok(StatusCode::NO_CONTENT)
}
