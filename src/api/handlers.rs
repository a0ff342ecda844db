//! CRUD handlers, generic over the resource kind.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::body::ApiResource;
use super::error::ApiError;
use crate::http::server::AppState;

pub async fn list<R: ApiResource>(State(state): State<AppState>) -> Json<Vec<R>> {
    Json(state.store.list::<R>())
}

pub async fn get<R: ApiResource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<R>, ApiError> {
    Ok(Json(state.store.get::<R>(&id)?))
}

pub async fn create<R: ApiResource>(
    State(state): State<AppState>,
    body: Result<Json<R::Body>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.map_err(|e| ApiError::invalid_body(R::KIND, e))?;
    let record = R::from_body(body, None)?;
    let created = state.store.create(record)?;

    tracing::info!(kind = %R::KIND, id = %created.id(), "Resource created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": created.id(), "created": true })),
    ))
}

pub async fn update<R: ApiResource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<R::Body>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::invalid_body(R::KIND, e))?;
    let record = R::from_body(body, Some(&id))?;
    state.store.update(&id, record)?;

    tracing::info!(kind = %R::KIND, id = %id, "Resource updated");
    Ok(Json(json!({ "id": id, "updated": true })))
}

pub async fn delete<R: ApiResource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.store.delete::<R>(&id)?;

    tracing::info!(kind = %R::KIND, id = %id, "Resource deleted");
    Ok(Json(json!({ "id": id, "deleted": true })))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}
