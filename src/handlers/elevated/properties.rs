// handlers/elevated/properties.rs - POST/PATCH/DELETE /properties handlers

use axum::extract::{multipart::MultipartRejection, Multipart, Path, State};
use axum::http::HeaderMap;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::format::PropertyView;
use crate::api::property_form::PropertyForm;
use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::storage::request_base_url;

/// POST /properties - multipart create
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<PropertyView> {
    let form = PropertyForm::from_multipart(multipart?, &state.config.uploads).await?;
    let input = form.into_create()?;
    let base_url = request_base_url(&headers)?;

    let property = state.properties().create(input, &base_url).await?;
    Ok(ApiResponse::created(PropertyView::from(&property)))
}

/// PATCH /properties/:id - multipart partial update
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<PropertyView> {
    let id: Uuid = parse_id(&id, "Property")?;
    let form = PropertyForm::from_multipart(multipart?, &state.config.uploads).await?;

    let service = state.properties();
    if !service.exists(id).await? {
        return Err(ApiError::not_found("Property not found"));
    }

    let input = form.into_update()?;
    let base_url = request_base_url(&headers)?;

    let property = service.update(id, input, &base_url).await?;
    Ok(ApiResponse::success(PropertyView::from(&property)))
}

/// DELETE /properties/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id: Uuid = parse_id(&id, "Property")?;
    state.properties().delete(id).await?;
    Ok(ApiResponse::success(json!({ "id": id })))
}
