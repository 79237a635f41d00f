// handlers/elevated/taxonomy.rs - /admin/{regions,neighborhoods,features} handlers
//
// Deleting a region or neighborhood clears the reference on properties;
// deleting a feature removes its links. Properties themselves stay.

use axum::extract::{rejection::JsonRejection, Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::api::format::{FeatureView, NeighborhoodView, RegionView};
use crate::app::AppState;
use crate::database::models::{Feature, Neighborhood, Region};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{PageMeta, PageQuery, Paginated};
use crate::handlers::{parse_id, public::auth::validate};
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::FeatureType;
use crate::validation::{coerce_enum, required, FieldErrors};

#[derive(Debug, Deserialize, Validate)]
pub struct NameRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FeatureRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub feature_type: Option<String>,
}

fn require_name(name: Option<String>) -> Result<String, ApiError> {
    let mut errors = FieldErrors::new();
    let name = required(&mut errors, "name", name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()));
    errors.finish(name.unwrap_or_default()).map_err(ApiError::validation)
}

fn feature_type(raw: Option<&str>, must_exist: bool) -> Result<Option<FeatureType>, ApiError> {
    let mut errors = FieldErrors::new();
    let value = coerce_enum(&mut errors, "type", raw);
    let value = if must_exist { required(&mut errors, "type", value) } else { value };
    errors.finish(value).map_err(ApiError::validation)
}

macro_rules! named_listing {
    ($list:ident, $get:ident, $delete:ident, $model:ty, $view:ty, $label:literal) => {
        pub async fn $list(
            State(state): State<AppState>,
            Query(query): Query<PageQuery>,
        ) -> ApiResult<Paginated<$view>> {
            let pagination = query.pagination();
            let (rows, total) = Repository::<$model>::new(<$model>::TABLE, state.pool.clone())
                .list_page(None, "name asc", pagination)
                .await?;
            Ok(ApiResponse::success(Paginated {
                items: rows.iter().map(<$view>::from).collect(),
                pagination: PageMeta::new(total, pagination),
            }))
        }

        pub async fn $get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<$view> {
            let id: i32 = parse_id(&id, $label)?;
            let row = Repository::<$model>::new(<$model>::TABLE, state.pool.clone())
                .find_404(id, $label)
                .await?;
            Ok(ApiResponse::success(<$view>::from(&row)))
        }

        pub async fn $delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
            let id: i32 = parse_id(&id, $label)?;
            let deleted = Repository::<$model>::new(<$model>::TABLE, state.pool.clone())
                .delete_by_id(id)
                .await?;
            if !deleted {
                return Err(ApiError::not_found(concat!($label, " not found")));
            }
            tracing::info!("Deleted {} {}", $label, id);
            Ok(ApiResponse::success(json!({ "id": id })))
        }
    };
}

named_listing!(list_regions, get_region, delete_region, Region, RegionView, "Region");
named_listing!(list_neighborhoods, get_neighborhood, delete_neighborhood, Neighborhood, NeighborhoodView, "Neighborhood");
named_listing!(list_features, get_feature, delete_feature, Feature, FeatureView, "Feature");

/// POST /admin/regions
pub async fn create_region(
    State(state): State<AppState>,
    payload: Result<Json<NameRequest>, JsonRejection>,
) -> ApiResult<RegionView> {
    let Json(request) = payload?;
    validate(&request)?;
    let region = Region::create(&state.pool, &require_name(request.name)?).await?;
    Ok(ApiResponse::created(RegionView::from(&region)))
}

/// PATCH /admin/regions/:id
pub async fn update_region(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NameRequest>, JsonRejection>,
) -> ApiResult<RegionView> {
    let id: i32 = parse_id(&id, "Region")?;
    let Json(request) = payload?;
    validate(&request)?;
    let region = Region::rename(&state.pool, id, request.name.as_deref().map(str::trim))
        .await?
        .ok_or_else(|| ApiError::not_found("Region not found"))?;
    Ok(ApiResponse::success(RegionView::from(&region)))
}

/// POST /admin/neighborhoods
pub async fn create_neighborhood(
    State(state): State<AppState>,
    payload: Result<Json<NameRequest>, JsonRejection>,
) -> ApiResult<NeighborhoodView> {
    let Json(request) = payload?;
    validate(&request)?;
    let neighborhood = Neighborhood::create(&state.pool, &require_name(request.name)?).await?;
    Ok(ApiResponse::created(NeighborhoodView::from(&neighborhood)))
}

/// PATCH /admin/neighborhoods/:id
pub async fn update_neighborhood(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NameRequest>, JsonRejection>,
) -> ApiResult<NeighborhoodView> {
    let id: i32 = parse_id(&id, "Neighborhood")?;
    let Json(request) = payload?;
    validate(&request)?;
    let neighborhood = Neighborhood::rename(&state.pool, id, request.name.as_deref().map(str::trim))
        .await?
        .ok_or_else(|| ApiError::not_found("Neighborhood not found"))?;
    Ok(ApiResponse::success(NeighborhoodView::from(&neighborhood)))
}

/// POST /admin/features
pub async fn create_feature(
    State(state): State<AppState>,
    payload: Result<Json<FeatureRequest>, JsonRejection>,
) -> ApiResult<FeatureView> {
    let Json(request) = payload?;
    validate(&request)?;
    let name = require_name(request.name)?;
    let kind = feature_type(request.feature_type.as_deref(), true)?
        .ok_or_else(|| ApiError::invalid_field("type", "Required"))?;

    let feature = Feature::create(&state.pool, &name, kind).await?;
    Ok(ApiResponse::created(FeatureView::from(&feature)))
}

/// PATCH /admin/features/:id
pub async fn update_feature(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<FeatureRequest>, JsonRejection>,
) -> ApiResult<FeatureView> {
    let id: i32 = parse_id(&id, "Feature")?;
    let Json(request) = payload?;
    validate(&request)?;
    let kind = feature_type(request.feature_type.as_deref(), false)?;

    let feature = Feature::update(&state.pool, id, request.name.as_deref().map(str::trim), kind)
        .await?
        .ok_or_else(|| ApiError::not_found("Feature not found"))?;
    Ok(ApiResponse::success(FeatureView::from(&feature)))
}
