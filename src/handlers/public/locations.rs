// handlers/public/locations.rs - GET /locations/* handlers
// Unpaginated, ordered by name

use axum::extract::State;
use serde_json::json;

use crate::api::format::{FeatureView, NeighborhoodView, RegionView};
use crate::app::AppState;
use crate::database::models::{Feature, Neighborhood, Region};
use crate::database::Repository;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult};

fn by_name() -> FilterData {
    FilterData {
        order: Some(json!("name asc")),
        ..FilterData::default()
    }
}

/// GET /locations/regions
pub async fn regions(State(state): State<AppState>) -> ApiResult<Vec<RegionView>> {
    let rows = Repository::<Region>::new(Region::TABLE, state.pool.clone())
        .select_any(by_name())
        .await?;
    Ok(ApiResponse::success(rows.iter().map(RegionView::from).collect()))
}

/// GET /locations/neighborhoods
pub async fn neighborhoods(State(state): State<AppState>) -> ApiResult<Vec<NeighborhoodView>> {
    let rows = Repository::<Neighborhood>::new(Neighborhood::TABLE, state.pool.clone())
        .select_any(by_name())
        .await?;
    Ok(ApiResponse::success(rows.iter().map(NeighborhoodView::from).collect()))
}

/// GET /locations/features
pub async fn features(State(state): State<AppState>) -> ApiResult<Vec<FeatureView>> {
    let rows = Repository::<Feature>::new(Feature::TABLE, state.pool.clone())
        .select_any(by_name())
        .await?;
    Ok(ApiResponse::success(rows.iter().map(FeatureView::from).collect()))
}
